// tests/security_test.rs
use std::path::Path;
use tierload::security::{session_fingerprint, validate_path_safety};

#[test]
fn test_session_fingerprint_hides_raw_id() {
    let id = "cs_test_a1b2c3d4e5f6g7h8i9";
    let fingerprint = session_fingerprint(id);

    assert!(fingerprint.starts_with("sess#"));
    assert!(!fingerprint.contains(id));
    assert_eq!(fingerprint.len(), "sess#".len() + 8);

    // Stable for the same id, different for another
    assert_eq!(fingerprint, session_fingerprint(id));
    assert_ne!(fingerprint, session_fingerprint("cs_test_other"));
}

#[test]
fn test_path_safety_validation() {
    // Temporary directory should be considered safe
    assert!(validate_path_safety(&std::env::temp_dir()).is_ok());
    assert!(validate_path_safety(Path::new("downloads")).is_ok());

    // Sensitive directories should be rejected
    #[cfg(unix)]
    {
        assert!(validate_path_safety(Path::new("/etc")).is_err());
        assert!(validate_path_safety(Path::new("/usr/bin")).is_err());
        assert!(validate_path_safety(Path::new("/proc/self/videos")).is_err());
    }

    // Path traversal attempts should be rejected
    assert!(validate_path_safety(Path::new("../../etc/passwd-dir")).is_err());
    assert!(validate_path_safety(Path::new("~/videos")).is_err());
}

// tests/common/http.rs
// One-shot HTTP server on a loopback port for driving the real client

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

pub struct Reply {
    status: &'static str,
    content_type: &'static str,
    body: Vec<u8>,
    // Body sent in chunks of this size with a pause after each
    trickle: Option<(usize, Duration)>,
}

impl Reply {
    pub fn json(body: &str) -> Self {
        Self {
            status: "200 OK",
            content_type: "application/json",
            body: body.as_bytes().to_vec(),
            trickle: None,
        }
    }

    pub fn bytes(body: &[u8]) -> Self {
        Self {
            status: "200 OK",
            content_type: "video/mp4",
            body: body.to_vec(),
            trickle: None,
        }
    }

    pub fn status(status: &'static str) -> Self {
        Self {
            status,
            content_type: "application/json",
            body: br#"{"error":"failed"}"#.to_vec(),
            trickle: None,
        }
    }

    pub fn trickle(mut self, chunk: usize, pause: Duration) -> Self {
        self.trickle = Some((chunk, pause));
        self
    }
}

/// Received request: the head (request line and headers) and the body
pub struct Received {
    pub head: String,
    pub body: Vec<u8>,
}

impl Received {
    pub fn request_line(&self) -> &str {
        self.head.lines().next().unwrap_or("")
    }

    pub fn header(&self, name: &str) -> Option<String> {
        let prefix = format!("{}:", name.to_lowercase());
        self.head
            .lines()
            .find(|l| l.to_lowercase().starts_with(&prefix))
            .map(|l| l[prefix.len()..].trim().to_string())
    }
}

/// Serve one request with `reply`. Returns the base address and a handle
/// resolving to what the client sent.
pub async fn serve_once(reply: Reply) -> (String, JoinHandle<Received>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let received = read_request(&mut socket).await;

        let head = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            reply.status,
            reply.content_type,
            reply.body.len()
        );
        socket.write_all(head.as_bytes()).await.unwrap();
        match reply.trickle {
            Some((size, pause)) => {
                for chunk in reply.body.chunks(size) {
                    if socket.write_all(chunk).await.is_err() {
                        break;
                    }
                    let _ = socket.flush().await;
                    tokio::time::sleep(pause).await;
                }
            }
            None => {
                let _ = socket.write_all(&reply.body).await;
            }
        }
        let _ = socket.shutdown().await;
        received
    });

    (base, handle)
}

async fn read_request(socket: &mut TcpStream) -> Received {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = socket.read(&mut chunk).await.unwrap();
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);

        if let Some(end) = header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..end]).to_lowercase();
            let length = head
                .lines()
                .find_map(|l| l.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }

    match header_end(&buf) {
        Some(end) => Received {
            head: String::from_utf8_lossy(&buf[..end]).to_string(),
            body: buf[end + 4..].to_vec(),
        },
        None => Received {
            head: String::from_utf8_lossy(&buf).to_string(),
            body: Vec::new(),
        },
    }
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n")
}

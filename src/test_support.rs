//! Helpers shared by unit tests: PATH lookup and throwaway HTTP endpoints.
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;

pub(crate) fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Answer a single request with `status` and `body`; returns the endpoint URL.
pub(crate) fn serve_once(status: &str, body: impl AsRef<[u8]>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test endpoint");
    let addr = listener.local_addr().expect("test endpoint addr");
    let body = body.as_ref();
    let mut response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    response.extend_from_slice(body);
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request_head(&mut stream);
            let _ = stream.write_all(&response);
        }
    });
    format!("http://{addr}/predict")
}

/// Accept one connection and never answer it.
pub(crate) fn serve_silently(hold: Duration) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test endpoint");
    let addr = listener.local_addr().expect("test endpoint addr");
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request_head(&mut stream);
            thread::sleep(hold);
        }
    });
    format!("http://{addr}/predict")
}

fn read_request_head(stream: &mut TcpStream) {
    let mut head = Vec::new();
    let mut buf = [0u8; 1024];
    while !head.windows(4).any(|window| window == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => head.extend_from_slice(&buf[..n]),
        }
    }
}

//! Shared test infrastructure for integration tests.
#![allow(dead_code)]

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::thread;

pub const BIN: &str = env!("CARGO_BIN_EXE_cicd-optimizer");

pub const PROBED_MANIFEST: &str = "\
apiVersion: apps/v1
kind: Deployment
spec:
  template:
    spec:
      containers:
        - name: api
          livenessProbe:
            httpGet: { path: /healthz, port: 8080 }
          readinessProbe:
            httpGet: { path: /ready, port: 8080 }
";

pub fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Serve `body` with a 200 status to a single request; returns the URL.
pub fn serve_prediction(body: &str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind test endpoint");
    let addr = listener.local_addr().expect("test endpoint addr");
    let response = format!(
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
        body.len()
    );
    thread::spawn(move || {
        if let Ok((mut stream, _)) = listener.accept() {
            read_request_head(&mut stream);
            let _ = stream.write_all(response.as_bytes());
        }
    });
    format!("http://{addr}/predict")
}

/// A URL nothing listens on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("local addr");
    drop(listener);
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

/// Run the binary in `cwd` with a clean set of pipeline environment variables.
pub fn run_in(cwd: &Path, args: &[&str]) -> Output {
    run_with_env(cwd, args, &[])
}

/// Like [`run_in`], then sets `env` on top of the cleaned environment.
pub fn run_with_env(cwd: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut command = Command::new(BIN);
    command
        .args(args)
        .current_dir(cwd)
        .env_remove("CICD_LINT_COMMAND")
        .env_remove("CICD_PREDICT_URL")
        .env_remove("CICD_MANIFEST")
        .env_remove("RUST_LOG");
    for (key, value) in env {
        command.env(key, value);
    }
    command.output().expect("run cicd-optimizer")
}

pub fn stdout_lines(output: &Output) -> Vec<String> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect()
}

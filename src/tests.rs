use std::{
    fs,
    io::{Read, Write},
    net::{TcpListener, TcpStream},
    sync::mpsc::{self, Receiver},
    thread,
    time::Duration,
};

use crate::{
    args::Args, client::send_request, error::Error, render_response, RenderOptions, RequestSpec,
};
use clap::Parser;

// Mock HTTP server answering a single connection with a canned response
struct MockServer {
    listener: TcpListener,
    response: Vec<u8>,
    delay: Duration,
}

impl MockServer {
    fn new(response: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        Self {
            listener,
            response: response.as_bytes().to_vec(),
            delay: Duration::ZERO,
        }
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn url(&self, path: &str) -> String {
        format!(
            "http://127.0.0.1:{}{}",
            self.listener.local_addr().unwrap().port(),
            path
        )
    }

    /// Serve one request in the background; the raw request arrives on the channel.
    fn serve_once(self) -> Receiver<String> {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = self.listener.accept().unwrap();
            let request = Self::read_request(&mut stream);
            sender.send(request).ok();
            thread::sleep(self.delay);
            stream.write_all(&self.response).ok();
            stream.flush().ok();
        });
        receiver
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut request = Vec::new();
        let mut buffer = [0u8; 1024];

        loop {
            let read = stream.read(&mut buffer).unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&buffer[..read]);

            let Some(header_end) = request.windows(4).position(|window| window == b"\r\n\r\n")
            else {
                continue;
            };
            let head = String::from_utf8_lossy(&request[..header_end]).to_lowercase();
            let content_length = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|value| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if request.len() >= header_end + 4 + content_length {
                break;
            }
        }

        String::from_utf8_lossy(&request).into_owned()
    }
}

fn ok_response(content_type: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nDate: Mon, 01 Jan 2024 00:00:00 GMT\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        content_type,
        body.len(),
        body
    )
}

fn quiet_options(dir: &tempfile::TempDir) -> RenderOptions {
    RenderOptions {
        save_dir: dir.path().to_path_buf(),
        output: None,
        chunk_delay: Duration::ZERO,
        show_progress: false,
    }
}

fn spec_for(argv: &[&str]) -> RequestSpec {
    let args = Args::parse_from(std::iter::once("reqline").chain(argv.iter().copied()));
    RequestSpec::from_args(&args).unwrap()
}

#[test]
fn test_get_with_headers_and_queries() {
    let server = MockServer::new(&ok_response("text/plain", "Hello, World!"));
    let url = server.url("/items");
    let requests = server.serve_once();

    let spec = spec_for(&["-H", "X_Token:abc", "-Q", "page=2", url.as_str()]);
    let response = send_request(&spec, false).unwrap();
    assert_eq!(response.status, Some(200));

    let request = requests.recv().unwrap();
    assert!(request.starts_with("GET /items?page=2 HTTP/1.1\r\n"));
    assert!(request.to_lowercase().contains("x_token: abc"));
    assert!(!request.to_lowercase().contains("content-type"));
}

#[test]
fn test_post_form_data() {
    let server = MockServer::new(&ok_response("application/json", "{\"status\":\"success\"}"));
    let url = server.url("/submit");
    let requests = server.serve_once();

    let spec = spec_for(&["-M", "post", "-D", "name=alice&age=30", url.as_str()]);
    send_request(&spec, false).unwrap();

    let request = requests.recv().unwrap();
    assert!(request.starts_with("POST /submit HTTP/1.1\r\n"));
    assert!(request
        .to_lowercase()
        .contains("content-type: application/x-www-form-urlencoded"));
    assert!(request.ends_with("\r\n\r\nname=alice&age=30"));
}

#[test]
fn test_put_json_is_sent_verbatim() {
    let server = MockServer::new(&ok_response("application/json", "{}"));
    let url = server.url("/things/1");
    let requests = server.serve_once();

    let spec = spec_for(&["-M", "PUT", "--json", "{\"name\": \"x\"}", url.as_str()]);
    send_request(&spec, false).unwrap();

    let request = requests.recv().unwrap();
    assert!(request.starts_with("PUT /things/1 HTTP/1.1\r\n"));
    assert!(request
        .to_lowercase()
        .contains("content-type: application/json"));
    assert!(request.ends_with("\r\n\r\n{\"name\": \"x\"}"));
}

#[test]
fn test_file_upload_sends_raw_bytes() {
    let server = MockServer::new(&ok_response("text/plain", "stored"));
    let url = server.url("/upload");
    let requests = server.serve_once();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"file contents").unwrap();
    let path = file.path().to_str().unwrap().to_string();

    let spec = spec_for(&["-M", "post", "--file", path.as_str(), url.as_str()]);
    send_request(&spec, false).unwrap();

    let request = requests.recv().unwrap();
    assert!(request
        .to_lowercase()
        .contains("content-type: application/octet-stream"));
    assert!(request.ends_with("\r\n\r\nfile contents"));
}

#[test]
fn test_html_response_is_saved_and_printed() {
    let server = MockServer::new(&ok_response("text/html; charset=utf-8", "<p>hi</p>"));
    let url = server.url("/");
    let _requests = server.serve_once();
    let dir = tempfile::tempdir().unwrap();

    let response = send_request(&spec_for(&[url.as_str()]), false).unwrap();
    let mut out = Vec::new();
    let saved = render_response(Some(response), &quiet_options(&dir), &mut out)
        .unwrap()
        .unwrap();

    assert_eq!(
        saved,
        dir.path()
            .join("file_Mon, 01 Jan 2024 00:00:00 GMT.html")
    );
    assert_eq!(fs::read(&saved).unwrap(), b"<p>hi</p>");

    let printed = String::from_utf8(out).unwrap();
    assert!(printed.contains("content-type: text/html; charset=utf-8\n"));
    assert!(printed.ends_with("<p>\n hi\n</p>\n"));
}

#[test]
fn test_timeout_is_fatal() {
    let server =
        MockServer::new(&ok_response("text/plain", "late")).with_delay(Duration::from_secs(3));
    let url = server.url("/slow");
    let _requests = server.serve_once();

    let spec = spec_for(&["--timeout", "1", url.as_str()]);
    match send_request(&spec, false) {
        Err(Error::Transport(err)) => assert!(err.is_timeout()),
        Err(other) => panic!("unexpected error: {}", other),
        Ok(_) => panic!("request should have timed out"),
    }
}

#[test]
fn test_connection_refused() {
    let port = {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let url = format!("http://127.0.0.1:{}", port);
    let spec = spec_for(&[url.as_str()]);
    assert!(matches!(
        send_request(&spec, false),
        Err(Error::Transport(_))
    ));
}

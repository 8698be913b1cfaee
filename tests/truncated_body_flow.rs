//! Integration tests for responses whose body breaks off mid-transfer.
//!
//! wiremock always sends complete bodies, so these tests use a bare TCP
//! listener that declares a `Content-Length` longer than what it writes
//! and then closes the connection.

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use api_devices::error::{DevicesError, UNKNOWN_ERROR_CODE};
use api_devices::v2::DevicesV2Api;

const TOKEN: &str = "aRandomBearerTokenForAuth0Authentication";
const CUSTOMER_ID: &str = "9a919a42-b506-49ee-b053-402827b761b7";

/// Serves one connection with `status_line`, a `Content-Length: 100`
/// header and only `hello` as body. Returns the base URL.
fn serve_truncated(status_line: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || {
        let (mut stream, _) = listener.accept().unwrap();
        read_request(&mut stream);
        let response = format!("HTTP/1.1 {status_line}\r\nContent-Length: 100\r\n\r\nhello");
        stream.write_all(response.as_bytes()).unwrap();
        stream.flush().unwrap();
        // Dropping the stream closes the connection 95 bytes short.
    });
    format!("http://{addr}")
}

/// Consumes the request head and its declared body.
fn read_request(stream: &mut TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    let (head_end, body_len) = loop {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_lowercase();
            let body_len = head
                .lines()
                .find_map(|line| line.strip_prefix("content-length:"))
                .and_then(|v| v.trim().parse::<usize>().ok())
                .unwrap_or(0);
            break (pos + 4, body_len);
        }
    };
    while buf.len() < head_end + body_len {
        let n = stream.read(&mut chunk).unwrap();
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

fn api(url: &str) -> DevicesV2Api {
    DevicesV2Api::new(url, Some(TOKEN)).unwrap()
}

#[tokio::test]
async fn empty_body_operation_reports_broken_transfer() {
    let url = serve_truncated("202 Accepted");
    let ids = vec!["25938eac-f148-45a0-bf5b-620b373c59e1".to_string()];

    let err = api(&url)
        .assignments(CUSTOMER_ID, &ids)
        .unwrap()
        .request()
        .await
        .unwrap_err();

    assert!(matches!(err, DevicesError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn decoded_operation_reports_network_not_parse() {
    let url = serve_truncated("200 OK");

    let err = api(&url)
        .download_link(CUSTOMER_ID)
        .unwrap()
        .get()
        .await
        .unwrap_err();

    assert!(matches!(err, DevicesError::Network(_)), "got {err:?}");
}

#[tokio::test]
async fn failed_status_is_translated_without_its_body() {
    let url = serve_truncated("400 Bad Request");

    let err = api(&url)
        .download_link(CUSTOMER_ID)
        .unwrap()
        .get()
        .await
        .unwrap_err();

    match err {
        DevicesError::ApiV2(e) => {
            assert_eq!(e.status_code, 400);
            assert_eq!(e.code, UNKNOWN_ERROR_CODE);
        }
        other => panic!("expected ApiV2, got {other:?}"),
    }
}

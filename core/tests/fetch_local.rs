/*
 * fetch_local.rs
 * Copyright (C) 2026 Chris Burdess
 *
 * End-to-end fetches against a scripted HTTP/1.1 server on 127.0.0.1. Each accepted connection
 * gets the next canned response; the requests the server saw are returned for inspection.
 */

use std::io::{ErrorKind as IoErrorKind, Write};
use std::time::Duration;

use flate2::write::GzEncoder;
use flate2::Compression;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use sfoglia_core::protocol::http::HttpClient;
use sfoglia_core::{FetchConfig, FetchError, Fetcher, Scheme};

/// Serve `responses` in order, one per connection. Resolves to the raw requests received.
async fn serve(responses: Vec<Vec<u8>>) -> (u16, JoinHandle<Vec<String>>) {
    serve_with_delay(responses, Duration::ZERO).await
}

async fn serve_with_delay(
    responses: Vec<Vec<u8>>,
    delay: Duration,
) -> (u16, JoinHandle<Vec<String>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let handle = tokio::spawn(async move {
        let mut requests = Vec::new();
        for response in responses {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut buf).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&buf[..n]),
                }
            }
            requests.push(String::from_utf8_lossy(&request).into_owned());
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            let _ = socket.write_all(&response).await;
            let _ = socket.shutdown().await;
        }
        requests
    });
    (port, handle)
}

fn fetcher() -> Fetcher {
    Fetcher::new(FetchConfig::default().user_agent(None))
}

fn gzip(data: &[u8]) -> Vec<u8> {
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).unwrap();
    enc.finish().unwrap()
}

fn chunked(body: &[u8], chunk_size: usize) -> Vec<u8> {
    let mut out = Vec::new();
    for chunk in body.chunks(chunk_size) {
        out.extend_from_slice(format!("{:x}\r\n", chunk.len()).as_bytes());
        out.extend_from_slice(chunk);
        out.extend_from_slice(b"\r\n");
    }
    out.extend_from_slice(b"0\r\n\r\n");
    out
}

#[tokio::test]
async fn chunked_body_is_reassembled() {
    let mut response =
        b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nTransfer-Encoding: chunked\r\n\r\n".to_vec();
    response.extend_from_slice(b"5\r\nHello\r\n6\r\n world\r\n0\r\n\r\n");
    let (port, server) = serve(vec![response]).await;

    let (headers, body) = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap();
    assert_eq!(body, "Hello world");
    assert_eq!(headers.get("Content-Type"), Some("text/html"));
    assert_eq!(headers.get("transfer-encoding"), Some("chunked"));
    server.await.unwrap();
}

#[tokio::test]
async fn request_bytes_are_exact() {
    let (port, server) = serve(vec![b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok".to_vec()]).await;
    let fetcher = Fetcher::new(
        FetchConfig::default()
            .user_agent(None)
            .decoders(sfoglia_core::Decoders::available().without_brotli()),
    );

    let (_, body) = fetcher
        .fetch(&format!("http://127.0.0.1:{}/a/b?c=d", port))
        .await
        .unwrap();
    assert_eq!(body, "ok");
    let requests = server.await.unwrap();
    assert_eq!(
        requests,
        vec![format!(
            "GET /a/b?c=d HTTP/1.1\r\nHost: 127.0.0.1:{}\r\nAccept-Encoding: gzip, deflate\r\nConnection: close\r\n\r\n",
            port
        )]
    );
}

#[tokio::test]
async fn user_agent_is_sent_last() {
    let (port, server) = serve(vec![b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n".to_vec()]).await;
    let fetcher = Fetcher::new(FetchConfig::default().user_agent(Some("tester/1".to_string())));

    let (_, body) = fetcher
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap();
    assert_eq!(body, "");
    let requests = server.await.unwrap();
    assert!(requests[0].ends_with("Connection: close\r\nUser-Agent: tester/1\r\n\r\n"));
}

#[tokio::test]
async fn chunked_gzip_body_is_decoded() {
    let html = "<html><body>compressed page</body></html>";
    let mut response = b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\nContent-Encoding: gzip\r\n\r\n".to_vec();
    response.extend_from_slice(&chunked(&gzip(html.as_bytes()), 7));
    let (port, server) = serve(vec![response]).await;

    let (_, body) = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap();
    assert_eq!(body, html);
    server.await.unwrap();
}

#[tokio::test]
async fn not_found_is_an_http_error() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 404 Not Found\r\nContent-Length: 9\r\n\r\nnot found".to_vec(),
    ])
    .await;

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/missing", port))
        .await
        .unwrap_err();
    assert!(matches!(&err, FetchError::Http { status: 404, reason } if reason == "Not Found"));
    assert_eq!(err.to_string(), "404: Not Found");
    server.await.unwrap();
}

#[tokio::test]
async fn content_length_stops_at_declared_size() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 200 OK\r\nContent-Length: 5\r\n\r\nHelloTRAILING GARBAGE".to_vec(),
    ])
    .await;

    let (_, body) = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap();
    assert_eq!(body, "Hello");
    server.await.unwrap();
}

#[tokio::test]
async fn body_without_framing_runs_to_close() {
    let (port, server) = serve(vec![b"HTTP/1.0 200 OK\r\nServer: old\r\n\r\nuntil the end".to_vec()]).await;

    let (headers, body) = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap();
    assert_eq!(body, "until the end");
    assert_eq!(headers.get("server"), Some("old"));
    server.await.unwrap();
}

#[tokio::test]
async fn unknown_content_encoding_fails() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 200 OK\r\nContent-Encoding: zstd\r\nContent-Length: 3\r\n\r\nabc".to_vec(),
    ])
    .await;

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Decoding(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn unknown_transfer_encoding_fails() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: gzip\r\n\r\nabc".to_vec(),
    ])
    .await;

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::UnsupportedFraming(te) if te == "gzip"));
    server.await.unwrap();
}

#[tokio::test]
async fn close_inside_chunk_is_a_protocol_error() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 200 OK\r\nTransfer-Encoding: chunked\r\n\r\n5\r\nHel".to_vec(),
    ])
    .await;

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Protocol(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn garbage_status_line_is_a_protocol_error() {
    let (port, server) = serve(vec![b"SSH-2.0-OpenSSH\r\n\r\n".to_vec()]).await;

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Protocol(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn redirect_is_followed_within_budget() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 301 Moved Permanently\r\nLocation: /final\r\nContent-Length: 0\r\n\r\n".to_vec(),
        b"HTTP/1.1 200 OK\r\nContent-Length: 4\r\n\r\ndone".to_vec(),
    ])
    .await;
    let fetcher = Fetcher::new(FetchConfig::default().user_agent(None).max_redirects(1));

    let (_, body) = fetcher
        .fetch(&format!("http://127.0.0.1:{}/start", port))
        .await
        .unwrap();
    assert_eq!(body, "done");
    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /start HTTP/1.1\r\n"));
    assert!(requests[1].starts_with("GET /final HTTP/1.1\r\n"));
}

#[tokio::test]
async fn redirect_without_budget_is_an_http_error() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 301 Moved Permanently\r\nLocation: /final\r\nContent-Length: 0\r\n\r\n".to_vec(),
    ])
    .await;

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/start", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Http { status: 301, .. }));
    server.await.unwrap();
}

#[tokio::test]
async fn refused_connection_is_a_connection_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = fetcher()
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Connection(_)));
}

#[tokio::test]
async fn silent_server_times_out() {
    let (port, server) = serve_with_delay(
        vec![b"HTTP/1.1 200 OK\r\nContent-Length: 0\r\n\r\n".to_vec()],
        Duration::from_secs(2),
    )
    .await;
    let fetcher = Fetcher::new(
        FetchConfig::default()
            .user_agent(None)
            .read_timeout(Duration::from_millis(200)),
    );

    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{}/", port))
        .await
        .unwrap_err();
    match err {
        FetchError::Connection(e) => assert_eq!(e.kind(), IoErrorKind::TimedOut),
        other => panic!("expected timeout, got {:?}", other),
    }
    server.await.unwrap();
}

#[tokio::test]
async fn url_without_authority_marker_is_fetched() {
    let (port, server) = serve(vec![b"HTTP/1.1 200 OK\r\nContent-Length: 2\r\n\r\nok".to_vec()]).await;

    let (_, body) = fetcher()
        .fetch(&format!("http:127.0.0.1:{}/plain", port))
        .await
        .unwrap();
    assert_eq!(body, "ok");
    let requests = server.await.unwrap();
    assert!(requests[0].starts_with("GET /plain HTTP/1.1\r\n"));
}

#[tokio::test]
async fn redirect_to_data_url_is_refused() {
    let (port, server) = serve(vec![
        b"HTTP/1.1 302 Found\r\nLocation: data:text/html,hi\r\nContent-Length: 0\r\n\r\n".to_vec(),
    ])
    .await;
    let fetcher = Fetcher::new(FetchConfig::default().user_agent(None).max_redirects(1));

    let err = fetcher
        .fetch(&format!("http://127.0.0.1:{}/dir/page", port))
        .await
        .unwrap_err();
    assert!(matches!(err, FetchError::Protocol(_)));
    server.await.unwrap();
}

#[tokio::test]
async fn connection_reports_its_endpoint() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let conn = HttpClient::connect("127.0.0.1", port, Scheme::Http, &FetchConfig::default())
        .await
        .unwrap();
    assert_eq!(conn.host(), "127.0.0.1");
    assert_eq!(conn.port(), port);
    assert!(!conn.is_secure());

    let err = HttpClient::connect("127.0.0.1", port, Scheme::Data, &FetchConfig::default())
        .await
        .err();
    assert!(matches!(err, Some(FetchError::UnsupportedScheme(_))));
}

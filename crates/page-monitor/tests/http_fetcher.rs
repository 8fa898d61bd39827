//! `HttpFetcher` against a minimal local HTTP responder.

use std::net::SocketAddr;
use std::time::Duration;

use page_monitor::{
    CookieRecord, CredentialBundle, FetchError, HttpFetcher, HttpFetcherConfig, PageFetcher,
};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use url::Url;

const SESSION_COOKIE: &str = "MoodleSession=abc";

/// Serve a handful of fixed routes until the test ends.
async fn spawn_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        loop {
            let Ok((stream, _)) = listener.accept().await else {
                break;
            };
            tokio::spawn(handle(stream));
        }
    });

    addr
}

async fn handle(mut stream: TcpStream) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }

    let request = String::from_utf8_lossy(&buf);
    let path = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .unwrap_or("/")
        .to_string();
    let cookie = request
        .lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("cookie")
                .then(|| value.trim().to_string())
        })
        .unwrap_or_default();

    let response = match path.as_str() {
        "/mod/view.php" if cookie.contains(SESSION_COOKIE) => {
            ok(&format!(r#"<div role="main">cookie: {}</div>"#, cookie))
        }
        "/mod/view.php" => redirect("/login/index.php"),
        "/login/index.php" => ok("<form>Log in</form>"),
        "/slow" => {
            tokio::time::sleep(Duration::from_secs(5)).await;
            ok("late")
        }
        _ => "HTTP/1.1 500 Internal Server Error\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
            .to_string(),
    };

    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.shutdown().await;
}

fn ok(body: &str) -> String {
    format!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    )
}

fn redirect(location: &str) -> String {
    format!(
        "HTTP/1.1 303 See Other\r\nLocation: {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        location
    )
}

fn bundle() -> CredentialBundle {
    CredentialBundle::new(vec![
        CookieRecord::new("MoodleSession", "abc", "127.0.0.1"),
        CookieRecord::new("tracker", "zzz", ".ads.example.com"),
    ])
}

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(&HttpFetcherConfig {
        use_system_proxy: false,
        ..Default::default()
    })
    .unwrap()
}

#[tokio::test]
async fn test_fetch_sends_scoped_cookies() {
    let addr = spawn_server().await;
    let url = Url::parse(&format!("http://{}/mod/view.php", addr)).unwrap();

    let result = fetcher().fetch(&url, &bundle()).await.unwrap();
    assert_eq!(result.status, 200);
    assert_eq!(result.final_url, url);
    assert_eq!(result.body, r#"<div role="main">cookie: MoodleSession=abc</div>"#);
}

#[tokio::test]
async fn test_fetch_reports_redirected_url() {
    let addr = spawn_server().await;
    let url = Url::parse(&format!("http://{}/mod/view.php", addr)).unwrap();

    let result = fetcher()
        .fetch(&url, &CredentialBundle::default())
        .await
        .unwrap();
    assert_eq!(result.final_url.path(), "/login/index.php");
    assert_eq!(result.body, "<form>Log in</form>");
}

#[tokio::test]
async fn test_fetch_non_success_status_is_error() {
    let addr = spawn_server().await;
    let url = Url::parse(&format!("http://{}/missing", addr)).unwrap();

    let err = fetcher().fetch(&url, &bundle()).await.unwrap_err();
    assert!(matches!(err, FetchError::Status { status: 500, .. }));
}

#[tokio::test]
async fn test_fetch_times_out() {
    let addr = spawn_server().await;
    let url = Url::parse(&format!("http://{}/slow", addr)).unwrap();
    let fetcher = HttpFetcher::new(&HttpFetcherConfig {
        timeout: Duration::from_millis(200),
        use_system_proxy: false,
        ..Default::default()
    })
    .unwrap();

    let err = fetcher.fetch(&url, &bundle()).await.unwrap_err();
    assert!(err.is_timeout(), "expected timeout, got {}", err);
}

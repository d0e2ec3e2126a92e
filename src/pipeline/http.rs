//! Shared blocking HTTP client construction.

use std::time::Duration;

/// Build the blocking client shared by every outbound adapter.
///
/// Must be called (and the client dropped) outside of an async runtime.
pub fn build_http_client(timeout_secs: u64) -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(concat!("moyak/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Join a base URL and a path segment with exactly one slash.
pub fn join_url(base: &str, segment: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        segment.trim_start_matches('/')
    )
}

/// Stub HTTP server for adapter tests.
///
/// Runs an axum router on `127.0.0.1:0` in its own thread and runtime so the
/// blocking client under test never shares a runtime with it.
#[cfg(test)]
pub(crate) fn spawn_stub_server(app: axum::Router) -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        runtime.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            tx.send(listener.local_addr().unwrap()).unwrap();
            axum::serve(listener, app).await.unwrap();
        });
    });
    let addr = rx.recv().unwrap();
    format!("http://{addr}")
}

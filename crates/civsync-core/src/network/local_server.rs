//! Loopback HTTP responder for client tests.

use super::client::{client_builder, CatalogHttpClient};
use crate::config::NetworkSettings;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// A complete HTTP/1.1 response that closes the connection.
pub(crate) fn reply(status: &str, body: &str) -> String {
    format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    )
}

/// Answer one connection per canned reply, in order. Returns the base URL.
pub(crate) async fn serve(replies: Vec<String>) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        for reply in replies {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = vec![0u8; 8192];
            let _ = socket.read(&mut request).await;
            socket.write_all(reply.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        }
    });
    base
}

/// Accept connections, read the request and never answer.
pub(crate) async fn serve_silent() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();
        let mut request = vec![0u8; 8192];
        let _ = socket.read(&mut request).await;
        tokio::time::sleep(Duration::from_secs(30)).await;
        drop(socket);
    });
    base
}

/// Client that ignores proxies from the environment.
pub(crate) fn local_client(settings: &NetworkSettings) -> CatalogHttpClient {
    let client = client_builder(settings)
        .unwrap()
        .no_proxy()
        .build()
        .unwrap();
    CatalogHttpClient::with_client(client, settings)
}

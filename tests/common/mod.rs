#![allow(dead_code)]

use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{accept_async, WebSocketStream};

pub type ServerStream = WebSocketStream<TcpStream>;

/// Local WebSocket server; `handle` runs once per accepted connection with its index
pub async fn spawn_server<F, Fut>(handle: F) -> SocketAddr
where
    F: Fn(ServerStream, usize) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = Arc::new(handle);
    let accepted = Arc::new(AtomicUsize::new(0));

    tokio::spawn(async move {
        while let Ok((stream, _)) = listener.accept().await {
            let handle = Arc::clone(&handle);
            let index = accepted.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                if let Ok(ws) = accept_async(stream).await {
                    handle(ws, index).await;
                }
            });
        }
    });

    addr
}

pub fn ws_url(addr: SocketAddr) -> String {
    format!("ws://{}", addr)
}

/// Next text frame parsed as JSON; `None` once the peer is gone
pub async fn next_request(ws: &mut ServerStream) -> Option<Value> {
    while let Some(Ok(message)) = ws.next().await {
        if let Message::Text(text) = message {
            return serde_json::from_str(&text).ok();
        }
    }
    None
}

pub fn ok_response(id: &Value, result: Value) -> Message {
    Message::Text(json!({"id": id, "status": 200, "result": result, "rateLimits": []}).to_string())
}

/// Answer every request with its own id and method
pub async fn echo(mut ws: ServerStream) {
    while let Some(request) = next_request(&mut ws).await {
        let reply = ok_response(&request["id"], json!({"method": request["method"]}));
        if ws.send(reply).await.is_err() {
            break;
        }
    }
}

/// Read everything, answer nothing
pub async fn silent(mut ws: ServerStream) {
    while next_request(&mut ws).await.is_some() {}
}

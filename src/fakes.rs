//! Scripted completion transports and a local HTTP endpoint for tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::dispatch::CompletionTransport;
use crate::openai::Error;
use crate::prompt::TaskLabel;

#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Answer with the prompt that was sent.
    Echo,
    Fail(String),
    Panic,
}

/// Answers each task according to a script, optionally after a delay.
#[derive(Debug)]
pub struct ScriptedTransport {
    default: Reply,
    replies: HashMap<TaskLabel, Reply>,
    delays: HashMap<TaskLabel, Duration>,
    calls: AtomicUsize,
}

impl ScriptedTransport {
    fn answering(default: Reply) -> Self {
        Self {
            default,
            replies: HashMap::new(),
            delays: HashMap::new(),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn replying(text: &str) -> Self {
        Self::answering(Reply::Text(text.to_string()))
    }

    pub fn echoing() -> Self {
        Self::answering(Reply::Echo)
    }

    pub fn failing(message: &str) -> Self {
        Self::answering(Reply::Fail(message.to_string()))
    }

    pub fn with_reply(mut self, label: TaskLabel, reply: Reply) -> Self {
        self.replies.insert(label, reply);
        self
    }

    pub fn with_delay(mut self, label: TaskLabel, delay: Duration) -> Self {
        self.delays.insert(label, delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CompletionTransport for ScriptedTransport {
    async fn complete(&self, label: TaskLabel, prompt: &str) -> Result<String, Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delays.get(&label) {
            tokio::time::sleep(*delay).await;
        }
        match self.replies.get(&label).unwrap_or(&self.default) {
            Reply::Text(text) => Ok(text.clone()),
            Reply::Echo => Ok(prompt.to_string()),
            Reply::Fail(message) => Err(Error::ApiError {
                status: 500,
                message: message.clone(),
            }),
            Reply::Panic => panic!("scripted transport panic"),
        }
    }
}

/// Serve every request on a fresh local port with `status` and a JSON `body`.
///
/// Returns the chat completion URL to configure and a channel receiving each
/// raw request (head and body) before its response is written.
pub async fn completion_server(
    status: &'static str,
    body: &'static str,
) -> (String, mpsc::UnboundedReceiver<String>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let endpoint = format!(
        "http://{}/v1/chat/completions",
        listener.local_addr().unwrap()
    );
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        while let Ok((mut stream, _)) = listener.accept().await {
            let tx = tx.clone();
            tokio::spawn(async move {
                let Ok(request) = read_request(&mut stream).await else {
                    return;
                };
                let _ = tx.send(request);
                let response = format!(
                    "HTTP/1.1 {}\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    (endpoint, rx)
}

async fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(end) = buf.windows(4).position(|x| x == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..end]).to_ascii_lowercase();
            let length = head
                .lines()
                .find_map(|x| x.strip_prefix("content-length:"))
                .and_then(|x| x.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if buf.len() >= end + 4 + length {
                break;
            }
        }
    }
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

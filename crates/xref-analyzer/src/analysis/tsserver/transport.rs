use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::DashMap;
use serde_json::Value;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader},
    sync::{mpsc, oneshot},
};
use tracing::{debug, trace, warn};

use super::protocol::{Message, Request};
use crate::analysis::HostError;

const CONTENT_LENGTH: &str = "Content-Length:";

type Pending = DashMap<u64, oneshot::Sender<Message>>;

/// Request/response plumbing over a server speaking newline-delimited JSON
/// in and `Content-Length` framed JSON out.
pub(super) struct Connection {
    outgoing: mpsc::UnboundedSender<Vec<u8>>,
    pending: Arc<Pending>,
    next_seq: AtomicU64,
    closed: Arc<AtomicBool>,
    timeout: Duration,
}

impl Connection {
    pub fn start<W, R>(
        writer: W,
        reader: R,
        timeout: Duration,
    ) -> Self
    where
        W: AsyncWrite + Unpin + Send + 'static,
        R: AsyncRead + Unpin + Send + 'static,
    {
        let (outgoing, queue) = mpsc::unbounded_channel();
        let pending = Arc::new(Pending::new());
        let closed = Arc::new(AtomicBool::new(false));

        tokio::spawn(write_loop(writer, queue, Arc::clone(&closed)));
        tokio::spawn(read_loop(BufReader::new(reader), Arc::clone(&pending), Arc::clone(&closed)));

        Self {
            outgoing,
            pending,
            next_seq: AtomicU64::new(1),
            closed,
            timeout,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Send a command that produces no response.
    pub fn notify(
        &self,
        command: &str,
        arguments: Option<Value>,
    ) -> Result<(), HostError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        self.send(&Request::new(seq, command, arguments))
    }

    /// Send a command and wait for its response body.
    pub async fn request(
        &self,
        command: &str,
        arguments: Option<Value>,
    ) -> Result<Option<Value>, HostError> {
        let seq = self.next_seq.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.pending.insert(seq, sender);

        if let Err(error) = self.send(&Request::new(seq, command, arguments)) {
            self.pending.remove(&seq);
            return Err(error);
        }

        let response = match tokio::time::timeout(self.timeout, receiver).await {
            Ok(Ok(response)) => response,
            Ok(Err(_)) => return Err(HostError::Closed),
            Err(_) => {
                self.pending.remove(&seq);
                return Err(HostError::Timeout {
                    command: command.to_string(),
                    after_ms: self.timeout.as_millis() as u64,
                });
            },
        };

        if !response.success {
            return Err(HostError::Request {
                command: command.to_string(),
                message: response.message.unwrap_or_else(|| "no message".to_string()),
            });
        }
        Ok(response.body)
    }

    fn send(
        &self,
        request: &Request<'_>,
    ) -> Result<(), HostError> {
        if self.is_closed() {
            return Err(HostError::Closed);
        }
        let mut line = serde_json::to_vec(request)?;
        line.push(b'\n');
        self.outgoing.send(line).map_err(|_| HostError::Closed)
    }
}

async fn write_loop<W>(
    mut writer: W,
    mut queue: mpsc::UnboundedReceiver<Vec<u8>>,
    closed: Arc<AtomicBool>,
) where
    W: AsyncWrite + Unpin,
{
    while let Some(line) = queue.recv().await {
        if let Err(error) = writer.write_all(&line).await {
            warn!("Failed to write to tsserver: {error}");
            break;
        }
        if let Err(error) = writer.flush().await {
            warn!("Failed to flush tsserver input: {error}");
            break;
        }
    }
    closed.store(true, Ordering::Release);
}

async fn read_loop<R>(
    mut reader: R,
    pending: Arc<Pending>,
    closed: Arc<AtomicBool>,
) where
    R: AsyncBufRead + Unpin,
{
    loop {
        match read_message(&mut reader).await {
            Ok(Some(message)) => dispatch(message, &pending),
            Ok(None) => {
                debug!("tsserver output closed");
                break;
            },
            Err(error) => {
                warn!("Stopped reading tsserver output: {error}");
                break;
            },
        }
    }
    closed.store(true, Ordering::Release);
    // Dropping the senders wakes every waiter with `HostError::Closed`.
    pending.clear();
}

fn dispatch(
    message: Message,
    pending: &Pending,
) {
    match message.kind.as_str() {
        "response" => {
            let Some(seq) = message.request_seq else {
                debug!("Dropping response without request_seq");
                return;
            };
            match pending.remove(&seq) {
                Some((_, sender)) => {
                    let _ = sender.send(message);
                },
                None => trace!("No waiter for {} response {seq}", message.command.as_deref().unwrap_or("?")),
            }
        },
        "event" => trace!("tsserver event {}", message.event.as_deref().unwrap_or("?")),
        other => debug!("Ignoring tsserver message of type {other}"),
    }
}

/// Read one framed message. `Ok(None)` means end of stream.
pub(super) async fn read_message<R>(reader: &mut R) -> Result<Option<Message>, HostError>
where
    R: AsyncBufRead + Unpin,
{
    let mut content_length = None;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(None);
        }
        let line = line.trim_end();
        if line.is_empty() {
            if content_length.is_some() {
                break;
            }
            continue;
        }
        match line.strip_prefix(CONTENT_LENGTH) {
            Some(value) => {
                let length = value
                    .trim()
                    .parse::<usize>()
                    .map_err(|_| HostError::Protocol(format!("bad content length {value:?}")))?;
                content_length = Some(length);
            },
            None => debug!("Ignoring unframed tsserver output: {line}"),
        }
    }

    let mut body = vec![0; content_length.unwrap_or_default()];
    reader.read_exact(&mut body).await?;
    Ok(Some(serde_json::from_slice(body.trim_ascii())?))
}

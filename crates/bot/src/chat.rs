//! Chat transport seam
//!
//! The command handler never talks to a chat network directly. A transport
//! yields incoming messages and delivers replies; the console transport reads
//! one message per line and is what the binary runs by default.

use anyhow::Result;
use async_trait::async_trait;
use predictor_lib::{CommandHandler, HealthRegistry};
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tracing::debug;

/// A message received from chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub channel: String,
    pub chatter: String,
    pub text: String,
}

/// Source of chat messages and sink for replies
#[async_trait]
pub trait ChatTransport: Send {
    /// Next message, or `None` once the transport is closed
    async fn next_message(&mut self) -> Result<Option<ChatMessage>>;

    /// Send a reply into the channel the message came from
    async fn send_reply(&mut self, to: &ChatMessage, reply: &str) -> Result<()>;
}

/// Line-oriented transport over any async reader/writer pair
///
/// Input lines are `chatter: text`, or bare text attributed to `console`.
pub struct ConsoleTransport<R, W> {
    lines: Lines<BufReader<R>>,
    writer: W,
    channel: String,
}

impl ConsoleTransport<tokio::io::Stdin, tokio::io::Stdout> {
    pub fn stdio(channel: impl Into<String>) -> Self {
        Self::new(tokio::io::stdin(), tokio::io::stdout(), channel)
    }
}

impl<R, W> ConsoleTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W, channel: impl Into<String>) -> Self {
        Self {
            lines: BufReader::new(reader).lines(),
            writer,
            channel: channel.into(),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    fn split_chatter(line: &str) -> (&str, &str) {
        match line.split_once(": ") {
            Some((chatter, text)) if !chatter.is_empty() && !chatter.contains(char::is_whitespace) => {
                (chatter, text)
            }
            _ => ("console", line),
        }
    }
}

#[async_trait]
impl<R, W> ChatTransport for ConsoleTransport<R, W>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn next_message(&mut self) -> Result<Option<ChatMessage>> {
        while let Some(line) = self.lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let (chatter, text) = Self::split_chatter(&line);
            return Ok(Some(ChatMessage {
                channel: self.channel.clone(),
                chatter: chatter.to_string(),
                text: text.to_string(),
            }));
        }
        Ok(None)
    }

    async fn send_reply(&mut self, to: &ChatMessage, reply: &str) -> Result<()> {
        for line in reply.lines() {
            self.writer
                .write_all(format!("@{} {}\n", to.chatter, line).as_bytes())
                .await?;
        }
        self.writer.flush().await?;
        Ok(())
    }
}

/// Answer messages until the transport closes, returning the number of replies sent
///
/// The transport is reported healthy while the loop runs and unhealthy once it
/// closes or fails.
pub async fn run<T: ChatTransport>(
    transport: &mut T,
    handler: &CommandHandler,
    health: &HealthRegistry,
) -> Result<usize> {
    health.transport_connected().await;

    match answer_messages(transport, handler).await {
        Ok(replies) => {
            health.transport_closed().await;
            Ok(replies)
        }
        Err(e) => {
            health.transport_failed(&e).await;
            Err(e)
        }
    }
}

async fn answer_messages<T: ChatTransport>(transport: &mut T, handler: &CommandHandler) -> Result<usize> {
    let mut replies = 0;

    while let Some(message) = transport.next_message().await? {
        debug!(
            channel = %message.channel,
            chatter = %message.chatter,
            text = %message.text,
            "Chat message received"
        );

        if let Some(reply) = handler.handle(&message.text) {
            transport.send_reply(&message, &reply).await?;
            replies += 1;
        }
    }

    Ok(replies)
}

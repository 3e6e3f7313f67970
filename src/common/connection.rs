//! # TCP Connection Abstraction
//!
//! Wraps a TCP stream with message framing for the leaderboard protocol.
//!
//! ## Wire Protocol
//!
//! Messages are sent with a 4-byte length prefix (big-endian) followed by JSON data:
//! ```text
//! [4 bytes: message length] [N bytes: JSON message data]
//! ```

use anyhow::{bail, Result};
use log::error;
use std::io::ErrorKind;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

use super::messages::Message;

/// Maximum allowed message size (1MB). Score documents are tiny.
const MAX_MESSAGE_SIZE: usize = 1024 * 1024;

/// TCP connection wrapper with message framing support.
pub struct Connection {
    stream: TcpStream,
}

impl Connection {
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Read one frame.
    ///
    /// `Ok(None)` means there is nothing usable to answer: the peer closed
    /// before sending a length, the frame exceeds [`MAX_MESSAGE_SIZE`], or the
    /// payload is not a [`Message`]. Other I/O failures are errors.
    pub async fn read_message(&mut self) -> Result<Option<Message>> {
        let length = match self.stream.read_u32().await {
            Ok(length) => length as usize,
            Err(e) if e.kind() == ErrorKind::UnexpectedEof => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if length > MAX_MESSAGE_SIZE {
            error!("❌ Dropping {} byte frame (max {})", length, MAX_MESSAGE_SIZE);
            return Ok(None);
        }

        let mut payload = vec![0u8; length];
        self.stream.read_exact(&mut payload).await?;

        Ok(Message::from_bytes(&payload)
            .map_err(|e| error!("❌ Undecodable frame: {}", e))
            .ok())
    }

    /// Write one frame and flush it.
    pub async fn write_message(&mut self, message: &Message) -> Result<()> {
        let payload = message.to_bytes()?;
        if payload.len() > MAX_MESSAGE_SIZE {
            bail!("{} byte message exceeds the frame limit", payload.len());
        }

        self.stream.write_u32(payload.len() as u32).await?;
        self.stream.write_all(&payload).await?;
        self.stream.flush().await?;
        Ok(())
    }
}

/// Open a connection to `address`, send one request and wait for its response.
///
/// An [`Message::ErrorResponse`] from the server is turned into an error.
pub async fn request(address: &str, message: &Message) -> Result<Message> {
    let stream = TcpStream::connect(address).await?;
    let mut conn = Connection::new(stream);

    conn.write_message(message).await?;

    match conn.read_message().await? {
        Some(Message::ErrorResponse { message }) => {
            Err(anyhow::anyhow!("Server refused request: {}", message))
        }
        Some(response) => Ok(response),
        None => Err(anyhow::anyhow!("Connection closed before a response arrived")),
    }
}

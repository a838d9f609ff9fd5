//! Async TCP transport for the memcached text protocol.

use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tracing::trace;

use crate::error::{CacheError, Result};
use crate::protocol::{self, Command, Reply};

/// One connection to a memcached server.
pub struct Transport {
    stream: TcpStream,
    read_buf: BytesMut,
    write_buf: BytesMut,
}

impl Transport {
    /// Connects to `host:port`.
    pub async fn connect(host: &str, port: u16) -> Result<Self> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(|err| CacheError::Connection(format!("{host}:{port}: {err}")))?;
        stream.set_nodelay(true)?;

        Ok(Self {
            stream,
            read_buf: BytesMut::with_capacity(4096),
            write_buf: BytesMut::with_capacity(256),
        })
    }

    /// Sends `command` and waits for its reply.
    pub async fn request(&mut self, command: &Command<'_>) -> Result<Reply> {
        self.write_buf.clear();
        protocol::encode(command, &mut self.write_buf);
        self.stream.write_all(&self.write_buf).await?;
        trace!(command = command.name(), bytes = self.write_buf.len(), "Sent cache command");

        self.read_reply().await
    }

    async fn read_reply(&mut self) -> Result<Reply> {
        loop {
            if !self.read_buf.is_empty() {
                match protocol::decode(&self.read_buf) {
                    Ok((reply, consumed)) => {
                        let _ = self.read_buf.split_to(consumed);
                        return Ok(reply);
                    }
                    Err(CacheError::Incomplete) => {}
                    Err(err) => return Err(err),
                }
            }

            let n = self.stream.read_buf(&mut self.read_buf).await?;
            if n == 0 {
                return Err(CacheError::Connection(String::from(
                    "connection closed by server",
                )));
            }
        }
    }
}

//! Plain TCP test client.
//!
//! Sends raw lines and asserts on the rendered terminal lines the server
//! writes back.

use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::time::timeout;

/// A test terminal client.
pub struct TestClient {
    reader: BufReader<OwnedReadHalf>,
    writer: BufWriter<OwnedWriteHalf>,
}

impl TestClient {
    /// Connect to a test server.
    pub async fn connect(address: &str) -> anyhow::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        let (read_half, write_half) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(read_half),
            writer: BufWriter::new(write_half),
        })
    }

    /// Send one line.
    pub async fn send_line(&mut self, line: &str) -> anyhow::Result<()> {
        self.writer.write_all(line.as_bytes()).await?;
        self.writer.write_all(b"\n").await?;
        self.writer.flush().await?;
        Ok(())
    }

    /// Receive one line, or `None` once the server closed the socket.
    pub async fn recv(&mut self) -> anyhow::Result<Option<String>> {
        self.recv_timeout(Duration::from_secs(5)).await
    }

    pub async fn recv_timeout(&mut self, dur: Duration) -> anyhow::Result<Option<String>> {
        let mut line = String::new();
        let n = timeout(dur, self.reader.read_line(&mut line)).await??;
        if n == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Skip lines until one equals `expected`.
    pub async fn expect(&mut self, expected: &str) -> anyhow::Result<()> {
        self.recv_until(|line| line == expected).await.map(drop)
    }

    /// Receive lines until `predicate` matches, returning the matching line.
    pub async fn recv_until<F>(&mut self, mut predicate: F) -> anyhow::Result<String>
    where
        F: FnMut(&str) -> bool,
    {
        loop {
            match self.recv().await? {
                Some(line) if predicate(&line) => return Ok(line),
                Some(_) => continue,
                None => anyhow::bail!("connection closed before the expected line"),
            }
        }
    }

    /// Send `line` and return the first line after its echo.
    pub async fn run(&mut self, line: &str) -> anyhow::Result<String> {
        self.send_line(line).await?;
        self.expect(&format!("> {}", line.trim())).await?;
        self.recv()
            .await?
            .ok_or_else(|| anyhow::anyhow!("connection closed after echo"))
    }

    /// Assert nothing arrives within `dur`.
    #[allow(dead_code)]
    pub async fn assert_silent(&mut self, dur: Duration) {
        let mut line = String::new();
        let read = timeout(dur, self.reader.read_line(&mut line)).await;
        assert!(read.is_err(), "unexpected line: {line:?}");
    }
}

//! Client transports.
//!
//! WebSocket clients exchange JSON text frames; plain TCP clients exchange
//! newline-terminated lines. Both look the same to the connection loop: a
//! stream of [`InboundFrame`]s in, rendered [`Frame`]s out.

use crate::render::{JsonRenderer, PlainRenderer, Renderer};
use bytes::BytesMut;
use futures_util::{SinkExt, StreamExt};
use portal_proto::{Frame, InboundFrame};
use tokio::net::TcpStream;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::codec::{Decoder, Encoder, Framed, LinesCodec, LinesCodecError};
use tracing::debug;

/// One received unit.
#[derive(Debug)]
pub enum Inbound {
    Frame(InboundFrame),
    /// A line over the configured length; its content was discarded.
    Oversized,
}

/// A decoded plain-text line.
#[derive(Debug, PartialEq, Eq)]
pub enum Line {
    Text(String),
    Oversized,
}

/// `LinesCodec` that reports an overlong line as an item instead of an
/// error, so the stream keeps going after it.
#[derive(Debug)]
pub struct LineCodec(LinesCodec);

impl LineCodec {
    pub fn new(max_length: usize) -> Self {
        Self(LinesCodec::new_with_max_length(max_length))
    }

    fn map(result: Result<Option<String>, LinesCodecError>) -> Result<Option<Line>, LinesCodecError> {
        match result {
            Ok(line) => Ok(line.map(Line::Text)),
            Err(LinesCodecError::MaxLineLengthExceeded) => Ok(Some(Line::Oversized)),
            Err(e) => Err(e),
        }
    }
}

impl Decoder for LineCodec {
    type Item = Line;
    type Error = LinesCodecError;

    fn decode(&mut self, buf: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        Self::map(self.0.decode(buf))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Line>, LinesCodecError> {
        Self::map(self.0.decode_eof(buf))
    }
}

impl Encoder<String> for LineCodec {
    type Error = LinesCodecError;

    fn encode(&mut self, line: String, buf: &mut BytesMut) -> Result<(), LinesCodecError> {
        self.0.encode(line, buf)
    }
}

/// A connected client socket.
pub enum Transport {
    WebSocket {
        stream: Box<WebSocketStream<TcpStream>>,
        max_line_length: usize,
    },
    Plain(Framed<TcpStream, LineCodec>),
}

impl Transport {
    pub fn websocket(stream: WebSocketStream<TcpStream>, max_line_length: usize) -> Self {
        Self::WebSocket {
            stream: Box::new(stream),
            max_line_length,
        }
    }

    pub fn plain(stream: TcpStream, max_line_length: usize) -> Self {
        Self::Plain(Framed::new(stream, LineCodec::new(max_line_length)))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::WebSocket { .. } => "websocket",
            Self::Plain(_) => "plain",
        }
    }

    /// Next client unit. `None` when the peer closed the connection.
    ///
    /// Cancel-safe: nothing is consumed unless this returns.
    pub async fn recv(&mut self) -> anyhow::Result<Option<Inbound>> {
        match self {
            Self::WebSocket {
                stream,
                max_line_length,
            } => loop {
                let Some(message) = stream.next().await else {
                    return Ok(None);
                };
                match message? {
                    Message::Text(text) => return Ok(Some(inbound_text(&text, *max_line_length))),
                    Message::Close(_) => return Ok(None),
                    other => debug!(kind = ?other, "ignoring non-text websocket message"),
                }
            },
            Self::Plain(framed) => match framed.next().await {
                None => Ok(None),
                Some(Ok(Line::Text(line))) => Ok(Some(Inbound::Frame(InboundFrame::line(line)))),
                Some(Ok(Line::Oversized)) => Ok(Some(Inbound::Oversized)),
                Some(Err(e)) => Err(e.into()),
            },
        }
    }

    /// Render and write one frame.
    pub async fn send(&mut self, frame: &Frame) -> anyhow::Result<()> {
        match self {
            Self::WebSocket { stream, .. } => {
                let text = JsonRenderer.render(frame)?;
                stream.send(Message::Text(text)).await?;
            }
            Self::Plain(framed) => {
                let text = PlainRenderer.render(frame)?;
                if text.is_empty() {
                    return Ok(());
                }
                for line in text.lines() {
                    framed.feed(line.to_string()).await?;
                }
                framed.flush().await?;
            }
        }
        Ok(())
    }

    /// Best-effort close.
    pub async fn close(&mut self) {
        let result = match self {
            Self::WebSocket { stream, .. } => (**stream).close(None).await.map_err(anyhow::Error::from),
            Self::Plain(framed) => framed.close().await.map_err(anyhow::Error::from),
        };
        if let Err(e) = result {
            debug!(error = %e, "error while closing transport");
        }
    }
}

/// Decode a WebSocket text frame. Anything that is not a JSON request
/// envelope is taken as a raw line.
fn decode_text(text: &str) -> InboundFrame {
    serde_json::from_str(text).unwrap_or_else(|_| InboundFrame::line(text))
}

/// Decode a text frame and hold its line to `max_line_length` bytes.
///
/// The limit applies to the line the client typed, not to the JSON envelope
/// around it.
fn inbound_text(text: &str, max_line_length: usize) -> Inbound {
    let frame = decode_text(text);
    if frame.cmd.len() > max_line_length {
        Inbound::Oversized
    } else {
        Inbound::Frame(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_envelope() {
        let frame = decode_text(r#"{"cmd":"pwd","working-dir":"/a"}"#);
        assert_eq!(frame.cmd, "pwd");
        assert_eq!(frame.working_dir.as_deref(), Some("/a"));
    }

    #[test]
    fn raw_text_is_a_line() {
        assert_eq!(decode_text("@hello"), InboundFrame::line("@hello"));
        assert_eq!(decode_text("{not json"), InboundFrame::line("{not json"));
    }

    #[test]
    fn line_limit_ignores_envelope() {
        let padded = format!(r#"{{"cmd":"pwd","working-dir":"/{}"}}"#, "a".repeat(64));
        assert!(padded.len() > 16);
        match inbound_text(&padded, 16) {
            Inbound::Frame(frame) => assert_eq!(frame.cmd, "pwd"),
            Inbound::Oversized => panic!("envelope size counted against the line"),
        }

        let long = format!(r#"{{"cmd":"{}"}}"#, "x".repeat(17));
        assert!(matches!(inbound_text(&long, 16), Inbound::Oversized));
        assert!(matches!(inbound_text(&"x".repeat(17), 16), Inbound::Oversized));
        assert!(matches!(inbound_text(&"x".repeat(16), 16), Inbound::Frame(_)));
    }

    #[tokio::test]
    async fn plain_transport_reads_lines_and_flags_oversized() {
        use tokio::io::AsyncWriteExt;
        use tokio::net::TcpListener;

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let mut client = TcpStream::connect(addr).await.unwrap();
        let (server, _) = listener.accept().await.unwrap();
        let mut transport = Transport::plain(server, 8);

        client.write_all(b"help\n0123456789abc\npwd\n").await.unwrap();
        drop(client);

        match transport.recv().await.unwrap() {
            Some(Inbound::Frame(f)) => assert_eq!(f.cmd, "help"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(matches!(transport.recv().await.unwrap(), Some(Inbound::Oversized)));
        match transport.recv().await.unwrap() {
            Some(Inbound::Frame(f)) => assert_eq!(f.cmd, "pwd"),
            other => panic!("unexpected {other:?}"),
        }
        assert!(transport.recv().await.unwrap().is_none());
    }
}

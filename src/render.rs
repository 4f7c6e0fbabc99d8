//! Frame rendering.
//!
//! The server produces [`Frame`] values; a renderer turns each into the text
//! a transport writes. WebSocket clients get JSON, plain TCP clients get
//! terminal lines.

use portal_proto::{ChatMessage, Frame, PortalCount};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Turns frames into wire text.
pub trait Renderer: Send + Sync {
    fn render(&self, frame: &Frame) -> Result<String, RenderError>;
}

/// One JSON object per frame, tagged by `kind`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRenderer;

impl Renderer for JsonRenderer {
    fn render(&self, frame: &Frame) -> Result<String, RenderError> {
        Ok(serde_json::to_string(frame)?)
    }
}

/// Human-readable lines for a raw terminal.
///
/// May return several lines joined by `\n`, without a trailing newline.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlainRenderer;

impl Renderer for PlainRenderer {
    fn render(&self, frame: &Frame) -> Result<String, RenderError> {
        Ok(match frame {
            Frame::Echo { line } => format!("> {line}"),
            Frame::Result { text, working_dir } => match (text, working_dir) {
                (Some(text), _) => text.clone(),
                (None, Some(dir)) => format!("[{dir}]"),
                (None, None) => String::new(),
            },
            Frame::Chat(msg) => chat_line(msg),
            Frame::Users { users, current } => {
                format!("* users: {} (you are {current})", users.join(", "))
            }
            Frame::Portals { portals, current } => portals_line(portals, current.as_deref()),
        })
    }
}

fn chat_line(msg: &ChatMessage) -> String {
    let mut line = msg.prefix.clone();
    if let Some(ref user) = msg.user {
        line.push_str(user);
        line.push_str(" : ");
    } else {
        line.push_str("* ");
    }
    line.push_str(&msg.body);
    if let Some(ref suffix) = msg.suffix {
        line.push(' ');
        line.push_str(suffix);
    }
    line
}

fn portals_line(portals: &[PortalCount], current: Option<&str>) -> String {
    let list = if portals.is_empty() {
        "none".to_string()
    } else {
        portals
            .iter()
            .map(|p| format!("{} ({})", p.name, p.sessions))
            .collect::<Vec<_>>()
            .join(", ")
    };
    match current {
        Some(current) => format!("* portals: {list} [current: {current}]"),
        None => format!("* portals: {list}"),
    }
}

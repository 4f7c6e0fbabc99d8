//! Frames exchanged with clients.
//!
//! [`InboundFrame`] is the envelope a client sends. [`Frame`] is everything
//! the server sends back; turning a frame into wire text is a renderer's job,
//! the server never builds presentation markup itself.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One client request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct InboundFrame {
    /// The command line as typed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub cmd: String,
    /// The client's idea of its working directory. Informational only.
    #[cfg_attr(
        feature = "serde",
        serde(rename = "working-dir", default, skip_serializing_if = "Option::is_none")
    )]
    pub working_dir: Option<String>,
}

impl InboundFrame {
    /// Wrap a bare line.
    pub fn line(cmd: impl Into<String>) -> Self {
        Self {
            cmd: cmd.into(),
            working_dir: None,
        }
    }
}

/// Delivery scope of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Scope {
    /// Sent to every session.
    Global,
    /// Sent to one portal.
    Portal,
    /// Sent to a single session.
    Direct,
    /// Server notice addressed to one session.
    Notice,
}

/// A chat line as displayed by a client.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ChatMessage {
    /// Delivery scope.
    pub scope: Scope,
    /// Directional/scope prefix shown before the sender.
    pub prefix: String,
    /// Sender username; absent for server notices.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub user: Option<String>,
    /// Message text, verbatim.
    pub body: String,
    /// Trailing decoration, e.g. the portal tag.
    #[cfg_attr(feature = "serde", serde(skip_serializing_if = "Option::is_none"))]
    pub suffix: Option<String>,
}

impl ChatMessage {
    /// A message for everyone.
    pub fn global(user: &str, body: &str) -> Self {
        Self {
            scope: Scope::Global,
            prefix: "@".to_string(),
            user: Some(user.to_string()),
            body: body.to_string(),
            suffix: None,
        }
    }

    /// A message for one portal.
    pub fn portal(user: &str, body: &str, portal: &str) -> Self {
        Self {
            scope: Scope::Portal,
            prefix: "#".to_string(),
            user: Some(user.to_string()),
            body: body.to_string(),
            suffix: Some(format!("({portal})")),
        }
    }

    /// A direct message as seen by its recipient.
    pub fn direct(from: &str, body: &str) -> Self {
        Self {
            scope: Scope::Direct,
            prefix: "<- ".to_string(),
            user: Some(from.to_string()),
            body: body.to_string(),
            suffix: None,
        }
    }

    /// A server notice.
    pub fn notice(text: impl Into<String>) -> Self {
        Self {
            scope: Scope::Notice,
            prefix: String::new(),
            user: None,
            body: text.into(),
            suffix: None,
        }
    }
}

/// Session count for one observed portal tag.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PortalCount {
    /// Portal tag.
    pub name: String,
    /// Live sessions in it.
    pub sessions: usize,
}

/// Everything the server sends to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", rename_all = "snake_case"))]
pub enum Frame {
    /// The line as typed, shown before its result.
    Echo {
        /// Raw line.
        line: String,
    },
    /// Outcome of a server command. Both fields absent means "nothing to
    /// show"; clients treat that as a screen clear.
    Result {
        /// Text reply.
        text: Option<String>,
        /// New working directory.
        working_dir: Option<String>,
    },
    /// A chat line.
    Chat(ChatMessage),
    /// Roster of the recipient's portal.
    Users {
        /// Usernames sharing the recipient's portal.
        users: Vec<String>,
        /// The recipient's own username.
        current: String,
    },
    /// Observed portals.
    Portals {
        /// Tags with session counts, sorted by tag.
        portals: Vec<PortalCount>,
        /// The recipient's portal.
        current: Option<String>,
    },
}

impl Frame {
    /// Short lowercase label, used for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Echo { .. } => "echo",
            Self::Result { .. } => "result",
            Self::Chat(_) => "chat",
            Self::Users { .. } => "users",
            Self::Portals { .. } => "portals",
        }
    }

    /// Shorthand for a server notice chat frame.
    pub fn notice(text: impl Into<String>) -> Self {
        Self::Chat(ChatMessage::notice(text))
    }
}

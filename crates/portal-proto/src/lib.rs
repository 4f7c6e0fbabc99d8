//! # portal-proto
//!
//! Line protocol shared by the portald server and its clients.
//!
//! - [`command`]: turns one raw input line into a [`Command`], classifying
//!   sigil lines (`@` global, `#` portal) and named server commands.
//! - [`frame`]: inbound envelope and the outbound frame kinds handed to a
//!   renderer.
//! - [`path`]: virtual working-directory resolution.
//!
//! ```rust
//! use portal_proto::{Command, MsgType, ParseContext};
//!
//! let ctx = ParseContext::new("/home");
//! let cmd = Command::parse("msg bob hello   world", &ctx).unwrap();
//! assert_eq!(cmd.msg_type, MsgType::Command);
//! assert_eq!(cmd.args, vec!["bob", "hello   world"]);
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod command;
pub mod error;
pub mod frame;
pub mod path;

pub use command::{Command, MsgType, ParseContext, GLOBAL_SIGIL, PORTAL_SIGIL};
pub use error::ParseError;
pub use frame::{ChatMessage, Frame, InboundFrame, PortalCount, Scope};

//! MSG command handler.
//!
//! Global and portal chat never reach the registry: the parser tags those
//! lines by sigil and the connection loop hands them straight to the
//! broadcaster. Direct messages are a named command because they need a
//! target.

use super::core::{CommandResult, Context, Handler, HandlerResult};
use crate::error::HandlerError;
use async_trait::async_trait;
use tracing::debug;

/// Handler for `msg <target> <message>`.
///
/// The message arrives as one argument with its spacing intact.
pub struct MsgHandler;

#[async_trait]
impl Handler for MsgHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let [target, body] = args else {
            return Err(HandlerError::Usage);
        };

        let queued = ctx.matrix.broadcaster.direct(ctx.conn, target, body)?;
        debug!(conn = %ctx.conn, target = %target, queued, "direct message");

        Ok(CommandResult::text(format!("-> {target} : {body}")))
    }
}

#[cfg(test)]
mod tests {
    use crate::handlers::core::CommandResult;
    use crate::handlers::testing::Harness;
    use portal_proto::{ChatMessage, Frame};

    #[tokio::test]
    async fn delivers_with_spacing() {
        let mut h = Harness::new(&["alice", "bob"]);
        assert_eq!(
            h.run(0, "msg bob hello   world").await,
            CommandResult::text("-> bob : hello   world")
        );
        assert_eq!(
            h.drain(1),
            vec![Frame::Chat(ChatMessage::direct("alice", "hello   world"))]
        );
        assert!(h.drain(0).is_empty());
    }

    #[tokio::test]
    async fn self_and_unknown_targets_are_distinct() {
        let mut h = Harness::new(&["alice", "bob"]);
        let to_self = h.run(0, "msg alice hi").await;
        let to_nobody = h.run(0, "msg zed hi").await;
        assert_eq!(to_self, CommandResult::text("Cannot send message to yourself"));
        assert_eq!(to_nobody, CommandResult::text("User zed not found"));
        assert_ne!(to_self, to_nobody);
        assert!(h.drain(0).is_empty());
        assert!(h.drain(1).is_empty());
    }

    #[tokio::test]
    async fn missing_body_gets_usage() {
        let mut h = Harness::new(&["alice", "bob"]);
        assert_eq!(
            h.run(0, "msg bob").await,
            CommandResult::text("msg <target> <message>")
        );
        assert!(h.drain(1).is_empty());
    }
}

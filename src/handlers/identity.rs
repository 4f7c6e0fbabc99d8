//! USERNAME command handler.

use super::core::{CommandResult, Context, Handler, HandlerResult};
use async_trait::async_trait;
use tracing::info;

/// Handler for `username <name>`.
pub struct UsernameHandler;

#[async_trait]
impl Handler for UsernameHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let Some(name) = args.first() else {
            return Err(crate::error::HandlerError::Usage);
        };
        ctx.check_name(name)?;

        let previous = ctx.matrix.sessions.rename(ctx.conn, name)?;
        info!(conn = %ctx.conn, from = %previous, to = %name, "username changed");
        ctx.matrix.broadcaster.presence_refresh();

        Ok(CommandResult::text(format!("Username changed to {name}")))
    }
}

//! Screen and working-directory commands: CLEAR, CD, PWD.

use super::core::{CommandResult, Context, Handler, HandlerResult};
use crate::error::HandlerError;
use async_trait::async_trait;
use portal_proto::path;
use tracing::debug;

/// Handler for `clear`. Produces no output at all; clients clear their
/// screen on an empty result.
pub struct ClearHandler;

#[async_trait]
impl Handler for ClearHandler {
    async fn handle(&self, _ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        Ok(CommandResult::empty())
    }
}

/// Handler for `cd <directory>`.
///
/// Expects the parser-injected working directory as its last argument.
pub struct CdHandler;

#[async_trait]
impl Handler for CdHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let [target, cwd] = args else {
            return Err(HandlerError::Usage);
        };

        let resolved = path::resolve(cwd, target);
        ctx.matrix.sessions.set_working_dir(ctx.conn, &resolved)?;
        debug!(from = %cwd, to = %resolved, "working directory changed");

        Ok(CommandResult::working_dir(resolved))
    }
}

/// Handler for `pwd`.
pub struct PwdHandler;

#[async_trait]
impl Handler for PwdHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        Ok(CommandResult::text(ctx.session()?.working_dir))
    }
}

//! HELP command handler.

use super::core::{CommandResult, Context, Handler, HandlerResult};
use crate::error::HandlerError;
use async_trait::async_trait;

const HELP_HEADER: &str = "Type `help <command name>` for more details.\n";

/// Handler for `help [command]`.
///
/// Without an argument, lists every registered command. With one, shows that
/// command's usage.
pub struct HelpHandler;

#[async_trait]
impl Handler for HelpHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        match args.first() {
            Some(topic) => match ctx.registry.get(topic) {
                Some(command) => Ok(CommandResult::text(command.usage())),
                None => Err(HandlerError::UnknownCommand(topic.clone())),
            },
            None => Ok(CommandResult::text(format!(
                "{HELP_HEADER}{}",
                ctx.registry.names().join(", ")
            ))),
        }
    }
}

//! Command handler registry and dispatch.
//!
//! The `Registry` maps exact, lowercase command names to their descriptors. It is
//! built once at startup and only read afterwards. Dispatch never fails:
//! every outcome, including rejections, resolves to a `CommandResult` for the
//! issuing session.

use super::context::{CommandResult, Context, Handler};
use crate::error::HandlerError;
use crate::handlers::{
    help::HelpHandler,
    identity::UsernameHandler,
    messaging::MsgHandler,
    navigation::{CdHandler, ClearHandler, PwdHandler},
    portal::{LeaveHandler, PortalHandler, PortalsHandler, WhoHandler},
};
use crate::telemetry::{CommandTimer, spans};
use portal_proto::Command;
use std::collections::HashMap;
use tracing::{Instrument, debug};

/// How a declared parameter is filled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Must be typed.
    Required,
    /// May be omitted.
    Optional,
    /// Injected by the parser, never typed.
    Context,
}

/// A declared command parameter.
#[derive(Debug, Clone, Copy)]
pub struct Param {
    pub name: &'static str,
    pub kind: ParamKind,
}

impl Param {
    pub const fn required(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Required,
        }
    }

    pub const fn optional(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Optional,
        }
    }

    pub const fn context(name: &'static str) -> Self {
        Self {
            name,
            kind: ParamKind::Context,
        }
    }
}

/// A registered command.
pub struct ServerCommand {
    pub name: &'static str,
    pub description: &'static str,
    pub params: &'static [Param],
    handler: Box<dyn Handler>,
}

impl ServerCommand {
    pub fn new(
        name: &'static str,
        description: &'static str,
        params: &'static [Param],
        handler: impl Handler + 'static,
    ) -> Self {
        Self {
            name,
            description,
            params,
            handler: Box::new(handler),
        }
    }

    /// `name <required> <optional?>`; context params are hidden.
    pub fn usage(&self) -> String {
        let mut usage = self.name.to_string();
        for param in self.params {
            let rendered = match param.kind {
                ParamKind::Required => format!("<{}>", param.name),
                ParamKind::Optional => format!("<{}?>", param.name),
                ParamKind::Context => continue,
            };
            usage.push(' ');
            usage.push_str(&rendered);
        }
        usage
    }

    /// Minimum number of user-typed arguments.
    pub fn arity(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind == ParamKind::Required)
            .count()
    }

    /// Maximum number of user-typed arguments.
    pub fn max_args(&self) -> usize {
        self.params
            .iter()
            .filter(|p| p.kind != ParamKind::Context)
            .count()
    }

    fn accepts(&self, typed: usize) -> bool {
        (self.arity()..=self.max_args()).contains(&typed)
    }
}

/// Registry of command handlers.
pub struct Registry {
    commands: HashMap<&'static str, ServerCommand>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Create a registry with every built-in command.
    pub fn new() -> Self {
        let mut registry = Self::empty();

        registry.register(ServerCommand::new(
            "help",
            "List commands or show one command's usage",
            &const { [Param::optional("command")] },
            HelpHandler,
        ));
        registry.register(ServerCommand::new("clear", "Clear the screen", &[], ClearHandler));

        // Navigation
        registry.register(ServerCommand::new(
            "cd",
            "Change the working directory",
            &const { [Param::required("directory"), Param::context("working_dir")] },
            CdHandler,
        ));
        registry.register(ServerCommand::new(
            "pwd",
            "Show the working directory",
            &[],
            PwdHandler,
        ));

        // Identity and portals
        registry.register(ServerCommand::new(
            "username",
            "Change your username",
            &const { [Param::required("name")] },
            UsernameHandler,
        ));
        registry.register(ServerCommand::new(
            "portal",
            "Move to a portal",
            &const { [Param::required("portal")] },
            PortalHandler,
        ));
        registry.register(ServerCommand::new(
            "leave",
            "Leave the current portal",
            &[],
            LeaveHandler,
        ));
        registry.register(ServerCommand::new(
            "portals",
            "List active portals",
            &[],
            PortalsHandler,
        ));
        registry.register(ServerCommand::new(
            "who",
            "List users in your portal",
            &[],
            WhoHandler,
        ));

        // Messaging
        registry.register(ServerCommand::new(
            "msg",
            "Send a direct message",
            &const { [Param::required("target"), Param::required("message")] },
            MsgHandler,
        ));

        registry
    }

    /// A registry with no commands.
    pub fn empty() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Add or replace a command.
    pub fn register(&mut self, command: ServerCommand) {
        debug!(
            name = command.name,
            description = command.description,
            "command registered"
        );
        self.commands.insert(command.name, command);
    }

    /// Exact-name lookup; `HELP` is not `help`.
    pub fn get(&self, name: &str) -> Option<&ServerCommand> {
        self.commands.get(name)
    }

    /// Every registered name, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Run one parsed command for the session in `ctx`.
    pub async fn dispatch(&self, ctx: &Context<'_>, command: &Command) -> CommandResult {
        let Some(server_command) = self.get(&command.cmd) else {
            crate::metrics::record_command_error("unknown", "unknown_command");
            debug!(command = %command.cmd, "Unknown command");
            return CommandResult::text(
                HandlerError::UnknownCommand(command.cmd.clone()).user_text(),
            );
        };

        let username = ctx
            .matrix
            .sessions
            .get(ctx.conn)
            .map(|s| s.username)
            .unwrap_or_default();
        let span = spans::command(server_command.name, &ctx.conn.to_string(), &username);
        let _timer = CommandTimer::new(server_command.name);

        let result = if server_command.accepts(command.user_args().len()) {
            server_command
                .handler
                .handle(ctx, &command.args)
                .instrument(span)
                .await
        } else {
            Err(HandlerError::Usage)
        };

        match result {
            Ok(result) => result,
            Err(e) => {
                crate::metrics::record_command_error(server_command.name, e.error_code());
                debug!(command = server_command.name, error = %e, "Command error");
                match e {
                    HandlerError::Usage => CommandResult::text(server_command.usage()),
                    other => CommandResult::text(other.user_text()),
                }
            }
        }
    }
}

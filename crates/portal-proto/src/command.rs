//! Input line parsing.
//!
//! A line is one of three things, decided by its first character:
//!
//! | First char        | [`MsgType`]          | `cmd`   | `args`                     |
//! |-------------------|----------------------|---------|----------------------------|
//! | [`GLOBAL_SIGIL`]  | [`MsgType::Global`]  | `"@"`   | `[body]` (verbatim)        |
//! | [`PORTAL_SIGIL`]  | [`MsgType::Portal`]  | `"#"`   | `[body]` (verbatim)        |
//! | anything else     | [`MsgType::Command`] | name    | whitespace-split tokens    |
//!
//! Sigils live only here; they are never command names in the server's
//! registry.
//!
//! Two per-command policies adjust the default tokenization:
//!
//! - spacing-preserving commands keep their trailing text verbatim as a
//!   single final argument, so message bodies survive with their original
//!   inter-word spacing;
//! - context commands get a value from [`ParseContext`] appended to their
//!   arguments, because the parser has no access to the session.

use crate::error::ParseError;

/// Sigil marking a message for every connected session.
pub const GLOBAL_SIGIL: char = '@';

/// Sigil marking a message for the sender's current portal.
pub const PORTAL_SIGIL: char = '#';

/// Commands whose trailing text is kept verbatim, with the number of plain
/// tokens preceding it.
const SPACING_PRESERVING: &[(&str, usize)] = &[("msg", 1)];

/// Commands that receive the session's working directory as a trailing
/// context argument.
const NEEDS_WORKING_DIR: &[&str] = &["cd"];

/// Classification of a parsed line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum MsgType {
    /// Chat message for every connected session.
    Global,
    /// Chat message for the sender's portal.
    Portal,
    /// Named server command.
    Command,
}

impl MsgType {
    /// Classify a line by its first character.
    pub fn of(first: char) -> Self {
        match first {
            GLOBAL_SIGIL => Self::Global,
            PORTAL_SIGIL => Self::Portal,
            _ => Self::Command,
        }
    }

    /// Short lowercase label, used for logging and metrics.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Global => "global",
            Self::Portal => "portal",
            Self::Command => "command",
        }
    }
}

/// Session-local values the parser may inject into arguments.
#[derive(Debug, Clone, Copy)]
pub struct ParseContext<'a> {
    /// The issuing session's current working directory.
    pub working_dir: &'a str,
}

impl<'a> ParseContext<'a> {
    /// Create a context for a session currently in `working_dir`.
    pub fn new(working_dir: &'a str) -> Self {
        Self { working_dir }
    }
}

/// One parsed input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    /// The line as received, trimmed at both ends.
    pub full: String,
    /// Command name as typed, or the sigil for chat lines.
    pub cmd: String,
    /// Arguments, including any trailing context arguments.
    pub args: Vec<String>,
    /// How the line is routed.
    pub msg_type: MsgType,
    context_args: usize,
}

impl Command {
    /// Parse one raw line.
    ///
    /// Fails only on empty or whitespace-only input.
    pub fn parse(raw: &str, ctx: &ParseContext<'_>) -> Result<Self, ParseError> {
        let line = raw.trim();
        let first = line.chars().next().ok_or(ParseError::Empty)?;

        let msg_type = MsgType::of(first);
        if msg_type != MsgType::Command {
            let body = &line[first.len_utf8()..];
            let args = if body.is_empty() {
                Vec::new()
            } else {
                vec![body.to_string()]
            };
            return Ok(Self {
                full: line.to_string(),
                cmd: first.to_string(),
                args,
                msg_type,
                context_args: 0,
            });
        }

        let name_end = line.find(char::is_whitespace).unwrap_or(line.len());
        let (cmd, rest) = line.split_at(name_end);

        let mut args = match preserved_lead(cmd) {
            Some(lead) => split_preserving(rest, lead),
            None => rest.split_whitespace().map(str::to_string).collect(),
        };

        let mut context_args = 0;
        if NEEDS_WORKING_DIR.contains(&cmd) {
            args.push(ctx.working_dir.to_string());
            context_args = 1;
        }

        Ok(Self {
            full: line.to_string(),
            cmd: cmd.to_string(),
            args,
            msg_type,
            context_args,
        })
    }

    /// Arguments the user actually typed, without injected context values.
    pub fn user_args(&self) -> &[String] {
        &self.args[..self.args.len() - self.context_args]
    }

    /// Number of trailing arguments injected from the [`ParseContext`].
    pub fn context_args(&self) -> usize {
        self.context_args
    }

    /// Message body of a sigil line, if any.
    pub fn body(&self) -> Option<&str> {
        match self.msg_type {
            MsgType::Command => None,
            _ => self.args.first().map(String::as_str),
        }
    }
}

fn preserved_lead(name: &str) -> Option<usize> {
    SPACING_PRESERVING
        .iter()
        .find(|(cmd, _)| *cmd == name)
        .map(|(_, lead)| *lead)
}

/// Split `lead` plain tokens off `rest`, then keep whatever follows the next
/// separator run verbatim as one final token.
fn split_preserving(mut rest: &str, lead: usize) -> Vec<String> {
    let mut args = Vec::with_capacity(lead + 1);
    for _ in 0..lead {
        rest = rest.trim_start();
        if rest.is_empty() {
            return args;
        }
        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        args.push(rest[..end].to_string());
        rest = &rest[end..];
    }

    let tail = rest.trim_start();
    if !tail.is_empty() {
        args.push(tail.to_string());
    }
    args
}

//! Portal membership and presence commands: PORTAL, LEAVE, PORTALS, WHO.
//!
//! Portals are free-form tags. A portal exists for as long as at least one
//! session carries its tag; nothing here creates or destroys one explicitly.

use super::core::{CommandResult, Context, Handler, HandlerResult};
use crate::error::HandlerError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

/// Handler for `portal <portal>`.
///
/// Moves the session, sends it the portal list and refreshes presence.
pub struct PortalHandler;

#[async_trait]
impl Handler for PortalHandler {
    async fn handle(&self, ctx: &Context<'_>, args: &[String]) -> HandlerResult {
        let Some(tag) = args.first() else {
            return Err(HandlerError::Usage);
        };
        ctx.check_name(tag)?;

        let previous = ctx.matrix.sessions.set_portal(ctx.conn, Some(tag))?;
        info!(conn = %ctx.conn, from = ?previous, to = %tag, "portal changed");

        let broadcaster = &ctx.matrix.broadcaster;
        broadcaster.send_portal_roster(ctx.conn);
        broadcaster.presence_refresh();

        Ok(CommandResult::text(format!("Portal changed to {tag}")))
    }
}

/// Handler for `leave`.
pub struct LeaveHandler;

#[async_trait]
impl Handler for LeaveHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        let Some(previous) = ctx.matrix.sessions.set_portal(ctx.conn, None)? else {
            return Err(HandlerError::NoPortal);
        };
        info!(conn = %ctx.conn, portal = %previous, "left portal");

        ctx.matrix.broadcaster.send_portal_roster(ctx.conn);
        ctx.matrix.broadcaster.presence_refresh();

        Ok(CommandResult::text(format!("Left portal {previous}")))
    }
}

/// Handler for `portals`.
pub struct PortalsHandler;

#[async_trait]
impl Handler for PortalsHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        let counts = ctx.matrix.sessions.portal_counts();
        if counts.is_empty() {
            return Ok(CommandResult::text("No active portals"));
        }

        let list: Vec<String> = counts
            .iter()
            .map(|(name, sessions)| format!("{name} ({sessions})"))
            .collect();
        Ok(CommandResult::text(format!("Portals: {}", list.join(", "))))
    }
}

/// Handler for `who`: the sessions sharing the issuer's portal, with how
/// long each has been connected.
pub struct WhoHandler;

#[async_trait]
impl Handler for WhoHandler {
    async fn handle(&self, ctx: &Context<'_>, _args: &[String]) -> HandlerResult {
        let session = ctx.session()?;
        let now = Utc::now();

        let (header, members) = match session.portal {
            Some(ref tag) => (
                format!("Users in portal {tag}:"),
                ctx.matrix.sessions.group_by_portal(tag),
            ),
            None => {
                let mut members: Vec<_> = ctx
                    .matrix
                    .sessions
                    .snapshot()
                    .into_iter()
                    .filter(|r| r.portal.is_none())
                    .filter_map(|r| ctx.matrix.sessions.get(r.id))
                    .collect();
                members.sort_by(|a, b| a.username.cmp(&b.username));
                ("Users outside any portal:".to_string(), members)
            }
        };

        let mut lines = vec![header];
        lines.extend(
            members
                .iter()
                .map(|m| format!("  {} (online {})", m.username, online_for(m.connected_at, now))),
        );
        Ok(CommandResult::text(lines.join("\n")))
    }
}

/// Coarse human duration, e.g. `42s`, `5m`, `3h`, `2d`.
fn online_for(since: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let elapsed = now.signed_duration_since(since);
    if elapsed.num_days() > 0 {
        format!("{}d", elapsed.num_days())
    } else if elapsed.num_hours() > 0 {
        format!("{}h", elapsed.num_hours())
    } else if elapsed.num_minutes() > 0 {
        format!("{}m", elapsed.num_minutes())
    } else {
        format!("{}s", elapsed.num_seconds().max(0))
    }
}

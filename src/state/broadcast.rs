//! Portal-scoped message fan-out.
//!
//! Every delivery works on a registry snapshot: the registry lock is never
//! held while frames are queued. Queues are bounded and written with
//! `try_send`, so a slow or dead session loses frames instead of stalling
//! the sender. Such losses are logged and counted, and the remaining
//! recipients are still served.

use crate::error::HandlerError;
use crate::state::sessions::{ConnId, Recipient, SessionRegistry};
use portal_proto::{ChatMessage, Frame, PortalCount};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, warn};

/// Fan-out over the live sessions of a [`SessionRegistry`].
#[derive(Debug, Clone)]
pub struct Broadcaster {
    sessions: Arc<SessionRegistry>,
}

impl Broadcaster {
    pub fn new(sessions: Arc<SessionRegistry>) -> Self {
        Self { sessions }
    }

    /// Send `body` to every session except the sender.
    ///
    /// Returns the number of sessions reached.
    pub fn global(&self, from: ConnId, body: &str) -> Result<usize, HandlerError> {
        if body.is_empty() {
            return Err(HandlerError::NoTextToSend);
        }
        let sender = self
            .sessions
            .recipient(from)
            .ok_or(HandlerError::SessionGone)?;

        let frame = Frame::Chat(ChatMessage::global(&sender.username, body));
        let reached = self
            .sessions
            .snapshot()
            .iter()
            .filter(|r| r.id != from)
            .filter(|r| deliver(r, frame.clone()))
            .count();

        crate::metrics::record_fanout("global", reached);
        debug!(from = %sender.username, reached, "global message");
        Ok(reached)
    }

    /// Send `body` to the other sessions in the sender's portal.
    pub fn portal(&self, from: ConnId, body: &str) -> Result<usize, HandlerError> {
        if body.is_empty() {
            return Err(HandlerError::NoTextToSend);
        }
        let sender = self
            .sessions
            .recipient(from)
            .ok_or(HandlerError::SessionGone)?;
        let Some(portal) = sender.portal else {
            return Err(HandlerError::NoPortal);
        };

        let frame = Frame::Chat(ChatMessage::portal(&sender.username, body, &portal));
        let reached = self
            .sessions
            .snapshot()
            .iter()
            .filter(|r| r.id != from && r.portal.as_deref() == Some(portal.as_str()))
            .filter(|r| deliver(r, frame.clone()))
            .count();

        crate::metrics::record_fanout("portal", reached);
        debug!(from = %sender.username, portal = %portal, reached, "portal message");
        Ok(reached)
    }

    /// Send `body` to the session named `target`.
    ///
    /// Self-targets and unknown names are rejected before anything is queued.
    /// Returns whether the frame was queued.
    pub fn direct(&self, from: ConnId, target: &str, body: &str) -> Result<bool, HandlerError> {
        let sender = self
            .sessions
            .recipient(from)
            .ok_or(HandlerError::SessionGone)?;
        if sender.username == target {
            return Err(HandlerError::SelfMessage);
        }
        let to = self
            .sessions
            .lookup_by_username(target)
            .ok_or_else(|| HandlerError::TargetNotFound(target.to_string()))?;
        if body.is_empty() {
            return Err(HandlerError::NoTextToSend);
        }
        let recipient = self
            .sessions
            .recipient(to)
            .ok_or_else(|| HandlerError::TargetNotFound(target.to_string()))?;

        let delivered = deliver(
            &recipient,
            Frame::Chat(ChatMessage::direct(&sender.username, body)),
        );
        crate::metrics::record_fanout("direct", usize::from(delivered));
        Ok(delivered)
    }

    /// Queue one frame for one session.
    pub fn send_to(&self, to: ConnId, frame: Frame) -> bool {
        match self.sessions.recipient(to) {
            Some(recipient) => deliver(&recipient, frame),
            None => false,
        }
    }

    /// Push every session the roster of its own portal.
    ///
    /// Sessions without a portal share one roster. Returns the number of
    /// sessions reached.
    pub fn presence_refresh(&self) -> usize {
        let snapshot = self.sessions.snapshot();
        let reached = snapshot
            .iter()
            .filter(|r| {
                let mut users: Vec<String> = snapshot
                    .iter()
                    .filter(|other| other.portal == r.portal)
                    .map(|other| other.username.clone())
                    .collect();
                users.sort();
                deliver(
                    r,
                    Frame::Users {
                        users,
                        current: r.username.clone(),
                    },
                )
            })
            .count();

        crate::metrics::set_connected_sessions(snapshot.len());
        debug!(sessions = snapshot.len(), reached, "presence refresh");
        reached
    }

    /// Push the observed portals with their session counts to one session.
    pub fn send_portal_roster(&self, to: ConnId) -> bool {
        let Some(recipient) = self.sessions.recipient(to) else {
            return false;
        };
        let portals = self
            .sessions
            .portal_counts()
            .into_iter()
            .map(|(name, sessions)| PortalCount { name, sessions })
            .collect();
        let current = recipient.portal.clone();
        deliver(&recipient, Frame::Portals { portals, current })
    }
}

/// Queue `frame` on one recipient's outbound channel without waiting.
fn deliver(recipient: &Recipient, frame: Frame) -> bool {
    let kind = frame.kind();
    match recipient.sender.try_send(frame) {
        Ok(()) => {
            crate::metrics::record_frame_sent();
            true
        }
        Err(err) => {
            let reason = match err {
                TrySendError::Full(_) => "full",
                TrySendError::Closed(_) => "closed",
            };
            warn!(
                conn = %recipient.id,
                username = %recipient.username,
                frame = kind,
                reason,
                "dropping frame for session"
            );
            crate::metrics::record_delivery_failure(reason);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_proto::Scope;
    use tokio::sync::mpsc;

    struct Peer {
        id: ConnId,
        rx: mpsc::Receiver<Frame>,
    }

    impl Peer {
        fn drain(&mut self) -> Vec<Frame> {
            let mut frames = Vec::new();
            while let Ok(frame) = self.rx.try_recv() {
                frames.push(frame);
            }
            frames
        }

        fn chats(&mut self) -> Vec<ChatMessage> {
            self.drain()
                .into_iter()
                .filter_map(|f| match f {
                    Frame::Chat(msg) => Some(msg),
                    _ => None,
                })
                .collect()
        }
    }

    fn setup(names: &[&str]) -> (Broadcaster, Vec<Peer>) {
        let sessions = Arc::new(SessionRegistry::new());
        let peers = names
            .iter()
            .map(|name| {
                let (tx, rx) = mpsc::channel(16);
                let id = ConnId::new();
                sessions.register(id, name, tx).unwrap();
                Peer { id, rx }
            })
            .collect();
        (Broadcaster::new(sessions), peers)
    }

    #[test]
    fn global_reaches_everyone_but_sender() {
        let (b, mut peers) = setup(&["alice", "bob", "carol"]);
        assert_eq!(b.global(peers[0].id, "hello").unwrap(), 2);

        assert!(peers[0].chats().is_empty());
        for peer in &mut peers[1..] {
            let chats = peer.chats();
            assert_eq!(chats, vec![ChatMessage::global("alice", "hello")]);
        }
    }

    #[test]
    fn portal_is_scoped() {
        let (b, mut peers) = setup(&["alice", "bob", "carol"]);
        let s = &b.sessions;
        s.set_portal(peers[0].id, Some("ops")).unwrap();
        s.set_portal(peers[1].id, Some("ops")).unwrap();
        s.set_portal(peers[2].id, Some("dev")).unwrap();

        assert_eq!(b.portal(peers[0].id, "deploying").unwrap(), 1);
        let chats = peers[1].chats();
        assert_eq!(chats.len(), 1);
        assert_eq!(chats[0].scope, Scope::Portal);
        assert_eq!(chats[0].suffix.as_deref(), Some("(ops)"));
        assert!(peers[0].chats().is_empty());
        assert!(peers[2].chats().is_empty());
    }

    #[test]
    fn portal_without_portal_delivers_nothing() {
        let (b, mut peers) = setup(&["alice", "bob"]);
        assert_eq!(b.portal(peers[0].id, "hi"), Err(HandlerError::NoPortal));
        assert!(peers[1].drain().is_empty());
    }

    #[test]
    fn empty_body_is_rejected() {
        let (b, peers) = setup(&["alice", "bob"]);
        assert_eq!(b.global(peers[0].id, ""), Err(HandlerError::NoTextToSend));
    }

    #[test]
    fn direct_rejections_are_distinct() {
        let (b, mut peers) = setup(&["alice", "bob"]);
        assert_eq!(
            b.direct(peers[0].id, "alice", "hi"),
            Err(HandlerError::SelfMessage)
        );
        assert_eq!(
            b.direct(peers[0].id, "zed", "hi"),
            Err(HandlerError::TargetNotFound("zed".into()))
        );
        assert!(peers[1].drain().is_empty());
    }

    #[test]
    fn direct_keeps_body_verbatim() {
        let (b, mut peers) = setup(&["alice", "bob"]);
        assert!(b.direct(peers[0].id, "bob", "hello   world").unwrap());
        let chats = peers[1].chats();
        assert_eq!(chats, vec![ChatMessage::direct("alice", "hello   world")]);
    }

    #[test]
    fn closed_queue_does_not_stop_others() {
        let (b, mut peers) = setup(&["alice", "bob", "carol"]);
        let bob = peers.remove(1);
        drop(bob.rx);

        assert_eq!(b.global(peers[0].id, "still here").unwrap(), 1);
        assert_eq!(peers[1].chats().len(), 1);
    }

    #[test]
    fn full_queue_does_not_stop_others() {
        let sessions = Arc::new(SessionRegistry::new());
        let (tx_full, _rx_full) = mpsc::channel(1);
        let (tx_ok, mut rx_ok) = mpsc::channel(4);
        let (tx_src, _rx_src) = mpsc::channel(4);
        let (src, full, ok) = (ConnId::new(), ConnId::new(), ConnId::new());
        sessions.register(src, "src", tx_src).unwrap();
        sessions.register(full, "full", tx_full).unwrap();
        sessions.register(ok, "ok", tx_ok).unwrap();
        let b = Broadcaster::new(sessions);

        assert_eq!(b.global(src, "one").unwrap(), 2);
        assert_eq!(b.global(src, "two").unwrap(), 1);
        assert!(rx_ok.try_recv().is_ok());
        assert!(rx_ok.try_recv().is_ok());
    }

    #[test]
    fn presence_refresh_groups_by_portal() {
        let (b, mut peers) = setup(&["alice", "bob", "carol"]);
        b.sessions.set_portal(peers[2].id, Some("ops")).unwrap();

        assert_eq!(b.presence_refresh(), 3);
        assert_eq!(
            peers[0].drain(),
            vec![Frame::Users {
                users: vec!["alice".into(), "bob".into()],
                current: "alice".into(),
            }]
        );
        assert_eq!(
            peers[2].drain(),
            vec![Frame::Users {
                users: vec!["carol".into()],
                current: "carol".into(),
            }]
        );
    }

    #[test]
    fn portal_roster_lists_counts() {
        let (b, mut peers) = setup(&["alice", "bob"]);
        b.sessions.set_portal(peers[0].id, Some("ops")).unwrap();
        b.sessions.set_portal(peers[1].id, Some("ops")).unwrap();

        assert!(b.send_portal_roster(peers[0].id));
        assert_eq!(
            peers[0].drain(),
            vec![Frame::Portals {
                portals: vec![PortalCount {
                    name: "ops".into(),
                    sessions: 2,
                }],
                current: Some("ops".into()),
            }]
        );
    }
}

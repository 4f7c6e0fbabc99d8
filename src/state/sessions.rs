//! Session registry.
//!
//! The `SessionRegistry` owns one `Session` per live connection. It is the
//! only shared mutable state in the server: every operation takes the same
//! registry-wide lock, so connect, disconnect, lookups and mutations are
//! serialized against each other. Expected populations are small, so lookups
//! by username are linear scans.

use crate::error::RegistryError;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use portal_proto::Frame;
use portal_proto::path::{ROOT, is_normalized};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use tokio::sync::mpsc;
use uuid::Uuid;

/// Opaque handle of one connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnId(Uuid);

impl ConnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ConnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ConnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Outbound queue of one session.
pub type FrameSender = mpsc::Sender<Frame>;

/// State of one live connection.
#[derive(Debug)]
struct Session {
    username: String,
    portal: Option<String>,
    working_dir: String,
    connected_at: DateTime<Utc>,
    sender: FrameSender,
}

/// Read-only copy of a session's state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionInfo {
    pub id: ConnId,
    pub username: String,
    pub portal: Option<String>,
    pub working_dir: String,
    pub connected_at: DateTime<Utc>,
}

/// Delivery target taken from a point-in-time snapshot.
#[derive(Debug, Clone)]
pub struct Recipient {
    pub id: ConnId,
    pub username: String,
    pub portal: Option<String>,
    pub sender: FrameSender,
}

/// Registry of live sessions keyed by connection.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: Mutex<HashMap<ConnId, Session>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `id`, starting at the root with no portal.
    ///
    /// Fails if another live session already uses `username`.
    pub fn register(
        &self,
        id: ConnId,
        username: &str,
        sender: FrameSender,
    ) -> Result<SessionInfo, RegistryError> {
        let mut sessions = self.sessions.lock();
        if sessions
            .iter()
            .any(|(other, s)| *other != id && s.username == username)
        {
            return Err(RegistryError::DuplicateUsername(username.to_string()));
        }

        let session = Session {
            username: username.to_string(),
            portal: None,
            working_dir: ROOT.to_string(),
            connected_at: Utc::now(),
            sender,
        };
        let info = session.info(id);
        sessions.insert(id, session);
        Ok(info)
    }

    /// Delete the session for `id`. Returns what was removed, if anything.
    pub fn remove(&self, id: ConnId) -> Option<SessionInfo> {
        self.sessions.lock().remove(&id).map(|s| s.info(id))
    }

    pub fn get(&self, id: ConnId) -> Option<SessionInfo> {
        self.sessions.lock().get(&id).map(|s| s.info(id))
    }

    /// First connection whose session uses `username`.
    pub fn lookup_by_username(&self, username: &str) -> Option<ConnId> {
        self.sessions
            .lock()
            .iter()
            .find(|(_, s)| s.username == username)
            .map(|(id, _)| *id)
    }

    /// All sessions whose portal is `tag`, ordered by username.
    pub fn group_by_portal(&self, tag: &str) -> Vec<SessionInfo> {
        let mut group: Vec<SessionInfo> = self
            .sessions
            .lock()
            .iter()
            .filter(|(_, s)| s.portal.as_deref() == Some(tag))
            .map(|(id, s)| s.info(*id))
            .collect();
        group.sort_by(|a, b| a.username.cmp(&b.username));
        group
    }

    /// Live session count per observed portal tag.
    pub fn portal_counts(&self) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for session in self.sessions.lock().values() {
            if let Some(ref portal) = session.portal {
                *counts.entry(portal.clone()).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Change the username of `id`, returning the previous one.
    pub fn rename(&self, id: ConnId, new_name: &str) -> Result<String, RegistryError> {
        let mut sessions = self.sessions.lock();
        if sessions
            .iter()
            .any(|(other, s)| *other != id && s.username == new_name)
        {
            return Err(RegistryError::DuplicateUsername(new_name.to_string()));
        }
        let session = sessions
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection)?;
        Ok(std::mem::replace(&mut session.username, new_name.to_string()))
    }

    /// Set or clear the portal of `id`, returning the previous one.
    pub fn set_portal(
        &self,
        id: ConnId,
        tag: Option<&str>,
    ) -> Result<Option<String>, RegistryError> {
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection)?;
        Ok(std::mem::replace(&mut session.portal, tag.map(str::to_string)))
    }

    pub fn set_working_dir(&self, id: ConnId, path: &str) -> Result<(), RegistryError> {
        debug_assert!(is_normalized(path), "unnormalized working dir {path:?}");
        let mut sessions = self.sessions.lock();
        let session = sessions
            .get_mut(&id)
            .ok_or(RegistryError::UnknownConnection)?;
        session.working_dir = path.to_string();
        Ok(())
    }

    /// Point-in-time copy of every session's delivery handle.
    ///
    /// The lock is released before this returns, so callers may send
    /// without holding it.
    pub fn snapshot(&self) -> Vec<Recipient> {
        self.sessions
            .lock()
            .iter()
            .map(|(id, s)| Recipient {
                id: *id,
                username: s.username.clone(),
                portal: s.portal.clone(),
                sender: s.sender.clone(),
            })
            .collect()
    }

    /// Delivery handle of a single session.
    pub fn recipient(&self, id: ConnId) -> Option<Recipient> {
        self.sessions.lock().get(&id).map(|s| Recipient {
            id,
            username: s.username.clone(),
            portal: s.portal.clone(),
            sender: s.sender.clone(),
        })
    }

    /// Usernames of every live session, sorted.
    pub fn usernames(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .sessions
            .lock()
            .values()
            .map(|s| s.username.clone())
            .collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }
}

impl Session {
    fn info(&self, id: ConnId) -> SessionInfo {
        SessionInfo {
            id,
            username: self.username.clone(),
            portal: self.portal.clone(),
            working_dir: self.working_dir.clone(),
            connected_at: self.connected_at,
        }
    }
}

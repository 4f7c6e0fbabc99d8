//! Shared fixtures for handler tests.

use super::core::{CommandResult, Context, Registry};
use crate::config::LimitsConfig;
use crate::state::{ConnId, Matrix, SessionInfo};
use portal_proto::{Command, Frame, ParseContext};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A matrix with registered sessions and their outbound queues.
pub(crate) struct Harness {
    pub matrix: Arc<Matrix>,
    pub registry: Registry,
    pub ids: Vec<ConnId>,
    rxs: Vec<mpsc::Receiver<Frame>>,
}

impl Harness {
    pub fn new(names: &[&str]) -> Self {
        let matrix = Arc::new(Matrix::with_parts(
            "test".to_string(),
            LimitsConfig::default(),
            Vec::new(),
        ));
        let mut ids = Vec::new();
        let mut rxs = Vec::new();
        for name in names {
            let (tx, rx) = mpsc::channel(64);
            let id = ConnId::new();
            matrix.sessions.register(id, name, tx).unwrap();
            ids.push(id);
            rxs.push(rx);
        }
        Self {
            matrix,
            registry: Registry::new(),
            ids,
            rxs,
        }
    }

    /// Parse `line` as session `who` would send it and dispatch it.
    pub async fn run(&self, who: usize, line: &str) -> CommandResult {
        let working_dir = self.session(who).working_dir;
        let command = Command::parse(line, &ParseContext::new(&working_dir)).unwrap();
        let ctx = Context::new(self.ids[who], &self.matrix, &self.registry);
        self.registry.dispatch(&ctx, &command).await
    }

    pub fn session(&self, who: usize) -> SessionInfo {
        self.matrix.sessions.get(self.ids[who]).unwrap()
    }

    /// Every frame queued for session `who` so far.
    pub fn drain(&mut self, who: usize) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Ok(frame) = self.rxs[who].try_recv() {
            frames.push(frame);
        }
        frames
    }
}

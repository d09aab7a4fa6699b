use std::sync::atomic::{AtomicU64, Ordering};

use dashmap::DashMap;
use dashmap::mapref::one::{Ref, RefMut};
use tokio::sync::mpsc;

use stackfall_core::protocol::ServerMessage;
use stackfall_core::{PlayerState, SessionId};

/// One connected player.
#[derive(Debug)]
pub struct SessionEntry {
    pub player: PlayerState,
    /// Insertion order, used to break leaderboard ties.
    pub seq: u64,
    /// Outbound queue to the player's socket. `None` for detached sessions.
    pub tx: Option<mpsc::UnboundedSender<ServerMessage>>,
    /// Last score the client claimed, kept for comparison only.
    pub reported_score: Option<u64>,
}

/// A score as seen by a registry snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScoreRow {
    pub id: SessionId,
    pub score: u64,
    pub seq: u64,
}

/// All live sessions keyed by connection identity.
///
/// Each entry is mutated by its own connection task only. Readers see whole
/// entries: a session is visible once `put` returns.
#[derive(Debug, Default)]
pub struct Registry {
    sessions: DashMap<SessionId, SessionEntry>,
    seq: AtomicU64,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a session under `player.id`, replacing any previous entry.
    pub fn put(&self, player: PlayerState, tx: Option<mpsc::UnboundedSender<ServerMessage>>) {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        self.sessions.insert(
            player.id,
            SessionEntry {
                player,
                seq,
                tx,
                reported_score: None,
            },
        );
    }

    pub fn get(&self, id: SessionId) -> Option<Ref<'_, SessionId, SessionEntry>> {
        self.sessions.get(&id)
    }

    pub fn get_mut(&self, id: SessionId) -> Option<RefMut<'_, SessionId, SessionEntry>> {
        self.sessions.get_mut(&id)
    }

    pub fn remove(&self, id: SessionId) -> Option<SessionEntry> {
        self.sessions.remove(&id).map(|(_, entry)| entry)
    }

    pub fn contains(&self, id: SessionId) -> bool {
        self.sessions.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Current score of every session.
    pub fn scores(&self) -> Vec<ScoreRow> {
        self.sessions
            .iter()
            .map(|entry| ScoreRow {
                id: *entry.key(),
                score: entry.player.score,
                seq: entry.seq,
            })
            .collect()
    }

    /// Queue a message to every attached session. Returns how many were reached.
    pub fn broadcast(&self, msg: &ServerMessage) -> usize {
        let mut sent = 0;
        for entry in self.sessions.iter() {
            if let Some(tx) = &entry.tx {
                if tx.send(msg.clone()).is_ok() {
                    sent += 1;
                }
            }
        }
        sent
    }
}

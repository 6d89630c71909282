//! Timed locks: per-match exclusive locks and per-tournament gates.
//!
//! Match locks are always taken in ascending match `sequence`, which orders every feeder
//! before the matches it feeds, so two requests can never wait on each other in a cycle.
//! Single-match operations hold their tournament's gate shared; batch operations
//! (generate, cleanup, reset) hold it exclusively.

use crate::error::BracketError;
use crate::models::{Match, MatchId, TournamentId};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{
    Mutex as AsyncMutex, OwnedMutexGuard, OwnedRwLockReadGuard, OwnedRwLockWriteGuard, RwLock,
};
use tokio::time::timeout;

/// Guards for a set of matches; dropping it releases them all.
pub struct MatchGuards {
    _guards: Vec<OwnedMutexGuard<()>>,
    ids: Vec<MatchId>,
}

impl MatchGuards {
    /// Match ids held, in acquisition order.
    pub fn ids(&self) -> &[MatchId] {
        &self.ids
    }

    pub fn holds(&self, id: MatchId) -> bool {
        self.ids.contains(&id)
    }
}

pub struct LockTable {
    matches: Mutex<HashMap<MatchId, Arc<AsyncMutex<()>>>>,
    gates: Mutex<HashMap<TournamentId, Arc<RwLock<()>>>>,
    wait: Duration,
}

impl LockTable {
    pub fn new(wait: Duration) -> Self {
        Self {
            matches: Mutex::new(HashMap::new()),
            gates: Mutex::new(HashMap::new()),
            wait,
        }
    }

    fn match_lock(&self, id: MatchId) -> Result<Arc<AsyncMutex<()>>, BracketError> {
        let mut table = self.matches.lock().map_err(|_| BracketError::Poisoned)?;
        Ok(table.entry(id).or_default().clone())
    }

    fn gate(&self, id: TournamentId) -> Result<Arc<RwLock<()>>, BracketError> {
        let mut table = self.gates.lock().map_err(|_| BracketError::Poisoned)?;
        Ok(table.entry(id).or_default().clone())
    }

    /// Lock the given matches in ascending `sequence`. Times out with `Contention`.
    ///
    /// Completed and void matches are never written again and are skipped.
    pub async fn lock_matches(&self, matches: &[&Match]) -> Result<MatchGuards, BracketError> {
        let mut ordered: Vec<&Match> = matches
            .iter()
            .copied()
            .filter(|m| !m.status.is_terminal())
            .collect();
        ordered.sort_by_key(|m| m.sequence);
        ordered.dedup_by_key(|m| m.id);

        let mut guards = Vec::with_capacity(ordered.len());
        let mut ids = Vec::with_capacity(ordered.len());
        for m in ordered {
            let lock = self.match_lock(m.id)?;
            let guard = timeout(self.wait, lock.lock_owned())
                .await
                .map_err(|_| BracketError::Contention(m.id))?;
            guards.push(guard);
            ids.push(m.id);
        }
        Ok(MatchGuards {
            _guards: guards,
            ids,
        })
    }

    /// Shared hold on a tournament, taken by single-match operations.
    pub async fn share(&self, id: TournamentId) -> Result<OwnedRwLockReadGuard<()>, BracketError> {
        let gate = self.gate(id)?;
        timeout(self.wait, gate.read_owned())
            .await
            .map_err(|_| BracketError::Contention(id))
    }

    /// Exclusive hold on a tournament, taken by batch operations.
    pub async fn exclusive(
        &self,
        id: TournamentId,
    ) -> Result<OwnedRwLockWriteGuard<()>, BracketError> {
        let gate = self.gate(id)?;
        timeout(self.wait, gate.write_owned())
            .await
            .map_err(|_| BracketError::Contention(id))
    }

    /// Forget the locks of matches that are gone or finished.
    pub fn forget(&self, ids: impl IntoIterator<Item = MatchId>) -> Result<(), BracketError> {
        let mut table = self.matches.lock().map_err(|_| BracketError::Poisoned)?;
        for id in ids {
            table.remove(&id);
        }
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn tracked(&self) -> usize {
        self.matches.lock().map(|table| table.len()).unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BracketType, MatchStatus, SlotSource};
    use uuid::Uuid;

    fn match_with_sequence(sequence: u32) -> Match {
        Match::new(
            Uuid::new_v4(),
            BracketType::Winners,
            1,
            sequence,
            [SlotSource::Bye, SlotSource::Bye],
            sequence,
        )
    }

    #[tokio::test]
    async fn held_match_lock_times_out_with_contention() {
        let table = LockTable::new(Duration::from_millis(20));
        let m = match_with_sequence(1);
        let _held = table.lock_matches(&[&m]).await.unwrap();
        let err = table.lock_matches(&[&m]).await.err();
        assert_eq!(err, Some(BracketError::Contention(m.id)));
    }

    #[tokio::test]
    async fn locks_follow_sequence_order() {
        let table = LockTable::new(Duration::from_millis(20));
        let (a, b, c) = (match_with_sequence(1), match_with_sequence(2), match_with_sequence(3));
        let guards = table.lock_matches(&[&c, &a, &b, &a]).await.unwrap();
        assert_eq!(guards.ids(), &[a.id, b.id, c.id]);
        drop(guards);
        assert!(table.lock_matches(&[&b]).await.is_ok());
    }

    #[tokio::test]
    async fn finished_matches_are_not_locked() {
        let table = LockTable::new(Duration::from_millis(20));
        let (mut done, open) = (match_with_sequence(1), match_with_sequence(2));
        done.status = MatchStatus::Completed;
        let guards = table.lock_matches(&[&done, &open]).await.unwrap();
        assert_eq!(guards.ids(), &[open.id]);
        assert_eq!(table.tracked(), 1);

        table.forget([open.id]).unwrap();
        assert_eq!(table.tracked(), 0);
    }

    #[tokio::test]
    async fn exclusive_gate_blocks_shared_holders() {
        let table = LockTable::new(Duration::from_millis(20));
        let id = Uuid::new_v4();
        let shared = table.share(id).await.unwrap();
        assert_eq!(table.exclusive(id).await.err(), Some(BracketError::Contention(id)));
        drop(shared);
        let _exclusive = table.exclusive(id).await.unwrap();
        assert_eq!(table.share(id).await.err(), Some(BracketError::Contention(id)));
    }
}

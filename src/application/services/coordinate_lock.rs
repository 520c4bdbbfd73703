use crate::analysis::domain::Gav;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Keyed lock serializing work on the same coordinate
///
/// Locks are created lazily on first use. An entry is removed again when
/// the last guard for it is released and nobody is waiting, so the table
/// only ever holds coordinates that are locked or contended.
///
/// The lock is not reentrant: a task must release a coordinate before it
/// can analyze that coordinate again further down its own call path.
#[derive(Default)]
pub struct CoordinateLock {
    locks: DashMap<Gav, Arc<Mutex<()>>>,
}

/// Holds a coordinate's lock until dropped
pub struct CoordinateGuard<'a> {
    owner: &'a CoordinateLock,
    gav: Gav,
    guard: Option<OwnedMutexGuard<()>>,
}

impl CoordinateLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits until `gav` is free and takes it
    pub async fn acquire(&self, gav: &Gav) -> CoordinateGuard<'_> {
        // The entry guard is a temporary and is released before awaiting
        let mutex = self
            .locks
            .entry(gav.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let guard = mutex.lock_owned().await;

        CoordinateGuard {
            owner: self,
            gav: gav.clone(),
            guard: Some(guard),
        }
    }

    /// Number of coordinates currently locked or waited on
    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}

impl CoordinateGuard<'_> {
    pub fn gav(&self) -> &Gav {
        &self.gav
    }
}

impl Drop for CoordinateGuard<'_> {
    fn drop(&mut self) {
        drop(self.guard.take());
        // Only the table's own reference left: nobody holds or awaits this lock
        self.owner
            .locks
            .remove_if(&self.gav, |_, mutex| Arc::strong_count(mutex) == 1);
    }
}

use crate::analysis::domain::Gav;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;

/// Coordinates whose analysis has started but not yet written its edges
///
/// A coordinate enters the set before its record is first persisted and
/// leaves it once its whole subtree has been analyzed. While it is in the
/// set, a stored record for it may be missing dependencies. Overlapping
/// analyses of one coordinate share an entry; waiters are woken when the
/// last of them finishes.
#[derive(Default)]
pub struct InFlightAnalyses {
    entries: DashMap<Gav, InFlightEntry>,
}

struct InFlightEntry {
    holders: usize,
    finished: watch::Sender<bool>,
}

/// Keeps a coordinate in flight until dropped
pub struct InFlightGuard<'a> {
    owner: &'a InFlightAnalyses,
    gav: Gav,
}

impl InFlightAnalyses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enter(&self, gav: &Gav) -> InFlightGuard<'_> {
        self.entries
            .entry(gav.clone())
            .or_insert_with(|| InFlightEntry {
                holders: 0,
                finished: watch::channel(false).0,
            })
            .holders += 1;

        InFlightGuard {
            owner: self,
            gav: gav.clone(),
        }
    }

    pub fn contains(&self, gav: &Gav) -> bool {
        self.entries.contains_key(gav)
    }

    /// Resolves once `gav` is no longer in flight
    pub async fn wait_for(&self, gav: &Gav) {
        let Some(mut finished) = self
            .entries
            .get(gav)
            .map(|entry| entry.finished.subscribe())
        else {
            return;
        };
        // A closed channel means the entry is already gone
        let _ = finished.wait_for(|done| *done).await;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        if let Entry::Occupied(mut entry) = self.owner.entries.entry(self.gav.clone()) {
            entry.get_mut().holders -= 1;
            if entry.get().holders == 0 {
                entry.remove().finished.send_replace(true);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    fn gav(name: &str) -> Gav {
        format!("g:{}:1", name).parse().unwrap()
    }

    #[test]
    fn test_entry_lives_until_last_guard_drops() {
        let analyses = InFlightAnalyses::new();
        let first = analyses.enter(&gav("a"));
        let second = analyses.enter(&gav("a"));
        assert_eq!(analyses.len(), 1);

        drop(first);
        assert!(analyses.contains(&gav("a")));
        drop(second);
        assert!(!analyses.contains(&gav("a")));
        assert!(analyses.is_empty());
    }

    #[tokio::test]
    async fn test_wait_for_idle_coordinate_returns_immediately() {
        let analyses = InFlightAnalyses::new();
        tokio::time::timeout(Duration::from_millis(100), analyses.wait_for(&gav("a")))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_wakes_when_analysis_finishes() {
        let analyses = Arc::new(InFlightAnalyses::new());
        let guard = analyses.enter(&gav("a"));

        let waiter = {
            let analyses = Arc::clone(&analyses);
            tokio::spawn(async move { analyses.wait_for(&gav("a")).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
    }
}

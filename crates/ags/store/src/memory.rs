//! In-memory store implementation
//!
//! Backs tests and single-process deployments. The `available` toggle
//! simulates a persistence outage: while unavailable every call fails
//! with `StoreUnavailable`, which the engines translate into their
//! degraded-mode behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

use ags_types::{
    AgencySnapshot, AgsError, AgsResult, Appeal, AppealId, BreakerScope, CircuitBreakerState,
    KnowledgeProfile, UserId,
};

use crate::traits::{AppealStore, BreakerStore, ProfileStore, SnapshotStore};
use crate::versioned::Versioned;

/// All four stores behind one in-memory state bag.
#[derive(Default)]
pub struct MemoryGovernanceStore {
    snapshots: RwLock<HashMap<UserId, Vec<AgencySnapshot>>>,
    profiles: RwLock<HashMap<(UserId, String), KnowledgeProfile>>,
    appeals: RwLock<HashMap<AppealId, Versioned<Appeal>>>,
    breakers: RwLock<HashMap<BreakerScope, CircuitBreakerState>>,
    available: AtomicBool,
}

impl MemoryGovernanceStore {
    pub fn new() -> Self {
        Self {
            snapshots: RwLock::new(HashMap::new()),
            profiles: RwLock::new(HashMap::new()),
            appeals: RwLock::new(HashMap::new()),
            breakers: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Simulate a persistence outage (or recovery).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    fn check_available(&self) -> AgsResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AgsError::StoreUnavailable("memory store offline".into()))
        }
    }
}

fn poisoned(what: &str) -> AgsError {
    AgsError::StoreUnavailable(format!("{what} lock poisoned"))
}

impl SnapshotStore for MemoryGovernanceStore {
    fn append(&self, snapshot: AgencySnapshot) -> AgsResult<()> {
        self.check_available()?;
        let mut snapshots = self.snapshots.write().map_err(|_| poisoned("snapshots"))?;
        snapshots
            .entry(snapshot.user_id.clone())
            .or_default()
            .push(snapshot);
        Ok(())
    }

    fn history(&self, user: &UserId) -> AgsResult<Vec<AgencySnapshot>> {
        self.check_available()?;
        let snapshots = self.snapshots.read().map_err(|_| poisoned("snapshots"))?;
        Ok(snapshots.get(user).cloned().unwrap_or_default())
    }

    fn latest(&self, user: &UserId) -> AgsResult<Option<AgencySnapshot>> {
        self.check_available()?;
        let snapshots = self.snapshots.read().map_err(|_| poisoned("snapshots"))?;
        Ok(snapshots.get(user).and_then(|h| h.last().cloned()))
    }

    fn recent(&self, user: &UserId, n: usize) -> AgsResult<Vec<AgencySnapshot>> {
        self.check_available()?;
        let snapshots = self.snapshots.read().map_err(|_| poisoned("snapshots"))?;
        let history = snapshots.get(user).map(|h| h.as_slice()).unwrap_or(&[]);
        let start = history.len().saturating_sub(n);
        Ok(history[start..].to_vec())
    }
}

impl ProfileStore for MemoryGovernanceStore {
    fn get(&self, user: &UserId, domain: &str) -> AgsResult<Option<KnowledgeProfile>> {
        self.check_available()?;
        let profiles = self.profiles.read().map_err(|_| poisoned("profiles"))?;
        Ok(profiles.get(&(user.clone(), domain.to_string())).cloned())
    }

    fn put(&self, profile: KnowledgeProfile) -> AgsResult<()> {
        self.check_available()?;
        let mut profiles = self.profiles.write().map_err(|_| poisoned("profiles"))?;
        profiles.insert(
            (profile.user_id.clone(), profile.domain.clone()),
            profile,
        );
        Ok(())
    }
}

impl AppealStore for MemoryGovernanceStore {
    fn insert(&self, appeal: Appeal) -> AgsResult<()> {
        self.check_available()?;
        let mut appeals = self.appeals.write().map_err(|_| poisoned("appeals"))?;
        appeals.insert(appeal.appeal_id.clone(), Versioned::initial(appeal));
        Ok(())
    }

    fn get(&self, appeal_id: &AppealId) -> AgsResult<Option<Versioned<Appeal>>> {
        self.check_available()?;
        let appeals = self.appeals.read().map_err(|_| poisoned("appeals"))?;
        Ok(appeals.get(appeal_id).cloned())
    }

    fn put(&self, appeal: Appeal, expected_version: u64) -> AgsResult<u64> {
        self.check_available()?;
        let mut appeals = self.appeals.write().map_err(|_| poisoned("appeals"))?;
        let current = appeals
            .get(&appeal.appeal_id)
            .ok_or_else(|| AgsError::AppealNotFound(appeal.appeal_id.clone()))?;

        if current.version != expected_version {
            return Err(AgsError::VersionConflict {
                entity: format!("appeal {}", appeal.appeal_id),
                expected: expected_version,
                found: current.version,
            });
        }

        let next_version = expected_version + 1;
        appeals.insert(
            appeal.appeal_id.clone(),
            Versioned {
                version: next_version,
                value: appeal,
            },
        );
        Ok(next_version)
    }

    fn outstanding(&self) -> AgsResult<Vec<Versioned<Appeal>>> {
        self.check_available()?;
        let appeals = self.appeals.read().map_err(|_| poisoned("appeals"))?;
        Ok(appeals
            .values()
            .filter(|v| v.value.status.is_outstanding())
            .cloned()
            .collect())
    }
}

impl BreakerStore for MemoryGovernanceStore {
    fn get(&self, scope: &BreakerScope) -> AgsResult<Option<CircuitBreakerState>> {
        self.check_available()?;
        let breakers = self.breakers.read().map_err(|_| poisoned("breakers"))?;
        Ok(breakers.get(scope).cloned())
    }

    fn trip(&self, state: CircuitBreakerState) -> AgsResult<bool> {
        self.check_available()?;
        let mut breakers = self.breakers.write().map_err(|_| poisoned("breakers"))?;
        if breakers.get(&state.scope).is_some_and(|s| s.active) {
            return Ok(false);
        }
        breakers.insert(state.scope.clone(), state);
        Ok(true)
    }

    fn clear(&self, scope: &BreakerScope) -> AgsResult<bool> {
        self.check_available()?;
        let mut breakers = self.breakers.write().map_err(|_| poisoned("breakers"))?;
        Ok(breakers.remove(scope).is_some())
    }

    fn active(&self) -> AgsResult<Vec<CircuitBreakerState>> {
        self.check_available()?;
        let breakers = self.breakers.read().map_err(|_| poisoned("breakers"))?;
        Ok(breakers.values().filter(|s| s.active).cloned().collect())
    }
}

//! Persistence hooks for SCORM attempts.
//!
//! The runtime cache is never the system of record. [`AttemptStore`]
//! connects it to whatever holds attempts authoritatively: it answers who
//! owns an attempt, supplies previously committed values on initialize and
//! receives values on commit.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::error::{Error, Result};
use crate::scorm::CmiValues;

/// Trait for attempt storage backends.
pub trait AttemptStore: Send + Sync {
    /// Owner of the attempt, or `None` if the attempt does not exist.
    fn owner_of(&self, attempt_id: &str) -> Result<Option<String>>;

    /// Values committed by earlier sessions of this attempt.
    fn load_values(&self, attempt_id: &str) -> Result<CmiValues>;

    /// Persist the attempt's current values.
    fn commit(&self, attempt_id: &str, values: &CmiValues) -> Result<()>;
}

#[derive(Debug, Clone, Default)]
struct AttemptRecord {
    user_id: String,
    values: CmiValues,
    commits: usize,
}

/// Attempt store kept in process memory.
///
/// Used by tests and by the trace replay command.
#[derive(Debug, Default)]
pub struct InMemoryAttempts {
    attempts: RwLock<HashMap<String, AttemptRecord>>,
}

impl InMemoryAttempts {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an attempt owned by `user_id`. Re-registering keeps its values.
    pub fn register(&self, attempt_id: impl Into<String>, user_id: impl Into<String>) {
        let user_id = user_id.into();
        self.attempts
            .write()
            .entry(attempt_id.into())
            .and_modify(|record| record.user_id.clone_from(&user_id))
            .or_insert_with(|| AttemptRecord {
                user_id,
                ..Default::default()
            });
    }

    /// Values last committed for the attempt.
    pub fn committed(&self, attempt_id: &str) -> Option<CmiValues> {
        self.attempts
            .read()
            .get(attempt_id)
            .map(|record| record.values.clone())
    }

    /// How many commits the attempt has received.
    pub fn commit_count(&self, attempt_id: &str) -> usize {
        self.attempts
            .read()
            .get(attempt_id)
            .map_or(0, |record| record.commits)
    }
}

impl AttemptStore for InMemoryAttempts {
    fn owner_of(&self, attempt_id: &str) -> Result<Option<String>> {
        Ok(self
            .attempts
            .read()
            .get(attempt_id)
            .map(|record| record.user_id.clone()))
    }

    fn load_values(&self, attempt_id: &str) -> Result<CmiValues> {
        Ok(self.committed(attempt_id).unwrap_or_default())
    }

    fn commit(&self, attempt_id: &str, values: &CmiValues) -> Result<()> {
        let mut attempts = self.attempts.write();
        let record = attempts
            .get_mut(attempt_id)
            .ok_or_else(|| Error::AttemptNotFound(attempt_id.to_string()))?;
        record.values.extend(values.iter().map(|(k, v)| (k.clone(), v.clone())));
        record.commits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_owner() {
        let store = InMemoryAttempts::new();
        store.register("attempt-1", "user-1");

        assert_eq!(
            store.owner_of("attempt-1").unwrap(),
            Some("user-1".to_string())
        );
        assert_eq!(store.owner_of("attempt-2").unwrap(), None);
    }

    #[test]
    fn test_commit_merges_values() {
        let store = InMemoryAttempts::new();
        store.register("attempt-1", "user-1");

        let mut first = CmiValues::new();
        first.insert("cmi.location".into(), "1".into());
        first.insert("cmi.suspend_data".into(), "a".into());
        store.commit("attempt-1", &first).unwrap();

        let mut second = CmiValues::new();
        second.insert("cmi.location".into(), "2".into());
        store.commit("attempt-1", &second).unwrap();

        let values = store.load_values("attempt-1").unwrap();
        assert_eq!(values.get("cmi.location").map(String::as_str), Some("2"));
        assert_eq!(values.get("cmi.suspend_data").map(String::as_str), Some("a"));
        assert_eq!(store.commit_count("attempt-1"), 2);
    }

    #[test]
    fn test_commit_unknown_attempt() {
        let store = InMemoryAttempts::new();
        let result = store.commit("ghost", &CmiValues::new());
        assert!(matches!(result, Err(Error::AttemptNotFound(_))));
    }

    #[test]
    fn test_load_values_for_unknown_attempt_is_empty() {
        let store = InMemoryAttempts::new();
        assert!(store.load_values("ghost").unwrap().is_empty());
    }
}

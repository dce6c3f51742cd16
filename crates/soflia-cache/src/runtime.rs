//! SCORM runtime API on top of the session store.
//!
//! This is the caller the store expects: every call checks that the attempt
//! belongs to the requesting user, every key is validated and every written
//! value is sanitized before it reaches [`ScormSessionStore`].

use tracing::{debug, warn};

use crate::cmi::{self, CmiKey};
use crate::error::{Error, Result};
use crate::persistence::AttemptStore;
use crate::scorm::ScormSessionStore;

/// `Initialize` / `GetValue` / `SetValue` / `Commit` / `Terminate` for SCORM content.
pub struct ScormRuntime<S: AttemptStore> {
    sessions: ScormSessionStore,
    attempts: S,
    max_value_len: usize,
}

impl<S: AttemptStore> ScormRuntime<S> {
    /// Create a runtime over a session store and an attempt backend.
    pub fn new(sessions: ScormSessionStore, attempts: S, max_value_len: usize) -> Self {
        Self {
            sessions,
            attempts,
            max_value_len,
        }
    }

    /// The attempt backend.
    pub fn attempts(&self) -> &S {
        &self.attempts
    }

    /// The session value store.
    pub fn sessions(&self) -> &ScormSessionStore {
        &self.sessions
    }

    /// Start a session for the attempt.
    ///
    /// Drops any leftover cached values and seeds the cache from storage.
    /// Returns how many values were loaded.
    pub fn initialize(&self, user_id: &str, attempt_id: &str) -> Result<usize> {
        self.authorize(user_id, attempt_id)?;

        self.sessions.clear_session_cache(attempt_id);
        let values = self.attempts.load_values(attempt_id)?;
        let count = values.len();
        self.sessions.load_session(attempt_id, values);

        debug!(user_id = %user_id, attempt_id = %attempt_id, loaded = count, "SCORM session initialized");
        Ok(count)
    }

    /// Read an element. `Ok(None)` means the element has no value yet.
    pub fn get_value(&self, user_id: &str, attempt_id: &str, key: &str) -> Result<Option<String>> {
        self.authorize(user_id, attempt_id)?;
        let key = CmiKey::parse(key)?;
        if key.is_write_only() {
            return Err(Error::WriteOnly(key.to_string()));
        }
        self.require_active(attempt_id)?;

        Ok(self.sessions.get_session_value(attempt_id, key.as_str()))
    }

    /// Write an element. Returns the sanitized value that was stored.
    pub fn set_value(
        &self,
        user_id: &str,
        attempt_id: &str,
        key: &str,
        raw_value: &str,
    ) -> Result<String> {
        self.authorize(user_id, attempt_id)?;
        let key = CmiKey::parse(key)?;
        if key.is_read_only() {
            return Err(Error::ReadOnly(key.to_string()));
        }

        let value = cmi::sanitize_value(raw_value, self.max_value_len);
        cmi::validate_vocabulary(&key, &value)?;
        self.require_active(attempt_id)?;

        self.sessions
            .set_session_value(attempt_id, key.as_str(), value.clone());
        Ok(value)
    }

    /// Persist the cached values. Returns how many were written.
    pub fn commit(&self, user_id: &str, attempt_id: &str) -> Result<usize> {
        self.authorize(user_id, attempt_id)?;
        let values = self
            .sessions
            .session_values(attempt_id)
            .ok_or_else(|| Error::NotInitialized(attempt_id.to_string()))?;

        self.attempts.commit(attempt_id, &values)?;
        debug!(attempt_id = %attempt_id, count = values.len(), "SCORM values committed");
        Ok(values.len())
    }

    /// Commit and end the session. Cached values are dropped afterwards.
    pub fn terminate(&self, user_id: &str, attempt_id: &str) -> Result<usize> {
        let committed = self.commit(user_id, attempt_id)?;
        self.sessions.clear_session_cache(attempt_id);
        debug!(attempt_id = %attempt_id, "SCORM session terminated");
        Ok(committed)
    }

    fn authorize(&self, user_id: &str, attempt_id: &str) -> Result<()> {
        match self.attempts.owner_of(attempt_id)? {
            None => Err(Error::AttemptNotFound(attempt_id.to_string())),
            Some(owner) if owner != user_id => {
                warn!(user_id = %user_id, attempt_id = %attempt_id, "SCORM access to foreign attempt denied");
                Err(Error::Forbidden {
                    attempt_id: attempt_id.to_string(),
                    user_id: user_id.to_string(),
                })
            }
            Some(_) => Ok(()),
        }
    }

    fn require_active(&self, attempt_id: &str) -> Result<()> {
        if self.sessions.is_active(attempt_id) {
            Ok(())
        } else {
            Err(Error::NotInitialized(attempt_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::InMemoryAttempts;
    use crate::scorm::CmiValues;
    use std::time::Duration;

    fn runtime() -> ScormRuntime<InMemoryAttempts> {
        let attempts = InMemoryAttempts::new();
        attempts.register("attempt-1", "user-1");
        ScormRuntime::new(
            ScormSessionStore::new(Duration::from_secs(60)),
            attempts,
            64_000,
        )
    }

    #[test]
    fn test_full_session() {
        let rt = runtime();
        assert_eq!(rt.initialize("user-1", "attempt-1").unwrap(), 0);

        rt.set_value("user-1", "attempt-1", "cmi.core.lesson_status", "completed")
            .unwrap();
        assert_eq!(
            rt.get_value("user-1", "attempt-1", "cmi.core.lesson_status")
                .unwrap(),
            Some("completed".to_string())
        );

        assert_eq!(rt.terminate("user-1", "attempt-1").unwrap(), 1);
        assert!(!rt.sessions().is_active("attempt-1"));

        let committed = rt.attempts().committed("attempt-1").unwrap();
        assert_eq!(
            committed.get("cmi.core.lesson_status").map(String::as_str),
            Some("completed")
        );
    }

    #[test]
    fn test_initialize_resumes_committed_values() {
        let rt = runtime();
        let mut values = CmiValues::new();
        values.insert("cmi.suspend_data".into(), "chapter-2".into());
        rt.attempts().commit("attempt-1", &values).unwrap();

        assert_eq!(rt.initialize("user-1", "attempt-1").unwrap(), 1);
        assert_eq!(
            rt.get_value("user-1", "attempt-1", "cmi.suspend_data")
                .unwrap(),
            Some("chapter-2".to_string())
        );
    }

    #[test]
    fn test_foreign_user_is_forbidden() {
        let rt = runtime();
        rt.initialize("user-1", "attempt-1").unwrap();

        let err = rt
            .set_value("user-2", "attempt-1", "cmi.location", "1")
            .unwrap_err();
        assert_eq!(err.status_code(), 403);

        let err = rt.initialize("user-2", "attempt-1").unwrap_err();
        assert!(matches!(err, Error::Forbidden { .. }));
    }

    #[test]
    fn test_unknown_attempt() {
        let rt = runtime();
        let err = rt.initialize("user-1", "ghost").unwrap_err();
        assert_eq!(err.status_code(), 404);
    }

    #[test]
    fn test_calls_before_initialize() {
        let rt = runtime();
        let err = rt
            .set_value("user-1", "attempt-1", "cmi.location", "1")
            .unwrap_err();
        assert!(matches!(err, Error::NotInitialized(_)));

        let err = rt.commit("user-1", "attempt-1").unwrap_err();
        assert!(matches!(err, Error::NotInitialized(_)));
    }

    #[test]
    fn test_calls_after_terminate() {
        let rt = runtime();
        rt.initialize("user-1", "attempt-1").unwrap();
        rt.set_value("user-1", "attempt-1", "cmi.location", "1")
            .unwrap();
        rt.terminate("user-1", "attempt-1").unwrap();

        let err = rt
            .get_value("user-1", "attempt-1", "cmi.location")
            .unwrap_err();
        assert!(matches!(err, Error::NotInitialized(_)));
    }

    #[test]
    fn test_access_rules_enforced() {
        let rt = runtime();
        rt.initialize("user-1", "attempt-1").unwrap();

        let err = rt
            .set_value("user-1", "attempt-1", "cmi.core.student_name", "Mallory")
            .unwrap_err();
        assert!(matches!(err, Error::ReadOnly(_)));

        rt.set_value("user-1", "attempt-1", "cmi.core.session_time", "00:10:00")
            .unwrap();
        let err = rt
            .get_value("user-1", "attempt-1", "cmi.core.session_time")
            .unwrap_err();
        assert!(matches!(err, Error::WriteOnly(_)));
    }

    #[test]
    fn test_invalid_input_rejected() {
        let rt = runtime();
        rt.initialize("user-1", "attempt-1").unwrap();

        let err = rt
            .set_value("user-1", "attempt-1", "cmi.core.lesson_status", "finished")
            .unwrap_err();
        assert_eq!(err.status_code(), 400);

        let err = rt
            .set_value("user-1", "attempt-1", "window.location", "x")
            .unwrap_err();
        assert!(matches!(err, Error::InvalidKey(_)));
    }

    #[test]
    fn test_values_are_sanitized() {
        let rt = runtime();
        rt.initialize("user-1", "attempt-1").unwrap();

        let stored = rt
            .set_value("user-1", "attempt-1", "cmi.suspend_data", " <b>state</b> ")
            .unwrap();
        assert_eq!(stored, "bstate/b");
        assert_eq!(
            rt.get_value("user-1", "attempt-1", "cmi.suspend_data")
                .unwrap(),
            Some("bstate/b".to_string())
        );
    }
}

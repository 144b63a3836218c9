use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// In-process registry of sessions with a run in flight.
#[derive(Debug, Clone, Default)]
pub struct RunRegistry {
    active: Arc<Mutex<HashSet<String>>>,
}

impl RunRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claims `session_id`, or returns `None` when a run already holds it.
    /// The claim is released when the returned guard drops.
    pub fn try_acquire(&self, session_id: &str) -> Option<RunGuard> {
        let mut active = self.active.lock().unwrap_or_else(|e| e.into_inner());
        if !active.insert(session_id.to_string()) {
            return None;
        }
        Some(RunGuard {
            registry: self.active.clone(),
            session_id: session_id.to_string(),
        })
    }

    pub fn is_running(&self, session_id: &str) -> bool {
        self.active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .contains(session_id)
    }
}

#[derive(Debug)]
pub struct RunGuard {
    registry: Arc<Mutex<HashSet<String>>>,
    session_id: String,
}

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.registry
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&self.session_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_claim_is_rejected_until_release() {
        let registry = RunRegistry::new();

        let guard = registry.try_acquire("s1").expect("first claim");
        assert!(registry.try_acquire("s1").is_none());
        assert!(registry.try_acquire("s2").is_some());
        assert!(registry.is_running("s1"));

        drop(guard);
        assert!(!registry.is_running("s1"));
        assert!(registry.try_acquire("s1").is_some());
    }
}

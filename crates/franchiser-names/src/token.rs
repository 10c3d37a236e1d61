use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Cooperative cancellation flag shared between a request and its issuer.
///
/// Cancelling does not abort the underlying call; the result handler checks
/// the flag before committing anything.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Holds the token of the one live request; issuing a new one supersedes it.
#[derive(Debug, Default)]
pub struct TokenSlot {
    current: Option<CancelToken>,
}

impl TokenSlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the live request, if any, and hand out a token for the next.
    pub fn issue(&mut self) -> CancelToken {
        self.cancel();
        let token = CancelToken::new();
        self.current = Some(token.clone());
        token
    }

    pub fn cancel(&mut self) {
        if let Some(token) = self.current.take() {
            token.cancel();
        }
    }

    pub fn is_live(&self) -> bool {
        self.current.as_ref().is_some_and(|t| !t.is_cancelled())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_supersedes_previous() {
        let mut slot = TokenSlot::new();
        let first = slot.issue();
        assert!(!first.is_cancelled());

        let second = slot.issue();
        assert!(first.is_cancelled());
        assert!(!second.is_cancelled());
        assert!(slot.is_live());

        slot.cancel();
        assert!(second.is_cancelled());
        assert!(!slot.is_live());
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}

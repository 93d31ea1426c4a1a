//! Bearer attachment.
//!
//! The manager decides which token outgoing API requests carry; the API
//! client only ever reads it. A `watch` channel carries the current token so
//! readers always see the latest value without locking the manager.

use crate::state::BearerToken;
use std::sync::Arc;
use tokio::sync::watch;

/// Shared slot holding the token attached to outgoing requests.
#[derive(Debug, Clone)]
pub struct BearerHandle {
    sender: Arc<watch::Sender<Option<BearerToken>>>,
}

impl BearerHandle {
    /// Create an empty slot.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Attach `token` to every subsequent request.
    pub fn attach(&self, token: BearerToken) {
        self.sender.send_replace(Some(token));
    }

    /// Stop attaching a token.
    pub fn detach(&self) {
        self.sender.send_replace(None);
    }

    /// Whether a token is attached.
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.sender.borrow().is_some()
    }

    /// Receiver for readers of the slot.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<BearerToken>> {
        self.sender.subscribe()
    }

    /// `Authorization` header value for the attached token, if any.
    #[must_use]
    pub fn authorization_header(&self) -> Option<String> {
        self.sender.borrow().as_ref().map(BearerToken::header_value)
    }
}

impl Default for BearerHandle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_and_detach() {
        let handle = BearerHandle::new();
        let receiver = handle.subscribe();
        assert!(!handle.is_attached());

        handle.attach(BearerToken::new("h.p.s"));
        assert_eq!(handle.authorization_header().as_deref(), Some("Bearer h.p.s"));
        assert_eq!(*receiver.borrow(), Some(BearerToken::new("h.p.s")));

        handle.detach();
        assert!(receiver.borrow().is_none());
        assert_eq!(handle.authorization_header(), None);
    }
}

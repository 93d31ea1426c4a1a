//! Mock navigator for testing.

use crate::providers::Navigator;
use grievance_core::Destination;
use std::sync::{Arc, Mutex};

/// Mock navigator.
///
/// Records every redirect in order.
#[derive(Debug, Clone, Default)]
pub struct MockNavigator {
    redirects: Arc<Mutex<Vec<Destination>>>,
}

impl MockNavigator {
    /// Create a navigator with no recorded redirects.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Redirects issued so far (for testing).
    #[must_use]
    pub fn redirects(&self) -> Vec<Destination> {
        self.redirects
            .lock()
            .map(|redirects| redirects.clone())
            .unwrap_or_default()
    }

    /// Most recent redirect (for testing).
    #[must_use]
    pub fn last_redirect(&self) -> Option<Destination> {
        self.redirects().last().copied()
    }
}

impl Navigator for MockNavigator {
    fn redirect(&self, destination: Destination) {
        if let Ok(mut redirects) = self.redirects.lock() {
            redirects.push(destination);
        }
    }
}

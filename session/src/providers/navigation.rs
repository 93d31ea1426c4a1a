//! Navigation sink.

use grievance_core::Destination;
use tokio::sync::mpsc;

/// Receiver of hard redirects.
///
/// A hard redirect replaces whatever the UI shell is showing; the manager
/// issues one after logout, lazy expiry and unauthorized API responses.
/// Redirects are fire-and-forget.
pub trait Navigator: Send + Sync {
    /// Navigate to `destination`, discarding the current view.
    fn redirect(&self, destination: Destination);
}

/// Forwards redirects into an unbounded channel.
///
/// The UI shell owns the receiving end and drives its router from it.
#[derive(Debug, Clone)]
pub struct ChannelNavigator {
    sender: mpsc::UnboundedSender<Destination>,
}

impl ChannelNavigator {
    /// Create a navigator and the receiver the shell listens on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Destination>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl Navigator for ChannelNavigator {
    fn redirect(&self, destination: Destination) {
        if self.sender.send(destination).is_err() {
            tracing::warn!(%destination, "Redirect dropped: navigation receiver is gone");
        }
    }
}

//! Connection state shared between the foreground and the receive task.

use std::sync::Arc;

use tokio::sync::watch;

/// Lifecycle of a command session's connection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Connected,
    Closing,
}

/// Watch-backed cell holding the current [`ConnectionState`].
///
/// Cloning shares the same cell. Readers never block writers.
#[derive(Debug, Clone)]
pub struct SharedState {
    tx: Arc<watch::Sender<ConnectionState>>,
}

impl Default for SharedState {
    fn default() -> Self {
        Self::new()
    }
}

impl SharedState {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ConnectionState::Disconnected);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn get(&self) -> ConnectionState {
        *self.tx.borrow()
    }

    /// Unconditionally moves to `to`.
    pub fn set(&self, to: ConnectionState) {
        let from = self.tx.send_replace(to);
        if from != to {
            tracing::debug!(?from, ?to, "Connection state transition");
        }
    }

    /// Moves to `to` only if the current state is `from`. Returns whether
    /// the transition happened.
    pub fn transition(&self, from: ConnectionState, to: ConnectionState) -> bool {
        let changed = self.tx.send_if_modified(|state| {
            if *state == from {
                *state = to;
                true
            } else {
                false
            }
        });
        if changed {
            tracing::debug!(?from, ?to, "Connection state transition");
        }
        changed
    }

    /// Receiver notified on every state change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_starts_disconnected() {
        assert_eq!(SharedState::new().get(), ConnectionState::Disconnected);
    }

    #[test]
    fn test_clones_share_state() {
        let state = SharedState::new();
        let other = state.clone();
        state.set(ConnectionState::Connected);
        assert_eq!(other.get(), ConnectionState::Connected);
    }

    #[test]
    fn test_transition_requires_expected_state() {
        let state = SharedState::new();
        assert!(!state.transition(ConnectionState::Connected, ConnectionState::Closing));
        assert_eq!(state.get(), ConnectionState::Disconnected);

        state.set(ConnectionState::Connected);
        assert!(state.transition(ConnectionState::Connected, ConnectionState::Closing));
        assert_eq!(state.get(), ConnectionState::Closing);
    }

    #[tokio::test]
    async fn test_subscriber_sees_change() {
        let state = SharedState::new();
        let mut rx = state.subscribe();
        state.set(ConnectionState::Connected);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), ConnectionState::Connected);
    }
}

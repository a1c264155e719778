//! One-shot UI events emitted by the storefront services.
//!
//! Front ends subscribe and render them (the CLI prints snackbars and
//! errors). Events sent while nobody listens are dropped.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Something the front end should show or do once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    ShowSnackbar(String),
    Navigate(String),
    NavigateBack,
    ShowError(String),
}

/// Fan-out channel for [`UiEvent`]s.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<UiEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Receive every event emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.sender.subscribe()
    }

    /// Emit an event.
    pub fn emit(&self, event: UiEvent) {
        if self.sender.send(event).is_err() {
            tracing::trace!("UI event dropped, no subscribers");
        }
    }

    pub fn snackbar(&self, message: impl Into<String>) {
        self.emit(UiEvent::ShowSnackbar(message.into()));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(UiEvent::ShowError(message.into()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_receive_events_in_order() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();
        bus.snackbar("hola");
        bus.emit(UiEvent::NavigateBack);
        assert_eq!(rx.recv().await.unwrap(), UiEvent::ShowSnackbar("hola".to_string()));
        assert_eq!(rx.recv().await.unwrap(), UiEvent::NavigateBack);
    }

    #[test]
    fn test_emit_without_subscribers_is_silent() {
        EventBus::new().error("nadie escucha");
    }
}

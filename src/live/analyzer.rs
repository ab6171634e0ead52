use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use crate::gateway::{ClassificationOutcome, Classifier};

/// Feedback events emitted towards the UI.
#[derive(Debug, Clone)]
pub enum LiveUpdate {
    /// Input went empty; hide any feedback.
    Cleared,
    /// Optimistic placeholder shown while the debounce timer runs.
    Analyzing,
    /// A classification round trip completed.
    Result(ClassificationOutcome),
}

/// Debounced live text analysis: `Idle -> Pending -> InFlight -> Idle`.
///
/// `input_changed` is called on every edit. It aborts the pending timer,
/// so bursts of keystrokes closer together than the debounce window
/// produce a single request, fired one window after the last keystroke.
/// A firing that lands while a request is already out is dropped rather
/// than queued, which keeps responses from arriving out of order.
pub struct LiveAnalyzer {
    classifier: Arc<dyn Classifier>,
    debounce: Duration,
    updates: mpsc::Sender<LiveUpdate>,
    pending: Option<JoinHandle<()>>,
    in_flight: Arc<AtomicBool>,
}

impl LiveAnalyzer {
    pub fn new(
        classifier: Arc<dyn Classifier>,
        debounce: Duration,
        updates: mpsc::Sender<LiveUpdate>,
    ) -> Self {
        Self {
            classifier,
            debounce,
            updates,
            pending: None,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Handle an input edit.
    pub fn input_changed(&mut self, text: &str) {
        // Supersede the previous keystroke's timer.
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }

        let trimmed = text.trim();
        if trimmed.is_empty() {
            let _ = self.updates.try_send(LiveUpdate::Cleared);
            return;
        }

        let _ = self.updates.try_send(LiveUpdate::Analyzing);

        let message = trimmed.to_string();
        let classifier = Arc::clone(&self.classifier);
        let in_flight = Arc::clone(&self.in_flight);
        let updates = self.updates.clone();
        let debounce = self.debounce;

        self.pending = Some(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;

            // A firing that lands while a request is out is dropped, not
            // queued; the next edit after completion starts over.
            if in_flight.swap(true, Ordering::SeqCst) {
                debug!("Debounce fired while a request was in flight, dropping");
                return;
            }

            // Detach the request: a later keystroke aborts only pending
            // timers, never a call already in flight.
            tokio::spawn(async move {
                let outcome = classifier.classify_text(&message).await;
                let _ = updates.send(LiveUpdate::Result(outcome)).await;
                in_flight.store(false, Ordering::SeqCst);
            });
        }));
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight.load(Ordering::SeqCst)
    }
}

impl Drop for LiveAnalyzer {
    fn drop(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

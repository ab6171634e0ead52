//! Live frequency visualization for active recordings
//!
//! The loop runs exactly while a session is recording: one repaint per
//! capture frame, each fully replacing the last. It ends deterministically
//! when the frame feed closes or the cancel flag flips; a tick after
//! teardown cannot happen because the loop owns no reference that
//! outlives it.

mod spectrum;

pub use spectrum::{render_bars, SpectrumAnalyzer};

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// Turn the session's raw frame feed into a feed of bar levels.
///
/// Returns the level receiver and the loop task. The task exits when the
/// frame channel closes (session stop drops the sender) or when `cancel`
/// is set, whichever comes first.
pub fn spawn_loop(
    analyzer: SpectrumAnalyzer,
    mut frames: mpsc::Receiver<Vec<i16>>,
    cancel: Arc<AtomicBool>,
) -> (mpsc::Receiver<Vec<f32>>, JoinHandle<()>) {
    let (levels_tx, levels_rx) = mpsc::channel(8);

    let task = tokio::spawn(async move {
        while let Some(samples) = frames.recv().await {
            if cancel.load(Ordering::SeqCst) {
                break;
            }

            let levels = analyzer.analyze(&samples);

            // Lossy on purpose: a stalled consumer skips frames rather
            // than building a backlog of stale paints.
            if levels_tx.try_send(levels).is_err() {
                debug!("Visualization consumer behind, skipping frame");
            }
        }
    });

    (levels_rx, task)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn loop_exits_when_frame_feed_closes() {
        let (frames_tx, frames_rx) = mpsc::channel(8);
        let cancel = Arc::new(AtomicBool::new(false));
        let (mut levels_rx, task) =
            spawn_loop(SpectrumAnalyzer::new(64, 8), frames_rx, cancel);

        frames_tx.send(vec![1000i16; 64]).await.unwrap();
        let levels = levels_rx.recv().await.unwrap();
        assert_eq!(levels.len(), 8);

        // Closing the feed is what stops the loop.
        drop(frames_tx);
        task.await.unwrap();
        assert!(levels_rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn cancel_flag_stops_the_loop_even_with_frames_pending() {
        let (frames_tx, frames_rx) = mpsc::channel(8);
        let cancel = Arc::new(AtomicBool::new(false));
        let (mut levels_rx, task) =
            spawn_loop(SpectrumAnalyzer::new(64, 8), frames_rx, Arc::clone(&cancel));

        cancel.store(true, Ordering::SeqCst);
        frames_tx.send(vec![1000i16; 64]).await.unwrap();

        // The next resumption observes the flag and exits without
        // painting the pending frame.
        task.await.unwrap();
        assert!(levels_rx.try_recv().is_err());
    }
}

// Tests for the debounced live text analyzer
//
// These run on a paused clock so the 800ms debounce window can be
// stepped through deterministically.

use spamscan::gateway::{ClassificationOutcome, Classifier, Label};
use spamscan::live::{LiveAnalyzer, LiveUpdate};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;

const DEBOUNCE: Duration = Duration::from_millis(800);

/// Scripted classifier that counts invocations and can simulate a slow
/// round trip.
struct CountingClassifier {
    calls: AtomicUsize,
    delay: Duration,
}

impl CountingClassifier {
    fn new(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            calls: AtomicUsize::new(0),
            delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Classifier for CountingClassifier {
    async fn classify_text(&self, _message: &str) -> ClassificationOutcome {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        ClassificationOutcome {
            ok: true,
            label: Some(Label::Spam),
            proba: Some(0.9),
            transcript: None,
            error: None,
        }
    }

    async fn classify_audio(&self, _wav_bytes: Vec<u8>, _filename: &str) -> ClassificationOutcome {
        ClassificationOutcome::failure("not used in these tests")
    }
}

/// Let spawned tasks catch up with the paused clock.
async fn settle() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

/// Step the paused clock. Settles first so a just-armed debounce timer
/// registers at the time of the keystroke that armed it, then settles
/// again so whatever fired gets to run.
async fn advance(duration: Duration) {
    settle().await;
    tokio::time::advance(duration).await;
    settle().await;
}

#[tokio::test(start_paused = true)]
async fn empty_input_issues_no_call() {
    let classifier = CountingClassifier::new(Duration::ZERO);
    let (tx, mut rx) = mpsc::channel(100);
    let mut analyzer = LiveAnalyzer::new(classifier.clone(), DEBOUNCE, tx);

    analyzer.input_changed("   \t  ");
    advance(Duration::from_secs(5)).await;

    assert_eq!(classifier.calls(), 0);
    assert!(matches!(rx.try_recv(), Ok(LiveUpdate::Cleared)));
}

#[tokio::test(start_paused = true)]
async fn keystroke_burst_yields_one_call_after_quiet_period() {
    let classifier = CountingClassifier::new(Duration::ZERO);
    let (tx, mut rx) = mpsc::channel(100);
    let mut analyzer = LiveAnalyzer::new(classifier.clone(), DEBOUNCE, tx);

    // Keystrokes arrive 300ms apart, well inside the debounce window.
    for text in ["W", "WI", "WIN"] {
        analyzer.input_changed(text);
        advance(Duration::from_millis(300)).await;
    }

    // 300ms have already passed since the last keystroke; the timer must
    // not fire until the full window has elapsed after it.
    assert_eq!(classifier.calls(), 0);

    advance(Duration::from_millis(499)).await;
    assert_eq!(classifier.calls(), 0);

    advance(Duration::from_millis(2)).await;
    assert_eq!(classifier.calls(), 1);

    // One Analyzing placeholder per keystroke, then a single result.
    let mut analyzing = 0;
    let mut results = 0;
    while let Ok(update) = rx.try_recv() {
        match update {
            LiveUpdate::Analyzing => analyzing += 1,
            LiveUpdate::Result(outcome) => {
                results += 1;
                assert!(outcome.ok);
            }
            LiveUpdate::Cleared => panic!("input never went empty"),
        }
    }
    assert_eq!(analyzing, 3);
    assert_eq!(results, 1);
}

#[tokio::test(start_paused = true)]
async fn firing_while_in_flight_is_dropped() {
    // Each round trip takes 10s, far longer than the debounce window.
    let classifier = CountingClassifier::new(Duration::from_secs(10));
    let (tx, mut rx) = mpsc::channel(100);
    let mut analyzer = LiveAnalyzer::new(classifier.clone(), DEBOUNCE, tx);

    analyzer.input_changed("first");
    advance(DEBOUNCE).await;
    assert_eq!(classifier.calls(), 1);
    assert!(analyzer.is_in_flight());

    // The next firing lands while the first request is still out.
    analyzer.input_changed("second");
    advance(DEBOUNCE).await;
    assert_eq!(classifier.calls(), 1, "in-flight firing must be dropped");

    // First request completes and its result is delivered.
    advance(Duration::from_secs(10)).await;
    assert!(!analyzer.is_in_flight());

    let mut results = 0;
    while let Ok(update) = rx.try_recv() {
        if matches!(update, LiveUpdate::Result(_)) {
            results += 1;
        }
    }
    assert_eq!(results, 1);

    // Latest wins after completion: a fresh edit goes through.
    analyzer.input_changed("third");
    advance(DEBOUNCE).await;
    assert_eq!(classifier.calls(), 2);
}

#[tokio::test(start_paused = true)]
async fn new_keystroke_cancels_pending_timer() {
    let classifier = CountingClassifier::new(Duration::ZERO);
    let (tx, _rx) = mpsc::channel(100);
    let mut analyzer = LiveAnalyzer::new(classifier.clone(), DEBOUNCE, tx);

    analyzer.input_changed("draft");
    advance(Duration::from_millis(799)).await;

    // Superseded one millisecond before it would have fired.
    analyzer.input_changed("draft!");
    advance(Duration::from_millis(2)).await;
    assert_eq!(classifier.calls(), 0);

    advance(DEBOUNCE).await;
    assert_eq!(classifier.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn clearing_input_cancels_pending_timer() {
    let classifier = CountingClassifier::new(Duration::ZERO);
    let (tx, mut rx) = mpsc::channel(100);
    let mut analyzer = LiveAnalyzer::new(classifier.clone(), DEBOUNCE, tx);

    analyzer.input_changed("almost");
    advance(Duration::from_millis(400)).await;
    analyzer.input_changed("");
    advance(Duration::from_secs(5)).await;

    assert_eq!(classifier.calls(), 0);

    let mut last = None;
    while let Ok(update) = rx.try_recv() {
        last = Some(update);
    }
    assert!(matches!(last, Some(LiveUpdate::Cleared)));
}

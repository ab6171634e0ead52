use crossterm::style::Stylize;
use std::io::{self, Write};

use crate::gateway::{ClassificationOutcome, Label};

/// Global activity indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indicator {
    Ready,
    Processing,
}

/// Visual class of a result banner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Ok,
    Warn,
    Err,
}

/// Map an outcome to its banner class and text.
///
/// Failures render as errors, spam as warnings, clean messages as
/// successes; confidence is shown as a percentage with one decimal when
/// the model exposes one. Pure, so rendering the same outcome twice
/// yields the same visible state.
pub fn banner(outcome: &ClassificationOutcome) -> (BannerKind, String) {
    if !outcome.ok {
        let message = outcome.error.as_deref().unwrap_or("Analysis failed");
        return (BannerKind::Err, format!("Error: {}", message));
    }

    let score = outcome
        .proba
        .map(|p| format!(" ({:.1}% confidence)", p * 100.0))
        .unwrap_or_default();

    match outcome.label {
        Some(Label::Spam) => (BannerKind::Warn, format!("Spam Detected{}", score)),
        Some(Label::Ham) => (BannerKind::Ok, format!("Clean Message{}", score)),
        None => (BannerKind::Err, "Error: Analysis failed".to_string()),
    }
}

/// Short-form line for live analysis.
///
/// `proba` is the spam probability, so the confidence shown for a clean
/// message is 100 minus the spam percentage. If the service ever starts
/// reporting P(predicted class) instead, this derivation is the one
/// place to change.
pub fn live_line(outcome: &ClassificationOutcome) -> String {
    if !outcome.ok {
        let message = outcome.error.as_deref().unwrap_or("Analysis failed");
        return format!("Error: {}", message);
    }

    match (outcome.label, outcome.proba) {
        (Some(Label::Spam), Some(p)) => format!("Spam ({:.1}%)", p * 100.0),
        (Some(Label::Spam), None) => "Spam".to_string(),
        (Some(Label::Ham), Some(p)) => format!("Clean ({:.1}%)", 100.0 - p * 100.0),
        (Some(Label::Ham), None) => "Clean".to_string(),
        (None, _) => "Analysis failed".to_string(),
    }
}

/// Terminal-side affordance state: busy lockout, activity indicator, and
/// banner/status rendering. Display-only; nothing here is persisted.
pub struct Feedback<W: Write> {
    out: W,
    busy: bool,
    indicator: Indicator,
}

impl<W: Write> Feedback<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            busy: false,
            indicator: Indicator::Ready,
        }
    }

    /// Busy lockout guarding against duplicate submission.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
    }

    pub fn indicator(&self) -> Indicator {
        self.indicator
    }

    pub fn set_indicator(&mut self, indicator: Indicator) -> io::Result<()> {
        self.indicator = indicator;

        let line = match indicator {
            Indicator::Ready => format!("{} Ready", "\u{25cf}".green()),
            Indicator::Processing => format!("{} Processing", "\u{25cf}".yellow()),
        };

        writeln!(self.out, "{}", line)?;
        self.out.flush()
    }

    /// Transient status line, overwritten in place.
    pub fn status(&mut self, text: &str) -> io::Result<()> {
        write!(self.out, "\r\x1b[2K{}", text.dim())?;
        self.out.flush()
    }

    pub fn clear_status(&mut self) -> io::Result<()> {
        write!(self.out, "\r\x1b[2K")?;
        self.out.flush()
    }

    pub fn render_banner(&mut self, outcome: &ClassificationOutcome) -> io::Result<()> {
        let (kind, text) = banner(outcome);

        let styled = match kind {
            BannerKind::Ok => text.green(),
            BannerKind::Warn => text.yellow(),
            BannerKind::Err => text.red(),
        };

        writeln!(self.out, "{}", styled)?;
        self.out.flush()
    }

    pub fn render_transcript(&mut self, transcript: &str) -> io::Result<()> {
        writeln!(self.out, "{}", "Transcript:".bold())?;
        writeln!(self.out, "  {}", transcript)?;
        self.out.flush()
    }
}

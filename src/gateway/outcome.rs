use serde::{Deserialize, Serialize};

/// Classification label returned by the prediction service.
///
/// Older deployments spell the clean label `NOT_SPAM`; both wire forms
/// decode to `Ham`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Label {
    #[serde(rename = "SPAM")]
    Spam,
    #[serde(rename = "HAM", alias = "NOT_SPAM")]
    Ham,
}

/// Normalized result of one classification round trip.
///
/// Produced only by the gateway and never mutated after receipt. Callers
/// branch on `ok` instead of handling errors: transport failures, decode
/// failures and service-reported errors all land here with `ok = false`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationOutcome {
    pub ok: bool,

    /// Predicted label, present when `ok` is true.
    #[serde(default)]
    pub label: Option<Label>,

    /// Spam probability in [0, 1], when the model exposes one.
    #[serde(default)]
    pub proba: Option<f64>,

    /// Transcript of the submitted audio, audio endpoint only.
    #[serde(default)]
    pub transcript: Option<String>,

    /// Human-readable failure message, present when `ok` is false.
    #[serde(default)]
    pub error: Option<String>,
}

impl ClassificationOutcome {
    /// Build a failed outcome from any error message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            label: None,
            proba: None,
            transcript: None,
            error: Some(message.into()),
        }
    }

    pub fn is_spam(&self) -> bool {
        self.label == Some(Label::Spam)
    }

    /// Ensure a failed outcome carries a message.
    pub fn normalized(mut self) -> Self {
        if !self.ok && self.error.is_none() {
            self.error = Some("Analysis failed".to_string());
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_spam_response() {
        let outcome: ClassificationOutcome =
            serde_json::from_str(r#"{"ok": true, "label": "SPAM", "proba": 0.97}"#).unwrap();

        assert!(outcome.ok);
        assert!(outcome.is_spam());
        assert_eq!(outcome.proba, Some(0.97));
        assert_eq!(outcome.transcript, None);
    }

    #[test]
    fn decodes_legacy_not_spam_label() {
        let outcome: ClassificationOutcome =
            serde_json::from_str(r#"{"ok": true, "label": "NOT_SPAM", "proba": 0.12}"#).unwrap();

        assert_eq!(outcome.label, Some(Label::Ham));
    }

    #[test]
    fn failure_carries_message() {
        let outcome = ClassificationOutcome::failure("model unavailable");

        assert!(!outcome.ok);
        assert_eq!(outcome.error.as_deref(), Some("model unavailable"));
    }

    #[test]
    fn normalized_fills_missing_error() {
        let outcome: ClassificationOutcome = serde_json::from_str(r#"{"ok": false}"#).unwrap();
        let outcome = outcome.normalized();

        assert_eq!(outcome.error.as_deref(), Some("Analysis failed"));
    }
}

//! Decision synthesis
//!
//! Turns the four analyzer results into one verdict. The reasoner proposes a
//! verdict from each analyzer's status and message; the priority rule is then
//! enforced locally so a failing high-priority check can never be accepted.
//!
//! Steps:
//! 1. All analyzers errored: flag_for_review without consulting the reasoner
//! 2. Ask the reasoner with a status/message summary in priority order
//! 3. Unparseable or verdict-less reply: flag_for_review
//! 4. Downgrade an accept that contradicts the dominant (highest-priority,
//!    non-error) signal

use super::result::{AnalyzerStatus, CombinedResult, Decision, Verdict};
use crate::reasoner::prompts::decision_prompt;
use crate::reasoner::{ParsedResponse, ReasonerClient};
use serde_json::{json, Value};
use std::sync::Arc;

/// Final-verdict synthesizer
#[derive(Debug, Clone)]
pub struct DecisionSynthesizer {
    reasoner: Arc<ReasonerClient>,
}

impl DecisionSynthesizer {
    /// Create a synthesizer backed by the shared reasoner
    pub fn new(reasoner: Arc<ReasonerClient>) -> Self {
        Self { reasoner }
    }

    /// Decide the outcome of one submission
    ///
    /// Never fails; the worst case is a flag_for_review decision.
    pub fn decide(&self, combined: &CombinedResult) -> Decision {
        if combined.all_errored() {
            log::warn!("Every analyzer errored; flagging for manual review");
            return Decision::new(
                Verdict::FlagForReview,
                "No analyzer produced a result (verification services unavailable); manual review required",
            );
        }

        let reply = self
            .reasoner
            .ask_json(&decision_prompt(&summarize(combined)), None);
        let proposed = interpret_reply(reply);
        let decision = enforce_priority(proposed, combined);

        log::info!("Decision: {} ({})", decision.verdict, decision.reason);
        decision
    }
}

/// Status/message summary in priority order; `detail` is left out
pub fn summarize(combined: &CombinedResult) -> String {
    let checks: Vec<Value> = combined
        .iter()
        .map(|(name, result)| {
            json!({
                "check": name.as_str(),
                "priority": name.priority_label(),
                "status": result.status.as_str(),
                "message": result.message,
            })
        })
        .collect();

    // Serializing a Vec<Value> cannot fail
    serde_json::to_string_pretty(&checks).unwrap_or_default()
}

/// Read the reasoner's proposed verdict
pub fn interpret_reply(reply: ParsedResponse) -> Decision {
    let map = match reply {
        ParsedResponse::Json(map) => map,
        ParsedResponse::Raw(text) => {
            log::warn!("Decision reply is not JSON; flagging for review");
            return Decision::new(Verdict::FlagForReview, text);
        }
    };

    let verdict = map
        .get("decision")
        .and_then(Value::as_str)
        .and_then(Verdict::parse_lenient);

    match verdict {
        Some(verdict) => {
            let reason = map
                .get("reason")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            Decision::new(verdict, reason)
        }
        None => {
            log::warn!("Decision reply carries no usable verdict; flagging for review");
            let reason = match map.get("message").and_then(Value::as_str) {
                Some(message) => message.to_string(),
                None => Value::Object(map).to_string(),
            };
            Decision::new(Verdict::FlagForReview, reason)
        }
    }
}

/// Downgrade an accept that contradicts the dominant signal
///
/// The dominant signal is the first non-error result in priority order
/// (OCR, Metadata, ImageArtifact, Forensics).
pub fn enforce_priority(decision: Decision, combined: &CombinedResult) -> Decision {
    if decision.verdict != Verdict::Accept {
        return decision;
    }
    let Some((name, dominant)) = combined.dominant() else {
        return decision;
    };

    let downgraded = match dominant.status {
        AnalyzerStatus::Fail => Verdict::Deny,
        AnalyzerStatus::FlagForReview => Verdict::FlagForReview,
        _ => return decision,
    };

    log::warn!(
        "Overriding accept to {}: {} check reported {}",
        downgraded,
        name,
        dominant.status
    );
    let reason = if decision.reason.is_empty() {
        format!("{} check reported {}", name, dominant.status)
    } else {
        format!(
            "{} [overridden: {} check reported {}]",
            decision.reason, name, dominant.status
        )
    };
    Decision::new(downgraded, reason)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::result::AnalyzerStatus::{Error, Fail, FlagForReview, Success};
    use crate::analysis::result::{AnalyzerName, AnalyzerResult};
    use crate::reasoner::parse_best_effort;

    fn combined(statuses: [AnalyzerStatus; 4]) -> CombinedResult {
        CombinedResult::from_results(
            AnalyzerName::ALL
                .into_iter()
                .zip(statuses)
                .map(|(name, status)| (name, AnalyzerResult::new(status))),
        )
    }

    #[test]
    fn test_ocr_fail_blocks_accept() {
        let results = combined([Fail, Success, Success, Success]);
        let decision = enforce_priority(Decision::new(Verdict::Accept, "looks fine"), &results);
        assert_eq!(decision.verdict, Verdict::Deny);
        assert!(decision.reason.contains("OCR check reported fail"));
    }

    #[test]
    fn test_dominant_flag_downgrades_accept() {
        let results = combined([Error, FlagForReview, Fail, Success]);
        let decision = enforce_priority(Decision::new(Verdict::Accept, ""), &results);
        assert_eq!(decision.verdict, Verdict::FlagForReview);
        assert_eq!(decision.reason, "Metadata check reported flag_for_review");
    }

    #[test]
    fn test_consistent_accept_is_kept() {
        let results = combined([Success, Fail, Fail, Fail]);
        let decision = enforce_priority(Decision::new(Verdict::Accept, "OCR matches"), &results);
        assert_eq!(decision, Decision::new(Verdict::Accept, "OCR matches"));
    }

    #[test]
    fn test_deny_is_never_upgraded() {
        let results = combined([Success, Success, Success, Success]);
        let decision = enforce_priority(Decision::new(Verdict::Deny, "photo swapped"), &results);
        assert_eq!(decision.verdict, Verdict::Deny);
    }

    #[test]
    fn test_interpret_reply_variants() {
        let accepted = interpret_reply(parse_best_effort(
            r#"{"decision":"accept","reason":"All checks passed"}"#,
        ));
        assert_eq!(accepted, Decision::new(Verdict::Accept, "All checks passed"));

        let flagged = interpret_reply(parse_best_effort(r#"{"decision":"Flag for review"}"#));
        assert_eq!(flagged.verdict, Verdict::FlagForReview);

        let raw = interpret_reply(parse_best_effort("cannot decide"));
        assert_eq!(raw, Decision::new(Verdict::FlagForReview, "cannot decide"));

        let unavailable = interpret_reply(parse_best_effort(
            r#"{"status":"fail","message":"API call failed after 3 attempts, endpoint http://x"}"#,
        ));
        assert_eq!(unavailable.verdict, Verdict::FlagForReview);
        assert_eq!(
            unavailable.reason,
            "API call failed after 3 attempts, endpoint http://x"
        );
    }

    #[test]
    fn test_summary_omits_detail() {
        let results = CombinedResult::from_results(vec![(
            AnalyzerName::Ocr,
            AnalyzerResult::new(Success)
                .with_message("names match")
                .with_detail("secret_field", "do not forward"),
        )]);
        let summary = summarize(&results);

        assert!(summary.contains("names match"));
        assert!(!summary.contains("do not forward"));
        let ocr = summary.find("\"OCR\"").unwrap();
        let forensics = summary.find("\"Forensics\"").unwrap();
        assert!(ocr < forensics);
    }
}

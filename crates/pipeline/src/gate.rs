//! Retrieval confidence gate
//!
//! The single hallucination-prevention checkpoint: generation runs only
//! when retrieval evidence is strong enough, otherwise the request
//! escalates to a human handoff. Confidence is the maximum finite score
//! across the retrieved results.

use polyglot_index::SearchResult;
use tracing::debug;

/// Default minimum confidence required to generate an answer
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 0.5;

/// Outcome of gating a retrieval result set
#[derive(Debug)]
pub enum GateDecision {
    /// Evidence is strong enough to generate from
    Proceed {
        results: Vec<SearchResult>,
        confidence: f32,
    },
    /// Escalate to the human handoff
    Escalate,
}

/// Thresholds retrieval scores to decide answer-vs-escalate
#[derive(Debug, Clone)]
pub struct ConfidenceGate {
    threshold: f32,
}

impl Default for ConfidenceGate {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
        }
    }
}

impl ConfidenceGate {
    pub fn new(threshold: f32) -> Self {
        Self { threshold }
    }

    /// Maximum finite score across the results; 0 when none exists
    pub fn confidence(results: &[SearchResult]) -> f32 {
        results
            .iter()
            .map(|r| r.score)
            .filter(|s| s.is_finite())
            .fold(None, |best: Option<f32>, s| {
                Some(best.map_or(s, |b| b.max(s)))
            })
            .unwrap_or(0.0)
    }

    /// Decide whether to generate or escalate
    pub fn gate(&self, results: Vec<SearchResult>) -> GateDecision {
        if results.is_empty() {
            debug!("No retrieval results, escalating");
            return GateDecision::Escalate;
        }

        let confidence = Self::confidence(&results);
        if confidence < self.threshold {
            debug!(
                confidence,
                threshold = self.threshold,
                "Retrieval confidence below threshold, escalating"
            );
            return GateDecision::Escalate;
        }

        debug!(confidence, "Retrieval confidence sufficient");
        GateDecision::Proceed {
            results,
            confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyglot_index::Metadata;

    fn result(score: f32) -> SearchResult {
        SearchResult {
            text: "passage".to_string(),
            metadata: Metadata::new(),
            score,
        }
    }

    #[test]
    fn test_proceeds_on_high_confidence() {
        let gate = ConfidenceGate::default();
        match gate.gate(vec![result(0.9), result(0.3)]) {
            GateDecision::Proceed {
                results,
                confidence,
            } => {
                assert_eq!(results.len(), 2);
                assert!((confidence - 0.9).abs() < 1e-6);
            }
            GateDecision::Escalate => panic!("expected Proceed"),
        }
    }

    #[test]
    fn test_escalates_on_empty_results() {
        let gate = ConfidenceGate::default();
        assert!(matches!(gate.gate(vec![]), GateDecision::Escalate));
    }

    #[test]
    fn test_escalates_below_threshold() {
        let gate = ConfidenceGate::default();
        assert!(matches!(
            gate.gate(vec![result(0.4)]),
            GateDecision::Escalate
        ));
    }

    #[test]
    fn test_nan_scores_excluded() {
        assert_eq!(
            ConfidenceGate::confidence(&[result(f32::NAN), result(0.7)]),
            0.7
        );
        assert_eq!(ConfidenceGate::confidence(&[result(f32::NAN)]), 0.0);
    }

    #[test]
    fn test_custom_threshold() {
        let gate = ConfidenceGate::new(0.3);
        assert!(matches!(
            gate.gate(vec![result(0.4)]),
            GateDecision::Proceed { .. }
        ));
    }
}

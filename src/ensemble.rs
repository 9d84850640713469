//! Weighted fusion of signal scores.

use serde::{Deserialize, Serialize};

use crate::intent::Intent;
use crate::signal::{ScoreMap, SignalKind};

/// Per-slot fusion weights.
///
/// The weights express relative trust, not a probability split: fused
/// scores are deliberately not renormalized, so a lone keyword hit yields
/// a lone low-confidence result rather than a false certainty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnsembleConfig {
    /// Weight of learned signals (word weights, neural hybrid).
    pub ml: f64,
    /// Weight of the conversational transition signal.
    pub context: f64,
    /// Weight of the regex pattern signal.
    pub pattern: f64,
    /// Weight of the keyword signal.
    pub keyword: f64,
}

impl Default for EnsembleConfig {
    fn default() -> Self {
        EnsembleConfig {
            ml: 0.4,
            context: 0.3,
            pattern: 0.2,
            keyword: 0.1,
        }
    }
}

impl EnsembleConfig {
    /// Weight for the given slot.
    pub fn weight(&self, kind: SignalKind) -> f64 {
        match kind {
            SignalKind::Ml => self.ml,
            SignalKind::Context => self.context,
            SignalKind::Pattern => self.pattern,
            SignalKind::Keyword => self.keyword,
        }
    }
}

/// Outcome of fusing one utterance's signal emissions.
#[derive(Debug, Clone)]
pub struct EnsembleDecision {
    /// Winning intent.
    pub intent: Intent,
    /// Winning fused score, capped at 1.0.
    pub confidence: f64,
    /// Full fused score map, uncapped.
    pub scores: ScoreMap,
}

impl EnsembleDecision {
    fn unknown() -> Self {
        EnsembleDecision {
            intent: Intent::Unknown,
            confidence: 0.0,
            scores: ScoreMap::new(),
        }
    }

    /// All scored intents, best first. Ties keep declaration order.
    pub fn ranked(&self) -> Vec<(Intent, f64)> {
        let mut ranked: Vec<(Intent, f64)> = Intent::ALL
            .iter()
            .filter_map(|intent| self.scores.get(intent).map(|s| (*intent, *s)))
            .collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}

/// Fuses signal emissions into a single decision.
#[derive(Debug, Clone, Default)]
pub struct Ensemble {
    config: EnsembleConfig,
}

impl Ensemble {
    pub fn new(config: EnsembleConfig) -> Self {
        Self { config }
    }

    /// Fuse the emissions of one classification pass.
    ///
    /// Emissions of the same kind are averaged intent-wise before their
    /// slot weight applies, so adding a second learned signal refines the
    /// learned opinion instead of doubling its vote. Abstaining signals are
    /// simply absent. With no emissions at all the result is `Unknown`
    /// at zero confidence.
    pub fn fuse(&self, emissions: &[(SignalKind, ScoreMap)]) -> EnsembleDecision {
        if emissions.is_empty() {
            return EnsembleDecision::unknown();
        }

        let mut fused = ScoreMap::new();
        for kind in [
            SignalKind::Pattern,
            SignalKind::Keyword,
            SignalKind::Context,
            SignalKind::Ml,
        ] {
            let maps: Vec<&ScoreMap> = emissions
                .iter()
                .filter(|(k, _)| *k == kind)
                .map(|(_, m)| m)
                .collect();
            if maps.is_empty() {
                continue;
            }

            let weight = self.config.weight(kind);
            let count = maps.len() as f64;
            for map in maps {
                for (intent, score) in map {
                    *fused.entry(*intent).or_insert(0.0) += weight * score / count;
                }
            }
        }

        // Deterministic argmax: declaration order breaks ties.
        let mut best: Option<(Intent, f64)> = None;
        for intent in Intent::ALL {
            if let Some(score) = fused.get(&intent) {
                if best.is_none_or(|(_, b)| *score > b) {
                    best = Some((intent, *score));
                }
            }
        }

        match best {
            Some((intent, score)) => EnsembleDecision {
                intent,
                confidence: score.min(1.0),
                scores: fused,
            },
            None => EnsembleDecision::unknown(),
        }
    }
}

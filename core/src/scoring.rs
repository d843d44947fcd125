//! Decision scoring.
//!
//! A decision's score is the weighted sum of its risk, reward and
//! realism metrics (each 0..=10) scaled to 0..=100. Weights are held in
//! hundredths so the result is exact integer arithmetic; the weighted
//! sum is truncated toward zero.

use crate::config::{ScoreThresholds, ScoringConfig};
use serde::{Deserialize, Serialize};

/// Upper bound of each decision metric. Larger inputs are clamped.
pub const METRIC_MAX: u32 = 10;
pub const SCORE_MAX: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackTier {
    Excellent,
    Good,
    Average,
    Poor,
}

impl FeedbackTier {
    pub fn message(&self) -> &'static str {
        match self {
            Self::Excellent => "🌟 Excellent Decision!",
            Self::Good => "👍 Good Choice!",
            Self::Average => "🤔 Acceptable, but could be better",
            Self::Poor => "⚠️ Risky Decision - Review your strategy",
        }
    }
}

/// Advisory notes shown alongside a scored decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Insight {
    HighRisk,
    LowReward,
    LowRealism,
}

impl Insight {
    pub fn message(&self) -> &'static str {
        match self {
            Self::HighRisk => "⚠️ High-risk decisions can lead to big rewards, but also big losses. Consider balancing with safer options.",
            Self::LowReward => "💭 Low reward options are safe but might limit growth. Look for opportunities to scale up.",
            Self::LowRealism => "🤔 This decision might not be very realistic in rural contexts. Always consider local conditions and resources.",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Scorer {
    /// (risk, reward, realism) in hundredths; sums to 100.
    weights:    (u32, u32, u32),
    thresholds: ScoreThresholds,
}

impl Default for Scorer {
    fn default() -> Self {
        Self {
            weights:    (30, 40, 30),
            thresholds: ScoreThresholds { excellent: 80, good: 60, average: 40 },
        }
    }
}

impl Scorer {
    /// Build from validated configuration (see `GameConfig::validate`).
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            weights:    config.weights.hundredths(),
            thresholds: config.thresholds,
        }
    }

    pub fn score(&self, risk: u32, reward: u32, realism: u32) -> u32 {
        let (wr, ww, wl) = self.weights;
        let weighted = risk.min(METRIC_MAX) * wr
            + reward.min(METRIC_MAX) * ww
            + realism.min(METRIC_MAX) * wl;
        // weighted is in hundredths of a 0..=10 scale; x10 / 100 == / 10
        weighted / 10
    }

    /// Inclusive lower bounds: >= excellent, >= good, >= average, else poor.
    pub fn classify(&self, score: u32) -> FeedbackTier {
        let t = &self.thresholds;
        if score >= t.excellent {
            FeedbackTier::Excellent
        } else if score >= t.good {
            FeedbackTier::Good
        } else if score >= t.average {
            FeedbackTier::Average
        } else {
            FeedbackTier::Poor
        }
    }
}

/// High risk (> 7) takes precedence over low reward (< 5); low realism
/// (< 6) is reported independently.
pub fn insights(risk: u32, reward: u32, realism: u32) -> Vec<Insight> {
    let mut notes = Vec::new();
    if risk > 7 {
        notes.push(Insight::HighRisk);
    } else if reward < 5 {
        notes.push(Insight::LowReward);
    }
    if realism < 6 {
        notes.push(Insight::LowRealism);
    }
    notes
}

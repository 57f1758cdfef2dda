//! Value-investing scorecard types
//!
//! The analysis agent fills in a [`ValuationScores`] from the collected data
//! bundle; [`ValuationScores::decide`] maps it to a discrete decision. Hard
//! stops short-circuit the weighted total: a business the rubric cannot
//! understand or defend is a pass regardless of how cheap it looks.

use serde::{Deserialize, Serialize};

/// Minimum competence score before the weighted total is even computed
pub const COMPETENCE_FLOOR: f64 = 0.5;
/// Minimum moat score before the weighted total is even computed
pub const MOAT_FLOOR: f64 = 0.4;
/// Weighted total at or above this maps to [`Decision::SatinAl`]
pub const BUY_THRESHOLD: f64 = 0.70;
/// Weighted total at or above this maps to [`Decision::Izle`]
pub const WATCH_THRESHOLD: f64 = 0.45;

/// Discrete investment decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Decision {
    /// Buy: durable moat and a sufficient safety margin
    #[serde(rename = "SATIN AL")]
    SatinAl,
    /// Watch: quality business, insufficient safety margin
    #[serde(rename = "İZLE")]
    Izle,
    /// Pass: outside the circle of competence, no moat, or overvalued
    #[serde(rename = "PAS")]
    Pas,
}

impl Decision {
    /// Turkish label as shown to the user
    pub fn label(&self) -> &'static str {
        match self {
            Decision::SatinAl => "SATIN AL",
            Decision::Izle => "İZLE",
            Decision::Pas => "PAS",
        }
    }
}

/// Rubric scores produced by the analysis agent, each in [0, 1]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationScores {
    /// How well the business fits the circle of competence
    pub competence: f64,

    /// Durability of the competitive advantage
    pub moat: f64,

    /// Quality and persistence of reported earnings
    #[serde(default)]
    pub earnings_quality: f64,

    /// Safety margin of price versus intrinsic value
    #[serde(default)]
    pub safety_margin: f64,

    /// Conviction-adjusted position sizing score
    #[serde(default)]
    pub position_sizing: f64,

    /// Owner earnings in the reporting currency; non-positive is a hard stop
    pub owner_earnings: f64,
}

impl ValuationScores {
    /// Weighted total over the five rubric scores
    ///
    /// Moat and safety margin dominate; position sizing is a tiebreaker.
    pub fn weighted_total(&self) -> f64 {
        self.competence * 0.15
            + self.moat * 0.30
            + self.earnings_quality * 0.20
            + self.safety_margin * 0.25
            + self.position_sizing * 0.10
    }

    /// Whether any hard-stop condition holds
    pub fn hard_stop(&self) -> bool {
        self.owner_earnings <= 0.0
            || self.competence < COMPETENCE_FLOOR
            || self.moat < MOAT_FLOOR
    }

    /// Map the scorecard to a decision
    ///
    /// Hard stops force [`Decision::Pas`] without computing the total.
    pub fn decide(&self) -> Decision {
        if self.hard_stop() {
            return Decision::Pas;
        }
        let total = self.weighted_total();
        if total >= BUY_THRESHOLD {
            Decision::SatinAl
        } else if total >= WATCH_THRESHOLD {
            Decision::Izle
        } else {
            Decision::Pas
        }
    }
}

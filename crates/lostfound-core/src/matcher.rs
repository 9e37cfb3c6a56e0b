//! Match engine pairing lost reports with found reports.
//!
//! The engine is a pure function over two report slices. It holds no state,
//! performs no I/O and never mutates its inputs; every [`MatchCandidate`]
//! borrows the two reports it pairs.
//!
//! # Scoring Algorithm
//!
//! 1. Enumerate the full cross product, lost-major: `(l0,f0), (l0,f1), …, (l1,f0), …`.
//! 2. Score each pair as the sum of the signals that hold:
//!    - name overlap (`+0.5`): either lowercase name contains the other,
//!    - description overlap (`+0.3`): same test on descriptions,
//!    - location equality (`+0.2`): lowercase locations are equal.
//! 3. Clamp to `[0.0, 1.0]`.
//! 4. Stable sort by score (desc); equal scores keep enumeration order.
//! 5. Truncate to `limit`.
//!
//! Empty strings are substrings of every string, so two reports with empty
//! descriptions earn the description signal. That is the default behavior;
//! [`MatchParams::require_non_empty`] switches it off.

use serde::Serialize;

use crate::models::ItemReport;

/// Weight of the name overlap signal.
pub const NAME_WEIGHT: f64 = 0.5;
/// Weight of the description overlap signal.
pub const DESCRIPTION_WEIGHT: f64 = 0.3;
/// Weight of the location equality signal.
pub const LOCATION_WEIGHT: f64 = 0.2;

/// Score at which a candidate counts as a certain match.
///
/// Presentation layers only offer direct contact with the finder for
/// candidates at or above this value.
pub const CERTAIN_MATCH_THRESHOLD: f64 = 1.0;

/// Number of candidates returned when no limit is configured.
pub const DEFAULT_MATCH_LIMIT: usize = 5;

/// Tuning for a single matcher invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchParams {
    /// Maximum number of candidates to return.
    pub limit: usize,
    /// When true, the containment signals only fire if both operands are
    /// non-empty.
    pub require_non_empty: bool,
    /// If true, populate [`MatchCandidate::signals`].
    pub explain: bool,
}

impl Default for MatchParams {
    fn default() -> Self {
        Self {
            limit: DEFAULT_MATCH_LIMIT,
            require_non_empty: false,
            explain: false,
        }
    }
}

/// Which signals fired for a pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SignalBreakdown {
    pub name: bool,
    pub description: bool,
    pub location: bool,
}

impl SignalBreakdown {
    /// Sum of the weights of the signals that fired, clamped to `1.0`.
    pub fn score(&self) -> f64 {
        let mut score = 0.0;
        if self.name {
            score += NAME_WEIGHT;
        }
        if self.description {
            score += DESCRIPTION_WEIGHT;
        }
        if self.location {
            score += LOCATION_WEIGHT;
        }
        score.clamp(0.0, 1.0)
    }
}

/// A scored pairing of one lost report with one found report.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchCandidate<'a> {
    pub lost_report: &'a ItemReport,
    pub found_report: &'a ItemReport,
    /// Composite score in `[0.0, 1.0]`.
    pub score: f64,
    /// Signal breakdown (populated when `explain` is true).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signals: Option<SignalBreakdown>,
}

impl MatchCandidate<'_> {
    /// True when the score reaches [`CERTAIN_MATCH_THRESHOLD`].
    pub fn is_certain(&self) -> bool {
        self.score >= CERTAIN_MATCH_THRESHOLD
    }
}

/// Evaluate the three signals for one pair.
pub fn evaluate_signals(
    lost: &ItemReport,
    found: &ItemReport,
    require_non_empty: bool,
) -> SignalBreakdown {
    SignalBreakdown {
        name: overlaps(&lost.name, &found.name, require_non_empty),
        description: overlaps(&lost.description, &found.description, require_non_empty),
        location: lost.location.to_lowercase() == found.location.to_lowercase(),
    }
}

/// Score one pair with the default (legacy) empty-field policy.
pub fn score_pair(lost: &ItemReport, found: &ItemReport) -> f64 {
    evaluate_signals(lost, found, false).score()
}

/// Symmetric case-insensitive containment: either string contains the other.
fn overlaps(a: &str, b: &str, require_non_empty: bool) -> bool {
    if require_non_empty && (a.is_empty() || b.is_empty()) {
        return false;
    }
    let a = a.to_lowercase();
    let b = b.to_lowercase();
    a.contains(&b) || b.contains(&a)
}

/// Rank candidate pairings between `lost` and `found` reports.
///
/// Returns at most `params.limit` candidates, sorted by score descending.
/// Never fails; empty input on either side yields an empty result.
pub fn match_reports<'a>(
    lost: &'a [ItemReport],
    found: &'a [ItemReport],
    params: &MatchParams,
) -> Vec<MatchCandidate<'a>> {
    let mut candidates: Vec<MatchCandidate<'a>> = lost
        .iter()
        .flat_map(|l| {
            found.iter().map(move |f| {
                let signals = evaluate_signals(l, f, params.require_non_empty);
                MatchCandidate {
                    lost_report: l,
                    found_report: f,
                    score: signals.score(),
                    signals: params.explain.then_some(signals),
                }
            })
        })
        .collect();

    tracing::debug!(
        lost = lost.len(),
        found = found.len(),
        pairs = candidates.len(),
        "scored report pairs"
    );

    // `sort_by` is stable, which keeps ties in enumeration order.
    candidates.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    candidates.truncate(params.limit);
    candidates
}

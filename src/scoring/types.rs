use serde::{Deserialize, Serialize};

/// Default similarity at or above which a response lands in [`Tier::Tier2`].
pub const DEFAULT_T_LOW: f32 = 0.4;
/// Default similarity at or above which a response lands in [`Tier::Tier3`].
pub const DEFAULT_T_HIGH: f32 = 0.8;

/// Difficulty bracket, ordered by increasing similarity threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Tier {
    Tier1,
    Tier2,
    Tier3,
}

impl Tier {
    /// All tiers, lowest first.
    pub const ALL: [Tier; 3] = [Tier::Tier1, Tier::Tier2, Tier::Tier3];

    /// Tier every word starts in (and returns to on reload).
    pub const LOWEST: Tier = Tier::Tier1;

    #[inline]
    pub fn index(self) -> usize {
        match self {
            Tier::Tier1 => 0,
            Tier::Tier2 => 1,
            Tier::Tier3 => 2,
        }
    }

    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Tier::Tier1 => "tier1",
            Tier::Tier2 => "tier2",
            Tier::Tier3 => "tier3",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step function from similarity to [`Tier`].
///
/// `sim >= t_high` is Tier3, `t_low <= sim < t_high` is Tier2, anything lower is Tier1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TierThresholds {
    pub t_low: f32,
    pub t_high: f32,
}

impl Default for TierThresholds {
    fn default() -> Self {
        Self {
            t_low: DEFAULT_T_LOW,
            t_high: DEFAULT_T_HIGH,
        }
    }
}

impl TierThresholds {
    pub fn new(t_low: f32, t_high: f32) -> Self {
        Self { t_low, t_high }
    }

    /// Both finite, within `[-1, 1]`, and `t_low <= t_high`.
    pub fn is_valid(&self) -> bool {
        self.t_low.is_finite()
            && self.t_high.is_finite()
            && (-1.0..=1.0).contains(&self.t_low)
            && (-1.0..=1.0).contains(&self.t_high)
            && self.t_low <= self.t_high
    }

    #[inline]
    pub fn classify(&self, similarity: f32) -> Tier {
        if similarity >= self.t_high {
            Tier::Tier3
        } else if similarity >= self.t_low {
            Tier::Tier2
        } else {
            Tier::Tier1
        }
    }
}

/// Output of one similarity computation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Cosine similarity in `[-1, 1]`.
    pub similarity: f32,
    pub tier: Tier,
    /// `trunc(similarity * 10)`, the integer score shown to players.
    pub points: i32,
}

impl ScoreResult {
    pub fn new(similarity: f32, thresholds: &TierThresholds) -> Self {
        Self {
            similarity,
            tier: thresholds.classify(similarity),
            points: similarity_points(similarity),
        }
    }
}

#[inline]
pub fn similarity_points(similarity: f32) -> i32 {
    (similarity * 10.0).trunc() as i32
}

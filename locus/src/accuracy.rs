//! Discrete accuracy tiers and the fallback ladder.
//!
//! The engine selects providers by accuracy tier rather than by raw
//! numeric accuracy. The six tiers are totally ordered from finest to
//! coarsest, and each tier defines the order in which other tiers are
//! tried when its own provider fails.

use std::fmt;
use std::time::Duration;

/// A discrete, ordered category of expected horizontal accuracy.
///
/// Ordering is finest first: `Navigation < Best < ... < ThreeKilometers`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AccuracyTier {
    /// Sub-meter target (~0.5 m), turn-by-turn navigation grade.
    Navigation,
    /// Best available (~5 m target).
    Best,
    /// Ten meters target.
    TenMeters,
    /// Hundred meters target.
    HundredMeters,
    /// One kilometer target.
    Kilometer,
    /// Three kilometers target, the coarsest tier.
    ThreeKilometers,
}

impl AccuracyTier {
    /// All tiers ordered from finest to coarsest.
    pub const ALL: [AccuracyTier; 6] = [
        AccuracyTier::Navigation,
        AccuracyTier::Best,
        AccuracyTier::TenMeters,
        AccuracyTier::HundredMeters,
        AccuracyTier::Kilometer,
        AccuracyTier::ThreeKilometers,
    ];

    /// Target horizontal accuracy for this tier, in meters.
    pub fn target_accuracy_m(self) -> f64 {
        match self {
            AccuracyTier::Navigation => 0.5,
            AccuracyTier::Best => 5.0,
            AccuracyTier::TenMeters => 10.0,
            AccuracyTier::HundredMeters => 100.0,
            AccuracyTier::Kilometer => 1_000.0,
            AccuracyTier::ThreeKilometers => 3_000.0,
        }
    }

    /// Dense index of this tier, finest = 0.
    pub fn index(self) -> usize {
        match self {
            AccuracyTier::Navigation => 0,
            AccuracyTier::Best => 1,
            AccuracyTier::TenMeters => 2,
            AccuracyTier::HundredMeters => 3,
            AccuracyTier::Kilometer => 4,
            AccuracyTier::ThreeKilometers => 5,
        }
    }

    /// Map a numeric accuracy request to a tier.
    ///
    /// Picks the finest tier whose target does not exceed the requested
    /// value, i.e. the nearest tier at or below the request. Requests
    /// finer than every tier fall back to the coarsest.
    pub fn from_meters(meters: f64) -> Self {
        for tier in Self::ALL.iter().rev() {
            if tier.target_accuracy_m() <= meters {
                return *tier;
            }
        }
        AccuracyTier::ThreeKilometers
    }

    /// The fallback ladder for this tier.
    ///
    /// Starts at the tier itself, walks toward coarser tiers in order,
    /// and only then retries finer tiers, nearest first.
    pub fn fallback_ladder(self) -> Vec<AccuracyTier> {
        let start = self.index();
        let mut ladder = Vec::with_capacity(Self::ALL.len());
        ladder.extend_from_slice(&Self::ALL[start..]);
        ladder.extend(Self::ALL[..start].iter().rev());
        ladder
    }

    /// Reasonable per-request timeout for providers serving this tier.
    ///
    /// Fine tiers are expected to be local sensors (fast or dead),
    /// coarse tiers are expected to be network lookups.
    pub fn suggested_timeout(self) -> Duration {
        match self {
            AccuracyTier::Navigation | AccuracyTier::Best | AccuracyTier::TenMeters => {
                Duration::from_secs(5)
            }
            _ => Duration::from_secs(30),
        }
    }
}

impl fmt::Display for AccuracyTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccuracyTier::Navigation => write!(f, "navigation"),
            AccuracyTier::Best => write!(f, "best"),
            AccuracyTier::TenMeters => write!(f, "10m"),
            AccuracyTier::HundredMeters => write!(f, "100m"),
            AccuracyTier::Kilometer => write!(f, "1km"),
            AccuracyTier::ThreeKilometers => write!(f, "3km"),
        }
    }
}

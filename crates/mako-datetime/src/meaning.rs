//! What a timestamp means to the system that produced or consumes it.
//!
//! Two layers live here:
//!
//! - [`TimestampMeaning`] / [`ConversionPlan`] — the flag-based records as
//!   they arrive from an external description (usually JSON). They can be
//!   inconsistent, so they expose `is_valid()` predicates.
//! - [`Semantics`] / [`ValidatedPlan`] — the typed form. A day-awareness flag
//!   only exists for gas and an end kind only exists for end dates, so an
//!   inconsistent value cannot be built.
//!
//! # Example
//!
//! ```
//! use mako_datetime::{ConversionPlan, EndKind, TimestampMeaning};
//!
//! let plan = ConversionPlan {
//!     source: TimestampMeaning::end_date(EndKind::Inclusive),
//!     target: TimestampMeaning::end_date(EndKind::Exclusive),
//! };
//! assert!(plan.is_valid());
//! assert_eq!(plan.invert().source, plan.target);
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{ConversionError, Result};

// ── EndKind ─────────────────────────────────────────────────────────────────

/// How an end-of-interval timestamp is to be understood.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum EndKind {
    /// The timestamp is the last instant still included,
    /// e.g. `2022-10-31` for the end of October.
    Inclusive,
    /// The timestamp is the first instant no longer included,
    /// e.g. `2022-11-01` for the end of October.
    Exclusive,
}

impl fmt::Display for EndKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndKind::Inclusive => f.write_str("Inclusive"),
            EndKind::Exclusive => f.write_str("Exclusive"),
        }
    }
}

impl FromStr for EndKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "inclusive" => Ok(EndKind::Inclusive),
            "exclusive" => Ok(EndKind::Exclusive),
            _ => Err(ConversionError::InvalidConfiguration(format!(
                "unknown end date kind '{s}' (expected 'Inclusive' or 'Exclusive')"
            ))),
        }
    }
}

// Upstream systems disagree on casing ("EXCLUSIVE", "Exclusive").
impl<'de> Deserialize<'de> for EndKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

// ── TimestampMeaning ────────────────────────────────────────────────────────

/// Flag-based description of one side of a conversion.
///
/// Valid iff `end_kind` is present exactly when `is_end_date` is set, and
/// `gas_day_aware` is present exactly when `is_gas` is set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct TimestampMeaning {
    /// The timestamp is the end of an interval (e.g. a contract end date).
    #[serde(rename = "isEndDate")]
    pub is_end_date: bool,

    /// Inclusive or exclusive end; only meaningful for end dates.
    #[serde(rename = "endDateTimeKind", skip_serializing_if = "Option::is_none")]
    pub end_kind: Option<EndKind>,

    /// The timestamp belongs to the gas sector rather than electricity.
    ///
    /// Independent of [`gas_day_aware`](Self::gas_day_aware): some systems
    /// distinguish gas from electricity yet still ignore the gas day.
    #[serde(rename = "isGas")]
    pub is_gas: bool,

    /// The gas day starts at 06:00 German local time instead of midnight.
    /// Required for gas, must be absent otherwise.
    #[serde(rename = "isGasTagAware", skip_serializing_if = "Option::is_none")]
    pub gas_day_aware: Option<bool>,

    /// Local time of day is not carried by this side and is floored to
    /// German midnight.
    #[serde(rename = "stripTime")]
    pub strip_time: bool,
}

impl TimestampMeaning {
    /// An electricity start/point timestamp.
    pub fn point() -> Self {
        Self::default()
    }

    /// An electricity end date of the given kind.
    pub fn end_date(kind: EndKind) -> Self {
        Self {
            is_end_date: true,
            end_kind: Some(kind),
            ..Self::default()
        }
    }

    /// Moves this meaning into the gas sector.
    pub fn gas(mut self, day_aware: bool) -> Self {
        self.is_gas = true;
        self.gas_day_aware = Some(day_aware);
        self
    }

    /// Marks this side as carrying no local time of day.
    pub fn stripped(mut self) -> Self {
        self.strip_time = true;
        self
    }

    /// `true` iff the optional fields agree with their flags.
    pub fn is_valid(&self) -> bool {
        self.is_end_date == self.end_kind.is_some() && self.is_gas == self.gas_day_aware.is_some()
    }
}

// ── ConversionPlan ──────────────────────────────────────────────────────────

/// An ordered pair of meanings: convert from `source` to `target`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversionPlan {
    /// Meaning of the timestamp before the conversion.
    pub source: TimestampMeaning,
    /// Meaning of the timestamp after the conversion.
    pub target: TimestampMeaning,
}

impl ConversionPlan {
    /// Read a plan from its JSON description.
    ///
    /// The plan is not validated here; a well-formed but inconsistent plan
    /// parses fine and is rejected by [`is_valid`](Self::is_valid).
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| ConversionError::InvalidConfiguration(format!("malformed plan: {e}")))
    }

    /// `true` iff both sides are valid and neither the sector nor the
    /// start/end role changes between them.
    pub fn is_valid(&self) -> bool {
        self.source.is_gas == self.target.is_gas
            && self.source.is_end_date == self.target.is_end_date
            && self.source.is_valid()
            && self.target.is_valid()
    }

    /// A new plan converting in the opposite direction.
    pub fn invert(&self) -> Self {
        Self {
            source: self.target.clone(),
            target: self.source.clone(),
        }
    }
}

// ── Typed form ──────────────────────────────────────────────────────────────

/// Start/point vs. end of an interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Boundary {
    /// A start date or a single point in time.
    Point,
    /// The end of an interval, understood as given.
    End(EndKind),
}

/// Regulated sector the timestamp belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    /// Days start at German midnight.
    Electricity,
    /// Gas; days start at midnight unless the system knows the gas day.
    Gas {
        /// Days start at 06:00 German local time.
        day_aware: bool,
    },
}

/// A [`TimestampMeaning`] that is valid by construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Semantics {
    /// Start/point or end date.
    pub boundary: Boundary,
    /// Electricity or gas, with gas day awareness.
    pub sector: Sector,
    /// Local time of day is floored to German midnight on this side.
    pub strip_time: bool,
}

impl Semantics {
    /// `true` for [`Boundary::End`].
    pub fn is_end_date(&self) -> bool {
        matches!(self.boundary, Boundary::End(_))
    }

    /// `true` for [`Sector::Gas`].
    pub fn is_gas(&self) -> bool {
        matches!(self.sector, Sector::Gas { .. })
    }
}

impl TryFrom<&TimestampMeaning> for Semantics {
    type Error = ConversionError;

    fn try_from(meaning: &TimestampMeaning) -> Result<Self> {
        let boundary = match (meaning.is_end_date, meaning.end_kind) {
            (false, None) => Boundary::Point,
            (true, Some(kind)) => Boundary::End(kind),
            (true, None) => {
                return Err(ConversionError::InvalidConfiguration(
                    "end date without an end date kind".to_string(),
                ))
            }
            (false, Some(kind)) => {
                return Err(ConversionError::InvalidConfiguration(format!(
                    "end date kind '{kind}' given for a timestamp that is not an end date"
                )))
            }
        };

        let sector = match (meaning.is_gas, meaning.gas_day_aware) {
            (false, None) => Sector::Electricity,
            (true, Some(day_aware)) => Sector::Gas { day_aware },
            (true, None) => {
                return Err(ConversionError::InvalidConfiguration(
                    "gas timestamp without gas day awareness".to_string(),
                ))
            }
            (false, Some(_)) => {
                return Err(ConversionError::InvalidConfiguration(
                    "gas day awareness given for a non-gas timestamp".to_string(),
                ))
            }
        };

        Ok(Self {
            boundary,
            sector,
            strip_time: meaning.strip_time,
        })
    }
}

impl From<&Semantics> for TimestampMeaning {
    fn from(semantics: &Semantics) -> Self {
        let (is_end_date, end_kind) = match semantics.boundary {
            Boundary::Point => (false, None),
            Boundary::End(kind) => (true, Some(kind)),
        };
        let (is_gas, gas_day_aware) = match semantics.sector {
            Sector::Electricity => (false, None),
            Sector::Gas { day_aware } => (true, Some(day_aware)),
        };
        Self {
            is_end_date,
            end_kind,
            is_gas,
            gas_day_aware,
            strip_time: semantics.strip_time,
        }
    }
}

/// A [`ConversionPlan`] that has passed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ValidatedPlan {
    source: Semantics,
    target: Semantics,
}

impl ValidatedPlan {
    /// Pair two meanings.
    ///
    /// # Errors
    ///
    /// Returns [`ConversionError::InvalidConfiguration`] when the pair would
    /// convert between gas and electricity or between a start and an end date.
    pub fn new(source: Semantics, target: Semantics) -> Result<Self> {
        if source.is_gas() != target.is_gas() {
            return Err(ConversionError::InvalidConfiguration(
                "cannot convert between gas and electricity".to_string(),
            ));
        }
        if source.is_end_date() != target.is_end_date() {
            return Err(ConversionError::InvalidConfiguration(
                "cannot convert between start and end dates".to_string(),
            ));
        }
        Ok(Self { source, target })
    }

    /// Meaning before the conversion.
    pub fn source(&self) -> &Semantics {
        &self.source
    }

    /// Meaning after the conversion.
    pub fn target(&self) -> &Semantics {
        &self.target
    }

    /// The same pair converting in the opposite direction; still valid.
    pub fn invert(&self) -> Self {
        Self {
            source: self.target,
            target: self.source,
        }
    }
}

impl TryFrom<&ConversionPlan> for ValidatedPlan {
    type Error = ConversionError;

    fn try_from(plan: &ConversionPlan) -> Result<Self> {
        let source = Semantics::try_from(&plan.source).map_err(|e| prefix_side("source", e))?;
        let target = Semantics::try_from(&plan.target).map_err(|e| prefix_side("target", e))?;
        Self::new(source, target)
    }
}

impl From<&ValidatedPlan> for ConversionPlan {
    fn from(plan: &ValidatedPlan) -> Self {
        Self {
            source: TimestampMeaning::from(&plan.source),
            target: TimestampMeaning::from(&plan.target),
        }
    }
}

fn prefix_side(side: &str, err: ConversionError) -> ConversionError {
    match err {
        ConversionError::InvalidConfiguration(msg) => {
            ConversionError::InvalidConfiguration(format!("{side}: {msg}"))
        }
        other => other,
    }
}

// ── Tests ───────────────────────────────────────────────────────────────────

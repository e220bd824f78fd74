//! # mako-datetime
//!
//! Deterministic timestamp conversion for German energy-market messaging.
//!
//! Systems exchanging market messages agree on instants but not on what an
//! instant *means*: whether a gas day starts at 06:00 or at midnight German
//! local time, whether a contract end date is inclusive or exclusive, and
//! whether the local time of day is carried at all. A [`ConversionPlan`]
//! describes the meaning on both sides and [`convert`] maps an instant from
//! one to the other, with all calendar decisions made in `Europe/Berlin`
//! local time across daylight-saving transitions.
//!
//! ## Modules
//!
//! - [`meaning`] — Timestamp meanings, conversion plans and their validation
//! - [`converter`] — The conversion algorithm
//! - [`german_time`] — Anchor checks and calendar steps in German local time
//! - [`instant`] — Anchoring caller input to UTC
//! - [`error`] — Error types
//!
//! ## Example
//!
//! ```
//! use mako_datetime::{convert, ConversionPlan};
//!
//! let plan = ConversionPlan::from_json(
//!     r#"{
//!         "source": {"isGas": true, "isGasTagAware": true, "isEndDate": false},
//!         "target": {"isGas": true, "isGasTagAware": false, "isEndDate": false}
//!     }"#,
//! )
//! .unwrap();
//! assert!(plan.is_valid());
//!
//! let converted = convert("2023-06-01T04:00:00Z", &plan).unwrap();
//! assert_eq!(converted.to_rfc3339(), "2023-05-31T22:00:00+00:00");
//! ```

#![warn(missing_docs)]

pub mod converter;
pub mod error;
pub mod german_time;
pub mod instant;
pub mod meaning;

pub use converter::{convert, convert_validated};
pub use error::{ConversionError, Result};
pub use german_time::{
    add_local_day, is_local_6am, is_local_6am_opt, is_local_midnight, is_local_midnight_opt,
    shift_6am_to_midnight, shift_midnight_to_6am, strip_time, subtract_local_day, GERMAN_TIME,
};
pub use instant::{parse_instant, AsInstant};
pub use meaning::{
    Boundary, ConversionPlan, EndKind, Sector, Semantics, TimestampMeaning, ValidatedPlan,
};

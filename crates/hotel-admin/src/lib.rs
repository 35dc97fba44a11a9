//! Back-office core for the hotel administration suite.
//!
//! The recruiting workflow carries the only non-trivial logic: a hiring
//! pipeline whose applications advance through stages in lockstep with the
//! rest of their job's cohort.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Small helpers shared by the `wxc` crates.

pub mod secret_string;

#[cfg(feature = "humantime-serde")]
pub mod humantime_serde;

pub use secret_string::SecretString;

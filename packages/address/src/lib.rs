#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Address reconciliation for the Tartu housing dataset.
//!
//! Listings, the accessibility survey and the noise survey each spell
//! street addresses differently. This crate turns all of them into one
//! join key (`"<street> <house number>"`) and joins on it:
//!
//! 1. [`normalize`] canonicalizes a single free-text address.
//! 2. [`expand`] splits a multi-building survey address
//!    (`"Tähe 10//12//14"`) into one key per building.
//! 3. [`alternate_form`] toggles the `tn` street-type marker.
//! 4. [`JoinTable`] looks a key up exactly, then by its alternate form,
//!    then falls back to a caller-supplied default.
//!
//! Nothing here performs I/O and nothing here can fail.

pub mod alternate;
pub mod join;
pub mod normalize;
pub mod variants;

pub use alternate::alternate_form;
pub use join::{JoinOutcome, JoinStats, JoinTable, MatchTier};
pub use normalize::normalize;
pub use variants::{expand, expand_addresses};

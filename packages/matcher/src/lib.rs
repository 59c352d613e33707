#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Name disambiguation between administrative levels.
//!
//! A geocoded mention lands in one level-1 polygon and usually one
//! level-2 polygon, but the point alone cannot say whether the event
//! affected the whole region or just the sub-region. This crate runs a
//! sequential funnel of name-comparison stages over the candidate pool;
//! each stage claims the candidates it can decide and passes the
//! remainder on, so no candidate is ever assigned twice. Whatever
//! survives every stage is dropped as too uncertain.

pub mod funnel;
pub mod similarity;

pub use funnel::{Candidate, NameMatch, Stage, disambiguate};
pub use similarity::similarity;

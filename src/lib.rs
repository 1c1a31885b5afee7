#![warn(missing_docs)]

//! Daily ranked-match harvester.
//!
//! Samples ranked players per tier and division, resolves their puuids, lists the matches
//! they played on one UTC day, and flattens every match into a match-level dataset and a
//! pick/ban-level dataset. See [`runner::PipelineRunner`].

pub mod api;
pub mod artifact;
pub mod client;
pub mod config;
pub mod error;
pub mod models;
pub mod records;
pub mod retry;
pub mod runner;
pub mod stages;
pub mod storage;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod util;
pub mod warehouse;

pub use error::{Error, Result};

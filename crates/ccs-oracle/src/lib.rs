//! # ccs-oracle
//! Scoring pipeline composition.
//!
//! Wires a [`DataSource`](ccs_core::traits::DataSource) through factor
//! extraction, scoring, commitment and (optionally) attestation signing,
//! and persists the results.

pub mod config;
pub mod output;
pub mod pipeline;

pub use config::{AppConfig, LoadError};
pub use output::{JsonFilePublisher, ScoreArtifact, write_score_artifact};
pub use pipeline::{ScoreReport, ScoringPipeline, ScoringRun};

//! Core library: Hebrew normalization, similarity scoring, lexicon adapters,
//! the cross-lexicon mapping builder and its reports.

pub mod adapters;
pub mod builder;
pub mod config;
pub mod error;
pub mod models;
pub mod normalizer;
pub mod pipeline;
pub mod report;
pub mod scorer;
pub mod supplement;

pub use error::PipelineError;

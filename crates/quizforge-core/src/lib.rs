//! quizforge-core — Scoring pipeline and generation stream decoding.
//!
//! This crate defines the domain model, error taxonomy, scoring strategies,
//! response cache, and the incremental decoder that turns a model-generation
//! token stream into discrete question objects.

pub mod cache;
pub mod decoder;
pub mod error;
pub mod generate;
pub mod model;
pub mod resolver;
pub mod strategy;
pub mod traits;

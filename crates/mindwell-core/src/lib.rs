//! MindWell Core — domain models, error taxonomy, repository traits
//! and intake form normalization shared by every other crate.

pub mod error;
pub mod intake;
pub mod models;
pub mod repository;

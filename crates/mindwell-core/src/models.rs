//! Domain models for the intake service.

pub mod account;
pub mod submission;

//! Route handlers.

pub mod auth;
pub mod intake;
pub mod submissions;

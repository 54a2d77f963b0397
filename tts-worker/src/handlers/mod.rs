//! Job handling and the HTTP surface around it.

pub mod health;
pub mod job;
pub mod runsync;

pub use job::handle_job;

pub mod api;
pub mod config;
pub mod janitor;
pub mod job;
pub mod observability;
pub mod queue;
pub mod status;
pub mod worker;

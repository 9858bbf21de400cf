pub mod actions;
pub mod health;

pub use actions::{Archive, Publish, StatusCounts};
pub use health::{health, readiness};

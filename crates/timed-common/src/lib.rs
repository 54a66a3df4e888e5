#![doc = "Common types shared across the timed-task workspace."]

pub mod clock;
pub mod config;
pub mod error;
pub mod metrics;
pub mod units;

pub use clock::*;
pub use config::*;
pub use error::*;
pub use metrics::*;
pub use units::*;

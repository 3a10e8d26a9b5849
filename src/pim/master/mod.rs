pub mod clean;
pub mod config;
pub mod dedup;
pub mod enrich;
pub mod error;
pub mod io;
pub mod join;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod prune;
pub mod report;

pub use error::{PimError, Result};

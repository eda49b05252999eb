pub mod constants;
pub mod error;
pub mod gas;
pub mod indexer;
pub mod interest_points;
pub mod math;
pub mod optimization;
pub mod paths;
pub mod pool;
pub mod token_graph;
pub mod types;
pub use error::{Result, RouterError};

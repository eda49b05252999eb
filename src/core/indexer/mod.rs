pub mod pool;
pub mod token;
pub use anyhow::Result;

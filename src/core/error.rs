use rust_decimal::Decimal;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RouterError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RouterError {
    #[error("no pool holds {token_in} or {token_out}")]
    EmptyPoolSet { token_in: String, token_out: String },

    #[error("degenerate pool {pool_id}: {reason}")]
    DegeneratePool { pool_id: String, reason: String },

    #[error("insufficient liquidity: requested {requested}, paths can absorb at most {capacity}")]
    InsufficientLiquidity { requested: Decimal, capacity: Decimal },

    #[error("no route connects the requested tokens")]
    NoViableRoute,

    #[error("invalid amount: {0}")]
    InvalidAmount(Decimal),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl RouterError {
    pub fn degenerate(pool_id: &str, reason: impl Into<String>) -> Self {
        RouterError::DegeneratePool {
            pool_id: pool_id.to_string(),
            reason: reason.into(),
        }
    }
}

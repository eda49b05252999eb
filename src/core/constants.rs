use rust_decimal::Decimal;

// Protocol bounds on a single pool swap: sell at most half of the input
// balance, buy at most a third of the output balance.
pub const MAX_IN_RATIO: Decimal = Decimal::from_parts(5, 0, 0, false, 1);
pub const MAX_OUT_RATIO: Decimal = Decimal::from_parts(3333, 0, 0, false, 4);

pub const BISECTION_MAX_ITERATIONS: usize = 128;

// Relative width at which a bisection bracket counts as converged (1e-15).
pub const BISECTION_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 15);

pub const DEFAULT_MAX_POOLS: usize = 4;

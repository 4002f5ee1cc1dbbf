pub mod board;
pub mod cell;

pub use board::{BoardGrid, CostStamp, FORBIDDEN_COST, GridCosts};
pub use cell::GridCell;

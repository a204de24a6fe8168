pub mod bounds;
pub mod executor;
pub mod planner;
pub mod predicate;
pub mod translate;

#[cfg(test)]
pub(crate) mod testing;

pub use executor::{Executor, RowStream};
pub use planner::*;
pub use predicate::extract;
pub use translate::translate;

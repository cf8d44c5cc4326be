pub mod error;
pub mod locator;

pub use error::BackendError;
pub use locator::{ElementHandle, LocatorStrategy, Predicate, Query, StrategyAction};

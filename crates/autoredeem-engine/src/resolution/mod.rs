pub mod engine;
pub mod result;

pub use engine::LocatorResolver;
pub use result::{ActionError, Resolution};

pub mod backend;
pub mod challenge;
pub mod config;
pub mod exit_codes;
pub mod guard;
pub mod money;
pub mod overlay;
pub mod resolution;
pub mod retention;
pub mod runner;
pub mod strategies;
pub mod workflow;

pub use autoredeem_common::locator;

//! Shared test infrastructure.

mod db;
pub(crate) mod fakes;

pub use context::TestContext;

//! Depot helper extensions.

use std::sync::Arc;

use salvo::prelude::{Depot, StatusError};
use tracing::error;

use crate::state::State;

/// Access to injected server state from handlers.
pub(crate) trait DepotExt {
    /// Shared state, or a 500 when the router was built without it.
    fn state_or_500(&self) -> Result<&Arc<State>, StatusError>;
}

impl DepotExt for Depot {
    fn state_or_500(&self) -> Result<&Arc<State>, StatusError> {
        self.obtain::<Arc<State>>().map_err(|_missing| {
            error!("server state missing from depot");

            StatusError::internal_server_error()
        })
    }
}

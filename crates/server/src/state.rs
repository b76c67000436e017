//! State

use std::sync::Arc;

use syncbridge_app::{context::AppContext, database::Db, engine::WebhookIngress};

#[derive(Clone, Debug)]
pub(crate) struct State {
    pub(crate) ingress: WebhookIngress,
    pub(crate) db: Db,
}

impl State {
    #[must_use]
    pub(crate) fn new(ingress: WebhookIngress, db: Db) -> Self {
        Self { ingress, db }
    }

    #[must_use]
    pub(crate) fn from_app_context(app: &AppContext) -> Arc<Self> {
        Arc::new(Self::new(app.ingress.clone(), app.db.clone()))
    }
}

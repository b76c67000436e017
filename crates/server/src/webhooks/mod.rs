//! Webhook ingress endpoint

mod errors;
pub(crate) mod receive;

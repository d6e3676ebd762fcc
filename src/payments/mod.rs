//! Gift payments: creation, status polling and provider reconciliation

mod model;
mod reconcile;
mod service;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;

pub use model::*;
pub use reconcile::parse_external_reference;
pub use service::{PaymentError, PaymentService};

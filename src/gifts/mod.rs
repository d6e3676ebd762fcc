//! Wedding gift catalogue

mod model;
mod service;

pub use model::*;
pub use service::{GiftError, GiftService};

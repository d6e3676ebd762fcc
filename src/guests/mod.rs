//! Guest list and RSVP confirmations, grouped into families by phone

mod model;
mod service;

pub use model::*;
pub use service::{GuestError, GuestService};

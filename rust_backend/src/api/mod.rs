//! # API Module
//!
//! Request types accepted by the scheduling engine. Both the Python bindings
//! and the Rust callers build events through here, so field validation and
//! the derivation of a booking from its class happen in one place.
//!
//! - [`request`]: [`EventDraft`] (flat host fields) and [`NewEventRequest`]
//!   (one variant per event category)

pub mod request;

pub use request::{EventDraft, NewEventRequest, Recurrence};

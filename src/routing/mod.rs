//! # Routing Module
//!
//! Router assembly and the forwarding handler that sends traffic on to the
//! payment API.

pub mod client;
pub mod handlers;
pub mod router;

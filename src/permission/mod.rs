//! Capture permission negotiation
//!
//! `PermissionNegotiator` validates the host environment (capture API present,
//! secure origin) and issues the single stream request of a session.

mod negotiator;

pub use negotiator::PermissionNegotiator;

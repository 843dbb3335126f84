//! Request authentication for the chorepoints gRPC server.
//!
//! [`AuthLayer`] wraps the tonic router and gates every inbound call:
//! methods in the exempt set (the login entry point) pass straight
//! through, every other method must present exactly one
//! `authorization: Bearer <token>` metadata value that the
//! [`token_core::TokenManager`] accepts. Rejections short-circuit with
//! `UNAUTHENTICATED` before the handler runs; on success the validated
//! claims are stored in the request extensions for handler access.
//!
//! The gate is a tower layer rather than a tonic interceptor because the
//! exemption is keyed on the invoked method name, which only the HTTP
//! request path carries.

mod layer;

pub use layer::{AuthGate, AuthLayer};

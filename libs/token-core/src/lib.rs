//! Bearer token issue and validation for the chorepoints backend.
//!
//! A [`TokenManager`] owns the shared signing secret and a time source.
//! Tokens are HS256-signed JWTs carrying a fixed claims shape
//! ([`AccessClaims`]) with a 30 minute lifetime. Validity is determined
//! entirely by the signature and the claims, so validation needs no
//! server-side state.
//!
//! ## Security Design
//!
//! - **HS256 only**: the validator pins the algorithm; tokens signed with
//!   any other algorithm are rejected (no algorithm confusion).
//! - **Injected clock**: every expiry computation goes through the
//!   manager's [`Clock`], so tests can pin instants deterministically.
//! - **Immutable after construction**: the manager holds no mutable state
//!   and is safe to share across concurrent calls.

mod clock;
mod token;

pub use clock::{Clock, SystemClock};
pub use token::{AccessClaims, TokenError, TokenManager};

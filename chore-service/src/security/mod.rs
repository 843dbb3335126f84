//! Security primitives for chore-service
//!
//! Password and PIN hashing (Argon2id). Token issue/validate lives in the
//! shared `token-core` library.

pub mod password;

pub use password::{hash_secret, verify_secret};

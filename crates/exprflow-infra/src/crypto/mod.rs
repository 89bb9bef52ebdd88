//! API key material.
//!
//! Keys are random and shown to the user once; only their SHA-256 digest is
//! stored.

pub mod hash;

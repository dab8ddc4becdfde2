//! DPoP proof verification (ES256 / P-256 only).
//!
//! Pipeline: `parser` → `validator` → `signature`, wired together by
//! `core::verify_proof`.
pub mod codec;
pub mod core;
pub mod parser;
pub mod signature;
pub mod thumbprint;
pub mod types;
pub mod validator;

pub use core::{verify_proof, verify_proof_at};
pub use types::{EcJwk, VerifiedProof};

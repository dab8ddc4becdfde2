//! Proof-of-Possession (DPoP) authentication.
//!
//! - `dpop`: proof parsing, claim checks and ES256 signature verification
//! - `token_issuer` / `access_jwt`: sender-constrained access tokens (`cnf.jkt`)
//! - `gateway`: the entry points used by the HTTP pipeline
//! - `replay`: optional `jti` seen-set
pub mod access_jwt;
pub mod dpop;
pub mod error;
pub mod factory;
pub mod gateway;
pub mod keys;
pub mod replay;
pub mod token_issuer;

#[cfg(test)]
pub(crate) mod testing;

pub use access_jwt::{BoundClaims, TokenValidator};
pub use error::PopError;
pub use factory::{build_pop_gateway, build_replay_store};
pub use gateway::{PopGateway, Stage};
pub use keys::KeyMaterial;
pub use token_issuer::{Claims, IssuedToken, TokenIssuer};

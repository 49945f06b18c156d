//! Credential primitives: password hashing and signed bearer tokens.
//!
//! These are pure functions over secrets and bytes. Persistence of revoked
//! tokens and reset requests lives in the storage layer, and the rules that
//! tie them together live in `domain::auth_service`.

pub mod password;
pub mod token;

pub use password::{hash_password, verify_password, PasswordError};
pub use token::{generate_reset_token, hash_reset_token, Claims, TokenCodec, TokenError, TokenType};

//! Credential handling for the portal.
//!
//! Passwords are never stored; only Argon2id hashes end up in the
//! metadata store.

mod password;

pub use password::{
    hash_password, validate_password, verify_password, HashCost, PasswordError,
    MAX_PASSWORD_LENGTH,
};

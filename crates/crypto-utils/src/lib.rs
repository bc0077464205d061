//! # crypto-utils
//!
//! Secure random generation and zeroizing wrappers for key material.

pub mod error;
pub mod random;
pub mod zeroizing;

pub use error::CryptoError;

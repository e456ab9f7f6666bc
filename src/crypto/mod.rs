//! Protection of sensitive card data.
//!
//! This module contains:
//! - `codec`: AES-256 encryption/decryption of card numbers and CVVs
//! - `masking`: display-safe masked representations derived from them

/// Symmetric encryption of card numbers and CVVs
pub mod codec;
/// Masked display strings for card numbers and expiration dates
pub mod masking;

//! Domain logic for the signed notification relay.
//!
//! Everything here is transport- and storage-agnostic: the envelope codec,
//! DKIM-style key records, signature verification, phone normalization and
//! the small value types shared by the other crates.

pub mod credentials;
pub mod delivery_mode;
pub mod dkim;
pub mod dns;
pub mod envelope;
pub mod error;
pub mod phone;
pub mod priority;
pub mod signature;
pub mod types;

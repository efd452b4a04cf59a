//! Cryptographic core of a Mimblewimble-style confidential ledger:
//! Ristretto scalar/point arithmetic, Pedersen and switch commitments,
//! deterministic key derivation, a Fiat-Shamir oracle, public and
//! bulletproof range proofs over an inner-product argument, Schnorr
//! signatures with multi-party co-signing, transaction kernels with
//! value-conservation validation, and the treasury emission protocol.

pub mod commitment;
pub mod error;
pub mod generators;
pub mod inner_product;
pub mod kdf;
pub mod oracle;
pub mod point;
pub mod range_proof;
pub mod scalar;
pub mod secret;
pub mod signature;
pub mod transaction;
pub mod treasury;

//! Tag names the rest of the system agrees on. Kept as a single module so a
//! typo in a string literal is a compile-time (grep-able) problem, not a
//! silent no-match at runtime.

pub const AUTHORITY: &str = "Authority";
pub const QUORUM: &str = "Quorum";
pub const DEVICE: &str = "Device";
pub const DEVICE_PODA: &str = "PODA";
pub const TYPE: &str = "Type";
pub const TYPE_PROCESS: &str = "Process";
pub const ATTESTATION_FOR: &str = "Attestation-For";
pub const FROM_PROCESS: &str = "From-Process";
pub const ERROR: &str = "Error";
pub const ERROR_PODA: &str = "PODA";

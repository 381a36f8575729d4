pub mod address;
pub mod errors;
pub mod signature;
pub mod wallet;

pub use address::Address;
pub use errors::WalletError;
pub use signature::Signature;
pub use wallet::{Wallet, verify};

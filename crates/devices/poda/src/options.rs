use poda_bundle::{Address, tags};
use poda_wallet::Wallet;

use crate::errors::OptionsError;

/// `{ authorities: Set<Address>, quorum: u32 }` from `spec.md` §3. The local
/// wallet's address is always present in `authorities` — the node implicitly
/// self-authorizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    pub authorities: Vec<Address>,
    pub quorum: u32,
}

impl DeviceOptions {
    /// `|authorities| >= quorum >= 1`, the invariant `spec.md` §3 states.
    /// Not enforced at parse time (the parser only validates what §4.1
    /// names as an error); exposed for callers/tests that want to check it.
    pub fn invariant_holds(&self) -> bool {
        self.quorum >= 1 && self.authorities.len() as u32 >= self.quorum
    }
}

/// Translates a process's declared tags into `DeviceOptions`, per `spec.md`
/// §4.1. `wallet` supplies the local node's own address, always appended.
pub fn parse_options(
    process_tags: &[(String, String)],
    wallet: &Wallet,
) -> Result<DeviceOptions, OptionsError> {
    let mut authorities = Vec::new();
    for (key, value) in process_tags {
        if key == tags::AUTHORITY {
            let address = value
                .parse::<Address>()
                .map_err(|_| OptionsError::InvalidAuthority(value.clone()))?;
            authorities.push(address);
        }
    }
    if authorities.is_empty() {
        return Err(OptionsError::EmptyAuthoritySet);
    }

    let quorum_value = process_tags
        .iter()
        .find(|(key, _)| key == tags::QUORUM)
        .map(|(_, value)| value)
        .ok_or(OptionsError::MissingQuorum)?;
    let quorum = quorum_value
        .parse::<u32>()
        .map_err(|_| OptionsError::InvalidQuorum(quorum_value.clone()))?;

    authorities.push(wallet.to_address());

    Ok(DeviceOptions {
        authorities,
        quorum,
    })
}

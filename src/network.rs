//! Network identifiers accepted by the message codec.

use alloc::string::ToString;
use core::{fmt, str::FromStr};

use bitcoin::Network;

use crate::Error;

/// The networks an address may be checked against.
///
/// Signet shares the `tb` human-readable part with testnet, so both accept
/// the same addresses.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum NetworkId {
    #[default]
    Mainnet,
    Testnet,
    Signet,
    Regtest,
}

impl NetworkId {
    /// Returns the rust-bitcoin network used for address checks.
    pub fn to_network(self) -> Network {
        match self {
            Self::Mainnet => Network::Bitcoin,
            Self::Testnet => Network::Testnet,
            Self::Signet => Network::Signet,
            Self::Regtest => Network::Regtest,
        }
    }
}

impl From<NetworkId> for Network {
    fn from(id: NetworkId) -> Self {
        id.to_network()
    }
}

impl FromStr for NetworkId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "bitcoin" | "livenet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "signet" => Ok(Self::Signet),
            "regtest" => Ok(Self::Regtest),
            _ => Err(Error::InvalidNetwork(s.to_string())),
        }
    }
}

impl fmt::Display for NetworkId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
            Self::Signet => write!(f, "signet"),
            Self::Regtest => write!(f, "regtest"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_parse_network_names() {
        assert_eq!(NetworkId::from_str("mainnet").unwrap(), NetworkId::Mainnet);
        assert_eq!(NetworkId::from_str("bitcoin").unwrap(), NetworkId::Mainnet);
        assert_eq!(NetworkId::from_str("Testnet").unwrap(), NetworkId::Testnet);
        assert_eq!(NetworkId::from_str("signet").unwrap(), NetworkId::Signet);
        assert_eq!(NetworkId::from_str("REGTEST").unwrap(), NetworkId::Regtest);

        assert!(matches!(
            NetworkId::from_str("liquid"),
            Err(Error::InvalidNetwork(name)) if name == "liquid"
        ));
    }

    #[test]
    fn test_network_mapping_round_trips_display() {
        for id in [
            NetworkId::Mainnet,
            NetworkId::Testnet,
            NetworkId::Signet,
            NetworkId::Regtest,
        ] {
            assert_eq!(NetworkId::from_str(&id.to_string()).unwrap(), id);
        }

        assert_eq!(Network::from(NetworkId::Mainnet), Network::Bitcoin);
        assert_eq!(NetworkId::Signet.to_network(), Network::Signet);
    }
}

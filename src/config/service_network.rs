// file: src/config/service_network.rs
// version: 1.0.0
// guid: 6f1d2c3b-8a4e-4b5f-9c7d-0e2a4b6c8d1f

//! Service network CIDR handed to the API server

use crate::error::KmachineError;
use crate::Result;
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

/// A parsed `address/prefix` service network
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceNetwork {
    network: IpAddr,
    prefix: u8,
}

impl ServiceNetwork {
    pub fn prefix(&self) -> u8 {
        self.prefix
    }

    /// Network address with host bits cleared
    pub fn network(&self) -> IpAddr {
        self.network
    }

    /// First host address; the in-cluster `kubernetes` service lives here
    pub fn gateway(&self) -> IpAddr {
        match self.network {
            IpAddr::V4(addr) => IpAddr::V4(Ipv4Addr::from(u32::from(addr) + 1)),
            IpAddr::V6(addr) => IpAddr::V6(Ipv6Addr::from(u128::from(addr) + 1)),
        }
    }
}

impl FromStr for ServiceNetwork {
    type Err = KmachineError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |why: &str| {
            KmachineError::config(format!(
                "Service cluster IP range must be a CIDR ({}): {}",
                why, s
            ))
        };

        let (addr, prefix) = s.split_once('/').ok_or_else(|| invalid("missing prefix"))?;
        let addr: IpAddr = addr.parse().map_err(|_| invalid("bad address"))?;
        let prefix: u8 = prefix.parse().map_err(|_| invalid("bad prefix"))?;

        // Leave room for at least the network address and one host.
        let network = match addr {
            IpAddr::V4(v4) => {
                if prefix > 30 {
                    return Err(invalid("prefix must be at most 30"));
                }
                let mask = u32::MAX.checked_shl(32 - u32::from(prefix)).unwrap_or(0);
                IpAddr::V4(Ipv4Addr::from(u32::from(v4) & mask))
            }
            IpAddr::V6(v6) => {
                if prefix > 126 {
                    return Err(invalid("prefix must be at most 126"));
                }
                let mask = u128::MAX.checked_shl(128 - u32::from(prefix)).unwrap_or(0);
                IpAddr::V6(Ipv6Addr::from(u128::from(v6) & mask))
            }
        };

        Ok(Self { network, prefix })
    }
}

impl fmt::Display for ServiceNetwork {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix)
    }
}

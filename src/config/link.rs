//! Link encapsulations under test
//!
//! Each tunnel type has its own far-end benchmark host, shaped interface and
//! per-packet overhead.

use std::fmt;
use std::str::FromStr;

use crate::gateway::{RemoteShell, SqmControl};
use crate::utils::{Result, TunerError};

/// Encapsulation between the gateway and the benchmark server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tunnel {
    /// Plain WAN, no tunnel
    None,
    WireGuard,
    OpenVpn,
}

impl Tunnel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tunnel::None => "None",
            Tunnel::WireGuard => "WireGuard",
            Tunnel::OpenVpn => "OpenVPN",
        }
    }

    /// Benchmark server reachable through this encapsulation
    pub fn host(&self) -> &'static str {
        match self {
            Tunnel::None => "10.0.0.2",
            Tunnel::WireGuard => "172.16.0.2",
            Tunnel::OpenVpn => "172.16.1.2",
        }
    }

    /// Per-packet overhead in bytes handed to SQM
    pub fn overhead(&self) -> u32 {
        match self {
            Tunnel::None => 22,
            Tunnel::WireGuard => 82,
            Tunnel::OpenVpn => 95,
        }
    }

    /// Fixed tunnel interface; the plain WAN interface is looked up on the gateway
    pub fn fixed_interface(&self) -> Option<&'static str> {
        match self {
            Tunnel::None => None,
            Tunnel::WireGuard => Some("wg0"),
            Tunnel::OpenVpn => Some("tun0"),
        }
    }
}

impl FromStr for Tunnel {
    type Err = TunerError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "" | "none" => Ok(Tunnel::None),
            "wireguard" => Ok(Tunnel::WireGuard),
            "openvpn" => Ok(Tunnel::OpenVpn),
            _ => Err(TunerError::Config(format!("Unrecognized tunnel: '{}'", s))),
        }
    }
}

impl fmt::Display for Tunnel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Fully resolved link parameters for one tunnel
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkConfig {
    pub tunnel: Tunnel,
    pub host: String,
    pub iface: String,
    pub overhead: u32,
}

impl LinkConfig {
    /// Resolve the shaped interface, asking the gateway for the WAN device if needed
    pub fn resolve(tunnel: Tunnel, gateway: &mut dyn RemoteShell) -> Result<Self> {
        let iface = match tunnel.fixed_interface() {
            Some(iface) => iface.to_string(),
            None => gateway.wan_interface()?,
        };
        Ok(Self {
            tunnel,
            host: tunnel.host().to_string(),
            iface,
            overhead: tunnel.overhead(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::remote_shell::tests::MockShell;
    use crate::utils::GatewayError;

    #[test]
    fn test_parse_tunnels() {
        assert_eq!("None".parse::<Tunnel>().unwrap(), Tunnel::None);
        assert_eq!("none".parse::<Tunnel>().unwrap(), Tunnel::None);
        assert_eq!("WIREGUARD".parse::<Tunnel>().unwrap(), Tunnel::WireGuard);
        assert_eq!("OpenVPN".parse::<Tunnel>().unwrap(), Tunnel::OpenVpn);
    }

    #[test]
    fn test_unrecognized_tunnel_is_config_error() {
        let err = "ipsec".parse::<Tunnel>().unwrap_err();
        assert!(err.is_config());
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("'ipsec'"));
    }

    #[test]
    fn test_resolve_tunnel_links() {
        let mut shell = MockShell::default();
        let link = LinkConfig::resolve(Tunnel::WireGuard, &mut shell).unwrap();
        assert_eq!(link.host, "172.16.0.2");
        assert_eq!(link.iface, "wg0");
        assert_eq!(link.overhead, 82);
        assert!(shell.commands.is_empty());

        let link = LinkConfig::resolve(Tunnel::OpenVpn, &mut shell).unwrap();
        assert_eq!((link.iface.as_str(), link.overhead), ("tun0", 95));
    }

    #[test]
    fn test_resolve_plain_wan() {
        let mut shell = MockShell::with_responses(&["eth1\n"]);
        let link = LinkConfig::resolve(Tunnel::None, &mut shell).unwrap();
        assert_eq!(link.iface, "eth1");
        assert_eq!(link.host, "10.0.0.2");
        assert_eq!(link.overhead, 22);
        assert_eq!(shell.commands, vec!["uci get network.wan.ifname"]);

        let mut shell = MockShell::with_responses(&[""]);
        let err = LinkConfig::resolve(Tunnel::None, &mut shell).unwrap_err();
        assert!(matches!(err, TunerError::Gateway(GatewayError::NoWanInterface)));
    }
}

//! Seed node port layout
//!
//! Every network id gets its own block of ports derived from the RPC port:
//! netids are grouped in tens, each group spanning 40 ports.

use crate::models::errors::{AppError, AppResult};
use crate::utils::constants::DEFAULT_RPC_PORT;

const UDP_OFFSET: u32 = 10;
const TCP_OFFSET: u32 = 20;
const WSS_OFFSET: u32 = 30;

/// Largest netid whose ports still fit below 65535
pub fn max_netid(rpc_port: u16) -> u16 {
    let max = 65_535u32.saturating_sub(40 + rpc_port as u32) / 4;
    max.min(u16::MAX as u32) as u16
}

/// Ports a seed node listens on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodePorts {
    pub base: u16,
    pub udp: u16,
    pub tcp: u16,
    pub wss: u16,
}

impl NodePorts {
    pub fn for_netid(netid: u16, rpc_port: u16) -> AppResult<Self> {
        let max = max_netid(rpc_port);
        if netid > max {
            return Err(AppError::netid_out_of_range(netid, max));
        }

        let rpc = rpc_port as u32;
        let base = if netid == 0 {
            rpc
        } else {
            let netid = netid as u32;
            (netid / 10) * 40 + rpc + netid % 10
        };

        let port = |offset: u32| -> AppResult<u16> {
            u16::try_from(base + offset).map_err(|_| AppError::netid_out_of_range(netid, max))
        };
        Ok(Self {
            base: port(0)?,
            udp: port(UDP_OFFSET)?,
            tcp: port(TCP_OFFSET)?,
            wss: port(WSS_OFFSET)?,
        })
    }
}

/// TCP (p2p) port of a netid with the default RPC port
pub fn tcp_port(netid: u16) -> AppResult<u16> {
    NodePorts::for_netid(netid, DEFAULT_RPC_PORT).map(|p| p.tcp)
}

/// Secure websocket port of a netid with the default RPC port
pub fn wss_port(netid: u16) -> AppResult<u16> {
    NodePorts::for_netid(netid, DEFAULT_RPC_PORT).map(|p| p.wss)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::errors::ErrorCode;

    #[test]
    fn test_default_netid_ports() {
        assert_eq!(wss_port(0).unwrap(), 7813);
        assert_eq!(tcp_port(0).unwrap(), 7803);
        let ports = NodePorts::for_netid(0, 7783).unwrap();
        assert_eq!(ports.udp, 7793);
    }

    #[test]
    fn test_grouped_netids() {
        // 8762 = 876 groups of 40 ports plus 2
        let ports = NodePorts::for_netid(8762, 7783).unwrap();
        assert_eq!(ports.base, 876 * 40 + 7783 + 2);
        assert_eq!(ports.tcp, ports.base + 20);
        assert_eq!(NodePorts::for_netid(1, 7783).unwrap().base, 7784);
    }

    #[test]
    fn test_netid_limit() {
        assert_eq!(max_netid(7783), 14428);
        let highest = NodePorts::for_netid(14428, 7783).unwrap();
        assert_eq!(highest.wss, 65_501);

        let err = NodePorts::for_netid(14429, 7783).unwrap_err();
        assert_eq!(err.code, ErrorCode::SeedNetidOutOfRange);
    }
}

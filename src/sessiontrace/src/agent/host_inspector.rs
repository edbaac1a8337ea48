use anyhow::{anyhow, Result};
use mockall::automock;
use netstat2::{get_sockets_info, AddressFamilyFlags, ProtocolFlags, ProtocolSocketInfo, TcpState};
use sysinfo::{ProcessRefreshKind, ProcessesToUpdate, System, UpdateKind};
use tracing::debug;

use crate::address::canonical_ip;
use crate::types::Address;

/// One row of the host's connection table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConnectionEntry {
    pub local: Address,
    pub status: String,
    /// Owning process, when the OS reports one.
    pub pid: Option<u32>,
}

/// One row of the host's process table. Name and command line are
/// `None` when they could not be read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProcessEntry {
    pub pid: u32,
    pub name: Option<String>,
    pub cmdline: Option<Vec<String>>,
}

/// Point-in-time views of the local host. Calls may block.
#[automock]
pub trait HostInspector: Send + Sync {
    fn connections(&self) -> Result<Vec<ConnectionEntry>>;
    fn processes(&self) -> Result<Vec<ProcessEntry>>;
    fn hostname(&self) -> Option<String>;
}

/// Reads the real connection and process tables of this machine.
#[derive(Debug, Default)]
pub struct SystemHostInspector;

impl SystemHostInspector {
    pub fn new() -> Self {
        Self
    }
}

fn tcp_status(state: &TcpState) -> &'static str {
    match state {
        TcpState::Established => "ESTABLISHED",
        TcpState::Listen => "LISTEN",
        TcpState::SynSent => "SYN_SENT",
        TcpState::SynReceived => "SYN_RECV",
        TcpState::FinWait1 => "FIN_WAIT1",
        TcpState::FinWait2 => "FIN_WAIT2",
        TcpState::TimeWait => "TIME_WAIT",
        TcpState::Closed => "CLOSE",
        TcpState::CloseWait => "CLOSE_WAIT",
        TcpState::LastAck => "LAST_ACK",
        TcpState::Closing => "CLOSING",
        _ => "NONE",
    }
}

impl HostInspector for SystemHostInspector {
    fn connections(&self) -> Result<Vec<ConnectionEntry>> {
        // Both families, since a client may reach the proxy over either
        let families = AddressFamilyFlags::IPV4 | AddressFamilyFlags::IPV6;
        let protocols = ProtocolFlags::TCP | ProtocolFlags::UDP;
        let sockets = get_sockets_info(families, protocols)
            .map_err(|e| anyhow!("failed to list sockets: {}", e))?;

        let mut entries = Vec::with_capacity(sockets.len());
        for socket in sockets {
            let (ip, port, status) = match &socket.protocol_socket_info {
                ProtocolSocketInfo::Tcp(tcp) => (tcp.local_addr, tcp.local_port, tcp_status(&tcp.state)),
                ProtocolSocketInfo::Udp(udp) => (udp.local_addr, udp.local_port, "NONE"),
            };
            let local = Address::new(canonical_ip(ip), u32::from(port));

            // Sockets owned by another user come back without a pid

            if socket.associated_pids.is_empty() {
                entries.push(ConnectionEntry {
                    local,
                    status: status.to_string(),
                    pid: None,
                });
                continue;
            }
            // A socket shared after fork is listed once per owner
            for pid in &socket.associated_pids {
                entries.push(ConnectionEntry {
                    local: local.clone(),
                    status: status.to_string(),
                    pid: Some(*pid),
                });
            }
        }

        debug!("Connection table has {} entries", entries.len());
        Ok(entries)
    }

    fn processes(&self) -> Result<Vec<ProcessEntry>> {
        let mut system = System::new();
        // Only the command line is needed, skip cpu, memory and disk stats
        system.refresh_processes_specifics(
            ProcessesToUpdate::All,
            true,
            ProcessRefreshKind::nothing().with_cmd(UpdateKind::Always),
        );

        let entries = system
            .processes()
            .values()
            .map(|process| {
                let name = process.name().to_string_lossy().to_string();
                let cmdline: Vec<String> = process
                    .cmd()
                    .iter()
                    .map(|arg| arg.to_string_lossy().to_string())
                    .collect();

                // sysinfo reports unreadable fields as empty
                ProcessEntry {
                    pid: process.pid().as_u32(),
                    name: (!name.is_empty()).then_some(name),
                    cmdline: (!cmdline.is_empty()).then_some(cmdline),
                }
            })
            .collect::<Vec<_>>();

        debug!("Process table has {} entries", entries.len());
        Ok(entries)
    }

    fn hostname(&self) -> Option<String> {
        System::host_name()
    }
}

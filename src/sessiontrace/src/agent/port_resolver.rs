use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use super::host_inspector::{HostInspector, ProcessEntry};
use crate::constants::UNKNOWN_HOSTNAME;
use crate::types::AgentProcessInfo;

/// Maps a local port to the process that owns it.
#[derive(Clone)]
pub struct PortResolver {
    inspector: Arc<dyn HostInspector>,
}

impl PortResolver {
    pub fn new(inspector: Arc<dyn HostInspector>) -> Self {
        Self { inspector }
    }

    /// Returns `None` when no live process owns `port`.
    ///
    /// Connections are scanned in table order and the first one whose
    /// owner is still in the process table wins. When several processes
    /// share a port the pick is arbitrary.
    pub fn resolve(&self, port: u32) -> Result<Option<AgentProcessInfo>> {
        // Two independent snapshots, read connections first
        let connections = self
            .inspector
            .connections()
            .context("failed to read connection table")?;
        let processes = self
            .inspector
            .processes()
            .context("failed to read process table")?;

        for connection in connections.iter().filter(|c| c.local.port == port) {
            let Some(pid) = connection.pid else {
                debug!("Connection {} has no owning process", connection.local);
                continue;
            };
            // the process may have exited between the two snapshots
            let Some(process) = find_process(pid, &processes) else {
                debug!("Process could not be found for {}", pid);
                continue;
            };

            let name = process.name.clone().unwrap_or_default();
            let cmdline = process.cmdline.clone().unwrap_or_else(|| {
                debug!("Cmdline could not be found for {}", pid);
                Vec::new()
            });
            let hostname = self.inspector.hostname().unwrap_or_else(|| {
                warn!("Hostname could not be found");
                UNKNOWN_HOSTNAME.to_string()
            });

            return Ok(Some(AgentProcessInfo {
                laddr: connection.local.clone(),
                status: connection.status.clone(),
                pid,
                name,
                cmdline,
                hostname,
            }));
        }

        Ok(None)
    }
}

fn find_process(pid: u32, processes: &[ProcessEntry]) -> Option<&ProcessEntry> {
    processes.iter().find(|process| process.pid == pid)
}

use serde::{Deserialize, Serialize};
use tracing::error;

use crate::types::JoinedRecord;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProcessesResponse {
    pub processes: Vec<Process>,
}

/// A session together with the client process behind it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Process {
    pub id: u64,
    pub mysql_user: String,
    pub db: Option<String>,
    pub command: String,
    pub time: u32,
    pub state: Option<String>,
    pub info: Option<String>,
    pub cmdline: Vec<String>,
    pub pid: Option<u32>,
    pub host: Option<String>,
}

impl From<&JoinedRecord> for Process {
    fn from(record: &JoinedRecord) -> Self {
        let session = &record.session;
        let time = session.elapsed_secs().unwrap_or_else(|_| {
            error!("time {:?} could not be converted to int", session.time);
            0
        });
        let agent = record.agent.as_ref();

        Process {
            id: session.id,
            mysql_user: session.user.clone(),
            db: session.db.clone(),
            command: session.command.clone(),
            time,
            state: session.state.clone(),
            info: session.info.clone(),
            cmdline: agent.map(|a| a.cmdline.clone()).unwrap_or_default(),
            pid: agent.map(|a| a.pid),
            host: agent.map(|a| a.hostname.clone()),
        }
    }
}

pub fn assemble(records: &[JoinedRecord]) -> ProcessesResponse {
    ProcessesResponse {
        processes: records.iter().map(Process::from).collect(),
    }
}

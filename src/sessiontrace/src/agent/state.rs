use std::sync::Arc;

use super::port_resolver::PortResolver;

#[derive(Clone)]
pub(super) struct AgentState {
    resolver: Arc<PortResolver>,
}

impl AgentState {
    pub fn new(resolver: PortResolver) -> Self {
        Self {
            resolver: Arc::new(resolver),
        }
    }

    pub fn resolver(&self) -> Arc<PortResolver> {
        Arc::clone(&self.resolver)
    }
}

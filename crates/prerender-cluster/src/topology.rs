//! Process roles and the worker-topology seam.
//!
//! The worker pool itself lives outside this crate. Bootstrapping only needs
//! to know which role the current process plays and how to hand the resolved
//! configuration to the rest of the group.

use std::fmt;
use std::sync::{Arc, OnceLock};

use prerender_cluster_config::{EffectiveConfig, EnvSnapshot};

use crate::{BootstrapError, BootstrapResult};

/// Environment variable whose presence marks a worker process.
pub const WORKER_ID_VAR: &str = "PRERENDER_CLUSTER_WORKER_ID";

/// The part a process plays in its group. Fixed for the process lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProcessRole {
    /// Resolves configuration and applies environment changes once.
    Coordinator,
    /// Inherits configuration from the coordinator.
    Worker,
}

impl ProcessRole {
    /// Detect the role from an environment snapshot.
    pub fn from_env(env: &EnvSnapshot) -> Self {
        if env.contains(WORKER_ID_VAR) {
            Self::Worker
        } else {
            Self::Coordinator
        }
    }

    /// Whether this is the coordinator.
    pub fn is_coordinator(self) -> bool {
        matches!(self, Self::Coordinator)
    }
}

impl fmt::Display for ProcessRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinator => f.write_str("coordinator"),
            Self::Worker => f.write_str("worker"),
        }
    }
}

/// Worker lifecycle manager, as seen by the bootstrapper.
pub trait ProcessTopology {
    /// Role of the current process.
    fn role(&self) -> ProcessRole;

    /// Share the resolved configuration with every worker.
    ///
    /// Called by the coordinator once, after environment propagation.
    fn broadcast_config(&self, config: Arc<EffectiveConfig>) -> BootstrapResult<()>;

    /// Configuration received from the coordinator, if any.
    ///
    /// Workers that get `None` resolve their own copy from the same sources.
    fn received_config(&self) -> Option<Arc<EffectiveConfig>> {
        None
    }
}

/// Topology for a process that runs without a worker pool.
///
/// Broadcasting stores the configuration locally; a second broadcast is
/// rejected because the group configuration is immutable once shared.
#[derive(Debug)]
pub struct SingleProcess {
    role: ProcessRole,
    shared: OnceLock<Arc<EffectiveConfig>>,
}

impl SingleProcess {
    /// Create a topology for the given role.
    pub fn new(role: ProcessRole) -> Self {
        Self {
            role,
            shared: OnceLock::new(),
        }
    }

    /// Create a coordinator topology.
    pub fn coordinator() -> Self {
        Self::new(ProcessRole::Coordinator)
    }

    /// Create a worker topology.
    pub fn worker() -> Self {
        Self::new(ProcessRole::Worker)
    }

    /// Create a topology whose role is detected from the environment.
    pub fn from_env(env: &EnvSnapshot) -> Self {
        Self::new(ProcessRole::from_env(env))
    }

    /// The configuration broadcast so far, if any.
    pub fn shared_config(&self) -> Option<Arc<EffectiveConfig>> {
        self.shared.get().cloned()
    }
}

impl ProcessTopology for SingleProcess {
    fn role(&self) -> ProcessRole {
        self.role
    }

    fn broadcast_config(&self, config: Arc<EffectiveConfig>) -> BootstrapResult<()> {
        if !self.role.is_coordinator() {
            return Err(BootstrapError::topology(
                "only the coordinator may broadcast configuration",
            ));
        }

        self.shared
            .set(config)
            .map_err(|_| BootstrapError::topology("configuration was already broadcast"))
    }
}

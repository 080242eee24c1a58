use crate::constants::MAX_TARGETS;
use crate::error::{Error, Result};
use crate::types::TargetId;
use std::net::IpAddr;
use tracing::{instrument, warn};

/// A monitored network endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Target {
    id: TargetId,
    name: String,
    addr: IpAddr,
}

impl Target {
    #[must_use]
    pub const fn id(&self) -> TargetId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }
}

/// The set of monitored targets, in registration order.
///
/// Entries are created once at startup and never mutated afterward.
#[derive(Debug, Clone, Default)]
pub struct TargetRegistry {
    targets: Vec<Target>,
    unresolved: Vec<String>,
}

impl TargetRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a resolved target and return its identifier.
    ///
    /// Identifiers are allocated sequentially from zero.  Registration fails
    /// with [`Error::TooManyTargets`] once [`MAX_TARGETS`] identifiers have
    /// been allocated, leaving the registry unchanged.
    #[instrument(skip(self), level = "trace")]
    pub fn register(&mut self, name: &str, addr: IpAddr) -> Result<TargetId> {
        if self.targets.len() >= MAX_TARGETS {
            return Err(Error::TooManyTargets);
        }
        let id = TargetId(u8::try_from(self.targets.len()).map_err(|_| Error::TooManyTargets)?);
        self.targets.push(Target {
            id,
            name: name.to_string(),
            addr,
        });
        Ok(id)
    }

    /// Note a target whose name could not be resolved.
    ///
    /// No identifier is allocated; monitoring continues with the remaining
    /// targets.
    pub fn resolve_failed(&mut self, name: &str, reason: &str) {
        warn!(host = name, reason, "excluding unresolvable target");
        self.unresolved.push(name.to_string());
    }

    #[must_use]
    pub fn name_of(&self, id: TargetId) -> Option<&str> {
        self.get(id).map(Target::name)
    }

    #[must_use]
    pub fn addr_of(&self, id: TargetId) -> Option<IpAddr> {
        self.get(id).map(Target::addr)
    }

    #[must_use]
    pub fn get(&self, id: TargetId) -> Option<&Target> {
        self.targets.get(id.index())
    }

    /// The registered targets in registration order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.targets.iter()
    }

    /// The names of targets which failed to resolve.
    #[must_use]
    pub fn unresolved(&self) -> &[String] {
        &self.unresolved
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.targets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }
}

use std::sync::Arc;

use glint_core::{Profile, Resources, Stage};

use crate::diagnostics::MessagePolicy;
use crate::symbols::BuiltInTable;

/// Per-compilation configuration.
#[derive(Clone, Debug)]
pub struct CompileOptions {
    pub(crate) stage: Stage,
    pub(crate) version: u32,
    pub(crate) profile: Profile,
    pub(crate) forward_compatible: bool,
    pub(crate) policy: MessagePolicy,
    pub(crate) resources: Resources,
    pub(crate) built_ins: Option<Arc<BuiltInTable>>,
}

impl CompileOptions {
    /// Desktop core 450 for `stage` with default resources.
    pub fn new(stage: Stage) -> Self {
        Self {
            stage,
            version: 450,
            profile: Profile::Core,
            forward_compatible: false,
            policy: MessagePolicy::default(),
            resources: Resources::default(),
            built_ins: None,
        }
    }

    /// Set the `#version` and profile.
    pub fn version(mut self, version: u32, profile: Profile) -> Self {
        self.version = version;
        self.profile = profile;
        self
    }

    /// Treat deprecated constructs as errors.
    pub fn forward_compatible(mut self, value: bool) -> Self {
        self.forward_compatible = value;
        self
    }

    /// Set the message suppression/escalation policy.
    pub fn policy(mut self, policy: MessagePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Set the resource limits.
    pub fn resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Share a built-in table already built for the same stage, version,
    /// profile and resources.
    pub fn built_ins(mut self, table: Arc<BuiltInTable>) -> Self {
        self.built_ins = Some(table);
        self
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn is_es(&self) -> bool {
        self.profile == Profile::Es
    }

    /// The built-in table these options select, building it if none was shared.
    pub fn build_built_ins(&self) -> Arc<BuiltInTable> {
        match &self.built_ins {
            Some(table) => table.clone(),
            None => Arc::new(BuiltInTable::new(
                self.stage,
                self.version,
                self.profile,
                &self.resources,
            )),
        }
    }
}

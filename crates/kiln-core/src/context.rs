//! Shared pipeline context.
//!
//! This module defines the `Context` struct, which groups the layout and every
//! external capability used throughout the install pipeline to reduce
//! argument fatigue.

use std::fmt;
use std::sync::Arc;

use crate::exec::{CommandRunner, HostRunner};
use crate::flags::{FlagSource, PkgConfig};
use crate::installer::Privilege;
use crate::interact::Interaction;
use crate::paths::Layout;
use crate::probe::{HostFs, Probe};
use crate::reporter::Reporter;
use crate::vcs::{Git, Vcs};

/// Groups common state used by the fetch/build/install pipeline.
#[derive(Clone)]
pub struct Context {
    /// Directory layout (registry, working copies, bin directories).
    pub layout: Layout,
    /// Filesystem predicates.
    pub probe: Arc<dyn Probe>,
    /// Child process execution.
    pub runner: Arc<dyn CommandRunner>,
    /// Version control.
    pub vcs: Arc<dyn Vcs>,
    /// Compiler/linker flag lookup.
    pub flags: Arc<dyn FlagSource>,
    /// Operator questions.
    pub interaction: Arc<dyn Interaction>,
    /// Operator-facing output.
    pub reporter: Arc<dyn Reporter>,
    /// How system-scope copies gain privilege.
    pub privilege: Privilege,
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Context")
            .field("layout", &self.layout)
            .field("privilege", &self.privilege)
            .finish_non_exhaustive()
    }
}

impl Context {
    /// A context wired to the host: real filesystem, processes, git and
    /// pkg-config, with privilege detected from the running process.
    pub fn host(
        layout: Layout,
        interaction: Arc<dyn Interaction>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let runner: Arc<dyn CommandRunner> = Arc::new(HostRunner);
        Self {
            layout,
            probe: Arc::new(HostFs),
            vcs: Arc::new(Git::new(runner.clone())),
            flags: Arc::new(PkgConfig::new(runner.clone())),
            runner,
            interaction,
            reporter,
            privilege: Privilege::detect(),
        }
    }
}

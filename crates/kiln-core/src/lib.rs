//! kiln core - fetch, build, install and track packages built from source.
//!
//! # Pipeline
//!
//! ```text
//! reference --[source]--> Origin --[acquire]--> Checkout --[build]--> BuildSystem
//!      --[locate]--> binary --[installer]--> destination --[registry]--> record
//! ```
//!
//! Every stage reaches the outside world through a capability held by
//! [`Context`]: [`Probe`] for filesystem predicates, [`CommandRunner`] for child
//! processes, [`Vcs`] for git, [`FlagSource`] for pkg-config, [`Interaction`] for
//! prompts and [`Reporter`] for operator-facing output. Tests swap any of them.
//!
//! Packages are processed one at a time; see [`pipeline::install_batch`] and
//! [`upgrade::reconcile`].

pub mod acquire;
pub mod build;
pub mod context;
pub mod exec;
pub mod flags;
pub mod installer;
pub mod interact;
pub mod locate;
pub mod paths;
pub mod pipeline;
pub mod probe;
pub mod registry;
pub mod remove;
pub mod reporter;
pub mod source;
pub mod upgrade;
pub mod vcs;

#[cfg(test)]
pub(crate) mod testing;

pub use context::Context;
pub use exec::{CommandRunner, ExecError, HostRunner};
pub use flags::{CompileFlags, FlagSource, PkgConfig};
pub use installer::Privilege;
pub use interact::{AssumeYes, Interaction};
pub use paths::Layout;
pub use pipeline::{InstallError, InstallPipeline, InstallRequest, Installed, Pipeline};
pub use probe::{HostFs, Probe};
pub use registry::{Registry, RegistryError};
pub use reporter::{NullReporter, Reporter};
pub use source::Origin;
pub use vcs::{Git, Vcs, VcsError};

pub use kiln_schema::{BuildSystem, CommitId, InstallScope, PackageName, PackageRecord};

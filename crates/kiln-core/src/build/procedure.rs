//! Per-build-system procedures.
//!
//! A procedure turns a build root, the package's compile flags and the
//! static-link request into a list of [`Step`]s. Planning is pure; the
//! dispatcher in the parent module executes the plan.

use std::path::{Path, PathBuf};
use std::process::Command;

use kiln_schema::BuildSystem;

use crate::flags::CompileFlags;

/// Rust target triple used for static cargo builds on this machine.
///
/// ```
/// let triple = kiln_core::build::procedure::musl_target();
/// assert!(triple.ends_with("-unknown-linux-musl"));
/// ```
pub fn musl_target() -> String {
    format!("{}-unknown-linux-musl", std::env::consts::ARCH)
}

/// A single external command with its working directory and environment
/// overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    /// Program to run.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
    /// Working directory.
    pub dir: PathBuf,
    /// Environment variables set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    /// Failures are logged and ignored, and output is discarded.
    pub best_effort: bool,
}

impl Invocation {
    fn new(program: &str, dir: &Path) -> Self {
        Self {
            program: program.to_string(),
            args: Vec::new(),
            dir: dir.to_path_buf(),
            env: Vec::new(),
            best_effort: false,
        }
    }

    fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    fn env(mut self, key: &str, value: String) -> Self {
        self.env.push((key.to_string(), value));
        self
    }

    fn flag_env(mut self, flags: &CompileFlags, static_link: bool) -> Self {
        let cflags = with_static(&flags.cflags, static_link);
        let ldflags = with_static(&flags.libs, static_link);
        if !cflags.is_empty() {
            self = self.env("CFLAGS", cflags);
        }
        if !ldflags.is_empty() {
            self = self.env("LDFLAGS", ldflags);
        }
        self
    }

    fn best_effort(mut self) -> Self {
        self.best_effort = true;
        self
    }

    /// The process to spawn.
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args).current_dir(&self.dir);
        for (key, value) in &self.env {
            cmd.env(key, value);
        }
        cmd
    }
}

/// Append `-static` to a flag string when linking statically.
fn with_static(flags: &str, static_link: bool) -> String {
    match (flags.is_empty(), static_link) {
        (_, false) => flags.to_string(),
        (true, true) => "-static".to_string(),
        (false, true) => format!("{flags} -static"),
    }
}

/// One action in a build plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Create a directory (and its parents).
    CreateDir(PathBuf),
    /// Set mode 0755 on a file.
    MakeExecutable(PathBuf),
    /// Run an external command.
    Run(Invocation),
}

/// How one build system is driven.
pub trait BuildProcedure: Send + Sync {
    /// Tag recorded in the registry.
    fn system(&self) -> BuildSystem;

    /// Whether [`BuildProcedure::plan`] can produce a statically linked binary.
    fn supports_static(&self) -> bool;

    /// Steps that build the project rooted at `root`.
    fn plan(&self, root: &Path, flags: &CompileFlags, static_link: bool) -> Vec<Step>;
}

/// Procedure for a build system.
pub fn procedure_for(system: BuildSystem) -> &'static dyn BuildProcedure {
    match system {
        BuildSystem::Make => &Make,
        BuildSystem::Cargo => &Cargo,
        BuildSystem::Cmake => &Cmake,
        BuildSystem::Configure => &Configure,
        BuildSystem::Zig => &Zig,
        BuildSystem::Shell => &Shell,
    }
}

struct Make;

impl BuildProcedure for Make {
    fn system(&self) -> BuildSystem {
        BuildSystem::Make
    }

    fn supports_static(&self) -> bool {
        true
    }

    fn plan(&self, root: &Path, flags: &CompileFlags, static_link: bool) -> Vec<Step> {
        vec![Step::Run(
            Invocation::new("make", root).flag_env(flags, static_link),
        )]
    }
}

struct Cargo;

impl BuildProcedure for Cargo {
    fn system(&self) -> BuildSystem {
        BuildSystem::Cargo
    }

    fn supports_static(&self) -> bool {
        true
    }

    fn plan(&self, root: &Path, _flags: &CompileFlags, static_link: bool) -> Vec<Step> {
        let build = Invocation::new("cargo", root).args(["build", "--release"]);
        if !static_link {
            return vec![Step::Run(build)];
        }
        let target = musl_target();
        vec![
            Step::Run(
                Invocation::new("rustup", root)
                    .args(["target", "add", target.as_str()])
                    .best_effort(),
            ),
            Step::Run(build.args(["--target", target.as_str()])),
        ]
    }
}

struct Cmake;

impl BuildProcedure for Cmake {
    fn system(&self) -> BuildSystem {
        BuildSystem::Cmake
    }

    fn supports_static(&self) -> bool {
        true
    }

    fn plan(&self, root: &Path, flags: &CompileFlags, static_link: bool) -> Vec<Step> {
        let build_dir = root.join("build");
        let mut configure = Invocation::new("cmake", &build_dir)
            .args([".."])
            .flag_env(flags, false);
        if static_link {
            configure = configure.args(["-DCMAKE_EXE_LINKER_FLAGS=-static", "-DBUILD_SHARED_LIBS=OFF"]);
        }
        vec![
            Step::CreateDir(build_dir.clone()),
            Step::Run(configure),
            Step::Run(Invocation::new("make", &build_dir)),
        ]
    }
}

struct Configure;

impl BuildProcedure for Configure {
    fn system(&self) -> BuildSystem {
        BuildSystem::Configure
    }

    fn supports_static(&self) -> bool {
        true
    }

    fn plan(&self, root: &Path, flags: &CompileFlags, static_link: bool) -> Vec<Step> {
        let mut configure = Invocation::new("./configure", root).flag_env(flags, false);
        if static_link {
            configure = configure.args([
                format!("LDFLAGS={}", with_static(&flags.libs, true)),
                "--disable-shared".to_string(),
            ]);
        }
        vec![
            Step::Run(configure),
            Step::Run(Invocation::new("make", root)),
        ]
    }
}

struct Zig;

impl BuildProcedure for Zig {
    fn system(&self) -> BuildSystem {
        BuildSystem::Zig
    }

    fn supports_static(&self) -> bool {
        true
    }

    fn plan(&self, root: &Path, _flags: &CompileFlags, static_link: bool) -> Vec<Step> {
        let mut build = Invocation::new("zig", root).args(["build"]);
        if static_link {
            build = build.args(["-Dtarget=native-native-musl"]);
        }
        vec![Step::Run(build)]
    }
}

/// `build.sh` gets compile flags but no static-link contract.
struct Shell;

impl BuildProcedure for Shell {
    fn system(&self) -> BuildSystem {
        BuildSystem::Shell
    }

    fn supports_static(&self) -> bool {
        false
    }

    fn plan(&self, root: &Path, flags: &CompileFlags, _static_link: bool) -> Vec<Step> {
        vec![
            Step::MakeExecutable(root.join("build.sh")),
            Step::Run(Invocation::new("./build.sh", root).flag_env(flags, false)),
        ]
    }
}

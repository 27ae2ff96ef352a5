//! Capability fakes shared by unit tests.

#![allow(missing_docs, unreachable_pub)]

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::{Arc, Mutex};

use kiln_schema::CommitId;
use tempfile::TempDir;

use crate::context::Context;
use crate::exec::{CommandRunner, ExecError, program_name};
use crate::flags::{CompileFlags, FlagSource};
use crate::installer::Privilege;
use crate::interact::Interaction;
use crate::paths::Layout;
use crate::probe::{HostFs, Probe};
use crate::reporter::Reporter;
use crate::source::Origin;
use crate::vcs::{Vcs, VcsError};

/// One command seen by [`RecordingRunner`].
#[derive(Debug, Clone)]
pub struct Recorded {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    pub dir: Option<PathBuf>,
}

impl Recorded {
    pub fn env(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Records every command instead of running it.
#[derive(Debug, Default)]
pub struct RecordingRunner {
    calls: Mutex<Vec<Recorded>>,
    responses: Mutex<HashMap<String, String>>,
    failing: Mutex<HashSet<String>>,
}

impl RecordingRunner {
    /// Stdout returned by `capture` for `program`.
    pub fn respond(&self, program: &str, output: &str) {
        self.responses
            .lock()
            .unwrap()
            .insert(program.to_string(), output.to_string());
    }

    /// Make every invocation of `program` exit with status 1.
    pub fn fail(&self, program: &str) {
        self.failing.lock().unwrap().insert(program.to_string());
    }

    pub fn calls(&self) -> Vec<Recorded> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, cmd: &Command) -> Result<String, ExecError> {
        let program = program_name(cmd);
        let recorded = Recorded {
            program: program.clone(),
            args: cmd
                .get_args()
                .map(|a| a.to_string_lossy().into_owned())
                .collect(),
            envs: cmd
                .get_envs()
                .filter_map(|(k, v)| {
                    v.map(|v| {
                        (
                            k.to_string_lossy().into_owned(),
                            v.to_string_lossy().into_owned(),
                        )
                    })
                })
                .collect(),
            dir: cmd.get_current_dir().map(Path::to_path_buf),
        };
        self.calls.lock().unwrap().push(recorded);

        if self.failing.lock().unwrap().contains(&program) {
            return Err(ExecError::Status {
                program,
                code: Some(1),
            });
        }
        Ok(self
            .responses
            .lock()
            .unwrap()
            .get(&program)
            .cloned()
            .unwrap_or_default())
    }
}

impl CommandRunner for RecordingRunner {
    fn run(&self, cmd: &mut Command) -> Result<(), ExecError> {
        self.record(cmd).map(|_| ())
    }

    fn capture(&self, cmd: &mut Command) -> Result<String, ExecError> {
        self.record(cmd)
    }
}

/// In-memory filesystem predicates.
#[derive(Debug, Default)]
pub struct MockProbe {
    files: HashSet<PathBuf>,
    dirs: HashSet<PathBuf>,
}

impl MockProbe {
    pub fn add_file(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        for ancestor in path.ancestors().skip(1) {
            self.dirs.insert(ancestor.to_path_buf());
        }
        self.files.insert(path);
    }

    pub fn add_dir(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        for ancestor in path.ancestors() {
            self.dirs.insert(ancestor.to_path_buf());
        }
    }
}

impl Probe for MockProbe {
    fn is_dir(&self, path: &Path) -> bool {
        self.dirs.contains(path)
    }

    fn is_file(&self, path: &Path) -> bool {
        self.files.contains(path)
    }

    fn is_dir_empty(&self, path: &Path) -> bool {
        !self
            .files
            .iter()
            .chain(self.dirs.iter())
            .any(|p| p.parent() == Some(path))
    }
}

/// Answers questions from queues; falls back to yes / first option.
#[derive(Debug, Default)]
pub struct ScriptedInteraction {
    confirms: Mutex<VecDeque<bool>>,
    selections: Mutex<VecDeque<Option<usize>>>,
    prompts: Mutex<Vec<String>>,
    reviewed: Mutex<Vec<PathBuf>>,
}

impl ScriptedInteraction {
    pub fn answer_confirm(&self, answer: bool) {
        self.confirms.lock().unwrap().push_back(answer);
    }

    pub fn answer_select(&self, answer: Option<usize>) {
        self.selections.lock().unwrap().push_back(answer);
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    pub fn reviewed(&self) -> Vec<PathBuf> {
        self.reviewed.lock().unwrap().clone()
    }
}

impl Interaction for ScriptedInteraction {
    fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.confirms.lock().unwrap().pop_front().unwrap_or(true)
    }

    fn select(&self, prompt: &str, _options: &[String]) -> Option<usize> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.selections.lock().unwrap().pop_front().unwrap_or(Some(0))
    }

    fn review(&self, path: &Path) {
        self.reviewed.lock().unwrap().push(path.to_path_buf());
    }
}

#[derive(Debug, Default)]
struct VcsState {
    head: Option<String>,
    clone_fails: bool,
    remote_heads: HashMap<String, String>,
    seed: Vec<(PathBuf, String)>,
    clones: Vec<String>,
    remote_queries: Vec<(String, Option<String>)>,
}

/// Git stand-in: clones create the destination and write seeded files.
#[derive(Debug)]
pub struct FakeVcs {
    state: Mutex<VcsState>,
}

impl Default for FakeVcs {
    fn default() -> Self {
        Self {
            state: Mutex::new(VcsState {
                head: Some("0000000000000000000000000000000000000000".into()),
                ..VcsState::default()
            }),
        }
    }
}

impl FakeVcs {
    pub fn set_head(&self, commit: &str) {
        self.state.lock().unwrap().head = Some(commit.to_string());
    }

    pub fn fail_head(&self) {
        self.state.lock().unwrap().head = None;
    }

    pub fn fail_clone(&self) {
        self.state.lock().unwrap().clone_fails = true;
    }

    /// Remote head reported for a clone URL.
    pub fn set_remote_head(&self, url: &str, commit: &str) {
        self.state
            .lock()
            .unwrap()
            .remote_heads
            .insert(url.to_string(), commit.to_string());
    }

    /// File every subsequent clone will contain.
    pub fn seed(&self, relative: &str, contents: &str) {
        self.state
            .lock()
            .unwrap()
            .seed
            .push((PathBuf::from(relative), contents.to_string()));
    }

    /// URLs cloned so far.
    pub fn clones(&self) -> Vec<String> {
        self.state.lock().unwrap().clones.clone()
    }

    pub fn remote_queries(&self) -> Vec<(String, Option<String>)> {
        self.state.lock().unwrap().remote_queries.clone()
    }
}

impl Vcs for FakeVcs {
    fn clone_shallow(
        &self,
        origin: &Origin,
        _branch: Option<&str>,
        dest: &Path,
    ) -> Result<(), VcsError> {
        let mut state = self.state.lock().unwrap();
        state.clones.push(origin.url());
        if state.clone_fails {
            return Err(ExecError::Status {
                program: "git".into(),
                code: Some(128),
            }
            .into());
        }
        std::fs::create_dir_all(dest.join(".git")).unwrap();
        for (relative, contents) in &state.seed {
            let path = dest.join(relative);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(path, contents).unwrap();
        }
        Ok(())
    }

    fn head(&self, _work_dir: &Path) -> Result<CommitId, VcsError> {
        match &self.state.lock().unwrap().head {
            Some(commit) => Ok(CommitId::new(commit.clone())),
            None => Err(ExecError::Status {
                program: "git".into(),
                code: Some(128),
            }
            .into()),
        }
    }

    fn remote_head(&self, origin: &Origin, branch: Option<&str>) -> Result<CommitId, VcsError> {
        let mut state = self.state.lock().unwrap();
        let url = origin.url();
        state
            .remote_queries
            .push((url.clone(), branch.map(str::to_string)));
        state
            .remote_heads
            .get(&url)
            .map(|c| CommitId::new(c.clone()))
            .ok_or(VcsError::NoRemoteHead(url))
    }
}

/// Fixed flag lookup.
#[derive(Debug)]
pub struct StaticFlags {
    pub available: bool,
    pub flags: CompileFlags,
}

impl Default for StaticFlags {
    fn default() -> Self {
        Self {
            available: true,
            flags: CompileFlags::default(),
        }
    }
}

impl FlagSource for StaticFlags {
    fn available(&self) -> bool {
        self.available
    }

    fn query(&self, _package: &str, _static_link: bool) -> CompileFlags {
        self.flags.clone()
    }
}

/// Keeps every message as `"<kind>: <text>"`.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    fn push(&self, kind: &str, msg: &str) {
        self.lines.lock().unwrap().push(format!("{kind}: {msg}"));
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap().clone()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.lines().iter().any(|l| l.contains(needle))
    }
}

impl Reporter for RecordingReporter {
    fn section(&self, title: &str) {
        self.push("section", title);
    }
    fn done(&self, name: &str, detail: &str) {
        self.push("done", &format!("{name} {detail}"));
    }
    fn failed(&self, name: &str, reason: &str) {
        self.push("failed", &format!("{name} {reason}"));
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn success(&self, msg: &str) {
        self.push("success", msg);
    }
    fn warning(&self, msg: &str) {
        self.push("warning", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn summary(&self, count: usize, action: &str, _elapsed_secs: f64) {
        self.push("summary", &format!("{count} {action}"));
    }
}

/// A sandboxed layout plus one fake per capability.
///
/// The probe is the real filesystem (confined to the sandbox); privilege
/// defaults to root so system-scope copies land in the sandbox directly.
#[derive(Debug)]
pub struct TestKit {
    tmp: TempDir,
    pub layout: Layout,
    pub runner: Arc<RecordingRunner>,
    pub vcs: Arc<FakeVcs>,
    pub flags: Arc<StaticFlags>,
    pub interaction: Arc<ScriptedInteraction>,
    pub reporter: Arc<RecordingReporter>,
    pub privilege: Privilege,
}

impl TestKit {
    pub fn new() -> Self {
        let tmp = tempfile::tempdir().unwrap();
        let layout = Layout::rooted(tmp.path());
        layout.ensure().unwrap();
        Self {
            tmp,
            layout,
            runner: Arc::default(),
            vcs: Arc::default(),
            flags: Arc::default(),
            interaction: Arc::default(),
            reporter: Arc::default(),
            privilege: Privilege::Root,
        }
    }

    pub fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }

    pub fn with_flags(mut self, flags: StaticFlags) -> Self {
        self.flags = Arc::new(flags);
        self
    }

    pub fn root(&self) -> &Path {
        self.tmp.path()
    }

    pub fn ctx(&self) -> Context {
        Context {
            layout: self.layout.clone(),
            probe: Arc::new(HostFs),
            runner: self.runner.clone(),
            vcs: self.vcs.clone(),
            flags: self.flags.clone(),
            interaction: self.interaction.clone(),
            reporter: self.reporter.clone(),
            privilege: self.privilege.clone(),
        }
    }
}

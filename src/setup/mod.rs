//! Setup orchestration.
//!
//! [`SetupOrchestrator`] performs a single run. [`SetupService`] schedules
//! runs on background threads and guarantees that at most one run touches a
//! given project at a time, since runs for the same project share its build
//! directory. Runs for different projects proceed in parallel.

mod error;
mod orchestrator;
mod state;
#[cfg(test)]
pub(crate) mod testing;

pub use error::SetupError;
pub use orchestrator::{
    DEFAULT_ARCHITECTURE, PROJECT_FILES, PreparedCommand, Selection, SetupOrchestrator,
};
pub use state::SetupState;

use crate::command::CommandLine;
use crate::process::{CancelToken, ProcessResult};
use crate::project::Project;
use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, TryLockError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// What a run should (re)configure. The three variants differ only in which
/// selection is fixed by the caller and which is read from the project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SetupRequest {
    Setup,
    ChangeArchitecture(String),
    ChangeBuildType(String),
}

impl fmt::Display for SetupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SetupRequest::Setup => f.write_str("setup"),
            SetupRequest::ChangeArchitecture(arch) => write!(f, "change architecture to {arch}"),
            SetupRequest::ChangeBuildType(bt) => write!(f, "change build type to {bt}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct SetupOutcome {
    pub command: CommandLine,
    pub selection: Selection,
    pub result: ProcessResult,
    /// Filtered stderr of a successful run (warnings)
    pub stderr: String,
    /// Metadata files now in the project root
    pub reconciled: Vec<PathBuf>,
    /// Post-processing problems that did not fail the run
    pub warnings: Vec<String>,
    pub states: Vec<SetupState>,
}

const LOCK_POLL_INTERVAL: Duration = Duration::from_millis(20);

/// One mutex per project root, shared by every task of a service.
#[derive(Debug, Clone, Default)]
pub struct ProjectLocks {
    locks: Arc<Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>>,
}

impl ProjectLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_for(&self, project: &Project) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        // Drop entries nobody holds any more.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(project.root().to_path_buf())
            .or_default()
            .clone()
    }

    /// Number of projects with a task queued or running.
    pub fn active(&self) -> usize {
        let locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.values().filter(|lock| Arc::strong_count(lock) > 1).count()
    }
}

/// Wait for `lock`, giving up when `cancel` fires.
fn acquire<'a>(
    lock: &'a Mutex<()>,
    cancel: &CancelToken,
) -> Result<MutexGuard<'a, ()>, SetupError> {
    loop {
        if cancel.is_cancelled() {
            return Err(SetupError::Interrupted);
        }
        match lock.try_lock() {
            Ok(guard) => return Ok(guard),
            Err(TryLockError::Poisoned(poisoned)) => return Ok(poisoned.into_inner()),
            Err(TryLockError::WouldBlock) => thread::sleep(LOCK_POLL_INTERVAL),
        }
    }
}

/// Schedules setup runs, one at a time per project.
#[derive(Clone)]
pub struct SetupService {
    orchestrator: Arc<SetupOrchestrator>,
    locks: ProjectLocks,
}

impl SetupService {
    pub fn new(orchestrator: SetupOrchestrator) -> Self {
        Self::with_locks(orchestrator, ProjectLocks::new())
    }

    /// Share `locks` with other services pointing at the same projects.
    pub fn with_locks(orchestrator: SetupOrchestrator, locks: ProjectLocks) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            locks,
        }
    }

    pub fn orchestrator(&self) -> &SetupOrchestrator {
        &self.orchestrator
    }

    pub fn locks(&self) -> &ProjectLocks {
        &self.locks
    }

    pub fn setup_project(&self, project: Project) -> Result<SetupTask, SetupError> {
        self.submit(project, SetupRequest::Setup)
    }

    pub fn change_architecture(
        &self,
        project: Project,
        architecture: impl Into<String>,
    ) -> Result<SetupTask, SetupError> {
        self.submit(project, SetupRequest::ChangeArchitecture(architecture.into()))
    }

    pub fn change_build_type(
        &self,
        project: Project,
        build_type: impl Into<String>,
    ) -> Result<SetupTask, SetupError> {
        self.submit(project, SetupRequest::ChangeBuildType(build_type.into()))
    }

    /// Run `request` on a background thread.
    pub fn submit(&self, project: Project, request: SetupRequest) -> Result<SetupTask, SetupError> {
        let name = format!("{} ({})", request, project);
        let cancel = CancelToken::new();
        let service = self.clone();
        let token = cancel.clone();

        let handle = thread::Builder::new()
            .name(format!("setup-{}", project.name()))
            .spawn(move || service.run_blocking(&project, &request, &token))
            .map_err(SetupError::Schedule)?;

        Ok(SetupTask {
            name,
            cancel,
            handle,
        })
    }

    /// Run `request` on the calling thread once the project is free.
    pub fn run_blocking(
        &self,
        project: &Project,
        request: &SetupRequest,
        cancel: &CancelToken,
    ) -> Result<SetupOutcome, SetupError> {
        let lock = self.locks.lock_for(project);
        log::debug!("{}: waiting for project lock", project);
        let _guard = acquire(&lock, cancel)?;
        self.orchestrator.run(project, request, cancel)
    }
}

/// Handle to a scheduled run.
#[derive(Debug)]
pub struct SetupTask {
    name: String,
    cancel: CancelToken,
    handle: JoinHandle<Result<SetupOutcome, SetupError>>,
}

impl SetupTask {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Ask the run to stop. A running CMake process is killed.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Wait for the run to finish.
    pub fn join(self) -> Result<SetupOutcome, SetupError> {
        match self.handle.join() {
            Ok(result) => result,
            Err(panic) => std::panic::resume_unwind(panic),
        }
    }
}

//! Test doubles for orchestrator and service tests.

use crate::command::CommandLine;
use crate::config::Settings;
use crate::console::{CommandReport, Reporter};
use crate::process::{CancelToken, CommandRunner, ProcessError, ProcessResult};
use crate::project::{Project, ProjectModel};
use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

pub(crate) struct Fixture {
    pub project: Project,
    pub toolchains: PathBuf,
    pub settings: Settings,
    _dir: tempfile::TempDir,
}

/// A project directory plus a toolchain directory holding `architectures`.
pub(crate) fn fixture(architectures: &[&str]) -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path().join("project");
    let toolchains = dir.path().join("toolchains");
    fs::create_dir_all(&root).unwrap();
    fs::create_dir_all(&toolchains).unwrap();
    for arch in architectures {
        fs::write(toolchains.join(format!("toolchain.{arch}.cmake")), "").unwrap();
    }

    let mut settings = Settings::default();
    settings.toolchains.dir = Some(toolchains.clone());

    Fixture {
        project: Project::new("project", root),
        toolchains,
        settings,
        _dir: dir,
    }
}

#[derive(Default)]
pub(crate) struct FakeRunner {
    exit_code: i32,
    stderr: String,
    delay: Duration,
    generate_for: Vec<String>,
    commands: Mutex<Vec<String>>,
    windows: Mutex<Vec<(Instant, Instant)>>,
}

impl FakeRunner {
    pub fn ok() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing(exit_code: i32, stderr: &str) -> Arc<Self> {
        Arc::new(Self {
            exit_code,
            stderr: stderr.to_string(),
            ..Self::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            delay,
            ..Self::default()
        })
    }

    /// Writes Eclipse metadata into `bin/<arch>/` like CMake would.
    pub fn generating(architectures: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            generate_for: architectures.iter().map(|a| a.to_string()).collect(),
            ..Self::default()
        })
    }

    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }

    /// Start and end of every run, in start order.
    pub fn windows(&self) -> Vec<(Instant, Instant)> {
        let mut windows = self.windows.lock().unwrap().clone();
        windows.sort();
        windows
    }
}

impl CommandRunner for FakeRunner {
    fn run(
        &self,
        command: &CommandLine,
        working_dir: Option<&Path>,
        _cancel: &CancelToken,
    ) -> Result<ProcessResult, ProcessError> {
        let start = Instant::now();
        self.commands.lock().unwrap().push(command.to_string());

        if let Some(dir) = working_dir {
            for arch in &self.generate_for {
                let bin = dir.join("bin").join(arch);
                fs::create_dir_all(&bin).unwrap();
                fs::write(bin.join(".project"), format!("<project arch=\"{arch}\"/>")).unwrap();
                fs::write(bin.join(".cproject"), format!("<cproject arch=\"{arch}\"/>")).unwrap();
            }
        }
        thread::sleep(self.delay);

        self.windows.lock().unwrap().push((start, Instant::now()));
        Ok(ProcessResult {
            exit_code: self.exit_code,
            stdout: "-- Configuring done\n".to_string(),
            stderr: self.stderr.clone(),
        })
    }
}

/// Project model that keeps settings in memory and logs every request.
#[derive(Default)]
pub(crate) struct MemoryProject {
    settings: Mutex<HashMap<String, String>>,
    derived: Mutex<Vec<PathBuf>>,
    calls: Mutex<Vec<String>>,
}

impl MemoryProject {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set(&self, _project: &Project, key: &str, value: &str) {
        self.settings
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn get(&self, _project: &Project, key: &str) -> Option<String> {
        self.settings.lock().unwrap().get(key).cloned()
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn derived(&self) -> Vec<PathBuf> {
        self.derived.lock().unwrap().clone()
    }

    fn record(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}

impl ProjectModel for MemoryProject {
    fn refresh(&self, _project: &Project) -> io::Result<()> {
        self.record("refresh".to_string());
        Ok(())
    }

    fn mark_derived(&self, _project: &Project, path: &Path) -> io::Result<()> {
        self.record(format!("mark_derived {}", file_name(path)));
        self.derived.lock().unwrap().push(path.to_path_buf());
        Ok(())
    }

    fn copy_file(&self, src: &Path, dst: &Path) -> io::Result<()> {
        self.record(format!("copy {}", file_name(dst)));
        fs::copy(src, dst).map(|_| ())
    }

    fn overwrite_if_different(&self, src: &Path, dst: &Path) -> io::Result<bool> {
        self.record(format!("overwrite {}", file_name(dst)));
        let content = fs::read(src)?;
        fs::write(dst, content)?;
        Ok(true)
    }

    fn reindex(&self, _project: &Project) -> io::Result<()> {
        self.record("reindex".to_string());
        Ok(())
    }

    fn get_setting(&self, project: &Project, key: &str) -> Option<String> {
        self.get(project, key)
    }

    fn set_setting(&self, project: &Project, key: &str, value: &str) -> io::Result<()> {
        self.set(project, key, value);
        Ok(())
    }

    fn clear_setting(&self, _project: &Project, key: &str) -> io::Result<()> {
        self.record(format!("clear_setting {key}"));
        self.settings.lock().unwrap().remove(key);
        Ok(())
    }
}

#[derive(Default)]
pub(crate) struct RecordingReporter {
    reports: Mutex<Vec<CommandReport>>,
}

impl RecordingReporter {
    pub fn reports(&self) -> Vec<CommandReport> {
        self.reports.lock().unwrap().clone()
    }
}

impl Reporter for RecordingReporter {
    fn report(&self, report: &CommandReport) {
        self.reports.lock().unwrap().push(report.clone());
    }
}

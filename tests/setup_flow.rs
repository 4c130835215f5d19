//! End-to-end tests for setup runs.
//!
//! A shell script stands in for `cmake`: it records its arguments, creates
//! the `-B` build directory and writes Eclipse metadata into it. Each test
//! gets its own temporary project and toolchain directory.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::Arc;

use cmide::config::Settings;
use cmide::console::ConsoleReporter;
use cmide::process::ProcessExecutor;
use cmide::project::{LocalProject, Project, ProjectModel, keys};
use cmide::setup::{SetupError, SetupOrchestrator, SetupRequest, SetupService};

const GENERATING_CMAKE: &str = r#"
for arg in "$@"; do
  case "$arg" in
    --help)
      printf 'Generators\n\n'
      printf '  Unix Makefiles               = Generates standard UNIX makefiles.\n'
      printf '  Eclipse CDT4 - Ninja         = Generates Eclipse CDT 4.0 project\n'
      printf '                                 files.\n'
      printf '  Eclipse CDT4 - Unix Makefiles= Generates Eclipse CDT 4.0 project files.\n'
      exit 0
      ;;
    --version)
      echo "cmake version 3.28.3"
      exit 0
      ;;
    -B*) out="${arg#-B}" ;;
  esac
done
mkdir -p "$out"
echo "<projectDescription>$out</projectDescription>" > "$out/.project"
echo "<cproject>$out</cproject>" > "$out/.cproject"
echo "-- Generating done"
"#;

const FAILING_CMAKE: &str = r#"
echo "-- Configuring incomplete"
echo "CMake Error: The source directory does not appear to contain CMakeLists.txt." >&2
exit 1
"#;

struct Sandbox {
    dir: tempfile::TempDir,
    root: PathBuf,
    toolchains: PathBuf,
}

impl Sandbox {
    fn new(architectures: &[&str], cmake_body: &str) -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let root = dir.path().join("firmware");
        let toolchains = dir.path().join("toolchains");
        fs::create_dir_all(&root).unwrap();
        fs::create_dir_all(&toolchains).unwrap();
        for arch in architectures {
            fs::write(toolchains.join(format!("toolchain.{arch}.cmake")), "").unwrap();
        }

        let log = dir.path().join("cmake.log");
        let script = dir.path().join("fake-cmake");
        fs::write(
            &script,
            format!(
                "#!/bin/sh\necho \"$@\" >> '{}'\n{}",
                log.display(),
                cmake_body
            ),
        )
        .unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();

        fs::write(
            root.join("cmide.toml"),
            format!(
                "[cmake]\npath = \"{}\"\nmake_args = \"-j4\"\n\n[toolchains]\ndir = \"{}\"\n",
                script.display(),
                toolchains.display()
            ),
        )
        .unwrap();

        Self {
            dir,
            root,
            toolchains,
        }
    }

    fn project(&self) -> Project {
        Project::open(&self.root).unwrap()
    }

    fn settings(&self) -> Settings {
        Settings::load_for(&self.root).unwrap()
    }

    fn invocations(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("cmake.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn service(&self, model: Arc<LocalProject>) -> SetupService {
        SetupService::new(SetupOrchestrator::new(
            self.settings(),
            Arc::new(ProcessExecutor::new()),
            model,
            Arc::new(ConsoleReporter::quiet()),
        ))
    }

    fn cmide(&self, args: &[&str]) -> Output {
        Command::new(env!("CARGO_BIN_EXE_cmide"))
            .args(args)
            .arg("--project")
            .arg(&self.root)
            .env("NO_COLOR", "1")
            .output()
            .expect("Failed to execute cmide")
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("{}: {e}", path.display()))
}

#[test]
fn test_setup_copies_metadata_into_project_root() {
    let sandbox = Sandbox::new(&["arm", "x86"], GENERATING_CMAKE);
    let model = Arc::new(LocalProject::new());
    let project = sandbox.project();

    let outcome = sandbox
        .service(model.clone())
        .setup_project(project.clone())
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(outcome.selection.architecture, "arm");
    assert_eq!(outcome.selection.build_type, "Debug");
    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert_eq!(outcome.reconciled.len(), 2);

    assert!(read(&sandbox.root.join(".project")).contains("bin/arm/"));
    assert!(read(&sandbox.root.join(".cproject")).contains("bin/arm/"));

    let derived = model.derived(&project);
    assert!(derived.contains(&PathBuf::from(".project")));
    assert!(derived.contains(&PathBuf::from(".cproject")));

    let invocations = sandbox.invocations();
    assert_eq!(invocations.len(), 1);
    let toolchain = sandbox.toolchains.join("toolchain.arm.cmake");
    assert!(invocations[0].contains(&format!("-DCMAKE_TOOLCHAIN_FILE={}", toolchain.display())));
    assert!(invocations[0].contains("-DCMAKE_BUILD_TYPE=Debug"));
    assert!(invocations[0].contains("-DCMAKE_ECLIPSE_MAKE_ARGUMENTS=-C bin/arm/ -j4"));
}

#[test]
fn test_change_architecture_overwrites_metadata() {
    let sandbox = Sandbox::new(&["arm", "x86"], GENERATING_CMAKE);
    let model = Arc::new(LocalProject::new());
    let service = sandbox.service(model.clone());
    let project = sandbox.project();

    service.setup_project(project.clone()).unwrap().join().unwrap();
    let outcome = service
        .change_architecture(project.clone(), "x86")
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(outcome.selection.architecture, "x86");
    assert!(read(&sandbox.root.join(".project")).contains("bin/x86/"));
    assert!(sandbox.root.join("bin/arm/.project").exists());
    assert!(sandbox.root.join("bin/x86/.cproject").exists());
}

#[test]
fn test_change_build_type_keeps_stored_architecture() {
    let sandbox = Sandbox::new(&["arm", "x86"], GENERATING_CMAKE);
    let model = Arc::new(LocalProject::new());
    let project = sandbox.project();
    model.set_setting(&project, keys::ARCHITECTURE, "x86").unwrap();

    let outcome = sandbox
        .service(model)
        .change_build_type(project, "Release")
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(outcome.selection.architecture, "x86");
    assert_eq!(outcome.selection.build_type, "Release");
    assert!(sandbox.invocations()[0].contains("-DCMAKE_BUILD_TYPE=Release"));
}

#[test]
fn test_missing_toolchain_aborts_before_running_cmake() {
    let sandbox = Sandbox::new(&["arm"], GENERATING_CMAKE);
    let err = sandbox
        .service(Arc::new(LocalProject::new()))
        .change_architecture(sandbox.project(), "riscv")
        .unwrap()
        .join()
        .unwrap_err();

    match err {
        SetupError::ToolchainUnavailable { architecture, path } => {
            assert_eq!(architecture, "riscv");
            assert!(path.ends_with("toolchain.riscv.cmake"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(sandbox.invocations().is_empty());
    assert!(!sandbox.root.join(".project").exists());
}

#[test]
fn test_failing_cmake_reports_stderr_and_copies_nothing() {
    let sandbox = Sandbox::new(&[], FAILING_CMAKE);
    let err = sandbox
        .service(Arc::new(LocalProject::new()))
        .setup_project(sandbox.project())
        .unwrap()
        .join()
        .unwrap_err();

    match &err {
        SetupError::NonZeroExit { exit_code, .. } => assert_eq!(*exit_code, 1),
        other => panic!("unexpected error: {other:?}"),
    }
    assert!(err.diagnostics().unwrap().contains("does not appear to contain"));
    assert!(!sandbox.root.join(".project").exists());
}

#[test]
fn test_cli_setup_persists_selection() {
    let sandbox = Sandbox::new(&["arm"], GENERATING_CMAKE);

    let output = sandbox.cmide(&["setup", "--quiet"]);
    assert!(
        output.status.success(),
        "setup failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let state = read(&LocalProject::state_path(&sandbox.project()));
    assert!(state.contains("architecture = \"arm\""));
    assert!(state.contains("build_type = \"Debug\""));
    assert!(sandbox.root.join(".cproject").exists());
}

#[test]
fn test_cli_build_type_switch() {
    let sandbox = Sandbox::new(&["arm"], GENERATING_CMAKE);

    let output = sandbox.cmide(&["build-type", "MinSizeRel"]);
    assert!(output.status.success());
    let state = read(&LocalProject::state_path(&sandbox.project()));
    assert!(state.contains("build_type = \"MinSizeRel\""));
}

#[test]
fn test_cli_failure_exits_non_zero() {
    let sandbox = Sandbox::new(&[], FAILING_CMAKE);

    let output = sandbox.cmide(&["setup"]);
    assert!(!output.status.success());
    assert!(!LocalProject::state_path(&sandbox.project()).exists());
}

#[test]
fn test_cli_lists_eclipse_generators() {
    let sandbox = Sandbox::new(&[], GENERATING_CMAKE);

    let output = sandbox.cmide(&["generators"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Eclipse CDT4 - Ninja"));
    assert!(stdout.contains("Eclipse CDT4 - Unix Makefiles"));
    assert!(!stdout.contains("standard UNIX makefiles"));
}

#[test]
fn test_cli_arch_list_shows_toolchains() {
    let sandbox = Sandbox::new(&["arm", "x86"], GENERATING_CMAKE);

    let output = sandbox.cmide(&["arch", "--list"]);
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("arm"));
    assert!(stdout.contains("x86"));
}

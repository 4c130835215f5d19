//! One setup run: assemble the CMake command, execute it in the project
//! root, then hand the generated metadata back to the project model.

use super::state::{SetupState, StateTracker};
use super::{SetupError, SetupOutcome, SetupRequest};
use crate::command::CommandLine;
use crate::command::shell::{escape_double_quoted, is_plain_word, quote_word};
use crate::config::Settings;
use crate::console::{CommandReport, Reporter};
use crate::filter::filter_error_output;
use crate::process::{CancelToken, CommandRunner};
use crate::project::{Project, ProjectModel, keys};
use crate::template::{
    ARCH_BIN_DIR, CMAKE_BUILD_TYPE, CommandTemplate, GENERATE_ECLIPSE_PROJECT, SETUP_BIN_DIR,
    SETUP_BIN_DIR_NO_TOOLCHAIN, SETUP_MODULE_PATH,
};
use crate::toolchain::ToolchainRegistry;
use std::path::PathBuf;
use std::sync::Arc;

/// Eclipse metadata generated into the build directory and copied to the root.
pub const PROJECT_FILES: [&str; 2] = [".project", ".cproject"];

/// Architecture used when no toolchains exist and none was selected.
pub const DEFAULT_ARCHITECTURE: &str = "default";

const DEFAULT_BUILD_TYPE: &str = "Debug";

/// Architecture and build type a run is configured for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub architecture: String,
    pub build_type: String,
}

/// A fully assembled command, ready to run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedCommand {
    pub command: CommandLine,
    pub selection: Selection,
    /// Build directory for the selected architecture, relative to the root
    pub arch_bin_dir: String,
}

pub struct SetupOrchestrator {
    settings: Settings,
    runner: Arc<dyn CommandRunner>,
    model: Arc<dyn ProjectModel>,
    reporter: Arc<dyn Reporter>,
}

impl SetupOrchestrator {
    pub fn new(
        settings: Settings,
        runner: Arc<dyn CommandRunner>,
        model: Arc<dyn ProjectModel>,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        Self {
            settings,
            runner,
            model,
            reporter,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn model(&self) -> &Arc<dyn ProjectModel> {
        &self.model
    }

    /// Resolve which architecture and build type `request` targets. Values
    /// not fixed by the request come from the project's stored settings.
    pub fn selection(&self, project: &Project, request: &SetupRequest) -> Selection {
        let architecture = match request {
            SetupRequest::ChangeArchitecture(architecture) => architecture.clone(),
            _ => self.stored_architecture(project),
        };
        let build_type = match request {
            SetupRequest::ChangeBuildType(build_type) => build_type.clone(),
            _ => self.stored_build_type(project),
        };
        Selection {
            architecture,
            build_type,
        }
    }

    fn stored_architecture(&self, project: &Project) -> String {
        self.model
            .get_setting(project, keys::ARCHITECTURE)
            .filter(|a| !a.trim().is_empty())
            .or_else(|| {
                self.settings
                    .toolchain_registry()
                    .list_architectures()
                    .into_iter()
                    .next()
            })
            .unwrap_or_else(|| DEFAULT_ARCHITECTURE.to_string())
    }

    fn stored_build_type(&self, project: &Project) -> String {
        self.model
            .get_setting(project, keys::BUILD_TYPE)
            .filter(|b| !b.trim().is_empty())
            .or_else(|| self.settings.build.types.first().cloned())
            .unwrap_or_else(|| DEFAULT_BUILD_TYPE.to_string())
    }

    /// Build the command line for `request` without running anything.
    pub fn prepare(
        &self,
        project: &Project,
        request: &SetupRequest,
    ) -> Result<PreparedCommand, SetupError> {
        let selection = self.selection(project, request);
        let registry = self.settings.toolchain_registry();

        let mut command = CommandLine::new(self.settings.cmake_path());
        command.append(fragment(
            GENERATE_ECLIPSE_PROJECT,
            &[
                ("BUILD_SYS", &escape_double_quoted(&self.settings.cmake.generator)),
                ("VERSION", &quote_word(&self.settings.cmake.ide_version)),
            ],
        )?);

        if let Some(modules) = self.settings.module_path() {
            command.append(fragment(
                SETUP_MODULE_PATH,
                &[(
                    "PATH_TO_MODULES",
                    &escape_double_quoted(&modules.to_string_lossy()),
                )],
            )?);
        }

        let arch_bin_dir = self.arch_bin_dir(&selection.architecture)?;
        command.append(self.architecture_fragment(
            &registry,
            &selection.architecture,
            &arch_bin_dir,
        )?);

        command.append(fragment(
            CMAKE_BUILD_TYPE,
            &[("BUILDTYPE", &quote_word(&selection.build_type))],
        )?);

        if matches!(request, SetupRequest::Setup)
            && let Some(extra) = self.settings.extra_args()
        {
            command.append(extra);
        }

        Ok(PreparedCommand {
            command,
            selection,
            arch_bin_dir,
        })
    }

    fn arch_bin_dir(&self, architecture: &str) -> Result<String, SetupError> {
        if !is_plain_word(architecture) {
            return Err(SetupError::UnsafeValue {
                what: "architecture",
                value: architecture.to_string(),
            });
        }
        let dir = fragment(
            ARCH_BIN_DIR,
            &[
                ("BIN_DIR", self.settings.build.bin_dir.trim_end_matches('/')),
                ("ARCH", architecture),
            ],
        )?;
        if !is_plain_word(&dir) {
            return Err(SetupError::UnsafeValue {
                what: "build directory",
                value: dir,
            });
        }
        Ok(dir)
    }

    fn architecture_fragment(
        &self,
        registry: &ToolchainRegistry,
        architecture: &str,
        arch_bin_dir: &str,
    ) -> Result<String, SetupError> {
        let make_args = escape_double_quoted(self.settings.make_args());

        if !registry.has_toolchains() {
            return fragment(
                SETUP_BIN_DIR_NO_TOOLCHAIN,
                &[("ARCH_BIN_DIR", arch_bin_dir), ("MAKE_ARGS", &make_args)],
            );
        }

        let toolchain = registry.toolchain_path_for(architecture);
        if !registry.is_available(architecture) {
            return Err(SetupError::ToolchainUnavailable {
                architecture: architecture.to_string(),
                path: toolchain,
            });
        }
        fragment(
            SETUP_BIN_DIR,
            &[
                ("ARCH_BIN_DIR", arch_bin_dir),
                (
                    "PATH_TO_TOOLCHAIN_FILE",
                    &escape_double_quoted(&toolchain.to_string_lossy()),
                ),
                ("MAKE_ARGS", &make_args),
            ],
        )
    }

    /// Run `request` against `project` to completion.
    ///
    /// Callers are responsible for making sure only one run per project is
    /// active; [`SetupService`](super::SetupService) does that.
    pub fn run(
        &self,
        project: &Project,
        request: &SetupRequest,
        cancel: &CancelToken,
    ) -> Result<SetupOutcome, SetupError> {
        let mut tracker = StateTracker::new(project);
        match self.drive(&mut tracker, project, request, cancel) {
            Ok(mut outcome) => {
                outcome.states = tracker.into_history();
                Ok(outcome)
            }
            Err(e) => {
                let state = tracker.fail();
                log::error!("{}: {} failed while {}: {}", project, request, state, e);
                Err(e)
            }
        }
    }

    fn drive(
        &self,
        tracker: &mut StateTracker<'_>,
        project: &Project,
        request: &SetupRequest,
        cancel: &CancelToken,
    ) -> Result<SetupOutcome, SetupError> {
        tracker.enter(SetupState::Preparing);
        let prepared = self.prepare(project, request)?;
        if cancel.is_cancelled() {
            return Err(SetupError::Interrupted);
        }

        tracker.enter(SetupState::Executing);
        let result = self
            .runner
            .run(&prepared.command, Some(project.root()), cancel)?;
        let stderr = filter_error_output(&result.stderr);

        self.reporter.report(&CommandReport {
            command_line: prepared.command.to_string(),
            stdout: result.stdout.clone(),
            stderr: stderr.clone(),
            success: result.success(),
        });

        if !result.success() {
            return Err(SetupError::NonZeroExit {
                command: prepared.command.to_string(),
                exit_code: result.exit_code,
                stderr,
            });
        }

        tracker.enter(SetupState::PostProcessing);
        let mut outcome = SetupOutcome {
            command: prepared.command.clone(),
            selection: prepared.selection.clone(),
            result,
            stderr,
            reconciled: Vec::new(),
            warnings: Vec::new(),
            states: Vec::new(),
        };
        self.post_process(project, &prepared, &mut outcome);
        tracker.enter(SetupState::Done);

        Ok(outcome)
    }

    /// Reconcile generated files into the project. Failures here are
    /// recorded as warnings; the CMake run itself already succeeded.
    fn post_process(&self, project: &Project, prepared: &PreparedCommand, outcome: &mut SetupOutcome) {
        let mut warn = |message: String| {
            log::warn!("{}: {}", project, message);
            outcome.warnings.push(message);
        };

        if let Err(e) = self.model.refresh(project) {
            warn(format!("refresh failed: {e}"));
        }

        let bin_dir = project.root().join(&prepared.arch_bin_dir);
        if let Err(e) = self.model.mark_derived(project, &bin_dir) {
            warn(format!("could not mark {} as derived: {e}", bin_dir.display()));
        }

        let mut reconciled: Vec<PathBuf> = Vec::new();
        for name in PROJECT_FILES {
            let src = bin_dir.join(name);
            let dst = project.root().join(name);
            if !src.exists() {
                warn(format!("unable to copy {}: it does not exist", src.display()));
                continue;
            }

            let copied = if dst.exists() {
                self.model.overwrite_if_different(&src, &dst).map(|_| ())
            } else {
                self.model.copy_file(&src, &dst)
            };
            match copied.and_then(|_| self.model.mark_derived(project, &dst)) {
                Ok(()) => reconciled.push(dst),
                Err(e) => warn(format!("unable to copy {}: {e}", src.display())),
            }
        }

        if let Err(e) = self.model.clear_setting(project, keys::ABSOLUTE_PROJECT_PATH) {
            warn(format!("could not clear cached project path: {e}"));
        }
        if let Err(e) = self.model.reindex(project) {
            warn(format!("re-index failed: {e}"));
        }

        outcome.reconciled = reconciled;
    }
}

/// Render a command fragment; every placeholder must be bound.
fn fragment(template: CommandTemplate, bindings: &[(&str, &str)]) -> Result<String, SetupError> {
    Ok(template.render_strict(bindings)?)
}

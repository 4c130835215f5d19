//! # cmide - Eclipse CDT projects from CMake
//!
//! cmide drives CMake's Eclipse generators for a project, one build
//! directory per target architecture, and keeps the generated `.project`
//! and `.cproject` files in the project root up to date.
//!
//! ## Quick Start
//!
//! ```bash
//! # Generate bin/<arch>/ and copy the Eclipse metadata into the project
//! cmide setup
//!
//! # Switch to another toolchain or build type
//! cmide arch arm
//! cmide build-type Release
//! ```
//!
//! ## Module Organization
//!
//! - [`template`] - `$NAME$` command templates
//! - [`toolchain`] - `toolchain.<arch>.cmake` discovery
//! - [`command`] - command line assembly and shell quoting
//! - [`process`] - child process execution with cancellation
//! - [`setup`] - the setup run and its per-project scheduling
//! - [`commands`] - CLI command handlers

/// CLI command handlers extracted from main.
pub mod commands;

/// Command line assembly.
pub mod command;

/// Configuration file parsing (`cmide.toml`).
pub mod config;

/// Reporting of CMake invocations.
pub mod console;

/// Noise filtering for CMake's stderr.
pub mod filter;

/// Eclipse generator discovery from `cmake --help`.
pub mod generators;

/// External process execution.
pub mod process;

/// Project handles and persisted project state.
pub mod project;

/// Setup runs and scheduling.
pub mod setup;

/// Command templates.
pub mod template;

/// Toolchain file discovery.
pub mod toolchain;

/// Terminal UI helpers.
pub mod ui;

//! # sloan_core
//!
//! Watches a downloads folder for files that have finished arriving, surfaces
//! each one once so it can be renamed by template, and files the result into a
//! per-customer folder tree in a remote document store.
//!
//! ## Features
//!
//! - **Stability Detection**: A file counts as settled only after its size stays unchanged for a quiet window and it opens for reading
//! - **Per-Path Debouncing**: At most one check per path; newer events cancel older checks
//! - **Self-Rename Suppression**: A lock marker in the folder silences detections while the app renames a file
//! - **Baseline & Seen Tracking**: Files present at startup and files already handled this session are never surfaced again
//! - **Sweep Fallback**: An optional periodic rescan recovers files whose events were missed
//! - **Filing Pipeline**: Template naming and customer-folder routing over a pluggable document store
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sloan_core::config::ConfigStore;
//! use sloan_core::watcher::service::WatcherService;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let cfg = ConfigStore::default_location()?.load()?;
//!
//! let mut service = WatcherService::create(&cfg.watch_folder, &cfg.watch)?;
//! let ready = service.run()?;
//!
//! for path in ready {
//!     println!("ready: {}", path.display());
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - **[`watcher`]**: Stability probing, debouncing, suppression, the seen/baseline gate and the sweep
//! - **[`rename`]**: Renaming a file while the watcher is suppressed
//! - **[`naming`]**: Filename templates and name sanitizing
//! - **[`organizer`]**: Customer folder tree and keyword routing over a [`organizer::DocumentStore`]
//! - **[`config`]**: JSON configuration with default merging
//! - **[`logging`]**: `tracing` subscriber setup
//! - **[`error`]**: Unified error handling throughout the library
//!
//! ## Renaming Without Re-detection
//!
//! The app's own rename would otherwise look like a brand new download. Rename
//! through [`rename::rename_file`], which holds the folder's lock marker for the
//! duration, then mark the new path seen:
//!
//! ```rust,no_run
//! use sloan_core::rename::rename_file;
//! use sloan_core::watcher::gate::{Baseline, SeenGate};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! # let gate = SeenGate::new(Baseline::capture(Path::new("/downloads"))?, false);
//! let renamed = rename_file(Path::new("/downloads/Jane Doe quote.pdf"), "Jane Doe FinalQ PV 2025-01-31.pdf")?;
//! gate.mark_seen(&renamed);
//! # Ok(())
//! # }
//! ```
//!
//! ## Error Handling
//!
//! Operations return [`SloanResult<T>`] which wraps the unified [`SloanError`] type.
//! Filesystem races during detection (a file vanishing mid-check, a permission
//! error while sampling) are never errors; the file is simply not ready yet.

pub mod config;
pub mod error;
pub mod logging;
pub mod naming;
pub mod organizer;
pub mod rename;
pub mod watcher;

/// Re-exports the most commonly used types for convenience.
pub use error::{SloanError, SloanResult};

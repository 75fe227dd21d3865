//! # Taskboard Architecture
//!
//! Taskboard is a **UI-agnostic kanban board engine**. The command-line client in
//! `main.rs` is one consumer of the library; nothing below the API layer knows about
//! terminals, files or users.
//!
//! ## Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  CLI Layer (main.rs, args.rs, print.rs)                     │
//! │  - Parses arguments, sanitizes input, formats output        │
//! │  - The ONLY place that knows about stdout/stderr/exit codes │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  API Layer (api.rs)                                         │
//! │  - Thin facade: store operation, then persist               │
//! │  - Rolls back when persistence fails                        │
//! │  - Holds the active user and the filter/sort settings       │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Engine (store/, view.rs, validation.rs)                    │
//! │  - Owns columns, per-column task lists and labels           │
//! │  - Enforces single placement and referential rules          │
//! │  - Projects filtered, sorted column views                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Persistence (persist/)                                     │
//! │  - Abstract PersistenceBackend trait, one snapshot per user │
//! │  - FsBackend (production), MemBackend (testing)             │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Key Principle: No I/O in the Engine
//!
//! The store and the view projector take Rust values and return Rust values. They
//! never write to stdout/stderr, never touch the filesystem and never exit. Raw user
//! text is cleaned by [`sanitize`] before it reaches them, and the engine validates it
//! again on every write.
//!
//! ## Testing Strategy
//!
//! 1. **Engine** (`store/*.rs`, `view.rs`): thorough unit tests of every operation
//!    and invariant. This is where most tests live.
//! 2. **API** (`api.rs`): persistence and rollback behavior against
//!    [`persist::memory::MemBackend`].
//! 3. **CLI** (`tests/`): end-to-end runs of the binary against a temporary data dir.
//!
//! ## Module Overview
//!
//! - [`api`]: facade used by clients
//! - [`store`]: the board state container and its operations
//! - [`view`]: filter/sort settings and column projection
//! - [`model`]: columns, tasks, labels, snapshots, drafts
//! - [`validation`]: field rules shared by store operations
//! - [`sanitize`]: untrusted input cleaning
//! - [`persist`]: snapshot storage backends
//! - [`config`]: board settings
//! - [`error`]: error types

pub mod api;
pub mod config;
pub mod error;
pub mod model;
pub mod persist;
pub mod sanitize;
pub mod store;
pub mod validation;
pub mod view;

#[cfg(any(test, feature = "test_utils"))]
pub mod test_utils;

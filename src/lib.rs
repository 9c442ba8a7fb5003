//! mbdls: a Language Server Protocol implementation for multibody-solver
//! input files.
//!
//! This crate provides the core functionality for the mbdls LSP server,
//! enabling editing support for solver input decks built from `set:`
//! statements, directives and drive callers.
//!
//! # Overview
//!
//! - **Capability negotiation**: one-time handshake recording which optional
//!   protocol features the client supports
//! - **Document tracking**: rope-backed open-document store with incremental
//!   text synchronization
//! - **Settings**: per-document configuration fetched from the client and
//!   cached, with a file-layered global fallback
//! - **Diagnostics**: detection of redefined `const` declarations
//! - **Autocomplete**: the fixed catalog of statements, built-in types,
//!   variables, functions, directives and drives, with a resolve step for
//!   documentation
//!
//! # Architecture
//!
//! The crate is organized around several key modules:
//!
//! - [`server`]: the tower-lsp backend owning all session state
//! - [`documents`]: open-document lifecycle and position mapping
//! - [`diagnostics`]: the constant-redefinition validator
//! - [`completion`]: the static lexicon and its two protocol operations
//! - [`config`]: effective settings and the per-document settings cache
//!
//! # Usage
//!
//! This crate is primarily used as the backing library for the `mbdls`
//! binary, which serves the protocol over stdio. The public API enables
//! programmatic access to the validator and the lexicon.
//!
//! ```
//! use mbdls::config::EffectiveSettings;
//! use mbdls::diagnostics;
//! use mbdls::documents::Document;
//!
//! let document = Document::new("set: const integer n = 10;\n", 0, "mbd");
//! let settings = EffectiveSettings::default();
//! let diagnostics = diagnostics::check(&document, &settings);
//! assert_eq!(diagnostics.len(), 1);
//! ```

// Protocol session state
pub mod capabilities;
pub mod server;

// Analysis pipeline
pub mod diagnostics;
pub mod documents;

// Completion catalog
pub mod completion;

// Configuration
pub mod config;

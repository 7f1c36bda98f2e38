//! Arbor - structure-preserving code editor engine
//!
//! Arbor keeps a small Python-like teaching language as a tree of typed
//! constructs instead of free text. Every keystroke is turned into an edit
//! action that either applies completely or not at all, so the document is
//! always well formed:
//! - Holes carry the set of types they accept
//! - Type-mismatched but recoverable edits open a draft record with fixes
//! - The host text widget only ever mirrors the tree's rendering
//!
//! # Architecture
//!
//! - **AST**: arena of constructs addressed by [`editor::NodeId`]
//! - **Scopes**: variable visibility per body
//! - **Validator**: pure predicates over a session
//! - **Router**: ordered rule tables from key events to actions
//! - **Executor**: atomic interpreter of [`editor::EditAction`]
//! - **Module**: one editor instance wired to a host buffer and message sink
//!
//! # Example
//!
//! ```
//! use arbor_core::{EditorConfig, Module};
//!
//! let mut module = Module::new(EditorConfig::default());
//! module.type_text("print(");
//! assert_eq!(module.text(), "print(___)");
//! assert_eq!(module.buffer_text(), module.text());
//! ```

pub mod config;
pub mod editor;
pub mod error;

pub use config::EditorConfig;
pub use editor::{
    Catalog, EditAction, EditorSession, EventRouter, Key, KeyEvent, Module, Position, RawEvent,
};
pub use error::{EditorError, Result};

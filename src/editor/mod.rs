//! Structure-preserving editing engine
//!
//! The document is a tree of constructs with typed holes, never free text.
//! Input flows one way:
//! - [`router::EventRouter`] turns a key or mouse event into an [`EditAction`]
//! - [`executor::ActionExecutor`] applies it atomically to the session
//! - the resulting [`buffer::BufferEdit`] and messages go back to the host
//!
//! [`Module`] drives that loop for one editor instance.

pub mod action;
pub mod ast;
pub mod autocomplete;
pub mod buffer;
pub mod catalog;
pub mod draft;
pub mod events;
pub mod executor;
pub mod focus;
pub mod menu;
pub mod messages;
pub mod module;
pub mod patterns;
pub mod position;
pub mod router;
pub mod scope;
pub mod session;
pub mod validator;

pub use action::{EditAction, EditActionType, LiteralValue};
pub use ast::{Ast, DataType, InsertionType, NodeId, NodeKind, TypeSet};
pub use buffer::{BufferEdit, RopeBuffer, TextBufferAdapter};
pub use catalog::{Catalog, ConstructDefinition};
pub use draft::{DraftFix, DraftRecord};
pub use events::{CallbackType, Notification};
pub use executor::{ActionExecutor, ActionOutcome};
pub use focus::{Context, Focus};
pub use messages::{MessageEffect, MessageSink, RecordingSink};
pub use module::Module;
pub use position::{Position, Range};
pub use router::{EventRouter, Key, KeyEvent, RawEvent};
pub use session::EditorSession;
pub use validator::Validator;

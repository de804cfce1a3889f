//! lje-core: format-preserving structural edits for localization JSON files
//!
//! This crate focuses on a small, well-factored surface:
//! - Span-annotated JSON AST (`ast`)
//! - Typed, position-free edit descriptors (`edit`)
//! - Patch generator turning a descriptor into span replacements (`patch`)
//! - Document controller over a pluggable backing-store host (`document`, `host`)
//! - Whole-document formatter and directory backup for bulk rewrites
//!
pub mod ast;
pub mod backup;
pub mod document;
pub mod edit;
pub mod error;
pub mod format;
pub mod host;
pub mod patch;

pub use document::{ApplyOptions, Document, FileEvent, WriteOptions};
pub use edit::{ArrayEdit, CompoundEdit, JsonEdit, ObjectEdit, apply_to_value};
pub use error::{EditError, ParseError};
pub use format::{CompactWhen, Formatter};
pub use host::{DocumentHost, FsHost};
pub use patch::{PropertyIndex, TextOp, make_edit};

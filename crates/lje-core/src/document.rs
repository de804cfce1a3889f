// Document controller: owns one file's parsed state, funnels every edit
// through a single mutable owner, and treats the backing text as the only
// source of truth (every accepted replacement is followed by a re-read).
use std::io;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{Receiver, Sender, channel};

use serde_json::Value;
use tracing::{debug, warn};

use crate::ast::{self, Node};
use crate::edit::{self, JsonEdit};
use crate::error::EditError;
use crate::format::Formatter;
use crate::host::DocumentHost;
use crate::patch::{PropertyIndex, make_edit};

#[derive(Debug, Clone, Copy, Default)]
pub struct ApplyOptions {
    pub force: bool,
    pub save: bool,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub force: bool,
}

/// Backing-file events reported by an external watcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileEvent {
    Created,
    Modified,
    Deleted,
}

pub struct Document {
    path: PathBuf,
    default_value: Value,
    ast: Node,
    index: PropertyIndex,
    read_successful: bool,
    formatter: Option<Formatter>,
    subscribers: Vec<Sender<()>>,
}

impl Document {
    /// A new document starts from a synthetic AST built by serializing the
    /// default value; it only becomes live after a successful `read`.
    pub fn new(path: impl Into<PathBuf>, default_value: Value) -> Self {
        let ast = synthetic_ast(&default_value);
        let index = PropertyIndex::build(&ast);
        Self {
            path: path.into(),
            default_value,
            ast,
            index,
            read_successful: false,
            formatter: None,
            subscribers: Vec::new(),
        }
    }

    /// Route all writes through a whole-document formatter instead of span
    /// patches (bulk rewrites with custom key order / compacting).
    pub fn with_formatter(mut self, formatter: Formatter) -> Self {
        self.formatter = Some(formatter);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn is_read_successful(&self) -> bool {
        self.read_successful
    }

    pub fn ast(&self) -> &Node {
        &self.ast
    }

    /// Change notifications, fired after every successful AST swap.
    pub fn subscribe(&mut self) -> Receiver<()> {
        let (tx, rx) = channel();
        self.subscribers.push(tx);
        rx
    }

    fn swap_ast(&mut self, ast: Node) {
        self.ast = ast;
        self.index = PropertyIndex::build(&self.ast);
        self.subscribers.retain(|tx| tx.send(()).is_ok());
        debug!(path = %self.path.display(), "ast swapped");
    }

    pub fn load_default(&mut self) {
        self.swap_ast(synthetic_ast(&self.default_value));
    }

    /// Fetch and parse the backing content. On any failure the document
    /// falls back to the default AST and the error is re-raised; edits are
    /// blocked until a read succeeds (or is forced).
    pub fn read(&mut self, host: &impl DocumentHost) -> Result<(), EditError> {
        let text = match host.read_all(&self.path) {
            Ok(t) => t,
            Err(e) => {
                self.load_default();
                self.read_successful = false;
                return Err(e.into());
            }
        };
        match ast::parse(&text) {
            Ok(node) => {
                self.swap_ast(node);
                self.read_successful = true;
                Ok(())
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "parse failed, falling back to default value");
                self.load_default();
                self.read_successful = false;
                Err(e.into())
            }
        }
    }

    /// Pure fold of the current AST back into a plain value.
    pub fn get_value(&self) -> Value {
        self.ast.to_value()
    }

    pub fn visit<'a>(&'a self, visitor: &mut dyn FnMut(&'a Node)) {
        ast::visit(&self.ast, visitor);
    }

    /// External watcher events take priority over anything queued: create
    /// and modify trigger an unconditional re-parse, delete reverts to the
    /// default AST.
    pub fn handle_file_event(&mut self, host: &impl DocumentHost, event: FileEvent) {
        match event {
            FileEvent::Created | FileEvent::Modified => {
                let _ = self.read(host);
            }
            FileEvent::Deleted => {
                self.load_default();
                self.read_successful = false;
            }
        }
    }

    /// Whole-document re-serialization of the current value. Refuses to
    /// overwrite an existing file that never parsed unless forced, creates
    /// the file when absent, and re-reads so the AST matches what landed.
    pub fn write(
        &mut self,
        host: &mut impl DocumentHost,
        options: WriteOptions,
    ) -> Result<(), EditError> {
        let exists = host.stat(&self.path);
        if exists && !self.read_successful && !options.force {
            return Err(EditError::RefusedOverwrite);
        }
        if !exists {
            host.create(&self.path)?;
        }
        let value = self.get_value();
        let text = match &self.formatter {
            Some(f) => f.format(&value),
            None => ast::serialize(&value),
        };
        host.write_all(&self.path, &text)?;
        self.read(host)?;
        Ok(())
    }

    /// Apply one edit descriptor. Returns whether the host accepted the
    /// replacement; `Ok(false)` is the transient rejection case and the
    /// caller may retry after the next re-read.
    pub fn apply_edit(
        &mut self,
        host: &mut impl DocumentHost,
        edit: &JsonEdit,
        options: ApplyOptions,
    ) -> Result<bool, EditError> {
        if !host.stat(&self.path) {
            if !options.force {
                return Err(EditError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("no such document: {}", self.path.display()),
                )));
            }
            // Write the serialized default first; the re-read inside write()
            // guarantees the patch below runs against a parse that matches
            // the backing text exactly.
            self.write(host, WriteOptions { force: true })?;
        } else if !self.read_successful {
            if !options.force {
                return Err(EditError::StaleDocument);
            }
            self.write(host, WriteOptions { force: true })?;
        }

        if let Some(formatter) = &self.formatter {
            let new_value = edit::apply_to_value(self.get_value(), edit);
            let text = formatter.format(&new_value);
            host.write_all(&self.path, &text)?;
            self.read(host)?;
            if options.save {
                host.save(&self.path)?;
            }
            return Ok(true);
        }

        let ops = make_edit(edit, &self.ast, &self.index, 0)?;
        debug!(path = %self.path.display(), ops = ops.len(), "submitting replacement");
        let accepted = host.apply_atomic_replacement(&self.path, &ops)?;
        if accepted {
            // Mandatory re-read: the backing text stays the one source of
            // truth instead of a second, diverging in-memory tree.
            self.read(host)?;
            if options.save {
                host.save(&self.path)?;
            }
        } else {
            warn!(path = %self.path.display(), "host rejected replacement");
        }
        Ok(accepted)
    }
}

fn synthetic_ast(value: &Value) -> Node {
    // The serializer only emits valid JSON, so this parse cannot fail.
    ast::parse(&ast::serialize(value)).expect("serialized default value must parse")
}

// Text-buffer / backing-store host. The document controller only ever talks
// to this trait; the filesystem implementation below is what the CLI uses.
use std::fs;
use std::io;
use std::path::Path;

use crate::patch::TextOp;

pub trait DocumentHost {
    fn read_all(&self, path: &Path) -> io::Result<String>;

    /// Apply every replacement or none. `Ok(false)` means the host refused
    /// the replacement (the spans no longer match the backing content);
    /// nothing was written.
    fn apply_atomic_replacement(&mut self, path: &Path, ops: &[TextOp]) -> io::Result<bool>;

    /// Deterministic whole-document replacement, independent of any spans.
    fn write_all(&mut self, path: &Path, text: &str) -> io::Result<()>;

    fn create(&mut self, path: &Path) -> io::Result<()>;

    fn stat(&self, path: &Path) -> bool;

    /// Flush hook for hosts with a dirty-buffer concept; files persist
    /// eagerly so the default is a no-op.
    fn save(&mut self, _path: &Path) -> io::Result<()> {
        Ok(())
    }
}

/// Filesystem-backed host. Replacements are validated against the current
/// file content and committed via temp file + rename, so a reader never
/// observes a partially applied patch.
#[derive(Debug, Default)]
pub struct FsHost;

impl FsHost {
    pub fn new() -> Self {
        FsHost
    }

    fn commit(path: &Path, text: &str) -> io::Result<()> {
        let dir = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("document");
        let tmp = dir.join(format!(".{}.tmp", name));
        fs::write(&tmp, text)?;
        fs::rename(&tmp, path)
    }

    fn ops_fit(text: &str, ops: &[TextOp]) -> bool {
        let mut prev_end = 0usize;
        for op in ops {
            let start = op.span.start.offset;
            let end = op.span.end.offset;
            if start < prev_end
                || end < start
                || end > text.len()
                || !text.is_char_boundary(start)
                || !text.is_char_boundary(end)
            {
                return false;
            }
            prev_end = end;
        }
        true
    }
}

impl DocumentHost for FsHost {
    fn read_all(&self, path: &Path) -> io::Result<String> {
        fs::read_to_string(path)
    }

    fn apply_atomic_replacement(&mut self, path: &Path, ops: &[TextOp]) -> io::Result<bool> {
        let mut text = fs::read_to_string(path)?;
        if !Self::ops_fit(&text, ops) {
            return Ok(false);
        }
        for op in ops.iter().rev() {
            text.replace_range(op.span.start.offset..op.span.end.offset, &op.text);
        }
        Self::commit(path, &text)?;
        Ok(true)
    }

    fn write_all(&mut self, path: &Path, text: &str) -> io::Result<()> {
        Self::commit(path, text)
    }

    fn create(&mut self, path: &Path) -> io::Result<()> {
        if !path.exists() {
            fs::write(path, "")?;
        }
        Ok(())
    }

    fn stat(&self, path: &Path) -> bool {
        path.exists()
    }
}

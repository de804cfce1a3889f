use std::fs;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;
use zip::CompressionMethod;
use zip::write::FileOptions;

// Zip backup of a localization data directory (non-destructive), taken
// before bulk rewrites.
pub fn zip_backup_dir(dir: &Path) -> io::Result<PathBuf> {
    if !dir.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            "not a directory",
        ));
    }
    let parent = dir.parent().unwrap_or(Path::new("."));
    let name = dir
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("locdata");
    let ts = chrono::Local::now().format("%Y%m%d-%H%M%S");
    let dest = parent.join(format!("{}_{}.zip", name, ts));

    let file = fs::File::create(&dest)?;
    let mut zip = zip::ZipWriter::new(file);
    let options = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644);
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| io::Error::other(e.to_string()))?;
        let path = entry.path();
        let rel = match path.strip_prefix(dir) {
            Ok(r) if !r.as_os_str().is_empty() => r,
            _ => continue,
        };
        let entry_name = rel.to_string_lossy().replace('\\', "/");
        if path.is_dir() {
            zip.add_directory(entry_name, options)?;
        } else {
            zip.start_file(entry_name, options)?;
            let data = fs::read(path)?;
            zip.write_all(&data)?;
        }
    }
    zip.finish()?;
    Ok(dest)
}

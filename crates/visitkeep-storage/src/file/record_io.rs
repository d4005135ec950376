//! Owner-only file creation, atomic record replacement.

use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use visitkeep_core::errors::SessionResult;
use visitkeep_core::SessionRecord;

use crate::{io_err, serde_err};

/// Permission bits for record and lock files.
#[cfg(unix)]
pub(crate) const FILE_MODE: u32 = 0o600;

/// Permission bits for a store directory created by us.
#[cfg(unix)]
pub(crate) const DIR_MODE: u32 = 0o700;

/// Create `dir` (and parents) if missing. New directories are owner-only.
pub(crate) fn ensure_dir(dir: &Path) -> SessionResult<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(DIR_MODE);
    }
    builder.create(dir).map_err(|e| io_err(dir, e))
}

/// Open options for files we create: read/write, owner-only.
pub(crate) fn owner_only() -> OpenOptions {
    let mut options = OpenOptions::new();
    options.read(true).write(true).create(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(FILE_MODE);
    }
    options
}

/// Read a record. `Ok(None)` when the file does not exist.
pub(crate) fn read_record(path: &Path) -> SessionResult<Option<SessionRecord>> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(io_err(path, e)),
    };
    serde_json::from_slice(&bytes).map(Some).map_err(serde_err)
}

/// Replace `path` with `record`: write a sibling temp file, fsync, rename.
///
/// Caller must hold the token lock; the temp name is not unique otherwise.
pub(crate) fn write_record(path: &Path, record: &SessionRecord) -> SessionResult<()> {
    let json = serde_json::to_vec_pretty(record).map_err(serde_err)?;
    let tmp = path.with_extension("json.tmp");

    let mut file = owner_only()
        .truncate(true)
        .open(&tmp)
        .map_err(|e| io_err(&tmp, e))?;
    file.write_all(&json).map_err(|e| io_err(&tmp, e))?;
    file.sync_all().map_err(|e| io_err(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| io_err(path, e))?;
    sync_parent(path)
}

/// Delete a file. Returns false if it was already gone.
pub(crate) fn remove_if_exists(path: &Path) -> SessionResult<bool> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(io_err(path, e)),
    }
}

/// Persist the rename itself.
#[cfg(unix)]
fn sync_parent(path: &Path) -> SessionResult<()> {
    let Some(parent) = path.parent() else {
        return Ok(());
    };
    fs::File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(|e| io_err(parent, e))
}

#[cfg(not(unix))]
fn sync_parent(_path: &Path) -> SessionResult<()> {
    Ok(())
}

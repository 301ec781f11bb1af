use crate::error::{Result, UpdateError};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::task;

/// Atomically replace `target` with `data`.
///
/// The bytes are staged in `<target>.tmp` and renamed over the target, so the
/// previous file stays intact until the rename succeeds.
pub async fn publish(target: &Path, data: Vec<u8>) -> Result<()> {
    let target_path = target.to_path_buf();

    // Perform blocking filesystem work in a dedicated thread.
    task::spawn_blocking(move || publish_blocking(&target_path, &data))
        .await
        .map_err(join_error)?
}

fn join_error(err: task::JoinError) -> UpdateError {
    UpdateError::Io(std::io::Error::other(format!("publish task failed: {err}")))
}

/// Path of the staging file used for `target`.
pub fn staging_path(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

fn publish_blocking(target: &Path, data: &[u8]) -> Result<()> {
    let staged = stage(target, data)?;
    if let Err(err) = commit(&staged, target) {
        if let Err(cleanup) = fs::remove_file(&staged) {
            tracing::warn!(
                "failed to remove staging file {}: {}",
                staged.display(),
                cleanup
            );
        }
        return Err(err);
    }
    Ok(())
}

/// Write `data` to the staging path next to `target`.
pub(crate) fn stage(target: &Path, data: &[u8]) -> Result<PathBuf> {
    let staged = staging_path(target);
    let written = write_staging(&staged, data);
    if let Err(err) = written {
        let _ = fs::remove_file(&staged);
        return Err(err);
    }
    Ok(staged)
}

fn write_staging(staged: &Path, data: &[u8]) -> Result<()> {
    let mut file = File::create(staged)?;
    file.write_all(data)?;
    file.flush()?;
    file.sync_all()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(0o644);
        file.set_permissions(perms)?;
    }

    Ok(())
}

/// Move a staged file over `target`.
pub(crate) fn commit(staged: &Path, target: &Path) -> Result<()> {
    fs::rename(staged, target)?;
    Ok(())
}

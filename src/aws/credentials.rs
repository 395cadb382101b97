use std::{
    io,
    path::{Path, PathBuf},
    process,
};
use tokio::{
    fs::{self, DirBuilder, OpenOptions},
    io::AsyncWriteExt,
};
use tracing::{debug, info};

use super::Credentials;
use crate::{constants::CREDENTIALS_PROFILE, error::FederationError};

/// Render credentials in the shared credentials file format
pub fn render_credentials(creds: &Credentials) -> String {
    format!(
        "[{CREDENTIALS_PROFILE}]\n\
         aws_access_key_id = {}\n\
         aws_secret_access_key = {}\n\
         aws_session_token = {}\n",
        creds.access_key_id, creds.secret_access_key, creds.session_token
    )
}

/// Write credentials to `path`, replacing whatever was there.
///
/// Missing parent directories are created. The content is staged in a
/// sibling file and renamed into place, so readers never observe a
/// partially written file.
pub async fn write_credentials(creds: &Credentials, path: &Path) -> Result<(), FederationError> {
    let content = render_credentials(creds);

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        create_dir_all_private(parent).await.map_err(|source| {
            FederationError::DirectoryCreationFailed {
                path: parent.to_path_buf(),
                source,
            }
        })?;
    }

    let write_failed = |source| FederationError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let staging = staging_path(path).map_err(write_failed)?;
    debug!("Staging credentials at {}", staging.display());

    if let Err(e) = write_and_rename(&staging, path, content.as_bytes()).await {
        fs::remove_file(&staging).await.ok();
        return Err(write_failed(e));
    }

    info!("Credentials written to {}", path.display());
    Ok(())
}

async fn create_dir_all_private(dir: &Path) -> io::Result<()> {
    let mut builder = DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(0o700);
    builder.create(dir).await
}

fn staging_path(path: &Path) -> io::Result<PathBuf> {
    let file_name = path.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "destination path has no file name",
        )
    })?;

    let mut staging = file_name.to_os_string();
    staging.push(format!(".{}.tmp", process::id()));
    Ok(path.with_file_name(staging))
}

async fn write_and_rename(staging: &Path, path: &Path, content: &[u8]) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(0o600);

    let mut file = options.open(staging).await?;
    file.write_all(content).await?;
    file.sync_all().await?;
    drop(file);

    fs::rename(staging, path).await
}

//! Pre-flight access checks for the launcher directory.

use std::path::Path;

use crate::app_data::installer_config;

use super::InstallError;

/// Check that we can write to the launcher directory before installing.
///
/// A missing directory is created; returns `true` in that case so the caller
/// can remove it again if the install does not go through. Fails when the
/// path is a file, cannot be created, or rejects a test write (read-only
/// mount, permissions).
pub async fn check_install_path(install_dir: &Path) -> Result<bool, InstallError> {
    let not_writable = |reason: String| InstallError::PathNotWritable {
        path: install_dir.to_path_buf(),
        reason,
    };

    let created = match tokio::fs::metadata(install_dir).await {
        Ok(meta) if !meta.is_dir() => {
            return Err(not_writable("path exists but is not a directory".into()));
        }
        Ok(_) => false,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(install_dir)
                .await
                .map_err(|e| not_writable(format!("could not create directory: {}", e)))?;
            tracing::info!("Created install directory {}", install_dir.display());
            true
        }
        Err(e) => return Err(not_writable(e.to_string())),
    };

    // Quick check that we can write to the directory
    let test_file = install_dir.join(&installer_config().launcher.write_test_file);
    match tokio::fs::write(&test_file, b"test").await {
        Ok(_) => {
            let _ = tokio::fs::remove_file(&test_file).await;
            tracing::debug!("Access check passed for {}", install_dir.display());
            Ok(created)
        }
        Err(e) => {
            if created {
                let _ = tokio::fs::remove_dir(install_dir).await;
            }
            Err(not_writable(format!(
                "directory is not writable, check folder permissions ({})",
                e
            )))
        }
    }
}

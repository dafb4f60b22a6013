use crate::CoreError;
use fs2::FileExt;
use packsmith_store::StoreLayout;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Exclusive advisory lock on one deployment.
///
/// Held for the whole of a deploy, status, or destroy so that two hosts
/// never drive the same deployment at once. Different deployments lock
/// different files.
pub struct DeploymentLock {
    lock_file: File,
}

fn open_lock_file(lock_path: &Path) -> Result<File, CoreError> {
    if let Some(parent) = lock_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    Ok(OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(lock_path)?)
}

impl DeploymentLock {
    pub fn acquire(layout: &StoreLayout, deployment_name: &str) -> Result<Self, CoreError> {
        Self::acquire_path(&layout.deployment_lock(deployment_name))
    }

    pub fn try_acquire(
        layout: &StoreLayout,
        deployment_name: &str,
    ) -> Result<Option<Self>, CoreError> {
        let file = open_lock_file(&layout.deployment_lock(deployment_name))?;
        match file.try_lock_exclusive() {
            Ok(()) => Ok(Some(Self { lock_file: file })),
            Err(_) => Ok(None),
        }
    }

    fn acquire_path(lock_path: &Path) -> Result<Self, CoreError> {
        let file = open_lock_file(lock_path)?;
        file.lock_exclusive()
            .map_err(|e| CoreError::Io(std::io::Error::new(std::io::ErrorKind::WouldBlock, e)))?;
        Ok(Self { lock_file: file })
    }
}

impl Drop for DeploymentLock {
    fn drop(&mut self) {
        let _ = self.lock_file.unlock();
    }
}

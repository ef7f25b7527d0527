/*
 * Copyright (C) 2026 The Cloudfile Authors
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 * http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

use crate::cloudfile::util::error::{is_not_found_error, new_error, with_context, DynError};

use std::path::Path;

pub mod linux;

/// Captured result of an external tool invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }
}

/// Filesystem occupancy as reported by the OS for a mounted path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FilesystemUsage {
    pub total_bytes: u64,
    pub used_bytes: u64,
    pub available_bytes: u64,
    pub total_inodes: u64,
    pub used_inodes: u64,
    pub available_inodes: u64,
}

/// Host-OS capabilities the orchestrators depend on. One implementation per
/// target OS; tests substitute [`crate::cloudfile::test_support::FakeMounter`].
pub trait Mounter: Send + Sync {
    /// Reports whether `path` is a mount point. A missing path surfaces as a
    /// not-found I/O error rather than a boolean, so callers can tell "not
    /// mounted" from "nothing there".
    fn is_mount_point(&self, path: &Path) -> Result<bool, DynError>;

    /// Mounts `source` at `target`. `sensitive_options` carry credentials and
    /// must stay out of logs and error text.
    fn mount(
        &self,
        source: &str,
        target: &Path,
        fs_type: &str,
        options: &[String],
        sensitive_options: &[String],
    ) -> Result<(), DynError>;

    /// Unmounts `target`, treating "not mounted" as success.
    fn unmount(&self, target: &Path) -> Result<(), DynError>;

    fn make_dir_all(&self, path: &Path) -> Result<(), DynError>;

    fn remove_dir(&self, path: &Path) -> Result<(), DynError>;

    /// Runs an external tool, capturing exit code and output. A non-zero exit
    /// is not an error at this layer; callers interpret the code.
    fn run_command(&self, command: &str, args: &[String]) -> Result<CommandOutput, DynError>;

    fn stat_fs(&self, path: &Path) -> Result<FilesystemUsage, DynError>;
}

/// Puts `path` into a mountable state and reports whether something is
/// already mounted there.
///
/// Probe errors other than a missing path are returned verbatim. A missing
/// path is created recursively; creation failures come back shaped
/// `mkdir <path>: <cause>`, as does the existing-but-not-a-directory case,
/// which mutates nothing.
pub fn ensure_mount_point(mounter: &dyn Mounter, path: &Path) -> Result<bool, DynError> {
    match mounter.is_mount_point(path) {
        Ok(true) => return Ok(true),
        Ok(false) => {}
        Err(err) if is_not_found_error(err.as_ref()) => {
            mounter
                .make_dir_all(path)
                .map_err(|e| with_context(e, format!("mkdir {}", path.display())))?;
            return Ok(false);
        }
        Err(err) => return Err(err),
    }

    if !path.is_dir() {
        return Err(new_error(format!(
            "mkdir {}: not a directory",
            path.display()
        )));
    }
    Ok(false)
}

/// Reverses a mount at `path`: unmount when mounted, then best-effort removal
/// of the leftover directory. A path that no longer exists is success.
pub fn cleanup_mount_point(mounter: &dyn Mounter, path: &Path) -> Result<(), DynError> {
    match mounter.is_mount_point(path) {
        Err(err) if is_not_found_error(err.as_ref()) => return Ok(()),
        Err(err) => return Err(err),
        Ok(true) => mounter.unmount(path)?,
        Ok(false) => {}
    }

    if let Err(err) = mounter.remove_dir(path) {
        log::warn!(
            "failed to remove mount point directory {}: {}",
            path.display(),
            err
        );
    }
    Ok(())
}

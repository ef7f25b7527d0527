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

use super::{CommandOutput, FilesystemUsage, Mounter};
use crate::cloudfile::util::error::{new_error, with_context, DynError};

use nix::errno::Errno;
use nix::mount::{mount, umount2, MntFlags, MsFlags};
use nix::sys::stat::lstat;
use nix::sys::statvfs::statvfs;
use std::fs;
use std::io;
use std::path::Path;
use std::process::{Command, Stdio};

const MOUNT_TOOL: &str = "mount";

/// [`Mounter`] backed by the Linux mount syscalls and the host's mount
/// helpers. Bind mounts go through the syscall directly; network filesystems
/// go through the `mount` binary so `mount.cifs`/`mount.nfs` handle
/// credentials, DNS and loop devices.
pub struct LinuxMounter;

impl LinuxMounter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for LinuxMounter {
    fn default() -> Self {
        Self::new()
    }
}

fn errno_to_io(errno: Errno) -> io::Error {
    io::Error::from_raw_os_error(errno as i32)
}

fn bind_mount(source: &str, target: &Path, options: &[String]) -> Result<(), DynError> {
    mount(
        Some(Path::new(source)),
        target,
        None::<&str>,
        MsFlags::MS_BIND,
        None::<&str>,
    )
    .map_err(|errno| {
        with_context(
            errno_to_io(errno),
            format!("failed to bind mount {} at {}", source, target.display()),
        )
    })?;

    // A read-only bind needs a second pass; MS_RDONLY is ignored on the
    // initial MS_BIND call.
    if options.iter().any(|option| option == "ro") {
        mount(
            None::<&Path>,
            target,
            None::<&str>,
            MsFlags::MS_BIND | MsFlags::MS_REMOUNT | MsFlags::MS_RDONLY,
            None::<&str>,
        )
        .map_err(|errno| {
            with_context(
                errno_to_io(errno),
                format!("failed to remount {} read-only", target.display()),
            )
        })?;
    }
    Ok(())
}

impl Mounter for LinuxMounter {
    fn is_mount_point(&self, path: &Path) -> Result<bool, DynError> {
        let stat = lstat(path).map_err(|errno| -> DynError { Box::new(errno_to_io(errno)) })?;
        let Some(parent) = path.parent() else {
            return Ok(true);
        };
        let parent = if parent.as_os_str().is_empty() {
            Path::new(".")
        } else {
            parent
        };
        let parent_stat = lstat(parent).map_err(|errno| {
            with_context(errno_to_io(errno), format!("stat {}", parent.display()))
        })?;
        // Same-filesystem bind mounts are not detectable this way; the
        // device comparison matches what the rest of the fleet relies on.
        Ok(stat.st_dev != parent_stat.st_dev)
    }

    fn mount(
        &self,
        source: &str,
        target: &Path,
        fs_type: &str,
        options: &[String],
        sensitive_options: &[String],
    ) -> Result<(), DynError> {
        if options.iter().any(|option| option == "bind") {
            return bind_mount(source, target, options);
        }

        let mut joined = options.to_vec();
        joined.extend(sensitive_options.iter().cloned());

        let mut command = Command::new(MOUNT_TOOL);
        if !fs_type.is_empty() {
            command.args(["-t", fs_type]);
        }
        if !joined.is_empty() {
            command.args(["-o", &joined.join(",")]);
        }
        // The -o argument may hold credentials; it must never reach error
        // text or logs from here on.
        let output = command
            .arg(source)
            .arg(target)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| {
                with_context(e, format!("failed to invoke {} for {}", MOUNT_TOOL, source))
            })?;

        if !output.status.success() {
            return Err(new_error(format!(
                "mount of {} at {} failed: {}",
                source,
                target.display(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(())
    }

    fn unmount(&self, target: &Path) -> Result<(), DynError> {
        match umount2(target, MntFlags::MNT_DETACH) {
            Ok(()) => Ok(()),
            // Not a mount point or already gone counts as unmounted.
            Err(Errno::EINVAL) | Err(Errno::ENOENT) => Ok(()),
            Err(errno) => Err(with_context(
                errno_to_io(errno),
                format!("failed to unmount {}", target.display()),
            )),
        }
    }

    fn make_dir_all(&self, path: &Path) -> Result<(), DynError> {
        fs::create_dir_all(path)?;
        Ok(())
    }

    fn remove_dir(&self, path: &Path) -> Result<(), DynError> {
        fs::remove_dir(path)?;
        Ok(())
    }

    fn run_command(&self, command: &str, args: &[String]) -> Result<CommandOutput, DynError> {
        let output = Command::new(command)
            .args(args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| with_context(e, format!("failed to invoke {}", command)))?;
        Ok(CommandOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }

    fn stat_fs(&self, path: &Path) -> Result<FilesystemUsage, DynError> {
        let stat = statvfs(path).map_err(|errno| -> DynError { Box::new(errno_to_io(errno)) })?;
        let fragment_size = stat.fragment_size() as u64;
        let blocks = stat.blocks() as u64;
        let blocks_free = stat.blocks_free() as u64;
        Ok(FilesystemUsage {
            total_bytes: fragment_size * blocks,
            used_bytes: fragment_size * blocks.saturating_sub(blocks_free),
            available_bytes: fragment_size * stat.blocks_available() as u64,
            total_inodes: stat.files() as u64,
            used_inodes: (stat.files() as u64).saturating_sub(stat.files_free() as u64),
            available_inodes: stat.files_available() as u64,
        })
    }
}

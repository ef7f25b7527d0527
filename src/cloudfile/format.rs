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

use crate::cloudfile::mount::Mounter;
use crate::cloudfile::util::error::{new_error, DynError};

use std::path::Path;

/// Filesystems a disk image may be formatted with. Any other `fstype` value
/// means the share itself is handed to the workload and no image is involved.
pub const SUPPORTED_DISK_FS_TYPES: [&str; 4] = ["ext4", "ext3", "ext2", "xfs"];

const BLKID_TOOL: &str = "blkid";
// blkid exits with 2 when the probed file carries no recognizable signature.
const NO_FILESYSTEM_EXIT_STATUS: i32 = 2;
const LOOP_OPTION: &str = "loop";

pub fn is_disk_fs_type(fs_type: &str) -> bool {
    SUPPORTED_DISK_FS_TYPES.contains(&fs_type)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiskSignature {
    Formatted { fs_type: Option<String> },
    Unformatted,
}

/// Asks blkid whether the disk image already carries a filesystem or
/// partition-table signature. The argv sequence is a compatibility contract
/// with conformance suites that script the tool.
pub fn probe_disk_signature(
    mounter: &dyn Mounter,
    disk_path: &Path,
) -> Result<DiskSignature, DynError> {
    let args: Vec<String> = ["-p", "-s", "TYPE", "-s", "PTTYPE", "-o", "export"]
        .iter()
        .map(|a| a.to_string())
        .chain(std::iter::once(disk_path.display().to_string()))
        .collect();
    let output = mounter.run_command(BLKID_TOOL, &args)?;

    if output.success() {
        return Ok(DiskSignature::Formatted {
            fs_type: parse_signature_type(&output.stdout),
        });
    }
    if output.code == Some(NO_FILESYSTEM_EXIT_STATUS) {
        return Ok(DiskSignature::Unformatted);
    }

    let outcome = match output.code {
        Some(code) => format!("status {}", code),
        None => "termination by signal".to_string(),
    };
    Err(new_error(format!(
        "blkid probe of {} failed with {}: {}",
        disk_path.display(),
        outcome,
        output.stderr.trim()
    )))
}

fn parse_signature_type(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.strip_prefix("TYPE=").map(|v| v.trim().to_string()))
}

/// Writes a fresh filesystem onto the disk image. Called at most once per
/// stage, and only after the signature probe reported nothing present.
pub fn format_disk(mounter: &dyn Mounter, disk_path: &Path, fs_type: &str) -> Result<(), DynError> {
    let tool = format!("mkfs.{}", fs_type);
    let mut args: Vec<String> = match fs_type {
        "ext4" | "ext3" | "ext2" => vec!["-F".to_string(), "-m0".to_string()],
        "xfs" => vec!["-f".to_string()],
        _ => Vec::new(),
    };
    args.push(disk_path.display().to_string());

    let output = mounter.run_command(&tool, &args)?;
    if !output.success() {
        return Err(new_error(format!(
            "{} failed for {}: {}",
            tool,
            disk_path.display(),
            output.stderr.trim()
        )));
    }
    Ok(())
}

/// Brings a disk image into service: format it if it has no signature yet,
/// then loop-mount it over the staging target, shadowing the network share
/// the image lives on.
pub fn stage_disk_image(
    mounter: &dyn Mounter,
    disk_path: &Path,
    target: &Path,
    fs_type: &str,
) -> Result<(), DynError> {
    match probe_disk_signature(mounter, disk_path)? {
        DiskSignature::Formatted { fs_type: existing } => {
            log::debug!(
                "disk image {} already formatted as {}",
                disk_path.display(),
                existing.as_deref().unwrap_or("unknown")
            );
        }
        DiskSignature::Unformatted => format_disk(mounter, disk_path, fs_type)?,
    }

    mounter.mount(
        &disk_path.display().to_string(),
        target,
        fs_type,
        &[LOOP_OPTION.to_string()],
        &[],
    )
}

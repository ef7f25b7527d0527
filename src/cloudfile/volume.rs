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

use crate::cloudfile::config::CloudEnvironment;
use crate::cloudfile::types::VolumeCapability;
use crate::cloudfile::util::error::{new_error, DynError};

use std::collections::HashMap;
use std::fmt;

// Volume context keys. The literal values are part of the wire contract and
// must match what the control plane writes into volume definitions.
pub const FS_TYPE_FIELD: &str = "fstype";
pub const DISK_NAME_FIELD: &str = "diskname";
pub const SHARE_NAME_FIELD: &str = "sharename";
pub const SERVER_NAME_FIELD: &str = "servername";

// Secret keys delivered with stage requests.
pub const ACCOUNT_NAME_FIELD: &str = "accountname";
pub const ACCOUNT_KEY_FIELD: &str = "accountkey";

pub const NFS: &str = "nfs";
pub const CIFS: &str = "cifs";

const VOLUME_ID_SEPARATOR: char = '#';

/// Segments of a `resourcegroup#account#share[#subdirectory]` volume ID.
/// Parsing never fails; absent segments come back empty and consumers decide
/// which ones they require. A trailing separator yields an empty
/// subdirectory, which is distinct from no subdirectory segment at all only
/// in the ID text, not in behavior.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeIdParts {
    pub resource_group: String,
    pub account_name: String,
    pub share_name: String,
    pub subdirectory: String,
}

pub fn parse_volume_id(volume_id: &str) -> VolumeIdParts {
    let mut segments = volume_id.split(VOLUME_ID_SEPARATOR);
    VolumeIdParts {
        resource_group: segments.next().unwrap_or_default().to_string(),
        account_name: segments.next().unwrap_or_default().to_string(),
        share_name: segments.next().unwrap_or_default().to_string(),
        subdirectory: segments.next().unwrap_or_default().to_string(),
    }
}

/// Storage account backing a volume: the secrets map wins over the ID
/// segment so that statically provisioned volumes with out-of-band
/// credentials keep working.
pub fn account_name(
    volume_id: &str,
    secrets: &HashMap<String, String>,
) -> Result<String, DynError> {
    if let Some(name) = non_empty(secrets, ACCOUNT_NAME_FIELD) {
        return Ok(name.to_string());
    }
    let parts = parse_volume_id(volume_id);
    if parts.account_name.is_empty() {
        return Err(new_error(format!(
            "failed to get account name from {}",
            volume_id
        )));
    }
    Ok(parts.account_name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountProtocol {
    Smb,
    Nfs,
}

impl MountProtocol {
    /// Filesystem type handed to the mount syscall.
    pub fn fs_type(self) -> &'static str {
        match self {
            MountProtocol::Smb => CIFS,
            MountProtocol::Nfs => NFS,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            MountProtocol::Smb => "smb",
            MountProtocol::Nfs => "nfs",
        }
    }
}

/// Everything the staging orchestrator needs to mount one share.
#[derive(Clone, PartialEq, Eq)]
pub struct MountRequest {
    pub source: String,
    pub protocol: MountProtocol,
    pub options: Vec<String>,
    pub sensitive_options: Vec<String>,
}

impl fmt::Debug for MountRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountRequest")
            .field("source", &self.source)
            .field("protocol", &self.protocol)
            .field("options", &self.options)
            .field(
                "sensitive_options",
                &format_args!("[{} redacted]", self.sensitive_options.len()),
            )
            .finish()
    }
}

/// Derives source, protocol and option lists for a stage request.
///
/// Share and server names prefer the volume context over the ID segments;
/// a missing server falls back to `<account>.file.<suffix>` from the cloud
/// environment. The source is UNC-style for both protocols.
pub fn resolve_mount_request(
    volume_id: &str,
    volume_context: &HashMap<String, String>,
    secrets: &HashMap<String, String>,
    capability: &VolumeCapability,
    cloud: &CloudEnvironment,
) -> Result<MountRequest, DynError> {
    let account = account_name(volume_id, secrets)?;
    let parts = parse_volume_id(volume_id);

    let share_name = non_empty(volume_context, SHARE_NAME_FIELD)
        .unwrap_or(parts.share_name.as_str())
        .to_string();
    let server = match non_empty(volume_context, SERVER_NAME_FIELD) {
        Some(server) => server.to_string(),
        None => format!("{}.file.{}", account, cloud.storage_suffix),
    };

    let mut source = format!("//{}/{}", server, share_name);
    if !parts.subdirectory.is_empty() {
        source.push('/');
        source.push_str(&parts.subdirectory);
    }

    let protocol = match volume_context.get(FS_TYPE_FIELD) {
        Some(fs_type) if fs_type == NFS => MountProtocol::Nfs,
        _ => MountProtocol::Smb,
    };

    let read_only = capability
        .access_mode
        .as_ref()
        .is_some_and(|mode| mode.is_read_only());
    let mut options = Vec::new();
    if read_only {
        options.push("ro".to_string());
    }
    if let Some(mount) = capability.mount.as_ref() {
        options.extend(mount.mount_flags.iter().cloned());
    }

    let sensitive_options = match protocol {
        MountProtocol::Nfs => Vec::new(),
        MountProtocol::Smb => {
            let mut credentials = Vec::new();
            credentials.push(format!("username={}", account));
            if let Some(key) = non_empty(secrets, ACCOUNT_KEY_FIELD) {
                credentials.push(format!("password={}", key));
            }
            credentials
        }
    };

    Ok(MountRequest {
        source,
        protocol,
        options,
        sensitive_options,
    })
}

fn non_empty<'a>(map: &'a HashMap<String, String>, key: &str) -> Option<&'a str> {
    map.get(key).map(String::as_str).filter(|v| !v.is_empty())
}

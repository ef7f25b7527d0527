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

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct MountVolumeCapability {
    #[serde(rename = "fsType", skip_serializing_if = "Option::is_none")]
    pub fs_type: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub mount_flags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum AccessMode {
    #[serde(rename = "SINGLE_NODE_WRITER")]
    #[default]
    SingleNodeWriter,
    #[serde(rename = "SINGLE_NODE_READER_ONLY")]
    SingleNodeReaderOnly,
    #[serde(rename = "MULTI_NODE_READER_ONLY")]
    MultiNodeReaderOnly,
    #[serde(rename = "MULTI_NODE_SINGLE_WRITER")]
    MultiNodeSingleWriter,
    #[serde(rename = "MULTI_NODE_MULTI_WRITER")]
    MultiNodeMultiWriter,
}

impl AccessMode {
    /// Modes that forbid writes; staging adds `ro` to the mount options.
    pub fn is_read_only(&self) -> bool {
        matches!(
            self,
            AccessMode::SingleNodeReaderOnly | AccessMode::MultiNodeReaderOnly
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VolumeCapability {
    #[serde(rename = "accessMode", skip_serializing_if = "Option::is_none")]
    pub access_mode: Option<AccessMode>,
    #[serde(rename = "mount", skip_serializing_if = "Option::is_none")]
    pub mount: Option<MountVolumeCapability>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CapacityRange {
    #[serde(rename = "requiredBytes", skip_serializing_if = "Option::is_none")]
    pub required_bytes: Option<u64>,
    #[serde(rename = "limitBytes", skip_serializing_if = "Option::is_none")]
    pub limit_bytes: Option<u64>,
}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct NodeStageVolumeRequest {
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(rename = "stagingTargetPath")]
    pub staging_target_path: String,
    #[serde(rename = "volumeCapability", skip_serializing_if = "Option::is_none")]
    pub volume_capability: Option<VolumeCapability>,
    #[serde(
        default,
        rename = "volumeContext",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub volume_context: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub secrets: HashMap<String, String>,
}

impl fmt::Debug for NodeStageVolumeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeStageVolumeRequest")
            .field("volume_id", &self.volume_id)
            .field("staging_target_path", &self.staging_target_path)
            .field("volume_capability", &self.volume_capability)
            .field("volume_context", &self.volume_context)
            .field("secrets", &redact_secrets(&self.secrets))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeStageVolumeResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeUnstageVolumeRequest {
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(rename = "stagingTargetPath")]
    pub staging_target_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeUnstageVolumeResponse {}

#[derive(Clone, Serialize, Deserialize, Default)]
pub struct NodePublishVolumeRequest {
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(rename = "stagingTargetPath")]
    pub staging_target_path: String,
    #[serde(rename = "targetPath")]
    pub target_path: String,
    #[serde(rename = "volumeCapability", skip_serializing_if = "Option::is_none")]
    pub volume_capability: Option<VolumeCapability>,
    #[serde(default)]
    pub readonly: bool,
    #[serde(
        default,
        rename = "volumeContext",
        skip_serializing_if = "HashMap::is_empty"
    )]
    pub volume_context: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub secrets: HashMap<String, String>,
}

impl fmt::Debug for NodePublishVolumeRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodePublishVolumeRequest")
            .field("volume_id", &self.volume_id)
            .field("staging_target_path", &self.staging_target_path)
            .field("target_path", &self.target_path)
            .field("volume_capability", &self.volume_capability)
            .field("readonly", &self.readonly)
            .field("volume_context", &self.volume_context)
            .field("secrets", &redact_secrets(&self.secrets))
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodePublishVolumeResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeUnpublishVolumeRequest {
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(rename = "targetPath")]
    pub target_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeUnpublishVolumeResponse {}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeGetVolumeStatsRequest {
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(rename = "volumePath")]
    pub volume_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub enum UsageUnit {
    #[serde(rename = "BYTES")]
    #[default]
    Bytes,
    #[serde(rename = "INODES")]
    Inodes,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct VolumeUsage {
    pub unit: UsageUnit,
    pub total: u64,
    pub used: u64,
    pub available: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeGetVolumeStatsResponse {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub usage: Vec<VolumeUsage>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeExpandVolumeRequest {
    #[serde(rename = "volumeId")]
    pub volume_id: String,
    #[serde(rename = "volumePath")]
    pub volume_path: String,
    #[serde(rename = "capacityRange", skip_serializing_if = "Option::is_none")]
    pub capacity_range: Option<CapacityRange>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct NodeExpandVolumeResponse {
    #[serde(rename = "capacityBytes", skip_serializing_if = "Option::is_none")]
    pub capacity_bytes: Option<u64>,
}

fn redact_secrets(secrets: &HashMap<String, String>) -> BTreeMap<&str, &'static str> {
    secrets
        .iter()
        .map(|(key, _)| (key.as_str(), "****"))
        .collect()
}

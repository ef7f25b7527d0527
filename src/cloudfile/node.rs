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
use crate::cloudfile::format::{is_disk_fs_type, stage_disk_image};
use crate::cloudfile::locks::{VolumeLockGuard, VolumeLocks};
use crate::cloudfile::logger::{log_error, log_info};
use crate::cloudfile::mount::{cleanup_mount_point, ensure_mount_point, Mounter};
use crate::cloudfile::status::Status;
use crate::cloudfile::types::{
    NodeExpandVolumeRequest, NodeExpandVolumeResponse, NodeGetVolumeStatsRequest,
    NodeGetVolumeStatsResponse, NodePublishVolumeRequest, NodePublishVolumeResponse,
    NodeStageVolumeRequest, NodeStageVolumeResponse, NodeUnpublishVolumeRequest,
    NodeUnpublishVolumeResponse, NodeUnstageVolumeRequest, NodeUnstageVolumeResponse,
    UsageUnit, VolumeUsage,
};
use crate::cloudfile::util::error::is_not_found_error;
use crate::cloudfile::volume::{
    account_name, resolve_mount_request, DISK_NAME_FIELD, FS_TYPE_FIELD,
};

use std::path::Path;
use std::sync::Arc;

const NODE_COMPONENT: &str = "csi.node";

/// Node half of the plugin: executes the stage → publish → unpublish →
/// unstage lifecycle for file-share volumes on this host.
///
/// Every call runs synchronously on the caller's task. Once an external
/// operation (mount, mkfs) has started it is not interruptible; callers get
/// the outcome of the step that failed and retry against a re-probed state.
pub struct NodeDriver {
    mounter: Arc<dyn Mounter>,
    cloud: CloudEnvironment,
    volume_locks: VolumeLocks,
}

impl NodeDriver {
    pub fn new(mounter: Arc<dyn Mounter>, cloud: CloudEnvironment) -> Self {
        Self {
            mounter,
            cloud,
            volume_locks: VolumeLocks::new(),
        }
    }

    /// In-flight-operation table. Exposed so transports and conformance
    /// tests can observe or pre-claim volume IDs.
    pub fn volume_locks(&self) -> &VolumeLocks {
        &self.volume_locks
    }

    fn acquire(&self, volume_id: &str) -> Result<VolumeLockGuard<'_>, Status> {
        self.volume_locks.try_acquire(volume_id).ok_or_else(|| {
            Status::aborted(format!("operation already exists for {}", volume_id))
        })
    }

    pub async fn node_stage_volume(
        &self,
        request: NodeStageVolumeRequest,
    ) -> Result<NodeStageVolumeResponse, Status> {
        if request.volume_id.is_empty() {
            return Err(Status::invalid_argument("Volume ID missing in request"));
        }
        if request.staging_target_path.is_empty() {
            return Err(Status::invalid_argument("Staging target not provided"));
        }
        let Some(capability) = request.volume_capability.as_ref() else {
            return Err(Status::invalid_argument("Volume capability not provided"));
        };
        let account = account_name(&request.volume_id, &request.secrets)
            .map_err(|err| Status::invalid_argument(err.to_string()))?;

        let _guard = self.acquire(&request.volume_id)?;

        let staging_path = Path::new(&request.staging_target_path);
        let fs_type = request
            .volume_context
            .get(FS_TYPE_FIELD)
            .map(String::as_str)
            .unwrap_or_default();
        let disk_name = request
            .volume_context
            .get(DISK_NAME_FIELD)
            .map(String::as_str)
            .unwrap_or_default();
        let disk_mode = is_disk_fs_type(fs_type);
        if disk_mode && disk_name.is_empty() {
            return Err(Status::invalid_argument(format!(
                "{} could not be empty, targetPath: {}",
                DISK_NAME_FIELD, request.staging_target_path
            )));
        }

        log_info(
            NODE_COMPONENT,
            "staging volume",
            &[
                ("volume_id", request.volume_id.as_str()),
                ("staging_target", request.staging_target_path.as_str()),
                ("account", account.as_str()),
            ],
        );

        let already_mounted = ensure_mount_point(self.mounter.as_ref(), staging_path)
            .map_err(|err| {
                Status::internal(format!(
                    "MkdirAll {} failed with error: {}",
                    request.staging_target_path, err
                ))
            })?;

        let disk_path = staging_path.join(disk_name);
        if already_mounted {
            if !disk_mode || !disk_path.exists() {
                // Either the plain share or the loop-mounted image is already
                // in place; repeating the call is a no-op.
                log_info(
                    NODE_COMPONENT,
                    "staging target already mounted",
                    &[("staging_target", request.staging_target_path.as_str())],
                );
                return Ok(NodeStageVolumeResponse {});
            }
            // The share is mounted but the disk image is still visible, so a
            // previous stage stopped before the loop mount; resume from here.
        } else {
            let mount_request = resolve_mount_request(
                &request.volume_id,
                &request.volume_context,
                &request.secrets,
                capability,
                &self.cloud,
            )
            .map_err(|err| Status::invalid_argument(err.to_string()))?;

            let options = mount_request.options.join(",");
            log_info(
                NODE_COMPONENT,
                "mounting share",
                &[
                    ("volume_id", request.volume_id.as_str()),
                    ("source", mount_request.source.as_str()),
                    ("protocol", mount_request.protocol.as_str()),
                    ("options", options.as_str()),
                ],
            );
            self.mounter
                .mount(
                    &mount_request.source,
                    staging_path,
                    mount_request.protocol.fs_type(),
                    &mount_request.options,
                    &mount_request.sensitive_options,
                )
                .map_err(|err| {
                    let status = Status::internal(format!(
                        "volume({}) mount {:?} on {:?} failed with {}",
                        request.volume_id, mount_request.source, request.staging_target_path, err
                    ));
                    log_error(
                        NODE_COMPONENT,
                        "share mount failed",
                        &[
                            ("volume_id", request.volume_id.as_str()),
                            ("source", mount_request.source.as_str()),
                        ],
                    );
                    status
                })?;
        }

        if disk_mode {
            stage_disk_image(self.mounter.as_ref(), &disk_path, staging_path, fs_type).map_err(
                |err| {
                    log_error(
                        NODE_COMPONENT,
                        "disk image staging failed",
                        &[
                            ("volume_id", request.volume_id.as_str()),
                            ("disk_path", &disk_path.display().to_string()),
                            ("error", &err.to_string()),
                        ],
                    );
                    Status::internal(format!(
                        "could not format {:?} and mount it at {:?}",
                        request.staging_target_path,
                        disk_path.display().to_string()
                    ))
                },
            )?;
        }

        log_info(
            NODE_COMPONENT,
            "volume staged",
            &[
                ("volume_id", request.volume_id.as_str()),
                ("staging_target", request.staging_target_path.as_str()),
            ],
        );
        Ok(NodeStageVolumeResponse {})
    }

    pub async fn node_unstage_volume(
        &self,
        request: NodeUnstageVolumeRequest,
    ) -> Result<NodeUnstageVolumeResponse, Status> {
        if request.volume_id.is_empty() {
            return Err(Status::invalid_argument("Volume ID missing in request"));
        }
        if request.staging_target_path.is_empty() {
            return Err(Status::invalid_argument("Staging target not provided"));
        }

        let _guard = self.acquire(&request.volume_id)?;

        log_info(
            NODE_COMPONENT,
            "unstaging volume",
            &[
                ("volume_id", request.volume_id.as_str()),
                ("staging_target", request.staging_target_path.as_str()),
            ],
        );
        cleanup_mount_point(
            self.mounter.as_ref(),
            Path::new(&request.staging_target_path),
        )
        .map_err(|err| {
            Status::internal(format!(
                "failed to unmount staging target {:?}: {}",
                request.staging_target_path, err
            ))
        })?;

        log_info(
            NODE_COMPONENT,
            "volume unstaged",
            &[("volume_id", request.volume_id.as_str())],
        );
        Ok(NodeUnstageVolumeResponse {})
    }

    pub async fn node_publish_volume(
        &self,
        request: NodePublishVolumeRequest,
    ) -> Result<NodePublishVolumeResponse, Status> {
        if request.volume_capability.is_none() {
            return Err(Status::invalid_argument(
                "Volume capability missing in request",
            ));
        }
        if request.volume_id.is_empty() {
            return Err(Status::invalid_argument("Volume ID missing in request"));
        }
        if request.target_path.is_empty() {
            return Err(Status::invalid_argument("Target path not provided"));
        }
        if request.staging_target_path.is_empty() {
            return Err(Status::invalid_argument("Staging target not provided"));
        }

        let _guard = self.acquire(&request.volume_id)?;

        let target = Path::new(&request.target_path);
        let already_mounted =
            ensure_mount_point(self.mounter.as_ref(), target).map_err(|err| {
                Status::internal(format!(
                    "Could not mount target {:?}: {}",
                    request.target_path, err
                ))
            })?;
        if already_mounted {
            log_info(
                NODE_COMPONENT,
                "target already published",
                &[("target", request.target_path.as_str())],
            );
            return Ok(NodePublishVolumeResponse {});
        }

        let mut options = vec!["bind".to_string()];
        if request.readonly {
            options.push("ro".to_string());
        }
        log_info(
            NODE_COMPONENT,
            "publishing volume",
            &[
                ("volume_id", request.volume_id.as_str()),
                ("staging_target", request.staging_target_path.as_str()),
                ("target", request.target_path.as_str()),
                ("readonly", if request.readonly { "true" } else { "false" }),
            ],
        );
        self.mounter
            .mount(&request.staging_target_path, target, "", &options, &[])
            .map_err(|err| {
                Status::internal(format!(
                    "Could not mount {:?} at {:?}: {}",
                    request.staging_target_path, request.target_path, err
                ))
            })?;

        Ok(NodePublishVolumeResponse {})
    }

    pub async fn node_unpublish_volume(
        &self,
        request: NodeUnpublishVolumeRequest,
    ) -> Result<NodeUnpublishVolumeResponse, Status> {
        if request.volume_id.is_empty() {
            return Err(Status::invalid_argument("Volume ID missing in request"));
        }
        if request.target_path.is_empty() {
            return Err(Status::invalid_argument("Target path missing in request"));
        }

        let _guard = self.acquire(&request.volume_id)?;

        log_info(
            NODE_COMPONENT,
            "unpublishing volume",
            &[
                ("volume_id", request.volume_id.as_str()),
                ("target", request.target_path.as_str()),
            ],
        );
        cleanup_mount_point(self.mounter.as_ref(), Path::new(&request.target_path)).map_err(
            |err| {
                Status::internal(format!(
                    "failed to unmount target {:?}: {}",
                    request.target_path, err
                ))
            },
        )?;

        Ok(NodeUnpublishVolumeResponse {})
    }

    pub async fn node_get_volume_stats(
        &self,
        request: NodeGetVolumeStatsRequest,
    ) -> Result<NodeGetVolumeStatsResponse, Status> {
        if request.volume_id.is_empty() {
            return Err(Status::invalid_argument(
                "NodeGetVolumeStats volume ID was empty",
            ));
        }
        if request.volume_path.is_empty() {
            return Err(Status::invalid_argument(
                "NodeGetVolumeStats volume path was empty",
            ));
        }

        let usage = self
            .mounter
            .stat_fs(Path::new(&request.volume_path))
            .map_err(|err| {
                if is_not_found_error(err.as_ref()) {
                    Status::not_found(format!("path {} does not exist", request.volume_path))
                } else {
                    Status::internal(format!(
                        "failed to stat file {}: {}",
                        request.volume_path, err
                    ))
                }
            })?;

        Ok(NodeGetVolumeStatsResponse {
            usage: vec![
                VolumeUsage {
                    unit: UsageUnit::Bytes,
                    total: usage.total_bytes,
                    used: usage.used_bytes,
                    available: usage.available_bytes,
                },
                VolumeUsage {
                    unit: UsageUnit::Inodes,
                    total: usage.total_inodes,
                    used: usage.used_inodes,
                    available: usage.available_inodes,
                },
            ],
        })
    }

    pub async fn node_expand_volume(
        &self,
        _request: NodeExpandVolumeRequest,
    ) -> Result<NodeExpandVolumeResponse, Status> {
        Err(Status::unimplemented(""))
    }
}

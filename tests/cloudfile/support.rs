#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use cloudfile::cloudfile::config::CloudEnvironment;
use cloudfile::cloudfile::node::NodeDriver;
use cloudfile::cloudfile::test_support::{test_output_dir, FakeMounter};
use cloudfile::cloudfile::types::{NodePublishVolumeRequest, NodeStageVolumeRequest, VolumeCapability};

pub const TEST_ACCOUNT: &str = "k8s";
pub const TEST_ACCOUNT_KEY: &str = "dGVzdGtleQ==";
pub const TEST_SUFFIX: &str = "test_suffix";
pub const TEST_VOLUME_ID: &str = "rg#k8s#fileshare#";

/// A node driver wired to a [`FakeMounter`], with a scratch directory per
/// test for staging and publish targets.
pub struct NodeTestEnv {
    pub mounter: Arc<FakeMounter>,
    pub driver: NodeDriver,
    base: PathBuf,
}

impl NodeTestEnv {
    pub fn new(test_name: &str) -> Self {
        let base = test_output_dir("csi-node").join(test_name);
        fs::create_dir_all(&base).expect("create test base dir");
        let mounter = Arc::new(FakeMounter::new());
        let driver = NodeDriver::new(mounter.clone(), CloudEnvironment::new(TEST_SUFFIX));
        Self {
            mounter,
            driver,
            base,
        }
    }

    /// Path under the per-test scratch directory. Nothing is created.
    pub fn path(&self, name: &str) -> PathBuf {
        self.base.join(name)
    }

    /// Directory under the per-test scratch directory, created on the spot.
    pub fn dir(&self, name: &str) -> PathBuf {
        let path = self.base.join(name);
        fs::create_dir_all(&path).expect("create scratch dir");
        path
    }
}

pub fn path_str(path: &Path) -> String {
    path.display().to_string()
}

pub fn account_secrets() -> HashMap<String, String> {
    HashMap::from([
        ("accountname".to_string(), TEST_ACCOUNT.to_string()),
        ("accountkey".to_string(), TEST_ACCOUNT_KEY.to_string()),
    ])
}

pub fn volume_context(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .collect()
}

/// Stage request for [`TEST_VOLUME_ID`] with account secrets and a default
/// capability; tests override fields as needed.
pub fn stage_request(staging: &Path) -> NodeStageVolumeRequest {
    NodeStageVolumeRequest {
        volume_id: TEST_VOLUME_ID.to_string(),
        staging_target_path: path_str(staging),
        volume_capability: Some(VolumeCapability::default()),
        volume_context: HashMap::new(),
        secrets: account_secrets(),
    }
}

pub fn publish_request(staging: &Path, target: &Path) -> NodePublishVolumeRequest {
    NodePublishVolumeRequest {
        volume_id: TEST_VOLUME_ID.to_string(),
        staging_target_path: path_str(staging),
        target_path: path_str(target),
        volume_capability: Some(VolumeCapability::default()),
        readonly: false,
        volume_context: HashMap::new(),
        secrets: HashMap::new(),
    }
}

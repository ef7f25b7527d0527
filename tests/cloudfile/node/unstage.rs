use cloudfile::cloudfile::status::Code;
use cloudfile::cloudfile::types::NodeUnstageVolumeRequest;

use crate::support::{path_str, NodeTestEnv, TEST_VOLUME_ID};

fn unstage_request(staging_target_path: String) -> NodeUnstageVolumeRequest {
    NodeUnstageVolumeRequest {
        volume_id: TEST_VOLUME_ID.to_string(),
        staging_target_path,
    }
}

#[tokio::test]
async fn unstage_rejects_empty_volume_id() {
    let env = NodeTestEnv::new("unstage-no-id");
    let mut request = unstage_request(path_str(&env.path("stage")));
    request.volume_id = String::new();

    let err = env.driver.node_unstage_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Volume ID missing in request");
}

#[tokio::test]
async fn unstage_rejects_empty_staging_target() {
    let env = NodeTestEnv::new("unstage-no-target");
    let request = unstage_request(String::new());

    let err = env.driver.node_unstage_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Staging target not provided");
}

#[tokio::test]
async fn unstage_unmounts_and_removes_staging_target() {
    let env = NodeTestEnv::new("unstage-mounted");
    let staging = env.dir("false_is_likely_exist-stage");

    env.driver
        .node_unstage_volume(unstage_request(path_str(&staging)))
        .await
        .expect("unstage");

    assert!(env
        .mounter
        .recorded(&format!("unmount target={}", path_str(&staging))));
    assert!(!staging.exists(), "staging directory should be removed");
}

#[tokio::test]
async fn unstage_succeeds_when_staging_target_missing() {
    let env = NodeTestEnv::new("unstage-missing");
    let staging = env.path("never-staged");

    env.driver
        .node_unstage_volume(unstage_request(path_str(&staging)))
        .await
        .expect("unstage");
    assert!(env.mounter.actions().is_empty());
}

#[tokio::test]
async fn unstage_removes_stale_directory_without_unmount() {
    let env = NodeTestEnv::new("unstage-stale");
    let staging = env.dir("stale");

    env.driver
        .node_unstage_volume(unstage_request(path_str(&staging)))
        .await
        .expect("unstage");

    assert!(!env.mounter.recorded("unmount"));
    assert!(!staging.exists());
}

#[tokio::test]
async fn unstage_rejected_while_volume_operation_in_flight() {
    let env = NodeTestEnv::new("unstage-conflict");
    let _held = env
        .driver
        .volume_locks()
        .try_acquire(TEST_VOLUME_ID)
        .expect("claim volume");

    let err = env
        .driver
        .node_unstage_volume(unstage_request(path_str(&env.path("stage"))))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Aborted);
    assert_eq!(
        err.message(),
        format!("operation already exists for {}", TEST_VOLUME_ID)
    );
}

#[tokio::test]
async fn unstage_tolerates_file_at_staging_path() {
    let env = NodeTestEnv::new("unstage-file");
    let staging = env.path("stale-marker");
    std::fs::write(&staging, b"leftover").expect("create file");

    env.driver
        .node_unstage_volume(unstage_request(path_str(&staging)))
        .await
        .expect("unstage");

    // Removal of a non-directory is best effort; the call still succeeds.
    assert!(staging.is_file());
    assert!(!env.mounter.recorded("unmount"));
}

#[tokio::test]
async fn unstage_wraps_probe_failures() {
    let env = NodeTestEnv::new("unstage-error");
    let staging = env.path("error_is_likely-stage");

    let err = env
        .driver
        .node_unstage_volume(unstage_request(path_str(&staging)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert_eq!(
        err.message(),
        format!(
            "failed to unmount staging target {:?}: fake is_mount_point: fake error",
            path_str(&staging)
        )
    );
}

use cloudfile::cloudfile::status::Code;
use cloudfile::cloudfile::types::NodeUnpublishVolumeRequest;

use crate::support::{path_str, NodeTestEnv, TEST_VOLUME_ID};

fn unpublish_request(target_path: String) -> NodeUnpublishVolumeRequest {
    NodeUnpublishVolumeRequest {
        volume_id: TEST_VOLUME_ID.to_string(),
        target_path,
    }
}

#[tokio::test]
async fn unpublish_rejects_empty_volume_id() {
    let env = NodeTestEnv::new("unpublish-no-id");
    let mut request = unpublish_request(path_str(&env.path("target")));
    request.volume_id = String::new();

    let err = env.driver.node_unpublish_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Volume ID missing in request");
}

#[tokio::test]
async fn unpublish_rejects_empty_target_path() {
    let env = NodeTestEnv::new("unpublish-no-target");
    let request = unpublish_request(String::new());

    let err = env.driver.node_unpublish_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Target path missing in request");
}

#[tokio::test]
async fn unpublish_unmounts_and_removes_target() {
    let env = NodeTestEnv::new("unpublish-mounted");
    let target = env.dir("false_is_likely_exist-target");

    env.driver
        .node_unpublish_volume(unpublish_request(path_str(&target)))
        .await
        .expect("unpublish");

    assert!(env
        .mounter
        .recorded(&format!("unmount target={}", path_str(&target))));
    assert!(!target.exists(), "target directory should be removed");
}

#[tokio::test]
async fn unpublish_succeeds_when_target_missing() {
    let env = NodeTestEnv::new("unpublish-missing");
    let target = env.path("never-published");

    env.driver
        .node_unpublish_volume(unpublish_request(path_str(&target)))
        .await
        .expect("unpublish");
    assert!(env.mounter.actions().is_empty());
}

#[tokio::test]
async fn unpublish_rejected_while_volume_operation_in_flight() {
    let env = NodeTestEnv::new("unpublish-conflict");
    let _held = env
        .driver
        .volume_locks()
        .try_acquire(TEST_VOLUME_ID)
        .expect("claim volume");

    let err = env
        .driver
        .node_unpublish_volume(unpublish_request(path_str(&env.path("target"))))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Aborted);
    assert_eq!(
        err.message(),
        format!("operation already exists for {}", TEST_VOLUME_ID)
    );
}

#[tokio::test]
async fn unpublish_wraps_probe_failures() {
    let env = NodeTestEnv::new("unpublish-error");
    let target = env.path("error_is_likely-target");

    let err = env
        .driver
        .node_unpublish_volume(unpublish_request(path_str(&target)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert_eq!(
        err.message(),
        format!(
            "failed to unmount target {:?}: fake is_mount_point: fake error",
            path_str(&target)
        )
    );
}

use cloudfile::cloudfile::status::Code;

use crate::support::{path_str, publish_request, NodeTestEnv};

#[tokio::test]
async fn publish_rejects_missing_capability() {
    let env = NodeTestEnv::new("publish-no-capability");
    let mut request = publish_request(&env.dir("stage"), &env.path("target"));
    request.volume_capability = None;

    let err = env.driver.node_publish_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Volume capability missing in request");
}

#[tokio::test]
async fn publish_rejects_empty_volume_id() {
    let env = NodeTestEnv::new("publish-no-id");
    let mut request = publish_request(&env.dir("stage"), &env.path("target"));
    request.volume_id = String::new();

    let err = env.driver.node_publish_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Volume ID missing in request");
}

#[tokio::test]
async fn publish_rejects_empty_target_path() {
    let env = NodeTestEnv::new("publish-no-target");
    let mut request = publish_request(&env.dir("stage"), &env.path("target"));
    request.target_path = String::new();

    let err = env.driver.node_publish_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Target path not provided");
}

#[tokio::test]
async fn publish_rejects_empty_staging_target() {
    let env = NodeTestEnv::new("publish-no-staging");
    let mut request = publish_request(&env.dir("stage"), &env.path("target"));
    request.staging_target_path = String::new();

    let err = env.driver.node_publish_volume(request).await.unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "Staging target not provided");
}

#[tokio::test]
async fn publish_bind_mounts_staging_to_target() {
    let env = NodeTestEnv::new("publish-bind");
    let staging = env.dir("stage");
    let target = env.path("pod-target");

    env.driver
        .node_publish_volume(publish_request(&staging, &target))
        .await
        .expect("publish");

    assert_eq!(
        env.mounter.actions(),
        vec![format!(
            "mount source={} target={} fstype= options=[bind] sensitive=0",
            path_str(&staging),
            path_str(&target)
        )]
    );
    assert!(target.is_dir(), "target should have been created");
}

#[tokio::test]
async fn publish_adds_ro_for_read_only_requests() {
    let env = NodeTestEnv::new("publish-readonly");
    let staging = env.dir("stage");
    let target = env.path("pod-target");
    let mut request = publish_request(&staging, &target);
    request.readonly = true;

    env.driver.node_publish_volume(request).await.expect("publish");
    assert!(env.mounter.recorded("options=[bind,ro]"));
}

#[tokio::test]
async fn publish_succeeds_when_target_already_mounted() {
    let env = NodeTestEnv::new("publish-idempotent");
    let staging = env.dir("stage");
    let target = env.path("false_is_likely_exist-target");

    env.driver
        .node_publish_volume(publish_request(&staging, &target))
        .await
        .expect("publish");
    assert!(env.mounter.actions().is_empty());
}

#[tokio::test]
async fn publish_wraps_target_preparation_failures() {
    let env = NodeTestEnv::new("publish-mkdir-error");
    let staging = env.dir("stage");
    let target = env.path("error_is_likely-target");

    let err = env
        .driver
        .node_publish_volume(publish_request(&staging, &target))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert_eq!(
        err.message(),
        format!(
            "Could not mount target {:?}: fake is_mount_point: fake error",
            path_str(&target)
        )
    );
}

#[tokio::test]
async fn publish_surfaces_bind_mount_failures() {
    let env = NodeTestEnv::new("publish-mount-error");
    let staging = env.dir("error_mount_source-stage");
    let target = env.path("pod-target");

    let err = env
        .driver
        .node_publish_volume(publish_request(&staging, &target))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Internal);
    assert_eq!(
        err.message(),
        format!(
            "Could not mount {:?} at {:?}: {}",
            path_str(&staging),
            path_str(&target),
            "fake mount: source error"
        )
    );
}

#[tokio::test]
async fn publish_rejected_while_volume_operation_in_flight() {
    let env = NodeTestEnv::new("publish-conflict");
    let _held = env
        .driver
        .volume_locks()
        .try_acquire(crate::support::TEST_VOLUME_ID)
        .expect("claim volume");

    let err = env
        .driver
        .node_publish_volume(publish_request(&env.dir("stage"), &env.path("target")))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::Aborted);
    assert_eq!(
        err.message(),
        format!(
            "operation already exists for {}",
            crate::support::TEST_VOLUME_ID
        )
    );
}

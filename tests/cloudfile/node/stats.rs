use cloudfile::cloudfile::status::Code;
use cloudfile::cloudfile::types::{NodeGetVolumeStatsRequest, UsageUnit};

use crate::support::{path_str, NodeTestEnv, TEST_VOLUME_ID};

fn stats_request(volume_path: String) -> NodeGetVolumeStatsRequest {
    NodeGetVolumeStatsRequest {
        volume_id: TEST_VOLUME_ID.to_string(),
        volume_path,
    }
}

#[tokio::test]
async fn stats_rejects_empty_volume_id() {
    let env = NodeTestEnv::new("stats-no-id");
    let mut request = stats_request(path_str(&env.dir("vol")));
    request.volume_id = String::new();

    let err = env
        .driver
        .node_get_volume_stats(request)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "NodeGetVolumeStats volume ID was empty");
}

#[tokio::test]
async fn stats_rejects_empty_volume_path() {
    let env = NodeTestEnv::new("stats-no-path");
    let request = stats_request(String::new());

    let err = env
        .driver
        .node_get_volume_stats(request)
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::InvalidArgument);
    assert_eq!(err.message(), "NodeGetVolumeStats volume path was empty");
}

#[tokio::test]
async fn stats_reports_not_found_for_missing_path() {
    let env = NodeTestEnv::new("stats-missing");
    let path = env.path("not-there");

    let err = env
        .driver
        .node_get_volume_stats(stats_request(path_str(&path)))
        .await
        .unwrap_err();
    assert_eq!(err.code(), Code::NotFound);
    assert_eq!(
        err.message(),
        format!("path {} does not exist", path_str(&path))
    );
}

#[tokio::test]
async fn stats_reports_bytes_and_inodes_for_existing_path() {
    let env = NodeTestEnv::new("stats-ok");
    let path = env.dir("vol");

    let response = env
        .driver
        .node_get_volume_stats(stats_request(path_str(&path)))
        .await
        .expect("stats");

    assert_eq!(response.usage.len(), 2);

    let bytes = &response.usage[0];
    assert!(matches!(bytes.unit, UsageUnit::Bytes));
    assert!(bytes.total > 0, "total bytes should be positive");
    assert!(bytes.used <= bytes.total);
    assert!(bytes.available <= bytes.total);

    let inodes = &response.usage[1];
    assert!(matches!(inodes.unit, UsageUnit::Inodes));
    assert!(inodes.used <= inodes.total);
    assert!(inodes.available <= inodes.total);
}

/*!
 * Integration tests for the probe driven end to end: fixture loading,
 * first-run bootstrap, full cycles against the in-memory backend, and the
 * resulting Prometheus gauge state.
 */

use std::io::Write;
use std::sync::Arc;

use bytes::Bytes;
use prometheus::Registry;
use tempfile::NamedTempFile;

use bucketprobe::bootstrap;
use bucketprobe::config::Config;
use bucketprobe::fixture::Fixture;
use bucketprobe::metrics::{CapturingSink, PrometheusSink};
use bucketprobe::probe::{CycleOptions, Operation, ProbeCycle};
use bucketprobe::store::{MemoryStore, ObjectStore, StoreError};

const DOWNLOAD_CONTENT: &[u8] = b"known good download content";
const UPLOAD_CONTENT: &[u8] = b"payload the probe uploads";

fn fixture_file(content: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content).unwrap();
    file
}

async fn load_fixture() -> (Fixture, NamedTempFile, NamedTempFile) {
    let download = fixture_file(DOWNLOAD_CONTENT);
    let upload = fixture_file(UPLOAD_CONTENT);
    let fixture = Fixture::load(download.path(), upload.path()).await.unwrap();
    (fixture, download, upload)
}

fn all_options() -> CycleOptions {
    CycleOptions {
        upload_key: "probe-upload.bin".to_string(),
        download_key: "probe-download.bin".to_string(),
        multipart_check: true,
        versioning_check: true,
    }
}

fn gauge_value(registry: &Registry, name: &str) -> Option<f64> {
    registry
        .gather()
        .iter()
        .find(|mf| mf.get_name() == name)
        .and_then(|mf| mf.get_metric().first())
        .map(|m| m.get_gauge().value())
}

fn error_labels(registry: &Registry, name: &str) -> Vec<String> {
    registry
        .gather()
        .iter()
        .find(|mf| mf.get_name() == name)
        .map(|mf| {
            mf.get_metric()
                .iter()
                .flat_map(|m| m.get_label().iter())
                .map(|l| l.get_value().to_string())
                .collect()
        })
        .unwrap_or_default()
}

/// Bootstrap then a full steady-state cycle: every step succeeds and every
/// status gauge reads ok.
#[tokio::test]
async fn test_first_run_then_full_cycle_all_green() {
    let (fixture, _d, _u) = load_fixture().await;
    let store = Arc::new(MemoryStore::new());

    bootstrap::first_run(
        store.as_ref(),
        "probe-bucket",
        "probe-download.bin",
        fixture.download_expected.clone(),
    )
    .await
    .unwrap();

    let options = all_options();
    let registry = Registry::new();
    let sink = Arc::new(
        PrometheusSink::register("probe", &registry, &options.enabled_operations()).unwrap(),
    );
    let cycle = ProbeCycle::new(store.clone(), Arc::new(fixture), options, sink);

    let results = cycle.run().await;
    assert_eq!(results.len(), 5);
    assert!(results.iter().all(|r| r.succeeded), "{:?}", results);

    for op in [
        "upload",
        "multipart_upload",
        "delete",
        "restore",
        "download",
    ] {
        assert_eq!(
            gauge_value(&registry, &format!("probe_{}_status", op)),
            Some(1.0),
            "status for {}",
            op
        );
        assert!(
            gauge_value(&registry, &format!("probe_{}_duration_seconds", op)).is_some(),
            "duration for {}",
            op
        );
    }

    // The versioning check deleted and restored the download object, so the
    // store ends the cycle with the seeded content live.
    assert_eq!(
        store.live_object("probe-download.bin").unwrap(),
        Bytes::from_static(DOWNLOAD_CONTENT)
    );
}

/// With both optional checks disabled a cycle is exactly upload then
/// download.
#[tokio::test]
async fn test_disabled_checks_yield_exactly_upload_and_download() {
    let (fixture, _d, _u) = load_fixture().await;
    let store = Arc::new(MemoryStore::new());
    store
        .put("probe-download.bin", Bytes::from_static(DOWNLOAD_CONTENT))
        .await
        .unwrap();

    let options = CycleOptions {
        multipart_check: false,
        versioning_check: false,
        ..all_options()
    };
    let sink = Arc::new(CapturingSink::new());
    let cycle = ProbeCycle::new(store, Arc::new(fixture), options, sink.clone());

    cycle.run().await;
    let recorded: Vec<Operation> = sink.results().iter().map(|r| r.operation).collect();
    assert_eq!(recorded, vec![Operation::Upload, Operation::Download]);
}

/// Wrong downloaded bytes: the download status goes to 0 with a mismatch
/// label, not a transport label.
#[tokio::test]
async fn test_corrupted_object_reports_mismatch_distinctly() {
    let (fixture, _d, _u) = load_fixture().await;
    let store = Arc::new(MemoryStore::new());
    store
        .put("probe-download.bin", Bytes::from_static(b"corrupted"))
        .await
        .unwrap();

    let options = CycleOptions {
        multipart_check: false,
        versioning_check: false,
        ..all_options()
    };
    let registry = Registry::new();
    let sink = Arc::new(
        PrometheusSink::register("probe", &registry, &options.enabled_operations()).unwrap(),
    );
    let cycle = ProbeCycle::new(store, Arc::new(fixture), options, sink);

    let results = cycle.run().await;
    let download = results.last().unwrap();
    assert!(!download.succeeded);
    assert_eq!(download.error.as_ref().unwrap().kind(), "mismatch");

    assert_eq!(gauge_value(&registry, "probe_download_status"), Some(0.0));
    let labels = error_labels(&registry, "probe_download_errors");
    assert_eq!(labels.len(), 1);
    assert!(labels[0].contains("mismatch"), "{:?}", labels);
    assert!(!labels[0].contains("network"), "{:?}", labels);
}

/// Unversioned store: delete succeeds without an id, restore fails with the
/// dedicated no-version label, download still runs and reports not-found.
#[tokio::test]
async fn test_unversioned_bucket_surfaces_restore_without_version() {
    let (fixture, _d, _u) = load_fixture().await;
    let store = Arc::new(MemoryStore::unversioned());
    store
        .put("probe-download.bin", Bytes::from_static(DOWNLOAD_CONTENT))
        .await
        .unwrap();

    let options = CycleOptions {
        multipart_check: false,
        ..all_options()
    };
    let registry = Registry::new();
    let sink = Arc::new(
        PrometheusSink::register("probe", &registry, &options.enabled_operations()).unwrap(),
    );
    let cycle = ProbeCycle::new(store, Arc::new(fixture), options, sink);

    let results = cycle.run().await;
    let ops: Vec<Operation> = results.iter().map(|r| r.operation).collect();
    assert_eq!(
        ops,
        vec![
            Operation::Upload,
            Operation::Delete,
            Operation::Restore,
            Operation::Download
        ]
    );

    assert_eq!(gauge_value(&registry, "probe_delete_status"), Some(1.0));
    assert_eq!(gauge_value(&registry, "probe_restore_status"), Some(0.0));
    let labels = error_labels(&registry, "probe_restore_errors");
    assert!(labels[0].contains("versioning"), "{:?}", labels);

    // Download ran and found nothing (the delete removed the object)
    assert_eq!(gauge_value(&registry, "probe_download_status"), Some(0.0));
}

/// A transport failure on one step leaves every other step measured, and a
/// second healthy cycle clears the error gauge again.
#[tokio::test]
async fn test_error_gauges_clear_on_next_healthy_cycle() {
    let (fixture, _d, _u) = load_fixture().await;
    let store = Arc::new(MemoryStore::new());
    store
        .put("probe-download.bin", Bytes::from_static(DOWNLOAD_CONTENT))
        .await
        .unwrap();

    let options = CycleOptions {
        multipart_check: false,
        versioning_check: false,
        ..all_options()
    };
    let registry = Registry::new();
    let sink = Arc::new(
        PrometheusSink::register("probe", &registry, &options.enabled_operations()).unwrap(),
    );
    let cycle = ProbeCycle::new(store.clone(), Arc::new(fixture), options, sink);

    store.fail_next("put", StoreError::Network("injected outage".to_string()));
    let results = cycle.run().await;
    assert!(!results[0].succeeded);
    assert!(results[1].succeeded);
    assert_eq!(gauge_value(&registry, "probe_upload_status"), Some(0.0));
    assert_eq!(error_labels(&registry, "probe_upload_errors").len(), 1);

    let results = cycle.run().await;
    assert!(results.iter().all(|r| r.succeeded));
    assert_eq!(gauge_value(&registry, "probe_upload_status"), Some(1.0));
    assert!(error_labels(&registry, "probe_upload_errors").is_empty());
}

/// Configuration loads from an actual file and maps onto cycle options.
#[tokio::test]
async fn test_config_load_drives_cycle_options() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(
        br#"
exporter:
  port: 9190
  path: /metrics
  interval_duration: 15
s3:
  url: http://localhost:9000
  region: us-east-1
  bucket: probe-bucket
  download_file_name: canary-download.bin
  download_file_path: /etc/probe/download.bin
  upload_file_name: canary-upload.bin
  upload_file_path: /etc/probe/upload.bin
  api_key: key
  secret_access_key: secret
  enable_multipart_upload_check: true
"#,
    )
    .unwrap();

    let config = Config::load(file.path()).unwrap();
    let options = config.cycle_options();
    assert_eq!(
        options.enabled_operations(),
        vec![
            Operation::Upload,
            Operation::MultipartUpload,
            Operation::Download
        ]
    );
    assert_eq!(config.exporter.interval().as_secs(), 15);
}

//! End-to-end tests for the reconstruction API.
//!
//! Requests go through the full router with a fake model, a fake video
//! decoder, and local-directory storage.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use frame_ingest::VideoDecoder;
use gaussian_ply::PlyCloud;
use prediction::Predictor;
use recon_api::{build_router, config::ServiceConfig, state::AppState};
use serde_json::{json, Value};
use storage::{AssetStorage, StorageBackend, StorageConfig};
use tempfile::TempDir;
use test_utils::{fixtures, FakePredictor, FakeVideoDecoder};
use tower::ServiceExt;

// ============================================================================
// Harness
// ============================================================================

struct TestApp {
    router: Router,
    predictor: Arc<FakePredictor>,
    dir: TempDir,
}

impl TestApp {
    fn new(predictor: FakePredictor) -> Self {
        Self::with_decoder(predictor, FakeVideoDecoder::new(Some(30.0), 95))
    }

    fn with_decoder(predictor: FakePredictor, decoder: FakeVideoDecoder) -> Self {
        let dir = TempDir::new().unwrap();
        let predictor = Arc::new(predictor);

        let mut config = ServiceConfig::default();
        config.work_dir = dir.path().join("work");
        config.storage = StorageConfig {
            backend: StorageBackend::Local {
                root: dir.path().join("ply"),
            },
        };

        let storage = AssetStorage::new(&config.storage).unwrap();
        let state = AppState::with_components(
            config,
            Arc::clone(&predictor) as Arc<dyn Predictor>,
            Arc::new(decoder) as Arc<dyn VideoDecoder>,
            storage,
            None,
        );

        Self {
            router: build_router(Arc::new(state)),
            predictor,
            dir,
        }
    }

    fn storage_root(&self) -> PathBuf {
        self.dir.path().join("ply")
    }

    fn work_dir(&self) -> PathBuf {
        self.dir.path().join("work")
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    async fn reconstruct_raw(&self, body: String) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/reconstruct")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap();
        let (status, bytes) = self.send(request).await;
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn reconstruct(&self, body: Value) -> (StatusCode, Value) {
        self.reconstruct_raw(body.to_string()).await
    }

    async fn get(&self, uri: &str) -> (StatusCode, Vec<u8>) {
        let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
        self.send(request).await
    }
}

fn entries(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

fn stored_ply(app: &TestApp, response: &Value) -> PlyCloud {
    let key = response["gaussian_asset_key"].as_str().unwrap();
    let bytes = std::fs::read(app.storage_root().join(key)).unwrap();
    PlyCloud::parse(&bytes).unwrap()
}

// ============================================================================
// Image input
// ============================================================================

#[tokio::test]
async fn test_three_images_reconstruct() {
    let app = TestApp::new(FakePredictor::with_points(20));
    let (status, body) = app
        .reconstruct(fixtures::image_request("case-001", 3))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    let stats = &body["processing_stats"];
    assert_eq!(stats["input_images"], 3);
    assert_eq!(stats["input_type"], "images");
    assert_eq!(stats["detected_objects"], 1);
    assert_eq!(stats["point_count"], 20);
    assert_eq!(body["point_cloud"]["count"], stats["point_count"]);
    assert_eq!(body["point_cloud"]["positions"].as_array().unwrap().len(), 20);
    assert_eq!(body["point_cloud"]["colors"][0], json!([0.5, 0.5, 0.5]));

    // every frame reaches the model at the fixed resolution
    assert_eq!(app.predictor.batches(), vec![vec![[3, 518, 518]; 3]]);
}

#[tokio::test]
async fn test_response_shape() {
    let app = TestApp::new(FakePredictor::with_points(12));
    let (status, body) = app.reconstruct(fixtures::image_request("case-002", 1)).await;
    assert_eq!(status, StatusCode::OK);

    let object = &body["objects"][0];
    assert_eq!(object["action"], "create");
    assert_eq!(object["confidence"], 0.8);
    assert_eq!(object["object"]["type"], "other");
    assert_eq!(object["object"]["confidence"], 0.8);
    // lattice points 0..12 span x in [0, 9], y in [0, 1]
    assert_eq!(object["object"]["bbox"]["min"], json!([0.0, 0.0, 0.0]));
    assert_eq!(object["object"]["bbox"]["max"], json!([9.0, 1.0, 0.0]));
    assert!(body["mesh_asset_key"].is_null());
    assert!(body["pointcloud_asset_key"].is_null());
    assert_eq!(body["uncertainty_regions"], json!([]));
}

#[tokio::test]
async fn test_data_url_images_accepted() {
    let app = TestApp::new(FakePredictor::with_points(5));
    let body = json!({
        "case_id": "case-003",
        "scan_asset_keys": [fixtures::png_data_url(32, 32), fixtures::jpeg_base64(40, 20)],
    });
    let (status, body) = app.reconstruct(body).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["processing_stats"]["input_images"], 2);
}

#[tokio::test]
async fn test_undecodable_image_is_client_error() {
    let app = TestApp::new(FakePredictor::with_points(5));
    let (status, body) = app
        .reconstruct(json!({
            "case_id": "case-004",
            "scan_asset_keys": [fixtures::png_base64(8, 8), "bm90IGFuIGltYWdl"],
        }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to decode images"));
    assert_eq!(app.predictor.calls(), 0);
}

// ============================================================================
// Validation
// ============================================================================

#[tokio::test]
async fn test_missing_inputs_rejected() {
    let app = TestApp::new(FakePredictor::with_points(5));
    let (status, body) = app.reconstruct(json!({"case_id": "case-005"})).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("scan_asset_keys"));
    assert_eq!(app.predictor.calls(), 0);
}

#[tokio::test]
async fn test_missing_case_id_rejected() {
    let app = TestApp::new(FakePredictor::with_points(5));
    let (status, body) = app
        .reconstruct(json!({"scan_asset_keys": [fixtures::png_base64(8, 8)]}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "case_id is required");
}

#[tokio::test]
async fn test_malformed_json_rejected() {
    let app = TestApp::new(FakePredictor::with_points(5));
    let (status, body) = app.reconstruct_raw("{\"case_id\": ".to_string()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().starts_with("Invalid JSON body"));
}

// ============================================================================
// Model output handling
// ============================================================================

#[tokio::test]
async fn test_positions_only_output_gets_defaults() {
    let app = TestApp::new(FakePredictor::with_points(10));
    let (status, body) = app.reconstruct(fixtures::image_request("case-006", 1)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);

    let cloud = stored_ply(&app, &body);
    assert_eq!(cloud.len(), 10);
    assert_eq!(cloud.column("opacity").unwrap(), vec![0.8; 10]);
    assert_eq!(cloud.column("rot_0").unwrap(), vec![1.0; 10]);
    assert_eq!(cloud.column("rot_3").unwrap(), vec![0.0; 10]);
    assert_eq!(cloud.column("scale_1").unwrap(), vec![-5.0; 10]);
}

#[tokio::test]
async fn test_attribute_style_output() {
    let app = TestApp::new(FakePredictor::with_splat_head(7));
    let (status, body) = app.reconstruct(fixtures::image_request("case-007", 2)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["processing_stats"]["point_count"], 7);

    let cloud = stored_ply(&app, &body);
    assert_eq!(cloud.column("scale_0").unwrap(), vec![-3.0; 7]);
}

#[tokio::test]
async fn test_missing_positions_is_server_error() {
    let app = TestApp::new(FakePredictor::with_unknown_key("depth"));
    let (status, body) = app.reconstruct(fixtures::image_request("case-008", 1)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Model did not produce point positions"));
    assert_eq!(entries(&app.storage_root()), 0);
}

#[tokio::test]
async fn test_model_failure_is_server_error() {
    let app = TestApp::new(FakePredictor::failing());
    let (status, body) = app.reconstruct(fixtures::image_request("case-009", 1)).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Model inference failed"));
}

#[tokio::test]
async fn test_large_cloud_downsampled() {
    let app = TestApp::new(FakePredictor::with_points(60_000));
    let (status, body) = app.reconstruct(fixtures::image_request("case-010", 1)).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(body["point_cloud"]["count"], 50_000);
    assert_eq!(body["point_cloud"]["positions"].as_array().unwrap().len(), 50_000);
    assert_eq!(body["processing_stats"]["point_count"], 60_000);
    // the stored file keeps every point
    assert_eq!(stored_ply(&app, &body).len(), 60_000);
}

#[tokio::test]
async fn test_downsampling_is_repeatable() {
    let app = TestApp::new(FakePredictor::with_points(50_100));
    let (_, first) = app.reconstruct(fixtures::image_request("case-011", 1)).await;
    let (_, second) = app.reconstruct(fixtures::image_request("case-011", 1)).await;

    assert_eq!(first["point_cloud"], second["point_cloud"]);
    assert_ne!(first["gaussian_asset_key"], second["gaussian_asset_key"]);
}

// ============================================================================
// Video input
// ============================================================================

#[tokio::test]
async fn test_video_sampled_at_one_fps() {
    let app = TestApp::with_decoder(
        FakePredictor::with_points(8),
        FakeVideoDecoder::new(Some(30.0), 95),
    );
    let (status, body) = app
        .reconstruct(fixtures::video_request("case-012", b"fake mp4 bytes"))
        .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["processing_stats"]["input_type"], "video");
    assert_eq!(body["processing_stats"]["input_images"], 4);
    assert_eq!(entries(&app.work_dir()), 0);
}

#[tokio::test]
async fn test_video_takes_precedence_over_images() {
    let app = TestApp::with_decoder(
        FakePredictor::with_points(8),
        FakeVideoDecoder::new(Some(10.0), 25),
    );
    let mut request = fixtures::video_request("case-013", b"v");
    request["scan_asset_keys"] = json!([fixtures::png_base64(8, 8)]);

    let (status, body) = app.reconstruct(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["processing_stats"]["input_type"], "video");
    assert_eq!(body["processing_stats"]["input_images"], 3);
}

#[tokio::test]
async fn test_unreadable_video_is_client_error() {
    let app = TestApp::with_decoder(FakePredictor::with_points(8), FakeVideoDecoder::corrupt());
    let (status, body) = app
        .reconstruct(fixtures::video_request("case-014", b"garbage"))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to process video input"));
    assert_eq!(entries(&app.work_dir()), 0);
}

#[tokio::test]
async fn test_empty_video_is_client_error() {
    let app = TestApp::with_decoder(
        FakePredictor::with_points(8),
        FakeVideoDecoder::new(Some(30.0), 0),
    );
    let (status, body) = app.reconstruct(fixtures::video_request("case-015", b"v")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"]
        .as_str()
        .unwrap()
        .contains("No frames could be extracted from video"));
}

// ============================================================================
// Storage
// ============================================================================

#[tokio::test]
async fn test_storage_failure_degrades_to_null_key() {
    let app = TestApp::new(FakePredictor::with_points(10));

    // Replace the storage root with a plain file so writes fail
    let root = app.storage_root();
    std::fs::remove_dir_all(&root).unwrap();
    std::fs::write(&root, b"not a directory").unwrap();

    let (status, body) = app.reconstruct(fixtures::image_request("case-016", 1)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert!(body["gaussian_asset_key"].is_null());
    assert_eq!(body["processing_stats"]["point_count"], 10);
    assert_eq!(entries(&app.work_dir()), 0);
}

#[tokio::test]
async fn test_scratch_files_removed_after_success() {
    let app = TestApp::new(FakePredictor::with_points(10));
    let (status, _) = app.reconstruct(fixtures::image_request("case-017", 1)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(entries(&app.work_dir()), 0);
    assert_eq!(entries(&app.storage_root()), 1);
}

// ============================================================================
// Download
// ============================================================================

#[tokio::test]
async fn test_download_round_trip() {
    let app = TestApp::new(FakePredictor::with_points(10));
    let (_, body) = app.reconstruct(fixtures::image_request("case-018", 1)).await;
    let key = body["gaussian_asset_key"].as_str().unwrap();
    assert!(key.starts_with("gaussians_") && key.ends_with(".ply"));

    let request = Request::builder()
        .uri(format!("/download_ply?filename={}", key))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE],
        "application/octet-stream"
    );
    assert_eq!(
        response.headers()[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"{}\"", key).as_str()
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(PlyCloud::parse(&bytes).unwrap().len(), 10);
}

#[tokio::test]
async fn test_download_streams_large_file() {
    let app = TestApp::new(FakePredictor::with_points(60_000));
    let (_, body) = app.reconstruct(fixtures::image_request("case-019", 1)).await;
    let key = body["gaussian_asset_key"].as_str().unwrap();
    let on_disk = std::fs::read(app.storage_root().join(key)).unwrap();

    let request = Request::builder()
        .uri(format!("/download_ply?filename={}", key))
        .body(Body::empty())
        .unwrap();
    let response = app.router.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_LENGTH],
        on_disk.len().to_string().as_str()
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(bytes.len(), on_disk.len());
    assert_eq!(&bytes[..], &on_disk[..]);
    assert_eq!(PlyCloud::parse(&bytes).unwrap().len(), 60_000);
}

#[tokio::test]
async fn test_download_missing_file() {
    let app = TestApp::new(FakePredictor::with_points(1));
    let (status, body) = app.get("/download_ply?filename=gaussians_nope.ply").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body, json!({"error": "PLY not found"}));
}

#[tokio::test]
async fn test_download_rejects_paths() {
    let app = TestApp::new(FakePredictor::with_points(1));
    let (status, _) = app.get("/download_ply?filename=..%2Fsecrets.ply").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// ============================================================================
// Health and metrics
// ============================================================================

#[tokio::test]
async fn test_health() {
    let app = TestApp::new(FakePredictor::with_points(1));
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);

    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["service"], "recon-api");
    assert_eq!(body["model"], "fake-model");
}

#[tokio::test]
async fn test_metrics_without_recorder() {
    let app = TestApp::new(FakePredictor::with_points(1));
    let (status, _) = app.get("/metrics").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

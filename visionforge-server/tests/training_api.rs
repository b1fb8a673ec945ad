//! End-to-end tests of the training job API

mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;
use visionforge_core::domain::job::JobStatus;

use common::{TestTrainer, spawn_app};

#[tokio::test]
async fn test_health() {
    let app = spawn_app(TestTrainer::succeeding(&[]), 1, 4);

    let (code, body) = app.send(Method::GET, "/api/v1/health", None).await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_submit_returns_pending_then_completes() {
    let app = spawn_app(TestTrainer::succeeding(&[0.10, 0.05, 0.30]), 1, 4);

    let (code, job) = app
        .send(
            Method::POST,
            "/api/v1/train",
            Some(json!({"dataset_name": "cones", "epochs": 3, "model_size": "s"})),
        )
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(job["status"], "pending");
    assert_eq!(job["current_epoch"], 0);
    assert_eq!(job["model_size"], "s");
    assert_eq!(job["config"]["batch_size"], 16);

    let job_id = job["job_id"].as_str().unwrap();
    let job = app.wait_for_status(job_id, "completed").await;

    assert_eq!(job["current_epoch"], 3);
    assert_eq!(job["best_map"], 0.30);
    assert_eq!(job["final_metrics"]["map50_95"], 0.30);
    assert_eq!(job["model_path"], format!("/models/{job_id}.pt"));
    assert!(job["error"].is_null());

    assert_eq!(
        app.repository.history(job_id),
        vec![JobStatus::Pending, JobStatus::Running, JobStatus::Completed]
    );
}

#[tokio::test]
async fn test_submit_rejections() {
    let app = spawn_app(TestTrainer::succeeding(&[]), 1, 4);

    let (code, body) = app
        .send(
            Method::POST,
            "/api/v1/train",
            Some(json!({"dataset_name": "empty"})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Dataset has no training images");

    let (code, body) = app
        .send(
            Method::POST,
            "/api/v1/train",
            Some(json!({"dataset_name": "nope"})),
        )
        .await;
    assert_eq!(code, StatusCode::NOT_FOUND);
    assert!(body["error"].as_str().unwrap().contains("nope"));

    let (code, _) = app
        .send(
            Method::POST,
            "/api/v1/train",
            Some(json!({"dataset_name": "cones", "epochs": 0})),
        )
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);

    let (_, jobs) = app.send(Method::GET, "/api/v1/train", None).await;
    assert_eq!(jobs, json!([]));
}

#[tokio::test]
async fn test_malformed_config_is_bad_request() {
    let app = spawn_app(TestTrainer::succeeding(&[]), 1, 4);

    for body in [
        json!({"dataset_name": "cones", "epochs": -1}),
        json!({"dataset_name": "cones", "model_size": "q"}),
        json!({"epochs": 3}),
        json!({"dataset_name": "cones", "batch_size": "big"}),
    ] {
        let (code, response) = app
            .send(Method::POST, "/api/v1/train", Some(body.clone()))
            .await;
        assert_eq!(code, StatusCode::BAD_REQUEST, "{body}");
        assert!(response["error"].is_string(), "{body}: {response}");
    }

    let (_, jobs) = app.send(Method::GET, "/api/v1/train", None).await;
    assert_eq!(jobs, json!([]));
}

#[tokio::test]
async fn test_list_query_parsing() {
    let app = spawn_app(TestTrainer::succeeding(&[0.2]), 1, 4);
    let job_id = app.submit(json!({"dataset_name": "cones", "epochs": 1})).await;
    app.wait_for_status(&job_id, "completed").await;

    for query in ["status=&limit=", "status=Completed", "status=completed&limit=10"] {
        let (code, jobs) = app
            .send(Method::GET, &format!("/api/v1/train?{query}"), None)
            .await;
        assert_eq!(code, StatusCode::OK, "{query}");
        assert_eq!(jobs.as_array().unwrap().len(), 1, "{query}");
    }

    for query in ["status=done", "limit=-3", "limit=many"] {
        let (code, body) = app
            .send(Method::GET, &format!("/api/v1/train?{query}"), None)
            .await;
        assert_eq!(code, StatusCode::BAD_REQUEST, "{query}");
        assert!(body["error"].is_string(), "{query}");
    }
}

#[tokio::test]
async fn test_unknown_job() {
    let app = spawn_app(TestTrainer::succeeding(&[]), 1, 4);

    for (method, uri) in [
        (Method::GET, "/api/v1/train/train_missing"),
        (Method::DELETE, "/api/v1/train/train_missing"),
        (Method::POST, "/api/v1/train/train_missing/resume"),
        (Method::GET, "/api/v1/train/train_missing/metrics"),
    ] {
        let (code, body) = app.send(method, uri, None).await;
        assert_eq!(code, StatusCode::NOT_FOUND, "{uri}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn test_cancel_completed_job_is_rejected() {
    let app = spawn_app(TestTrainer::succeeding(&[0.2]), 1, 4);
    let job_id = app.submit(json!({"dataset_name": "cones", "epochs": 1})).await;
    app.wait_for_status(&job_id, "completed").await;

    let (code, body) = app
        .send(Method::DELETE, &format!("/api/v1/train/{job_id}"), None)
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("Cannot cancel"));

    let job = app.wait_for_status(&job_id, "completed").await;
    assert_eq!(job["status"], "completed");
}

#[tokio::test]
async fn test_cancel_pending_job() {
    // No run slots, so the job stays queued
    let app = spawn_app(TestTrainer::succeeding(&[0.2]), 0, 4);
    let job_id = app.submit(json!({"dataset_name": "cones"})).await;

    let (code, body) = app
        .send(Method::DELETE, &format!("/api/v1/train/{job_id}"), None)
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["job_id"], job_id.as_str());

    app.wait_for_status(&job_id, "cancelled").await;
    assert!(app.trainer.requests().is_empty());
}

#[tokio::test]
async fn test_list_failed_jobs_newest_first() {
    let app = spawn_app(TestTrainer::failing_first(&[0.1], usize::MAX), 1, 4);

    let first = app.submit(json!({"dataset_name": "cones"})).await;
    app.wait_for_status(&first, "failed").await;
    let second = app.submit(json!({"dataset_name": "cones"})).await;
    let failed = app.wait_for_status(&second, "failed").await;
    assert_eq!(failed["error"], "GPU lost");

    for query in ["status=failed", "status=FAILED"] {
        let (code, jobs) = app
            .send(Method::GET, &format!("/api/v1/train?{query}"), None)
            .await;
        assert_eq!(code, StatusCode::OK);

        let ids: Vec<&str> = jobs
            .as_array()
            .unwrap()
            .iter()
            .map(|j| j["job_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec![second.as_str(), first.as_str()]);
    }

    let (_, completed) = app
        .send(Method::GET, "/api/v1/train?status=completed", None)
        .await;
    assert_eq!(completed, json!([]));

    let (_, limited) = app.send(Method::GET, "/api/v1/train?limit=1", None).await;
    assert_eq!(limited.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_resume_failed_job_reruns_same_config() {
    let app = spawn_app(TestTrainer::failing_first(&[0.15, 0.25], 1), 1, 4);

    let config = json!({
        "dataset_name": "cones",
        "model_size": "m",
        "epochs": 2,
        "batch_size": 8,
        "imgsz": 512,
        "lr0": 0.002,
        "optimizer": "AdamW",
        "save_period": 1,
        "device": "cpu"
    });
    let job_id = app.submit(config).await;
    let failed = app.wait_for_status(&job_id, "failed").await;
    assert_eq!(failed["error"], "GPU lost");

    let (code, resumed) = app
        .send(Method::POST, &format!("/api/v1/train/{job_id}/resume"), None)
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(resumed["status"], "pending");
    assert!(resumed["error"].is_null());
    assert_eq!(resumed["config"], failed["config"]);

    let completed = app.wait_for_status(&job_id, "completed").await;
    assert_eq!(completed["best_map"], 0.25);
    assert_eq!(completed["attempt"], 2);

    let requests = app.trainer.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0], requests[1]);
    assert_eq!(requests[0].batch_size, 8);
    assert_eq!(requests[0].save_period, Some(1));

    assert_eq!(
        app.repository.history(&job_id),
        vec![
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Failed,
            JobStatus::Pending,
            JobStatus::Running,
            JobStatus::Completed
        ]
    );
}

#[tokio::test]
async fn test_resume_completed_job_is_rejected() {
    let app = spawn_app(TestTrainer::succeeding(&[0.2]), 1, 4);
    let job_id = app.submit(json!({"dataset_name": "cones"})).await;
    app.wait_for_status(&job_id, "completed").await;

    let (code, body) = app
        .send(Method::POST, &format!("/api/v1/train/{job_id}/resume"), None)
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Can only resume cancelled or failed jobs");
}

#[tokio::test]
async fn test_metrics_endpoint() {
    let app = spawn_app(TestTrainer::succeeding(&[0.3, 0.4]), 0, 4);
    let job_id = app.submit(json!({"dataset_name": "cones", "epochs": 2})).await;

    let (code, body) = app
        .send(Method::GET, &format!("/api/v1/train/{job_id}/metrics"), None)
        .await;
    assert_eq!(code, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Metrics only available for running or completed jobs"
    );

    let app = spawn_app(TestTrainer::succeeding(&[0.3, 0.4]), 1, 4);
    let job_id = app.submit(json!({"dataset_name": "cones", "epochs": 2})).await;
    app.wait_for_status(&job_id, "completed").await;

    let (code, metrics) = app
        .send(Method::GET, &format!("/api/v1/train/{job_id}/metrics"), None)
        .await;
    assert_eq!(code, StatusCode::OK);
    assert_eq!(metrics["total_epochs"], 2);
    assert_eq!(metrics["current_epoch"], 2);
    assert_eq!(metrics["best_map"], 0.4);
    assert_eq!(metrics["current_metrics"]["map50_95"], 0.4);
}

#[tokio::test]
async fn test_full_queue_is_rejected() {
    let app = spawn_app(TestTrainer::succeeding(&[]), 0, 1);
    app.submit(json!({"dataset_name": "cones"})).await;

    let (code, body) = app
        .send(
            Method::POST,
            "/api/v1/train",
            Some(json!({"dataset_name": "cones"})),
        )
        .await;
    assert_eq!(code, StatusCode::SERVICE_UNAVAILABLE);
    assert!(body["error"].as_str().unwrap().contains("queue is full"));

    let (_, jobs) = app.send(Method::GET, "/api/v1/train", None).await;
    assert_eq!(jobs.as_array().unwrap().len(), 1);
}

use bytes::Bytes;
use chrono::{TimeZone, Utc};
use futures::TryStreamExt;
use s3_artifacts::{
    create_s3_app, verify_presigned, BucketName, BucketStatus, EndpointConfig, ObjectKey,
    ObjectStoreClient, PutObjectRequest, RunRequest, StorageError,
};
use std::time::Duration;

// Note: These tests require MinIO to be running and configured via environment variables:
// - S3_ENDPOINT (default: http://localhost:9000)
// - AWS_ACCESS_KEY_ID (default: minioadmin)
// - AWS_SECRET_ACCESS_KEY (default: minioadmin123)

fn endpoint() -> EndpointConfig {
    let endpoint =
        std::env::var("S3_ENDPOINT").unwrap_or_else(|_| "http://localhost:9000".to_string());
    let access_key =
        std::env::var("AWS_ACCESS_KEY_ID").unwrap_or_else(|_| "minioadmin".to_string());
    let secret_key =
        std::env::var("AWS_SECRET_ACCESS_KEY").unwrap_or_else(|_| "minioadmin123".to_string());

    EndpointConfig::builder()
        .endpoint(endpoint)
        .access_key(access_key)
        .secret_key(secret_key)
        .build()
}

fn unique_bucket() -> BucketName {
    BucketName::new(format!("test-{}", uuid::Uuid::new_v4().simple())).unwrap()
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_ensure_bucket_idempotent() {
    let bucket = unique_bucket();
    let app = create_s3_app(endpoint(), bucket.clone()).unwrap();

    assert_eq!(
        app.client.ensure_bucket(&bucket).await.unwrap(),
        BucketStatus::Created
    );
    assert_eq!(
        app.client.ensure_bucket(&bucket).await.unwrap(),
        BucketStatus::Existing
    );

    let buckets = app.client.list_buckets().await.unwrap();
    assert_eq!(buckets.iter().filter(|b| **b == bucket).count(), 1);
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_concurrent_ensure_bucket() {
    let bucket = unique_bucket();
    let app = create_s3_app(endpoint(), bucket.clone()).unwrap();

    let (a, b) = tokio::join!(
        app.client.ensure_bucket(&bucket),
        app.client.ensure_bucket(&bucket)
    );
    assert!(a.is_ok());
    assert!(b.is_ok());
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_put_to_missing_bucket() {
    let bucket = unique_bucket();
    let app = create_s3_app(endpoint(), bucket.clone()).unwrap();

    let err = app
        .client
        .put_object(PutObjectRequest {
            bucket,
            key: ObjectKey::new("a.json").unwrap(),
            payload: Bytes::from_static(b"{}"),
            content_type: "application/json".to_string(),
        })
        .await
        .unwrap_err();

    assert!(err.is_not_found(), "unexpected error: {err}");
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_bad_credentials() {
    let config = EndpointConfig::builder()
        .endpoint(endpoint().endpoint)
        .access_key("not-a-user")
        .secret_key("not-a-secret")
        .build();
    let app = create_s3_app(config, unique_bucket()).unwrap();

    let err = app.client.list_buckets().await.unwrap_err();
    assert!(matches!(err, StorageError::Auth { .. }), "unexpected error: {err}");
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_end_to_end_scenario() {
    let bucket = unique_bucket();
    let app = create_s3_app(endpoint(), bucket.clone()).unwrap();
    let run = RunRequest::default();
    let body = run.to_json_bytes().unwrap();

    let report = app
        .publisher
        .publish_run_request(
            bucket.clone(),
            &run,
            Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            "runs/",
            Duration::from_secs(300),
        )
        .await
        .unwrap();

    assert_eq!(
        report.receipt.key.as_str(),
        "runs/20240101T000000Z/request.json"
    );
    assert_eq!(report.listing.len(), 1);
    assert_eq!(report.listing[0].key, report.receipt.key);
    assert_eq!(report.listing[0].size, body.len() as u64);

    let http = reqwest::Client::new();
    verify_presigned(&http, &report.presigned, &body).await.unwrap();

    let fetched = app
        .client
        .get_object(&bucket, &report.receipt.key)
        .await
        .unwrap();
    assert_eq!(fetched.as_ref(), body.as_slice());
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_presigned_url_expires() {
    let bucket = unique_bucket();
    let app = create_s3_app(endpoint(), bucket.clone()).unwrap();
    app.client.ensure_bucket(&bucket).await.unwrap();

    let key = ObjectKey::new("short-lived.txt").unwrap();
    app.client
        .put_object(PutObjectRequest {
            bucket: bucket.clone(),
            key: key.clone(),
            payload: Bytes::from_static(b"soon gone"),
            content_type: "text/plain".to_string(),
        })
        .await
        .unwrap();

    let presigned = app
        .client
        .presign_get(&bucket, &key, Duration::from_secs(1))
        .await
        .unwrap();

    tokio::time::sleep(Duration::from_secs(3)).await;

    let http = reqwest::Client::new();
    let err = verify_presigned(&http, &presigned, b"soon gone")
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::Auth { .. }), "unexpected error: {err}");
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_listing_sizes() {
    let bucket = unique_bucket();
    let app = create_s3_app(endpoint(), bucket.clone()).unwrap();
    app.client.ensure_bucket(&bucket).await.unwrap();

    for (key, body) in [("runs/a.json", "1"), ("runs/b.json", "22"), ("other.json", "333")] {
        app.client
            .put_object(PutObjectRequest {
                bucket: bucket.clone(),
                key: ObjectKey::new(key).unwrap(),
                payload: Bytes::from(body),
                content_type: "application/json".to_string(),
            })
            .await
            .unwrap();
    }

    let listed: Vec<_> = app
        .client
        .list_objects(&bucket, "runs/")
        .try_collect()
        .await
        .unwrap();
    let got: Vec<_> = listed.iter().map(|o| (o.key.as_str(), o.size)).collect();
    assert_eq!(got, vec![("runs/a.json", 1), ("runs/b.json", 2)]);
}

#[tokio::test]
#[ignore = "requires MinIO server to be running"]
async fn test_minio_special_character_keys_round_trip() {
    let bucket = unique_bucket();
    let app = create_s3_app(endpoint(), bucket.clone()).unwrap();
    app.client.ensure_bucket(&bucket).await.unwrap();

    let written = ["notes/a~b.json", "notes/report#1.txt", "notes/v[1].json"];
    for key in written {
        app.client
            .put_object(PutObjectRequest {
                bucket: bucket.clone(),
                key: ObjectKey::new(key).unwrap(),
                payload: Bytes::from(key),
                content_type: "application/json".to_string(),
            })
            .await
            .unwrap();
    }

    let listed: Vec<_> = app
        .client
        .list_objects(&bucket, "notes/")
        .try_collect()
        .await
        .unwrap();
    let keys: Vec<_> = listed.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, written);

    let key = ObjectKey::new("notes/a~b.json").unwrap();
    let presigned = app
        .client
        .presign_get(&bucket, &key, Duration::from_secs(60))
        .await
        .unwrap();
    let http = reqwest::Client::new();
    verify_presigned(&http, &presigned, b"notes/a~b.json")
        .await
        .unwrap();
}

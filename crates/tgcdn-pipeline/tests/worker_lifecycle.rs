//! Exercises the worker against a real MySQL-family instance and a fake
//! upstream client. Skipped, not failed, when `TGCDN_TEST_DATABASE_URL` is
//! unset.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tgcdn_core::FileUuid;
use tgcdn_pipeline::{Worker, WorkerHandle};
use tgcdn_store::{build_pool, Store};
use tgcdn_upstream::{MessagingClient, SentDocument, UpstreamError};

struct FakeMessagingClient {
    calls: AtomicUsize,
    fail_first_n: usize,
}

#[async_trait]
impl MessagingClient for FakeMessagingClient {
    async fn send_document(
        &self,
        _bot_token: &str,
        _chat_id: i64,
        _document_path: &Path,
        _caption: &str,
    ) -> Result<SentDocument, UpstreamError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first_n {
            return Err(UpstreamError::RateLimited {
                retry_after: Duration::from_millis(10),
            });
        }
        Ok(SentDocument {
            message_id: 7,
            file_id: "fake-file-id".to_string(),
        })
    }

    async fn get_file_path(&self, _bot_token: &str, _file_id: &str) -> Result<String, UpstreamError> {
        Ok("documents/fake.jpg".to_string())
    }
}

async fn test_store() -> Option<Store> {
    let url = std::env::var("TGCDN_TEST_DATABASE_URL").ok()?;
    let pool = build_pool(&url).await.expect("failed to build pool");
    Some(Store::new(pool))
}

#[tokio::test]
async fn worker_commits_after_rate_limit_retries() {
    let Some(store) = test_store().await else {
        eprintln!("skipping: TGCDN_TEST_DATABASE_URL not set");
        return;
    };

    let temp_dir = tempfile::tempdir().unwrap();
    let bot = store.bots.get_or_create("worker-test-token").await.unwrap();
    let file_uuid = FileUuid::new();
    tokio::fs::write(temp_dir.path().join(file_uuid.to_string()), b"fake-bytes")
        .await
        .unwrap();
    store.queues.insert_ready(file_uuid, Utc::now().naive_utc()).await.unwrap();

    let upstream = Arc::new(FakeMessagingClient {
        calls: AtomicUsize::new(0),
        fail_first_n: 2,
    });

    let worker = Worker::new(
        bot.bot_id,
        "worker-test-token".to_string(),
        1234,
        temp_dir.path().to_path_buf(),
        10,
        Duration::from_millis(50),
        store.clone(),
        upstream,
    );
    let handle: WorkerHandle = worker.spawn();

    tokio::time::sleep(Duration::from_millis(500)).await;
    handle.stop().await;

    let file_row = store.files.get_by_uuid(file_uuid).await.unwrap();
    assert_eq!(file_row.unwrap().file_id, "fake-file-id");
}

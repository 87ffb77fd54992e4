//! Polling helpers for asynchronous task state

use shortvid_dl::{Task, TaskId, VideoDownloader};
use std::path::Path;
use std::time::Duration;

/// Poll until `id` leaves `processing`, panicking after `timeout`
pub async fn wait_for_terminal(downloader: &VideoDownloader, id: TaskId, timeout: Duration) -> Task {
    tokio::time::timeout(timeout, async {
        loop {
            match downloader.task_status(id) {
                Ok(Task::Processing) => tokio::time::sleep(Duration::from_millis(10)).await,
                Ok(task) => return task,
                Err(e) => panic!("task {id} disappeared: {e}"),
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("task {id} still processing after {timeout:?}"))
}

/// Poll until `path` no longer exists, panicking after `timeout`
pub async fn wait_for_file_removed(path: &Path, timeout: Duration) {
    tokio::time::timeout(timeout, async {
        while path.exists() {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap_or_else(|_| panic!("{} still exists after {timeout:?}", path.display()));
}

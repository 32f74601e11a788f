//! Background writer persisting watchlist snapshots in mutation order.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tokio::sync::{mpsc, oneshot};

use crate::storage::{Storage, StorageError};

/// Outcome callback invoked on the writer thread after each write.
pub(crate) type WriteReport = Box<dyn FnMut(u64, Result<(), StorageError>) + Send>;

enum WriteCommand {
    Snapshot { revision: u64, payload: String },
    Flush(oneshot::Sender<()>),
}

/// Handle to the writer thread.
///
/// Commands are consumed in FIFO order by a single thread. Queued snapshots
/// are coalesced so only the newest one is written, which keeps the stored
/// value equal to the latest mutation.
#[derive(Debug)]
pub(crate) struct SnapshotWriter {
    tx: Option<mpsc::UnboundedSender<WriteCommand>>,
    handle: Option<JoinHandle<()>>,
}

impl SnapshotWriter {
    /// Spawns the writer thread for `key`.
    pub(crate) fn spawn(storage: Arc<dyn Storage>, key: String, mut report: WriteReport) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<WriteCommand>();

        let spawned = thread::Builder::new()
            .name(String::from("watchlist-writer"))
            .spawn(move || {
                while let Some(first) = rx.blocking_recv() {
                    let mut latest = None;
                    let mut waiters = Vec::new();
                    let mut next = Some(first);
                    while let Some(command) = next {
                        match command {
                            WriteCommand::Snapshot { revision, payload } => {
                                latest = Some((revision, payload));
                            }
                            WriteCommand::Flush(waiter) => waiters.push(waiter),
                        }
                        next = rx.try_recv().ok();
                    }

                    if let Some((revision, payload)) = latest {
                        let result = storage.set(&key, &payload);
                        report(revision, result);
                    }
                    for waiter in waiters {
                        let _ = waiter.send(());
                    }
                }
                tracing::debug!("watchlist writer stopped");
            });

        match spawned {
            Ok(handle) => Self {
                tx: Some(tx),
                handle: Some(handle),
            },
            Err(e) => {
                tracing::error!(error = %e, "failed to start watchlist writer; running in memory only");
                Self {
                    tx: None,
                    handle: None,
                }
            }
        }
    }

    /// Queues a snapshot. Returns `false` if the writer is gone.
    pub(crate) fn submit(&self, revision: u64, payload: String) -> bool {
        self.tx.as_ref().is_some_and(|tx| {
            tx.send(WriteCommand::Snapshot { revision, payload })
                .is_ok()
        })
    }

    /// Waits until every snapshot queued before this call has been written.
    pub(crate) async fn flush(&self) {
        let Some(tx) = self.tx.as_ref() else {
            return;
        };
        let (waiter, done) = oneshot::channel();
        if tx.send(WriteCommand::Flush(waiter)).is_ok() {
            let _ = done.await;
        }
    }
}

impl Drop for SnapshotWriter {
    fn drop(&mut self) {
        // Closing the channel lets the thread drain what is queued and exit.
        drop(self.tx.take());
        if let Some(handle) = self.handle.take()
            && handle.join().is_err()
        {
            tracing::error!("watchlist writer panicked");
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::indexing_slicing)]

    use std::sync::Mutex;

    use super::*;
    use crate::storage::MemoryStorage;

    fn recording_writer(
        storage: &Arc<MemoryStorage>,
    ) -> (SnapshotWriter, Arc<Mutex<Vec<(u64, bool)>>>) {
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&reports);
        let writer = SnapshotWriter::spawn(
            Arc::clone(storage) as Arc<dyn Storage>,
            String::from("key"),
            Box::new(move |revision, result| {
                sink.lock().unwrap().push((revision, result.is_ok()));
            }),
        );
        (writer, reports)
    }

    #[tokio::test]
    async fn test_flush_waits_for_latest_snapshot() {
        // Arrange
        let storage = Arc::new(MemoryStorage::new());
        let (writer, reports) = recording_writer(&storage);

        // Act
        for revision in 1..=20_u64 {
            assert!(writer.submit(revision, format!("[{revision}]")));
        }
        writer.flush().await;

        // Assert
        assert_eq!(storage.raw("key").as_deref(), Some("[20]"));
        let reports = reports.lock().unwrap();
        assert_eq!(reports.last(), Some(&(20, true)));
        assert!(reports.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[tokio::test]
    async fn test_failed_write_is_reported() {
        // Arrange
        let storage = Arc::new(MemoryStorage::new());
        storage.set_fail_writes(true);
        let (writer, reports) = recording_writer(&storage);

        // Act
        writer.submit(1, String::from("[]"));
        writer.flush().await;

        // Assert
        assert_eq!(*reports.lock().unwrap(), vec![(1, false)]);
        assert_eq!(storage.raw("key"), None);
    }

    #[test]
    fn test_drop_drains_pending_snapshots() {
        // Arrange
        let storage = Arc::new(MemoryStorage::new());
        let (writer, _reports) = recording_writer(&storage);

        // Act
        writer.submit(1, String::from("[1]"));
        writer.submit(2, String::from("[1,2]"));
        drop(writer);

        // Assert
        assert_eq!(storage.raw("key").as_deref(), Some("[1,2]"));
    }
}

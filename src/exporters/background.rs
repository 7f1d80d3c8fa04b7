//! Exporter that writes on a worker thread

use crate::core::{Exporter, Result, TargetError};
use crossbeam_channel::{bounded, Sender};
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Default time `Drop` waits for the worker to drain
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Batches queued before `export` blocks the caller
pub const DEFAULT_QUEUE_CAPACITY: usize = 64;

/// Moves the blocking write of another exporter off the calling thread
///
/// `export` only queues a copy of the batch; a failure of the inner
/// exporter is logged and counted on the worker, never reported to the
/// target. When the queue is full `export` blocks until the worker catches
/// up.
///
/// # Example
///
/// ```
/// use json_log_target::exporters::{BackgroundExporter, MemoryExporter};
/// use json_log_target::Exporter;
/// use serde_json::json;
/// use std::time::Duration;
///
/// let memory = MemoryExporter::new();
/// let handle = memory.handle();
///
/// let mut exporter = BackgroundExporter::new(memory);
/// exporter.export(&[json!({"message": "queued"})]).unwrap();
/// assert!(exporter.shutdown(Duration::from_secs(1)));
///
/// assert_eq!(handle.records(), vec![json!({"message": "queued"})]);
/// ```
pub struct BackgroundExporter {
    name: String,
    sender: Option<Sender<Vec<Value>>>,
    worker: Option<thread::JoinHandle<()>>,
    stats: Arc<WorkerStats>,
}

#[derive(Debug, Default)]
struct WorkerStats {
    exported: AtomicU64,
    failures: AtomicU64,
}

impl BackgroundExporter {
    pub fn new<E: Exporter + 'static>(inner: E) -> Self {
        Self::with_capacity(inner, DEFAULT_QUEUE_CAPACITY)
    }

    pub fn with_capacity<E: Exporter + 'static>(mut inner: E, capacity: usize) -> Self {
        let (sender, receiver) = bounded::<Vec<Value>>(capacity.max(1));
        let name = format!("background({})", inner.name());
        let stats = Arc::new(WorkerStats::default());
        let worker_stats = Arc::clone(&stats);

        let worker = thread::spawn(move || {
            for batch in receiver {
                let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                    inner.export(&batch)
                }));

                match outcome {
                    Ok(Ok(())) => {
                        worker_stats
                            .exported
                            .fetch_add(batch.len() as u64, Ordering::Relaxed);
                    }
                    Ok(Err(e)) => {
                        log::error!(
                            "'{}' dropped {} records: {}",
                            inner.name(),
                            batch.len(),
                            e
                        );
                        worker_stats.failures.fetch_add(1, Ordering::Relaxed);
                    }
                    Err(panic) => {
                        let message = panic
                            .downcast_ref::<&str>()
                            .map(|s| s.to_string())
                            .or_else(|| panic.downcast_ref::<String>().cloned())
                            .unwrap_or_else(|| "unknown panic".to_string());
                        log::error!(
                            "exporter panicked on a batch of {}: {}",
                            batch.len(),
                            message
                        );
                        worker_stats.failures.fetch_add(1, Ordering::Relaxed);
                    }
                }
            }
        });

        Self {
            name,
            sender: Some(sender),
            worker: Some(worker),
            stats,
        }
    }

    /// Records the inner exporter accepted
    pub fn exported(&self) -> u64 {
        self.stats.exported.load(Ordering::Relaxed)
    }

    /// Batches the inner exporter rejected or panicked on
    pub fn failures(&self) -> u64 {
        self.stats.failures.load(Ordering::Relaxed)
    }

    /// Batches queued and not yet taken by the worker
    pub fn queued(&self) -> usize {
        self.sender.as_ref().map_or(0, Sender::len)
    }

    /// Stop accepting batches and wait for the worker to drain the queue
    ///
    /// Returns `false` if the worker panicked or did not finish in time.
    pub fn shutdown(&mut self, timeout: Duration) -> bool {
        drop(self.sender.take());

        let Some(worker) = self.worker.take() else {
            return true;
        };

        let start = Instant::now();
        while !worker.is_finished() {
            if start.elapsed() >= timeout {
                log::warn!(
                    "'{}' did not drain within {:?}; queued records may be lost",
                    self.name,
                    timeout
                );
                return false;
            }
            thread::sleep(Duration::from_millis(10));
        }

        if worker.join().is_err() {
            log::error!("'{}' worker thread panicked during shutdown", self.name);
            return false;
        }
        true
    }
}

impl Exporter for BackgroundExporter {
    fn export(&mut self, records: &[Value]) -> Result<()> {
        if records.is_empty() {
            return Ok(());
        }

        let sender = self.sender.as_ref().ok_or_else(|| {
            TargetError::service_unavailable(self.name.clone(), "exporter has been shut down")
        })?;
        sender
            .send(records.to_vec())
            .map_err(|_| TargetError::ChannelSendError)
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for BackgroundExporter {
    fn drop(&mut self) {
        self.shutdown(DEFAULT_SHUTDOWN_TIMEOUT);
    }
}

impl std::fmt::Debug for BackgroundExporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackgroundExporter")
            .field("name", &self.name)
            .field("queued", &self.queued())
            .field("exported", &self.exported())
            .field("failures", &self.failures())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exporters::MemoryExporter;
    use serde_json::json;

    struct Rejecting;

    impl Exporter for Rejecting {
        fn export(&mut self, _records: &[Value]) -> Result<()> {
            Err(TargetError::exporter("rejecting", "always fails"))
        }

        fn name(&self) -> &str {
            "rejecting"
        }
    }

    struct Panicking;

    impl Exporter for Panicking {
        fn export(&mut self, _records: &[Value]) -> Result<()> {
            panic!("sink exploded")
        }

        fn name(&self) -> &str {
            "panicking"
        }
    }

    #[test]
    fn test_batches_arrive_in_order() {
        let memory = MemoryExporter::new();
        let handle = memory.handle();
        let mut exporter = BackgroundExporter::with_capacity(memory, 2);

        for n in 0..10 {
            exporter.export(&[json!({"n": n})]).unwrap();
        }
        assert!(exporter.shutdown(Duration::from_secs(5)));

        let seen: Vec<i64> = handle
            .records()
            .iter()
            .map(|r| r["n"].as_i64().unwrap())
            .collect();
        assert_eq!(seen, (0..10).collect::<Vec<_>>());
        assert_eq!(exporter.exported(), 10);
    }

    #[test]
    fn test_inner_failures_are_counted() {
        let mut exporter = BackgroundExporter::new(Rejecting);
        exporter.export(&[json!({})]).unwrap();
        exporter.export(&[json!({})]).unwrap();
        assert!(exporter.shutdown(Duration::from_secs(5)));
        assert_eq!(exporter.failures(), 2);
        assert_eq!(exporter.exported(), 0);
    }

    #[test]
    fn test_worker_survives_panics() {
        let mut exporter = BackgroundExporter::new(Panicking);
        exporter.export(&[json!({})]).unwrap();
        exporter.export(&[json!({})]).unwrap();
        assert!(exporter.shutdown(Duration::from_secs(5)));
        assert_eq!(exporter.failures(), 2);
    }

    #[test]
    fn test_export_after_shutdown_fails() {
        let mut exporter = BackgroundExporter::new(MemoryExporter::new());
        assert!(exporter.shutdown(Duration::from_secs(5)));
        assert!(matches!(
            exporter.export(&[json!({})]),
            Err(TargetError::ServiceUnavailable { .. })
        ));
        assert_eq!(exporter.name(), "background(memory)");
    }
}

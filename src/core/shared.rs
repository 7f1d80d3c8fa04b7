//! Thread-safe handle around a target

use super::{
    error::Result,
    metrics::TargetMetrics,
    raw_record::RawRecord,
    target::JsonTarget,
};
use parking_lot::Mutex;
use std::cell::RefCell;
use std::sync::Arc;

thread_local! {
    /// Targets whose lock is held by the current thread
    static HELD: RefCell<Vec<usize>> = const { RefCell::new(Vec::new()) };
}

/// Marks a target as held by this thread until dropped
struct HeldMarker(usize);

impl HeldMarker {
    fn enter(id: usize) -> Self {
        HELD.with(|held| held.borrow_mut().push(id));
        Self(id)
    }

    fn is_held(id: usize) -> bool {
        HELD.with(|held| held.borrow().contains(&id))
    }
}

impl Drop for HeldMarker {
    fn drop(&mut self) {
        HELD.with(|held| {
            let mut held = held.borrow_mut();
            if let Some(pos) = held.iter().rposition(|id| *id == self.0) {
                held.remove(pos);
            }
        });
    }
}

struct Inner {
    target: Mutex<JsonTarget>,
    /// Records collected by the thread holding `target`, e.g. from a
    /// `log` bridge fed by the exporter's own diagnostics
    deferred: Mutex<Vec<RawRecord>>,
}

impl Drop for Inner {
    fn drop(&mut self) {
        let deferred = std::mem::take(self.deferred.get_mut());
        if deferred.is_empty() {
            return;
        }
        if let Err(e) = self.target.get_mut().collect(deferred, false) {
            log::error!("dropping deferred records: {}", e);
        }
    }
}

/// Cloneable handle that serializes access to one [`JsonTarget`]
///
/// Every clone feeds the same batch. A collect that triggers a flush holds
/// the lock for the duration of the export, so concurrent producers never
/// observe a half-exported batch.
///
/// A collect issued by the thread that already holds the lock, which is
/// what happens when the `log` facade is routed back into the target and
/// the export logs, does not block. Its records are queued and join the
/// batch ahead of the next collect.
#[derive(Clone)]
pub struct SharedTarget {
    inner: Arc<Inner>,
    metrics: Arc<TargetMetrics>,
}

impl SharedTarget {
    pub fn new(target: JsonTarget) -> Self {
        let metrics = target.metrics_handle();
        Self {
            inner: Arc::new(Inner {
                target: Mutex::new(target),
                deferred: Mutex::new(Vec::new()),
            }),
            metrics,
        }
    }

    fn id(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }

    pub fn collect(&self, records: Vec<RawRecord>, is_final: bool) -> Result<()> {
        if HeldMarker::is_held(self.id()) {
            self.inner.deferred.lock().extend(records);
            return Ok(());
        }

        let _held = HeldMarker::enter(self.id());
        let mut target = self.inner.target.lock();
        let mut pending = std::mem::take(&mut *self.inner.deferred.lock());
        pending.extend(records);
        target.collect(pending, is_final)
    }

    pub fn flush(&self) -> Result<()> {
        self.collect(Vec::new(), true)
    }

    pub fn pending(&self) -> usize {
        let queued = self.deferred();
        if HeldMarker::is_held(self.id()) {
            return queued;
        }
        queued + self.inner.target.lock().pending()
    }

    /// Records queued by re-entrant collects, not yet in the batch
    pub fn deferred(&self) -> usize {
        self.inner.deferred.lock().len()
    }

    /// Read without taking the target lock
    pub fn metrics(&self) -> &TargetMetrics {
        &self.metrics
    }

    /// Run `f` with exclusive access to the target
    pub fn with_target<R>(&self, f: impl FnOnce(&mut JsonTarget) -> R) -> R {
        let _held = HeldMarker::enter(self.id());
        f(&mut self.inner.target.lock())
    }
}
impl From<JsonTarget> for SharedTarget {
    fn from(target: JsonTarget) -> Self {
        Self::new(target)
    }
}

impl std::fmt::Debug for SharedTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedTarget")
            .field("collected", &self.metrics.collected())
            .field("exported", &self.metrics.exported())
            .finish()
    }
}

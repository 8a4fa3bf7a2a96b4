//! Redraw coalescing and background task tracking.
//!
//! Renderers never draw directly. Every state change calls
//! [`FrameScheduler::request_redraw`], and the shell asks once per display refresh
//! whether a redraw is due. Any number of requests between two refreshes produce one
//! frame.
//!
//! Background work (text loads, pagination) is fire-and-forget: it is spawned on the
//! current [`LocalSet`](tokio::task::LocalSet), writes its result into a shared cache,
//! and requests a redraw. The scheduler keeps the join handles only so that
//! [`settle`](FrameScheduler::settle) can wait for quiescence.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use tokio::task::JoinHandle;
use tracing::warn;

#[derive(Debug, Default)]
struct SchedulerInner {
    redraw: Cell<bool>,
    tasks: RefCell<Vec<JoinHandle<()>>>,
}

/// Coalesces redraw requests and tracks spawned tasks.
///
/// Cheap to clone: clones share one flag and one task list.
#[derive(Debug, Clone, Default)]
pub struct FrameScheduler {
    inner: Rc<SchedulerInner>,
}

impl FrameScheduler {
    /// Create a scheduler with no redraw pending.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask for a redraw on the next frame.
    pub fn request_redraw(&self) {
        self.inner.redraw.set(true);
    }

    /// True if a redraw has been requested since the last [`take_redraw`](Self::take_redraw).
    pub fn is_redraw_pending(&self) -> bool {
        self.inner.redraw.get()
    }

    /// Consume the pending redraw request.
    pub fn take_redraw(&self) -> bool {
        self.inner.redraw.replace(false)
    }

    /// Spawn `task` on the current `LocalSet`.
    ///
    /// # Panics
    ///
    /// Panics if called outside a `LocalSet` context, like
    /// [`tokio::task::spawn_local`].
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        let mut tasks = self.inner.tasks.borrow_mut();
        tasks.retain(|handle| !handle.is_finished());
        tasks.push(tokio::task::spawn_local(task));
    }

    /// Number of tasks spawned and not yet observed finished.
    pub fn pending_tasks(&self) -> usize {
        let mut tasks = self.inner.tasks.borrow_mut();
        tasks.retain(|handle| !handle.is_finished());
        tasks.len()
    }

    /// Wait until every spawned task, including tasks spawned meanwhile, has finished.
    pub async fn settle(&self) {
        loop {
            let batch = std::mem::take(&mut *self.inner.tasks.borrow_mut());
            if batch.is_empty() {
                break;
            }
            for handle in batch {
                if let Err(err) = handle.await {
                    warn!(error = %err, "Background task did not complete");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::task::LocalSet;

    #[test]
    fn redraw_requests_coalesce() {
        let scheduler = FrameScheduler::new();
        assert!(!scheduler.take_redraw());
        for _ in 0..10 {
            scheduler.request_redraw();
        }
        assert!(scheduler.is_redraw_pending());
        assert!(scheduler.take_redraw());
        assert!(!scheduler.take_redraw());
    }

    #[test]
    fn clones_share_state() {
        let scheduler = FrameScheduler::new();
        scheduler.clone().request_redraw();
        assert!(scheduler.take_redraw());
    }

    #[tokio::test]
    async fn settle_waits_for_nested_tasks() {
        let local = LocalSet::new();
        let scheduler = FrameScheduler::new();
        let hits = Rc::new(Cell::new(0));

        local
            .run_until(async {
                let inner_scheduler = scheduler.clone();
                let inner_hits = hits.clone();
                scheduler.spawn(async move {
                    tokio::task::yield_now().await;
                    inner_hits.set(inner_hits.get() + 1);
                    let nested_hits = inner_hits.clone();
                    let redraw = inner_scheduler.clone();
                    inner_scheduler.spawn(async move {
                        nested_hits.set(nested_hits.get() + 1);
                        redraw.request_redraw();
                    });
                });
                scheduler.settle().await;
            })
            .await;

        assert_eq!(hits.get(), 2);
        assert!(scheduler.take_redraw());
        assert_eq!(scheduler.pending_tasks(), 0);
    }
}

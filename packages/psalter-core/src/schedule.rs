//! Single-slot cancellable scheduled task, used to debounce resize events.
//!
//! Each [`Debouncer::schedule`] call replaces the pending task: a burst of
//! events inside the quiet window runs the task once, `delay` after the last
//! event. Only a task still waiting out its delay is cancelled; one that has
//! started running is left to finish.
//!
//! Tasks are spawned with [`tokio::task::spawn_local`], so scheduling must
//! happen inside a [`tokio::task::LocalSet`].

use std::cell::Cell;
use std::future::Future;
use std::rc::Rc;
use std::time::Duration;

use tokio::task::JoinHandle;

/// Quiet window for viewport resize events.
pub const RESIZE_DEBOUNCE: Duration = Duration::from_millis(250);

struct Pending {
    handle: JoinHandle<()>,
    started: Rc<Cell<bool>>,
}

pub struct Debouncer {
    delay: Duration,
    pending: Option<Pending>,
}

impl Debouncer {
    pub fn new(delay: Duration) -> Self {
        Debouncer {
            delay,
            pending: None,
        }
    }

    /// Run `task` after the delay, cancelling any task still waiting.
    pub fn schedule<F>(&mut self, task: F)
    where
        F: Future<Output = ()> + 'static,
    {
        self.cancel();

        let delay = self.delay;
        let started = Rc::new(Cell::new(false));
        let flag = Rc::clone(&started);
        let handle = tokio::task::spawn_local(async move {
            tokio::time::sleep(delay).await;
            flag.set(true);
            task.await;
        });

        self.pending = Some(Pending { handle, started });
    }

    /// Cancel the waiting task, if any. Returns `true` if one was cancelled.
    pub fn cancel(&mut self) -> bool {
        match self.pending.take() {
            Some(pending) if !pending.started.get() => {
                pending.handle.abort();
                true
            }
            _ => false,
        }
    }

    /// `true` while a scheduled task is still waiting out its delay.
    pub fn is_pending(&self) -> bool {
        self.pending
            .as_ref()
            .is_some_and(|p| !p.started.get() && !p.handle.is_finished())
    }
}

impl Drop for Debouncer {
    fn drop(&mut self) {
        self.cancel();
    }
}

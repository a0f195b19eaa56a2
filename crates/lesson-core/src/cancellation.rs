use std::sync::{
    Arc, Mutex, Weak,
    atomic::{AtomicBool, Ordering},
};
use tokio::sync::Notify;

/// Cooperative cancellation shared between a command handler and one
/// in-flight playback run (or a nested scope such as a decision window).
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    inner: Arc<Inner>,
}

#[derive(Debug, Default)]
struct Inner {
    cancelled: AtomicBool,
    notify: Notify,
    children: Mutex<Vec<Weak<Inner>>>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Token that is cancelled together with `self`, but can also be
    /// cancelled on its own without touching the parent.
    pub fn child_token(&self) -> Self {
        let child = Self::new();
        if let Ok(mut children) = self.inner.children.lock() {
            children.retain(|weak| weak.strong_count() > 0);
            children.push(Arc::downgrade(&child.inner));
        }
        // Parent may have been cancelled before the child was registered.
        if self.is_cancelled() {
            child.cancel();
        }
        child
    }

    pub fn cancel(&self) {
        cancel_inner(&self.inner);
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::Acquire)
    }

    /// Resolves once the token is cancelled; immediately if it already is.
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }
}

fn cancel_inner(inner: &Arc<Inner>) {
    if inner.cancelled.swap(true, Ordering::AcqRel) {
        return;
    }
    inner.notify.notify_waiters();
    let children = match inner.children.lock() {
        Ok(mut guard) => std::mem::take(&mut *guard),
        Err(_) => return,
    };
    for child in children.iter().filter_map(Weak::upgrade) {
        cancel_inner(&child);
    }
}

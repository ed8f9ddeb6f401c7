//! Render trigger coordination.
//!
//! The host component exposes one imperative primitive: request a render and
//! get called back once it commits. The state wraps each request with a
//! [`RenderScope`] marker that stays visible until the commit callback runs,
//! and hands the caller a [`RenderTicket`] that resolves at the same moment.

use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Invoked exactly once after the requested render has committed.
pub type RenderCallback = Box<dyn FnOnce() + Send>;

/// The host component's re-render primitive.
pub trait RenderTrigger: Send + Sync {
    /// Schedule a render of the whole component and call `on_committed`
    /// exactly once after it commits.
    fn request_render(&self, on_committed: RenderCallback);
}

impl<F> RenderTrigger for F
where
    F: Fn(RenderCallback) + Send + Sync,
{
    fn request_render(&self, on_committed: RenderCallback) {
        self(on_committed)
    }
}

impl std::fmt::Debug for dyn RenderTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("RenderTrigger")
    }
}

/// What a render request was caused by.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderScope {
    /// The component as a whole, e.g. after a rollback.
    Component,
    /// One bound store changed as a whole.
    Store(String),
    /// One field changed; holds the `store_key.path` string.
    Field(String),
}

/// Resolves once the render it was issued for has committed.
///
/// Resolves to `false` if the host dropped the commit callback without
/// calling it. Dropping the ticket does not cancel the render.
#[derive(Debug)]
pub struct RenderTicket {
    rx: oneshot::Receiver<()>,
}

impl RenderTicket {
    pub(crate) fn new() -> (oneshot::Sender<()>, Self) {
        let (tx, rx) = oneshot::channel();
        (tx, Self { rx })
    }
}

impl Future for RenderTicket {
    type Output = bool;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx).poll(cx).map(|result| result.is_ok())
    }
}

/// Commits every render synchronously, inside `request_render`.
#[derive(Debug, Default)]
pub struct ImmediateRenderTrigger {
    renders: AtomicUsize,
}

impl ImmediateRenderTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of renders performed so far.
    pub fn renders(&self) -> usize {
        self.renders.load(Ordering::SeqCst)
    }
}

impl RenderTrigger for ImmediateRenderTrigger {
    fn request_render(&self, on_committed: RenderCallback) {
        self.renders.fetch_add(1, Ordering::SeqCst);
        on_committed();
    }
}

/// Queues render requests until the host commits them.
///
/// Useful for headless hosts that drive their own frame loop, and for
/// observing the transient markers while a render is pending.
#[derive(Default)]
pub struct ManualRenderTrigger {
    pending: Mutex<VecDeque<RenderCallback>>,
    requested: AtomicUsize,
}

impl ManualRenderTrigger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders requested but not committed yet.
    pub fn pending(&self) -> usize {
        self.pending.lock().len()
    }

    /// Total renders ever requested.
    pub fn requested(&self) -> usize {
        self.requested.load(Ordering::SeqCst)
    }

    /// Commit the oldest pending render. Returns false if none was pending.
    pub fn commit_next(&self) -> bool {
        let next = self.pending.lock().pop_front();
        match next {
            Some(on_committed) => {
                on_committed();
                true
            }
            None => false,
        }
    }

    /// Commit every pending render in request order. Returns how many ran.
    pub fn commit_all(&self) -> usize {
        let mut committed = 0;
        while self.commit_next() {
            committed += 1;
        }
        committed
    }
}

impl RenderTrigger for ManualRenderTrigger {
    fn request_render(&self, on_committed: RenderCallback) {
        self.requested.fetch_add(1, Ordering::SeqCst);
        self.pending.lock().push_back(on_committed);
    }
}

impl std::fmt::Debug for ManualRenderTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualRenderTrigger")
            .field("pending", &self.pending())
            .field("requested", &self.requested())
            .finish()
    }
}

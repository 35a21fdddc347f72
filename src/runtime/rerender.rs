//! Rerender - force a subscriber's output to be recomputed.
//!
//! A [`Rerender`] couples a render closure with a version signal:
//! - `trigger()` bumps the version and runs the render closure
//! - the version is a spark-signals [`Signal`], so effects and deriveds can
//!   depend on it like on any other reactive value
//!
//! # Re-entrancy
//!
//! Rendering usually mutates the store, and store mutations notify archetype
//! listeners, which trigger re-renders. A trigger arriving while its own
//! render is running is coalesced into one more pass once the current pass
//! finishes, instead of recursing.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use spark_signals::{signal, Signal};
use tracing::{trace, warn};

use crate::error::Result;
use crate::runtime::RenderFn;

/// Upper bound on coalesced passes per trigger.
pub const MAX_RERENDER_PASSES: usize = 64;

struct RerenderInner {
    render: RefCell<Option<RenderFn>>,
    version: Signal<u64>,
    running: Cell<bool>,
    pending: Cell<bool>,
    disposed: Cell<bool>,
}

/// Handle to a re-render trigger. Clones share the same trigger.
#[derive(Clone)]
pub struct Rerender {
    inner: Rc<RerenderInner>,
}

impl Default for Rerender {
    fn default() -> Self {
        Self::new()
    }
}

impl Rerender {
    /// A trigger with no render closure. Triggering only bumps the version.
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RerenderInner {
                render: RefCell::new(None),
                version: signal(0),
                running: Cell::new(false),
                pending: Cell::new(false),
                disposed: Cell::new(false),
            }),
        }
    }

    /// A trigger that runs `render` on every pass.
    pub fn with_render(render: impl FnMut() -> Result<()> + 'static) -> Self {
        let rerender = Self::new();
        rerender.set_render(render);
        rerender
    }

    /// Replace the render closure.
    pub fn set_render(&self, render: impl FnMut() -> Result<()> + 'static) {
        *self.inner.render.borrow_mut() = Some(Box::new(render));
        self.inner.disposed.set(false);
    }

    /// Request a re-render.
    ///
    /// Runs the render closure now, or schedules one more pass if a render is
    /// already in progress. Returns the first render error of this call.
    pub fn trigger(&self) -> Result<()> {
        let inner = &self.inner;
        inner.version.set(inner.version.get() + 1);

        if inner.running.get() {
            inner.pending.set(true);
            return Ok(());
        }

        let Some(mut render) = inner.render.borrow_mut().take() else {
            return Ok(());
        };

        inner.running.set(true);
        let mut result = Ok(());
        let mut passes = 0;
        loop {
            inner.pending.set(false);
            passes += 1;
            trace!(pass = passes, "rerender");

            if let Err(err) = render() {
                result = Err(err);
                break;
            }
            if !inner.pending.get() {
                break;
            }
            if passes >= MAX_RERENDER_PASSES {
                warn!(passes, "rerender did not settle, dropping further passes");
                break;
            }
        }
        inner.pending.set(false);
        inner.running.set(false);

        // Put the closure back unless it was replaced or disposed meanwhile.
        let mut slot = inner.render.borrow_mut();
        if slot.is_none() && !inner.disposed.get() {
            *slot = Some(render);
        }

        result
    }

    /// Number of triggers so far. Reading inside an effect tracks it.
    pub fn version(&self) -> u64 {
        self.inner.version.get()
    }

    /// The underlying version signal.
    pub fn version_signal(&self) -> Signal<u64> {
        self.inner.version.clone()
    }

    /// Whether a render pass is in progress.
    pub fn is_rendering(&self) -> bool {
        self.inner.running.get()
    }

    /// Drop the render closure. Later triggers only bump the version.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        let render = self.inner.render.borrow_mut().take();
        drop(render);
    }

    /// Identity comparison.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Rerender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Rerender")
            .field("version", &self.version())
            .field("rendering", &self.is_rendering())
            .finish()
    }
}

//! Node - a mounted subtree.
//!
//! Every binder returns a [`Node`]. A node owns two closures:
//! - a render closure, run on each re-render to re-read props and re-render
//!   descendants
//! - a cleanup closure, run exactly once on unmount
//!
//! Dropping a node unmounts it, so a `Vec<Node>` going out of scope tears its
//! whole subtree down.

use std::fmt;

use crate::error::Result;

/// Cleanup function returned by setup code.
pub type Cleanup = Box<dyn FnOnce()>;

/// Render closure of a mounted node.
pub type RenderFn = Box<dyn FnMut() -> Result<()>>;

/// A mounted subtree.
#[derive(Default)]
pub struct Node {
    render: Option<RenderFn>,
    cleanup: Option<Cleanup>,
}

impl Node {
    /// Node with both a render and a cleanup closure.
    pub fn new(
        render: impl FnMut() -> Result<()> + 'static,
        cleanup: impl FnOnce() + 'static,
    ) -> Self {
        Self {
            render: Some(Box::new(render)),
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// Node that only needs teardown.
    pub fn from_cleanup(cleanup: impl FnOnce() + 'static) -> Self {
        Self {
            render: None,
            cleanup: Some(Box::new(cleanup)),
        }
    }

    /// Node with nothing to do.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compose siblings. Re-renders in order, unmounts in reverse order.
    pub fn group(children: Vec<Node>) -> Self {
        let children = std::rc::Rc::new(std::cell::RefCell::new(children));
        let children_render = children.clone();

        Self::new(
            move || {
                for child in children_render.borrow_mut().iter_mut() {
                    child.rerender()?;
                }
                Ok(())
            },
            move || {
                let mut children = children.borrow_mut();
                while let Some(child) = children.pop() {
                    child.unmount();
                }
            },
        )
    }

    /// Re-render this subtree.
    pub fn rerender(&mut self) -> Result<()> {
        match self.render.as_mut() {
            Some(render) => render(),
            None => Ok(()),
        }
    }

    /// Whether the node is still mounted.
    pub fn is_mounted(&self) -> bool {
        self.cleanup.is_some() || self.render.is_some()
    }

    /// Tear the subtree down.
    pub fn unmount(mut self) {
        self.teardown();
    }

    fn teardown(&mut self) {
        self.render = None;
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl Drop for Node {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl From<Cleanup> for Node {
    fn from(cleanup: Cleanup) -> Self {
        Self {
            render: None,
            cleanup: Some(cleanup),
        }
    }
}

impl From<Vec<Node>> for Node {
    fn from(children: Vec<Node>) -> Self {
        Node::group(children)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("mounted", &self.is_mounted())
            .finish()
    }
}

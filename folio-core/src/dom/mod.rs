pub mod mem;

use crate::error::Error;

pub use mem::{MemDocument, MemElement};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Opacity {
    Hidden,
    Visible,
}

impl Opacity {
    pub fn as_css(self) -> &'static str {
        match self {
            Opacity::Hidden => "0",
            Opacity::Visible => "1",
        }
    }
}

/// Returned by wheel listeners to decide whether the event keeps bubbling to
/// the ancestors of the current target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    Stop,
}

pub type ReadyHandler = Box<dyn FnOnce()>;
pub type HashChangeHandler = Box<dyn FnMut()>;
pub type WheelHandler = Box<dyn FnMut() -> Propagation>;

pub trait Element: Clone + 'static {
    fn add_class(&self, class: &str) -> Result<(), Error>;

    fn remove_class(&self, class: &str) -> Result<(), Error>;

    fn set_opacity(&self, opacity: Opacity) -> Result<(), Error>;
}

/// The page the controllers run against.
///
/// Handles are cheap clones sharing the same underlying document, so
/// callbacks can keep their own copy for the lifetime of the page.
pub trait Document: Clone + 'static {
    type Element: Element;

    /// Current fragment with its leading `#`, or an empty string when the URL
    /// has no (or an empty) fragment.
    fn hash(&self) -> String;

    /// Rewrites the fragment. If the value changes, hash-change handlers run
    /// later, never from inside this call.
    fn set_hash(&self, hash: &str) -> Result<(), Error>;

    fn body(&self) -> Option<Self::Element>;

    /// All elements whose class list contains `class`, in document order.
    fn query_class(&self, class: &str) -> Vec<Self::Element>;

    fn query_first(&self, class: &str) -> Option<Self::Element> {
        self.query_class(class).into_iter().next()
    }

    /// Runs `handler` once the document is parsed, or right away if it
    /// already is.
    fn on_ready(&self, handler: ReadyHandler) -> Result<(), Error>;

    fn on_hash_change(&self, handler: HashChangeHandler) -> Result<(), Error>;

    /// Registers a passive wheel listener on `target`.
    fn on_wheel(&self, target: &Self::Element, handler: WheelHandler) -> Result<(), Error>;
}

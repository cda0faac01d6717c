//! In-memory document used to drive the controllers without a browser.
//!
//! Element handles share the tree; listeners are kept apart from it so a
//! handler can touch elements while it is being dispatched.

use std::{cell::RefCell, collections::HashMap, fmt, mem, rc::Rc};

use url::Url;

use super::{
    Document, Element, HashChangeHandler, Opacity, Propagation, ReadyHandler, WheelHandler,
};
use crate::{config::is_class_name, error::Error};

const BODY: usize = 0;

#[derive(Default)]
struct Node {
    parent: Option<usize>,
    classes: Vec<String>,
    opacity: Option<Opacity>,
    opacity_log: Vec<Opacity>,
    class_writes: usize,
}

struct Tree {
    url: Url,
    nodes: Vec<Node>,
    queued_hash_changes: usize,
    ready: bool,
}

#[derive(Default)]
struct Listeners {
    ready: Vec<ReadyHandler>,
    hash_change: Vec<HashChangeHandler>,
    wheel: HashMap<usize, Vec<WheelHandler>>,
}

#[derive(Clone)]
pub struct MemDocument {
    tree: Rc<RefCell<Tree>>,
    listeners: Rc<RefCell<Listeners>>,
}

impl MemDocument {
    /// Creates a document containing only a body, located at `url`.
    pub fn new(url: &str) -> Result<Self, Error> {
        let url = Url::parse(url)?;
        let tree = Tree {
            url,
            nodes: vec![Node::default()],
            queued_hash_changes: 0,
            ready: false,
        };
        Ok(Self {
            tree: Rc::new(RefCell::new(tree)),
            listeners: Rc::new(RefCell::new(Listeners::default())),
        })
    }

    pub fn url(&self) -> String {
        self.tree.borrow().url.to_string()
    }

    pub fn body_element(&self) -> MemElement {
        self.element(BODY)
    }

    /// Appends a child to `parent` carrying the given classes.
    pub fn append(&self, parent: &MemElement, classes: &[&str]) -> MemElement {
        let mut tree = self.tree.borrow_mut();
        tree.nodes.push(Node {
            parent: Some(parent.id),
            classes: classes.iter().map(|class| class.to_string()).collect(),
            ..Node::default()
        });
        let id = tree.nodes.len() - 1;
        drop(tree);
        self.element(id)
    }

    /// Changes the fragment the way a user following a link would.
    pub fn navigate(&self, hash: &str) {
        self.write_hash(hash);
    }

    pub fn is_ready(&self) -> bool {
        self.tree.borrow().ready
    }

    pub fn pending_hash_changes(&self) -> usize {
        self.tree.borrow().queued_hash_changes
    }

    /// Marks the document as parsed and runs the queued ready handlers.
    pub fn fire_ready(&self) {
        self.tree.borrow_mut().ready = true;
        let handlers = mem::take(&mut self.listeners.borrow_mut().ready);
        for handler in handlers {
            handler();
        }
    }

    /// Delivers queued hash-change notifications until none are left,
    /// including the ones queued by the handlers themselves. Returns the
    /// number of notifications delivered.
    pub fn process_hash_changes(&self) -> usize {
        let mut delivered = 0;
        loop {
            {
                let mut tree = self.tree.borrow_mut();
                if tree.queued_hash_changes == 0 {
                    break;
                }
                tree.queued_hash_changes -= 1;
            }
            let mut handlers = mem::take(&mut self.listeners.borrow_mut().hash_change);
            for handler in handlers.iter_mut() {
                handler();
            }
            let mut listeners = self.listeners.borrow_mut();
            handlers.append(&mut listeners.hash_change);
            listeners.hash_change = handlers;
            delivered += 1;
        }
        delivered
    }

    /// Dispatches a wheel event at `target`, bubbling up to the body unless a
    /// listener stops it. Returns the number of listeners invoked.
    pub fn dispatch_wheel(&self, target: &MemElement) -> usize {
        let path = {
            let tree = self.tree.borrow();
            let mut path = Vec::new();
            let mut current = Some(target.id);
            while let Some(id) = current {
                path.push(id);
                current = tree.nodes[id].parent;
            }
            path
        };

        let mut invoked = 0;
        for id in path {
            let mut handlers = self
                .listeners
                .borrow_mut()
                .wheel
                .remove(&id)
                .unwrap_or_default();
            let mut stopped = false;
            for handler in handlers.iter_mut() {
                invoked += 1;
                if handler() == Propagation::Stop {
                    stopped = true;
                }
            }
            let mut listeners = self.listeners.borrow_mut();
            let registered = listeners.wheel.entry(id).or_default();
            handlers.append(registered);
            *registered = handlers;
            if stopped {
                break;
            }
        }
        invoked
    }

    fn element(&self, id: usize) -> MemElement {
        MemElement {
            tree: self.tree.clone(),
            id,
        }
    }

    fn write_hash(&self, hash: &str) {
        let fragment = hash.strip_prefix('#').unwrap_or(hash);
        let mut tree = self.tree.borrow_mut();
        let before = tree.url.fragment().map(str::to_owned);
        tree.url.set_fragment(Some(fragment));
        if tree.url.fragment().map(str::to_owned) != before {
            tree.queued_hash_changes += 1;
        }
    }
}

impl Document for MemDocument {
    type Element = MemElement;

    fn hash(&self) -> String {
        self.tree
            .borrow()
            .url
            .fragment()
            .filter(|fragment| !fragment.is_empty())
            .map(|fragment| format!("#{}", fragment))
            .unwrap_or_default()
    }

    fn set_hash(&self, hash: &str) -> Result<(), Error> {
        self.write_hash(hash);
        Ok(())
    }

    fn body(&self) -> Option<MemElement> {
        Some(self.body_element())
    }

    fn query_class(&self, class: &str) -> Vec<MemElement> {
        let ids: Vec<usize> = {
            let tree = self.tree.borrow();
            tree.nodes
                .iter()
                .enumerate()
                .filter(|(_, node)| node.classes.iter().any(|c| c == class))
                .map(|(id, _)| id)
                .collect()
        };
        ids.into_iter().map(|id| self.element(id)).collect()
    }

    fn on_ready(&self, handler: ReadyHandler) -> Result<(), Error> {
        if self.is_ready() {
            handler();
        } else {
            self.listeners.borrow_mut().ready.push(handler);
        }
        Ok(())
    }

    fn on_hash_change(&self, handler: HashChangeHandler) -> Result<(), Error> {
        self.listeners.borrow_mut().hash_change.push(handler);
        Ok(())
    }

    fn on_wheel(&self, target: &MemElement, handler: WheelHandler) -> Result<(), Error> {
        self.listeners
            .borrow_mut()
            .wheel
            .entry(target.id)
            .or_default()
            .push(handler);
        Ok(())
    }
}

#[derive(Clone)]
pub struct MemElement {
    tree: Rc<RefCell<Tree>>,
    id: usize,
}

impl MemElement {
    pub fn classes(&self) -> Vec<String> {
        self.tree.borrow().nodes[self.id].classes.clone()
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.tree.borrow().nodes[self.id]
            .classes
            .iter()
            .any(|c| c == class)
    }

    pub fn opacity(&self) -> Option<Opacity> {
        self.tree.borrow().nodes[self.id].opacity
    }

    /// Every opacity written to this element, oldest first.
    pub fn opacity_log(&self) -> Vec<Opacity> {
        self.tree.borrow().nodes[self.id].opacity_log.clone()
    }

    /// Number of `add_class`/`remove_class` calls made on this element.
    pub fn class_writes(&self) -> usize {
        self.tree.borrow().nodes[self.id].class_writes
    }
}

impl Element for MemElement {
    fn add_class(&self, class: &str) -> Result<(), Error> {
        if !is_class_name(class) {
            return Err(Error::HostError(format!("invalid class token: {:?}", class)));
        }
        let mut tree = self.tree.borrow_mut();
        let node = &mut tree.nodes[self.id];
        node.class_writes += 1;
        if !node.classes.iter().any(|c| c == class) {
            node.classes.push(class.to_string());
        }
        Ok(())
    }

    fn remove_class(&self, class: &str) -> Result<(), Error> {
        if !is_class_name(class) {
            return Err(Error::HostError(format!("invalid class token: {:?}", class)));
        }
        let mut tree = self.tree.borrow_mut();
        let node = &mut tree.nodes[self.id];
        node.class_writes += 1;
        node.classes.retain(|c| c != class);
        Ok(())
    }

    fn set_opacity(&self, opacity: Opacity) -> Result<(), Error> {
        let mut tree = self.tree.borrow_mut();
        let node = &mut tree.nodes[self.id];
        node.opacity = Some(opacity);
        node.opacity_log.push(opacity);
        Ok(())
    }
}

impl PartialEq for MemElement {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.tree, &other.tree) && self.id == other.id
    }
}

impl Eq for MemElement {}

impl fmt::Debug for MemElement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemElement")
            .field("id", &self.id)
            .field("classes", &self.classes())
            .finish()
    }
}

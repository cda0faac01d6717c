use std::{fmt, rc::Rc};

use serde::{Deserialize, Serialize};

use crate::{
    config::{is_class_name, SiteConfig},
    dom::{Document, Element, Opacity},
    error::Error,
};

const FRAGMENT_MARKER: char = '#';

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum Destination {
    Default,
    Alternate,
}

/// The two destinations a page can show, by bare name.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Routes {
    default: String,
    alternate: String,
}

impl Routes {
    pub fn new(default: &str, alternate: &str) -> Result<Self, Error> {
        for name in [default, alternate] {
            if !is_class_name(name) || name.contains(FRAGMENT_MARKER) {
                return Err(Error::InvalidConfig(format!(
                    "destination is not a usable class name: {:?}",
                    name
                )));
            }
        }
        if default == alternate {
            return Err(Error::InvalidConfig(format!(
                "destinations must differ, both are {:?}",
                default
            )));
        }
        Ok(Self {
            default: default.to_string(),
            alternate: alternate.to_string(),
        })
    }

    pub fn name(&self, destination: Destination) -> &str {
        match destination {
            Destination::Default => &self.default,
            Destination::Alternate => &self.alternate,
        }
    }

    pub fn fragment(&self, destination: Destination) -> String {
        format!("{}{}", FRAGMENT_MARKER, self.name(destination))
    }

    /// Maps a fragment such as `#projects` to its destination. Only exact
    /// matches count.
    pub fn resolve(&self, fragment: &str) -> Option<Destination> {
        let name = fragment.strip_prefix(FRAGMENT_MARKER)?;
        [Destination::Default, Destination::Alternate]
            .into_iter()
            .find(|&destination| self.name(destination) == name)
    }

    pub fn is_valid_fragment(&self, fragment: &str) -> bool {
        !fragment.is_empty() && self.resolve(fragment).is_some()
    }
}

impl Default for Routes {
    fn default() -> Self {
        let config = SiteConfig::default();
        Self {
            default: config.default_destination,
            alternate: config.alternate_destination,
        }
    }
}

/// Strips one leading `#`.
pub fn bare_name(fragment: &str) -> &str {
    fragment.strip_prefix(FRAGMENT_MARKER).unwrap_or(fragment)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NavEvent {
    InitialLoad,
    DocumentReady,
    HashChange,
}

impl fmt::Display for NavEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavEvent::InitialLoad => f.write_str("initial load"),
            NavEvent::DocumentReady => f.write_str("document ready"),
            NavEvent::HashChange => f.write_str("hash change"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reconciled {
    /// The fragment was not a known destination and has been rewritten to the
    /// default one. Classes are left for the resulting hash change.
    Redirected { from: String },
    /// Nothing was left after stripping the marker.
    Skipped,
    Activated {
        destination: Destination,
        deactivated: usize,
        activated: usize,
    },
}

pub struct NavController {
    routes: Routes,
    active_class: String,
}

impl NavController {
    pub fn new(routes: Routes, active_class: impl Into<String>) -> Self {
        Self {
            routes,
            active_class: active_class.into(),
        }
    }

    pub fn from_config(config: &SiteConfig) -> Result<Self, Error> {
        Ok(Self::new(config.routes()?, config.active_class.as_str()))
    }

    pub fn reconcile<D: Document>(&self, doc: &D) -> Result<Reconciled, Error> {
        let hash = doc.hash();

        // Only a valid fragment resolves, so this is the validity check.
        let Some(destination) = self.routes.resolve(&hash) else {
            doc.set_hash(&self.routes.fragment(Destination::Default))?;
            return Ok(Reconciled::Redirected { from: hash });
        };

        let name = bare_name(&hash);
        if name.is_empty() {
            return Ok(Reconciled::Skipped);
        }

        let previous = doc.query_class(&self.active_class);
        for element in &previous {
            element.remove_class(&self.active_class)?;
        }

        let next = doc.query_class(name);
        for element in &next {
            element.add_class(&self.active_class)?;
        }

        Ok(Reconciled::Activated {
            destination,
            deactivated: previous.len(),
            activated: next.len(),
        })
    }

    /// Hooks the controller up to `doc` for the lifetime of the page.
    ///
    /// The body stays hidden until the document is ready, so the page never
    /// shows before the first destination has been marked active.
    pub fn install<D: Document>(self, doc: &D) -> Result<(), Error> {
        let nav = Rc::new(self);

        if let Some(body) = doc.body() {
            body.set_opacity(Opacity::Hidden)?;
        }

        nav.handle(doc, NavEvent::InitialLoad);

        doc.on_hash_change(Box::new({
            let nav = nav.clone();
            let doc = doc.clone();
            move || nav.handle(&doc, NavEvent::HashChange)
        }))?;

        doc.on_ready(Box::new({
            let nav = nav.clone();
            let doc = doc.clone();
            move || {
                if let Some(body) = doc.body() {
                    if let Err(err) = body.set_opacity(Opacity::Visible) {
                        log::error!("failed to reveal page: {}", err);
                    }
                }
                nav.handle(&doc, NavEvent::DocumentReady);
            }
        }))?;

        log::info!(
            "navigation installed: {} / {}",
            nav.routes.fragment(Destination::Default),
            nav.routes.fragment(Destination::Alternate)
        );
        Ok(())
    }

    fn handle<D: Document>(&self, doc: &D, event: NavEvent) {
        match self.reconcile(doc) {
            Ok(Reconciled::Redirected { from }) => {
                log::debug!("{}: redirecting {:?} to default", event, from);
            }
            Ok(Reconciled::Skipped) => {
                log::debug!("{}: empty destination, skipping", event);
            }
            Ok(Reconciled::Activated {
                destination,
                deactivated,
                activated,
            }) => {
                log::debug!(
                    "{}: {:?} active ({} off, {} on)",
                    event,
                    destination,
                    deactivated,
                    activated
                );
            }
            Err(err) => {
                log::error!("{}: failed to reconcile: {}", event, err);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemDocument;

    fn page(url: &str) -> MemDocument {
        let doc = MemDocument::new(url).unwrap();
        let body = doc.body_element();
        doc.append(&body, &["tab", "projects"]);
        doc.append(&body, &["tab", "contributions"]);
        doc.append(&body, &["section", "projects"]);
        doc
    }

    #[test]
    fn valid_fragments_are_the_two_destinations() {
        let routes = Routes::default();
        assert!(routes.is_valid_fragment("#projects"));
        assert!(routes.is_valid_fragment("#contributions"));
        for fragment in [
            "",
            "#",
            "projects",
            "#Projects",
            "##projects",
            "#projects ",
            "#bogus",
            "#projects#contributions",
        ] {
            assert!(!routes.is_valid_fragment(fragment), "{:?}", fragment);
        }
    }

    #[test]
    fn routes_resolve_and_format() {
        let routes = Routes::new("work", "oss").unwrap();
        assert_eq!(routes.fragment(Destination::Default), "#work");
        assert_eq!(routes.resolve("#oss"), Some(Destination::Alternate));
        assert_eq!(routes.resolve("oss"), None);
        assert!(Routes::new("work", "").is_err());
        assert!(Routes::new("#work", "oss").is_err());
    }

    #[test]
    fn bare_name_strips_one_marker() {
        assert_eq!(bare_name("#projects"), "projects");
        assert_eq!(bare_name("##x"), "#x");
        assert_eq!(bare_name("#"), "");
        assert_eq!(bare_name("plain"), "plain");
    }

    #[test]
    fn invalid_fragment_redirects_without_touching_classes() {
        let doc = page("https://example.com/#bogus");
        let nav = NavController::new(Routes::default(), "hash-active");

        let outcome = nav.reconcile(&doc).unwrap();

        assert_eq!(
            outcome,
            Reconciled::Redirected {
                from: "#bogus".to_string()
            }
        );
        assert_eq!(doc.hash(), "#projects");
        assert_eq!(doc.pending_hash_changes(), 1);
        for element in doc.query_class("tab") {
            assert_eq!(element.class_writes(), 0);
        }
    }

    #[test]
    fn empty_fragment_redirects() {
        let doc = page("https://example.com/");
        let nav = NavController::new(Routes::default(), "hash-active");
        assert!(matches!(
            nav.reconcile(&doc).unwrap(),
            Reconciled::Redirected { .. }
        ));
        assert_eq!(doc.hash(), "#projects");
    }

    #[test]
    fn valid_fragment_activates_matching_elements() {
        let doc = page("https://example.com/#projects");
        let nav = NavController::new(Routes::default(), "hash-active");

        let outcome = nav.reconcile(&doc).unwrap();

        assert_eq!(
            outcome,
            Reconciled::Activated {
                destination: Destination::Default,
                deactivated: 0,
                activated: 2,
            }
        );
        assert_eq!(doc.query_class("hash-active"), doc.query_class("projects"));
        assert_eq!(doc.pending_hash_changes(), 0);
    }

    #[test]
    fn reconcile_is_idempotent() {
        let doc = page("https://example.com/#contributions");
        let nav = NavController::new(Routes::default(), "hash-active");

        nav.reconcile(&doc).unwrap();
        let first = doc.query_class("hash-active");
        nav.reconcile(&doc).unwrap();

        assert_eq!(doc.query_class("hash-active"), first);
        assert_eq!(first, doc.query_class("contributions"));
    }

    #[test]
    fn switching_moves_the_marker() {
        let doc = page("https://example.com/#projects");
        let shared = doc.append(&doc.body_element(), &["projects", "contributions"]);
        let nav = NavController::new(Routes::default(), "hash-active");
        nav.reconcile(&doc).unwrap();

        doc.navigate("#contributions");
        let outcome = nav.reconcile(&doc).unwrap();

        assert_eq!(
            outcome,
            Reconciled::Activated {
                destination: Destination::Alternate,
                deactivated: 3,
                activated: 2,
            }
        );
        for element in doc.query_class("projects") {
            let both = element.has_class("contributions");
            assert_eq!(element.has_class("hash-active"), both, "{:?}", element);
        }
        assert!(shared.has_class("hash-active"));
        assert_eq!(
            doc.query_class("hash-active"),
            doc.query_class("contributions")
        );
    }

    #[test]
    fn missing_elements_are_not_an_error() {
        let doc = MemDocument::new("https://example.com/#contributions").unwrap();
        let nav = NavController::new(Routes::default(), "hash-active");
        assert_eq!(
            nav.reconcile(&doc).unwrap(),
            Reconciled::Activated {
                destination: Destination::Alternate,
                deactivated: 0,
                activated: 0,
            }
        );
    }

    #[test]
    fn reports_the_destination_it_activated() {
        let doc = page("https://example.com/#contributions");
        let nav = NavController::new(Routes::new("projects", "contributions").unwrap(), "on");

        match nav.reconcile(&doc).unwrap() {
            Reconciled::Activated { destination, .. } => {
                assert_eq!(destination, Destination::Alternate);
            }
            other => panic!("unexpected outcome: {:?}", other),
        }

        doc.navigate("#projects");
        assert!(matches!(
            nav.reconcile(&doc).unwrap(),
            Reconciled::Activated {
                destination: Destination::Default,
                ..
            }
        ));
    }
}

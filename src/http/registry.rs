//! Page registry: absolute URI path to `(handler, attributes)`, plus an
//! optional default handler for unmatched paths.
//!
//! Grounded on `ryanseipp-rask-old/server/src/listener.rs`'s dispatch table,
//! generalized from a `Slab`-indexed session table to a `HashMap` keyed on
//! URI path -- the natural key here, since lookups are always by path, not
//! by a stable numeric handle.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::http::message::{Request, Response};

/// A synchronous request handler. Returns an HTTP status code, or `0` to
/// mean "the handler already set the status on the response itself".
pub type Handler = Arc<dyn Fn(&Request, &mut Response) -> u16 + Send + Sync>;

/// Per-page metadata applied to the response after the handler runs.
#[derive(Debug, Clone, Default)]
pub struct PageAttributes {
    pub content_type: Option<String>,
    pub cache_control: Option<String>,
    pub persistent_override: Option<bool>,
}

impl PageAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills in any response header slot the handler left unset.
    pub fn apply(&self, resp: &mut Response) {
        if let Some(ct) = &self.content_type {
            if !resp.entity_header.is_set_content_type() {
                resp.entity_header.set_content_type(ct.clone());
            }
        }
        if let Some(cc) = &self.cache_control {
            if !resp.general_header.is_set_cache_control() {
                resp.general_header.set_cache_control(cc.clone());
            }
        }
        if let Some(persistent) = self.persistent_override {
            resp.set_persistent(persistent);
        }
    }
}

struct Entry {
    handler: Handler,
    attributes: PageAttributes,
}

/// Maps absolute URI paths to handlers, capped at `max_pages` registrations.
pub struct PageRegistry {
    pages: HashMap<String, Entry>,
    default_handler: Option<Entry>,
    max_pages: usize,
}

impl PageRegistry {
    pub fn new(max_pages: usize) -> Self {
        Self {
            pages: HashMap::new(),
            default_handler: None,
            max_pages,
        }
    }

    /// Registers a handler for an exact URI path. Fails with
    /// [`crate::error::ErrorKind::Resource`] once `max_pages` entries exist.
    pub fn register(
        &mut self,
        path: impl Into<String>,
        handler: Handler,
        attributes: PageAttributes,
    ) -> Result<()> {
        let path = path.into();
        if !self.pages.contains_key(&path) && self.pages.len() >= self.max_pages {
            return Err(Error::resource("page registry is at max_pages capacity"));
        }
        self.pages.insert(path, Entry { handler, attributes });
        Ok(())
    }

    pub fn set_default_handler(&mut self, handler: Handler, attributes: PageAttributes) {
        self.default_handler = Some(Entry { handler, attributes });
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Looks up the handler for `path`, falling back to the default handler.
    /// Returns the handler and its attributes for the caller to apply after
    /// invocation.
    pub fn lookup(&self, path: &str) -> Option<(&Handler, &PageAttributes)> {
        self.pages
            .get(path)
            .or(self.default_handler.as_ref())
            .map(|e| (&e.handler, &e.attributes))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::status::Status;

    fn ok_handler() -> Handler {
        Arc::new(|_req, resp| {
            resp.set_status(Status::Ok);
            0
        })
    }

    #[test]
    fn exact_match_wins_over_default() {
        let mut registry = PageRegistry::new(4);
        registry
            .register("/a", ok_handler(), PageAttributes::new())
            .unwrap();
        registry.set_default_handler(
            Arc::new(|_req, resp| {
                resp.set_status(Status::NotFound);
                0
            }),
            PageAttributes::new(),
        );

        let (handler, _) = registry.lookup("/a").unwrap();
        let req = Request::new();
        let mut resp = Response::new();
        handler(&req, &mut resp);
        assert_eq!(resp.status, Status::Ok);
    }

    #[test]
    fn unmatched_path_falls_back_to_default() {
        let mut registry = PageRegistry::new(4);
        registry.set_default_handler(
            Arc::new(|_req, resp| {
                resp.set_status(Status::NotFound);
                0
            }),
            PageAttributes::new(),
        );

        let (handler, _) = registry.lookup("/missing").unwrap();
        let req = Request::new();
        let mut resp = Response::new();
        handler(&req, &mut resp);
        assert_eq!(resp.status, Status::NotFound);
    }

    #[test]
    fn registration_beyond_max_pages_is_rejected() {
        let mut registry = PageRegistry::new(1);
        registry
            .register("/a", ok_handler(), PageAttributes::new())
            .unwrap();
        assert!(registry
            .register("/b", ok_handler(), PageAttributes::new())
            .is_err());
    }
}

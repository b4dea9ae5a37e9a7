//! Node access through a browser-automation session.
//!
//! Every call is one JSON request/response round trip over a
//! [`BrowserTransport`]. [`LoopbackBrowser`] answers the same protocol from
//! in-process elements.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{DomError, Element, NodeAccess, Undo};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "camelCase")]
pub enum Request {
    TagName { handle: String },
    GetAttributeNames { handle: String },
    GetAttribute { handle: String, name: String },
    GetOriginalAttribute { handle: String, name: String },
    SetAttribute { handle: String, name: String, value: String },
    RemoveAttribute { handle: String, name: String },
    ClassListAdd { handle: String, class: String },
    ClassListRemove { handle: String, class: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "camelCase")]
pub enum Response {
    Tag { name: String },
    Names { names: Vec<String> },
    Value { value: Option<String> },
    Undo { undo: Undo },
    /// The handle no longer points at an element.
    Stale,
    Error { message: String },
}

pub trait BrowserTransport {
    fn round_trip(&self, payload: &str) -> Result<String, DomError>;
}

impl<T: BrowserTransport + ?Sized> BrowserTransport for &T {
    fn round_trip(&self, payload: &str) -> Result<String, DomError> {
        (**self).round_trip(payload)
    }
}

pub struct RemoteElement<T: BrowserTransport> {
    handle: String,
    transport: T,
}

impl<T: BrowserTransport> RemoteElement<T> {
    pub fn new(handle: impl Into<String>, transport: T) -> Self {
        Self {
            handle: handle.into(),
            transport,
        }
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    fn call(&self, request: &Request) -> Result<Response, DomError> {
        let payload = serde_json::to_string(request)?;
        log::trace!("remote -> {payload}");
        let reply = self.transport.round_trip(&payload)?;
        log::trace!("remote <- {reply}");
        match serde_json::from_str(&reply)? {
            Response::Stale => Err(DomError::StaleHandle {
                handle: self.handle.clone(),
            }),
            Response::Error { message } => {
                log::debug!("remote element {} failed: {message}", self.handle);
                Err(DomError::Remote {
                    handle: self.handle.clone(),
                    message,
                })
            }
            response => Ok(response),
        }
    }

    fn unexpected(request: &Request, response: Response) -> DomError {
        DomError::UnexpectedResponse {
            request: format!("{request:?}"),
            response: format!("{response:?}"),
        }
    }

    fn value(&self, request: Request) -> Result<Option<String>, DomError> {
        match self.call(&request)? {
            Response::Value { value } => Ok(value),
            other => Err(Self::unexpected(&request, other)),
        }
    }

    fn undo(&self, request: Request) -> Result<Undo, DomError> {
        match self.call(&request)? {
            Response::Undo { undo } => Ok(undo),
            other => Err(Self::unexpected(&request, other)),
        }
    }
}

impl<T: BrowserTransport> NodeAccess for RemoteElement<T> {
    fn tag_name(&self) -> Result<String, DomError> {
        let request = Request::TagName {
            handle: self.handle.clone(),
        };
        match self.call(&request)? {
            Response::Tag { name } => Ok(name.to_ascii_lowercase()),
            other => Err(Self::unexpected(&request, other)),
        }
    }

    fn attribute_names(&self) -> Result<Vec<String>, DomError> {
        let request = Request::GetAttributeNames {
            handle: self.handle.clone(),
        };
        match self.call(&request)? {
            Response::Names { names } => Ok(names),
            other => Err(Self::unexpected(&request, other)),
        }
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, DomError> {
        self.value(Request::GetAttribute {
            handle: self.handle.clone(),
            name: name.to_string(),
        })
    }

    fn original_attribute(&self, name: &str) -> Result<Option<String>, DomError> {
        self.value(Request::GetOriginalAttribute {
            handle: self.handle.clone(),
            name: name.to_string(),
        })
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<Undo, DomError> {
        self.undo(Request::SetAttribute {
            handle: self.handle.clone(),
            name: name.to_string(),
            value: value.to_string(),
        })
    }

    fn remove_attribute(&mut self, name: &str) -> Result<Undo, DomError> {
        self.undo(Request::RemoveAttribute {
            handle: self.handle.clone(),
            name: name.to_string(),
        })
    }

    fn add_class(&mut self, class: &str) -> Result<Undo, DomError> {
        self.undo(Request::ClassListAdd {
            handle: self.handle.clone(),
            class: class.to_string(),
        })
    }

    fn remove_class(&mut self, class: &str) -> Result<Undo, DomError> {
        self.undo(Request::ClassListRemove {
            handle: self.handle.clone(),
            class: class.to_string(),
        })
    }
}

/// Serves the remote protocol from elements held in this process.
#[derive(Default)]
pub struct LoopbackBrowser {
    elements: RefCell<HashMap<String, Element>>,
}

impl LoopbackBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, handle: impl Into<String>, element: Element) {
        self.elements.borrow_mut().insert(handle.into(), element);
    }

    pub fn remove(&self, handle: &str) -> Option<Element> {
        self.elements.borrow_mut().remove(handle)
    }

    pub fn snapshot(&self, handle: &str) -> Option<Element> {
        self.elements.borrow().get(handle).cloned()
    }

    fn dispatch(&self, request: Request) -> Response {
        let mut elements = self.elements.borrow_mut();
        let handle = match &request {
            Request::TagName { handle }
            | Request::GetAttributeNames { handle }
            | Request::GetAttribute { handle, .. }
            | Request::GetOriginalAttribute { handle, .. }
            | Request::SetAttribute { handle, .. }
            | Request::RemoveAttribute { handle, .. }
            | Request::ClassListAdd { handle, .. }
            | Request::ClassListRemove { handle, .. } => handle.clone(),
        };
        let Some(el) = elements.get_mut(&handle) else {
            return Response::Stale;
        };
        let result = match request {
            Request::TagName { .. } => el.tag_name().map(|name| Response::Tag {
                name: name.to_ascii_uppercase(),
            }),
            Request::GetAttributeNames { .. } => {
                el.attribute_names().map(|names| Response::Names { names })
            }
            Request::GetAttribute { name, .. } => {
                el.attribute(&name).map(|value| Response::Value { value })
            }
            Request::GetOriginalAttribute { name, .. } => el
                .original_attribute(&name)
                .map(|value| Response::Value { value }),
            Request::SetAttribute { name, value, .. } => el
                .set_attribute(&name, &value)
                .map(|undo| Response::Undo { undo }),
            Request::RemoveAttribute { name, .. } => {
                el.remove_attribute(&name).map(|undo| Response::Undo { undo })
            }
            Request::ClassListAdd { class, .. } => {
                el.add_class(&class).map(|undo| Response::Undo { undo })
            }
            Request::ClassListRemove { class, .. } => {
                el.remove_class(&class).map(|undo| Response::Undo { undo })
            }
        };
        result.unwrap_or_else(|e| Response::Error {
            message: e.to_string(),
        })
    }
}

impl BrowserTransport for LoopbackBrowser {
    fn round_trip(&self, payload: &str) -> Result<String, DomError> {
        let request: Request = serde_json::from_str(payload)?;
        let response = self.dispatch(request);
        Ok(serde_json::to_string(&response)?)
    }
}

//! In-process element tree plus the node-access capability the template
//! compiler reads attributes through.
//!
//! Two adapters implement [`NodeAccess`]: [`Element`] itself (an in-process
//! DOM) and [`remote::RemoteElement`] (a handle into a browser-automation
//! session). Callers only ever see the trait.

pub mod access;
pub mod error;
pub mod parse;
pub mod remote;

use std::collections::HashMap;

pub use access::{NodeAccess, Scoped, Undo, read_attribute};
pub use error::DomError;
pub use parse::parse_html;

/// Elements that never have children or a closing tag.
pub const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

pub fn is_void_element(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag.to_ascii_lowercase().as_str())
}

#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
    Comment(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attr {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Element {
    pub tag: String,
    /// Attributes in source order. Names are unique.
    pub attrs: Vec<Attr>,
    pub children: Vec<Node>,
    pub self_closing: bool,
    // first value seen for an attribute before any mutation touched it
    original: HashMap<String, String>,
}

impl Element {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::default()
        }
    }

    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.put(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Value the attribute had before the first mutation, if it was mutated.
    pub fn original(&self, name: &str) -> Option<&str> {
        self.original.get(name).map(String::as_str)
    }

    pub(crate) fn put(&mut self, name: String, value: String) -> Option<String> {
        if let Some(existing) = self.attrs.iter_mut().find(|a| a.name == name) {
            Some(std::mem::replace(&mut existing.value, value))
        } else {
            self.attrs.push(Attr { name, value });
            None
        }
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<String> {
        let pos = self.attrs.iter().position(|a| a.name == name)?;
        Some(self.attrs.remove(pos).value)
    }

    pub(crate) fn remember_original(&mut self, name: &str) {
        if self.original.contains_key(name) {
            return;
        }
        if let Some(value) = self.get(name).map(str::to_string) {
            self.original.insert(name.to_string(), value);
        }
    }

    pub fn class_list(&self) -> Vec<&str> {
        self.get("class")
            .map(|c| c.split_whitespace().collect())
            .unwrap_or_default()
    }

    /// Concatenated text of all descendant text nodes.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            match child {
                Node::Text(t) => out.push_str(t),
                Node::Element(e) => out.push_str(&e.text_content()),
                Node::Comment(_) => {}
            }
        }
        out
    }

    pub fn inner_html(&self) -> String {
        self.children.iter().map(Node::to_html).collect()
    }
}

impl Node {
    pub fn to_html(&self) -> String {
        match self {
            Node::Text(t) => t.clone(),
            Node::Comment(c) => format!("<!--{c}-->"),
            Node::Element(e) => {
                let mut out = format!("<{}", e.tag);
                for a in &e.attrs {
                    out.push_str(&format!(" {}=\"{}\"", a.name, escape_attr(&a.value)));
                }
                if e.self_closing || is_void_element(&e.tag) {
                    out.push_str("/>");
                    return out;
                }
                out.push('>');
                out.push_str(&e.inner_html());
                out.push_str(&format!("</{}>", e.tag));
                out
            }
        }
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, Node::Text(t) if t.chars().all(char::is_whitespace))
    }
}

fn escape_attr(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

pub fn h(tag: impl Into<String>, attrs: &[(&str, &str)], children: Vec<Node>) -> Node {
    let mut el = Element::new(tag);
    for (k, v) in attrs {
        el.put((*k).to_string(), (*v).to_string());
    }
    el.children = children;
    Node::Element(el)
}

pub fn text(t: impl Into<String>) -> Node {
    Node::Text(t.into())
}

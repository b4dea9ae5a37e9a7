//! CSS rule tree for template stylesheets.
//!
//! Stylesheets are parsed into a small tree of `rule`, `atrule` and `decl`
//! nodes. Selectors and values are kept as source text; [`selector`] breaks
//! selectors down when a caller needs their parts.

pub mod error;
pub mod filter;
mod parser;
pub mod selector;

pub use error::StyleError;
pub use filter::{ElementMatch, rules_for_element};

#[derive(Debug, Clone, PartialEq)]
pub enum CssNode {
    Rule {
        selector: String,
        nodes: Vec<CssNode>,
    },
    AtRule {
        name: String,
        params: String,
        nodes: Vec<CssNode>,
    },
    Decl {
        prop: String,
        value: String,
    },
}

impl CssNode {
    pub fn node_type(&self) -> &'static str {
        match self {
            CssNode::Rule { .. } => "rule",
            CssNode::AtRule { .. } => "atrule",
            CssNode::Decl { .. } => "decl",
        }
    }

    pub fn selector(&self) -> Option<&str> {
        match self {
            CssNode::Rule { selector, .. } => Some(selector),
            _ => None,
        }
    }

    pub fn nodes(&self) -> &[CssNode] {
        match self {
            CssNode::Rule { nodes, .. } | CssNode::AtRule { nodes, .. } => nodes,
            CssNode::Decl { .. } => &[],
        }
    }

    pub fn to_css(&self) -> String {
        match self {
            CssNode::Decl { prop, value } => format!("{prop}: {value};"),
            CssNode::Rule { selector, nodes } => {
                format!("{selector} {{\n{}}}\n", indent_block(nodes))
            }
            CssNode::AtRule {
                name,
                params,
                nodes,
            } => {
                let head = if params.is_empty() {
                    format!("@{name}")
                } else {
                    format!("@{name} {params}")
                };
                if nodes.is_empty() {
                    format!("{head};\n")
                } else {
                    format!("{head} {{\n{}}}\n", indent_block(nodes))
                }
            }
        }
    }
}

fn indent_block(nodes: &[CssNode]) -> String {
    nodes
        .iter()
        .flat_map(|n| {
            n.to_css()
                .lines()
                .map(|l| format!("  {l}\n"))
                .collect::<Vec<_>>()
        })
        .collect()
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct Stylesheet {
    pub nodes: Vec<CssNode>,
}

impl Stylesheet {
    pub fn parse(css: &str) -> Result<Self, StyleError> {
        Ok(Stylesheet {
            nodes: parser::parse_nodes(css)?,
        })
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn to_css(&self) -> String {
        self.nodes.iter().map(CssNode::to_css).collect()
    }
}

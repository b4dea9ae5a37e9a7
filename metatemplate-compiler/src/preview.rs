//! Renders a template with chosen variable values as plain HTML.
//!
//! Values are written onto the live nodes through [`NodeAccess`] under a
//! [`Scoped`] guard and rolled back once the element is serialised, so the
//! tree is left as it was found.

use std::collections::BTreeMap;

use metatemplate_dom::{Element, Node, NodeAccess, Scoped, is_void_element, parse_html, read_attribute};

use crate::error::{AttributeError, CompileError};
use crate::formats::{Comparison, IfCondition};
use crate::types::Template;
use crate::variable::{Marker, parse_markers};
use crate::walker::{IF_TAG, VARIABLE_TAG};

/// Parses `template.html` and previews it with `values`.
pub fn preview_template(template: &Template, values: &BTreeMap<String, String>) -> Result<String, CompileError> {
    let mut nodes = parse_html(&template.html)?;
    render_preview(&template.id, &mut nodes, values)
}

/// Variable values are option names for enumerations and `"true"` for
/// booleans; anything but empty or `"false"` counts as set.
pub fn render_preview(
    template_id: &str,
    nodes: &mut [Node],
    values: &BTreeMap<String, String>,
) -> Result<String, CompileError> {
    let mut out = String::new();
    for node in nodes.iter_mut() {
        match node {
            Node::Text(text) => out.push_str(text),
            Node::Comment(_) => {}
            Node::Element(el) => out.push_str(&preview_element(template_id, el, values)?),
        }
    }
    Ok(out)
}

fn preview_element(
    template_id: &str,
    el: &mut Element,
    values: &BTreeMap<String, String>,
) -> Result<String, CompileError> {
    match el.tag.as_str() {
        VARIABLE_TAG => {
            let key = read_attribute(el, "key")?;
            match values.get(key.trim()) {
                Some(value) => Ok(escape_text(value)),
                None => render_preview(template_id, &mut el.children, values),
            }
        }
        IF_TAG => {
            let expression = read_attribute(el, "key")?;
            let condition = IfCondition::parse(&expression).ok_or_else(|| CompileError::InvalidCondition {
                template_id: template_id.to_string(),
                expression: expression.clone(),
            })?;
            if holds(&condition, values) {
                render_preview(template_id, &mut el.children, values)
            } else {
                Ok(String::new())
            }
        }
        _ => {
            let mut guard = Scoped::new(el);
            for name in guard.node().attribute_names()? {
                let raw = read_attribute(guard.node(), &name)?;
                let (text, markers) = parse_markers(&raw).map_err(|source| CompileError::Attribute {
                    template_id: template_id.to_string(),
                    snippet: format!("{name}=\"{raw}\""),
                    source: AttributeError::Variable {
                        attribute: name.clone(),
                        source,
                    },
                })?;
                if markers.is_empty() {
                    continue;
                }
                let value = attribute_value(&text, &markers, values);
                // the guard adds class tokens rather than replacing the list
                if value.is_empty() || name == "class" {
                    guard.remove_attribute(&name)?;
                }
                if !value.is_empty() {
                    guard.set_attribute(&name, &value)?;
                }
            }

            let node = guard.node_mut();
            let mut html = open_tag(node);
            if !node.self_closing && !is_void_element(&node.tag) {
                html.push_str(&render_preview(template_id, &mut node.children, values)?);
                html.push_str(&format!("</{}>", node.tag));
            }
            guard.rollback()?;
            Ok(html)
        }
    }
}

fn is_set(value: Option<&String>) -> bool {
    value.is_some_and(|v| !v.is_empty() && v != "false")
}

fn holds(condition: &IfCondition, values: &BTreeMap<String, String>) -> bool {
    let value = values.get(&condition.key);
    match &condition.comparison {
        None => is_set(value),
        Some((Comparison::Equals, expected)) => value == Some(expected),
        Some((Comparison::NotEquals, expected)) => value != Some(expected),
    }
}

fn attribute_value(text: &str, markers: &[Marker], values: &BTreeMap<String, String>) -> String {
    let mut pieces: Vec<String> = vec![text.to_string()];
    for marker in markers {
        let value = values.get(&marker.key);
        let piece = match marker.options.as_deref() {
            None => value.cloned(),
            Some([only]) => is_set(value).then(|| only.value.clone()),
            Some(options) => options
                .iter()
                .find(|o| Some(&o.name) == value)
                .map(|o| o.value.clone()),
        };
        pieces.extend(piece);
    }
    pieces
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn open_tag(el: &Element) -> String {
    let mut out = format!("<{}", el.tag);
    for attr in &el.attrs {
        out.push_str(&format!(" {}=\"{}\"", attr.name, escape_attribute(&attr.value)));
    }
    out.push_str(if el.self_closing { "/>" } else { ">" });
    out
}

fn escape_text(value: &str) -> String {
    value.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

fn escape_attribute(value: &str) -> String {
    value.replace('&', "&amp;").replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn values(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    const HTML: &str = concat!(
        r#"<div class="g-alert {{ isOpen?: g-alert--open }} {{ level: g-alert--info as info | g-alert--error as error }}">"#,
        r#"<mt-if key="level?=error"><b>!</b></mt-if>"#,
        r#"<mt-variable key="children">Default</mt-variable>"#,
        r#"</div>"#
    );

    #[test]
    fn applies_values() {
        let template = Template::new("alert", HTML, "");
        let html = preview_template(
            &template,
            &values(&[("isOpen", "true"), ("level", "error"), ("children", "Oh <no>")]),
        )
        .unwrap();
        assert_eq!(
            html,
            r#"<div class="g-alert g-alert--open g-alert--error"><b>!</b>Oh &lt;no&gt;</div>"#
        );
    }

    #[test]
    fn unset_values_fall_back() {
        let template = Template::new("alert", HTML, "");
        let html = preview_template(&template, &values(&[])).unwrap();
        assert_eq!(html, r#"<div class="g-alert">Default</div>"#);
    }

    #[test]
    fn empty_attributes_are_removed() {
        let template = Template::new("link", r#"<a href="{{ href }}">x</a>"#, "");
        assert_eq!(preview_template(&template, &values(&[])).unwrap(), "<a>x</a>");
    }

    #[test]
    fn tree_is_unchanged_afterwards() {
        let mut nodes = parse_html(HTML).unwrap();
        let before: String = nodes.iter().map(Node::to_html).collect();
        render_preview("alert", &mut nodes, &values(&[("isOpen", "true")])).unwrap();
        let after: String = nodes.iter().map(Node::to_html).collect();
        assert_eq!(before, after);
    }
}

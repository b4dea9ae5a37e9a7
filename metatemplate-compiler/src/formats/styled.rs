//! Element CSS rewritten as a styled-components body.
//!
//! A rule whose subject carries classes beyond the element's static ones is
//! conditional on the variables that add those classes. `.row.row--reverse`
//! on `class="row {{ isReversed?: row--reverse }}"` becomes
//! `${(props) => (props.isReversed) && css`...`}`.

use metatemplate_style::CssNode;
use metatemplate_style::selector::{parse_selector, split_selector_list};

use crate::types::{DynamicKeyType, TemplateAttribute};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledRules {
    pub body: String,
    /// Keys the body reads from `props`, first use first.
    pub used_props: Vec<String>,
    /// Whether the body calls the `css` helper.
    pub uses_css_helper: bool,
}

impl StyledRules {
    pub fn is_empty(&self) -> bool {
        self.body.trim().is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Term {
    Truthy(String),
    Equals { key: String, name: String },
}

impl Term {
    fn key(&self) -> &str {
        match self {
            Term::Truthy(key) | Term::Equals { key, .. } => key,
        }
    }

    fn render(&self) -> String {
        match self {
            Term::Truthy(key) => format!("props.{key}"),
            Term::Equals { key, name } => format!("props.{key} === {}", js_string(name)),
        }
    }
}

/// Selectors of one rule that share a nesting suffix (`:hover`, `[open]`).
#[derive(Debug, Default)]
struct Group {
    nest: String,
    // empty inner vec: applies unconditionally
    conditions: Vec<Vec<Term>>,
}

pub fn render_styled_rules(nodes: &[CssNode], class: Option<&TemplateAttribute>) -> StyledRules {
    let mut out = StyledRules::default();
    let body: Vec<String> = nodes
        .iter()
        .filter_map(|node| render_node(node, class, &mut out))
        .collect();
    out.body = body.join("\n");
    out
}

fn render_node(node: &CssNode, class: Option<&TemplateAttribute>, out: &mut StyledRules) -> Option<String> {
    match node {
        CssNode::Rule { selector, nodes } => {
            let declarations = declarations(nodes);
            if declarations.is_empty() {
                return None;
            }
            let blocks: Vec<String> = groups(selector, class)
                .into_iter()
                .map(|group| render_group(&group, &declarations, out))
                .collect();
            (!blocks.is_empty()).then(|| blocks.join("\n"))
        }
        CssNode::AtRule { name, params, nodes } => {
            let inner: Vec<String> = nodes
                .iter()
                .filter_map(|node| render_node(node, class, out))
                .collect();
            if inner.is_empty() {
                log::debug!("dropping @{name} {params} with no rules for this element");
                return None;
            }
            Some(format!("@{name} {params} {{\n{}\n}}", indent(&inner.join("\n"))))
        }
        CssNode::Decl { .. } => None,
    }
}

fn declarations(nodes: &[CssNode]) -> String {
    nodes
        .iter()
        .map(|node| node.to_css().trim_end().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

fn groups(selector_list: &str, class: Option<&TemplateAttribute>) -> Vec<Group> {
    let mut groups: Vec<Group> = Vec::new();
    for text in split_selector_list(selector_list) {
        let selector = parse_selector(&text);
        if selector.has_ancestors {
            log::debug!("ignoring {text:?}: selectors with ancestors are not scoped to one element");
            continue;
        }
        let Some(condition) = condition(&selector.subject.classes, class) else {
            log::debug!("ignoring {text:?}: no variable can add its classes");
            continue;
        };
        let subject = &selector.subject;
        let nest = format!("{}{}", subject.attributes.concat(), subject.pseudos.concat());

        match groups.iter_mut().find(|g| g.nest == nest) {
            Some(group) => group.conditions.push(condition),
            None => groups.push(Group {
                nest,
                conditions: vec![condition],
            }),
        }
    }
    groups
}

/// Terms that must all hold for an element to carry `classes`. `None` when
/// no variable can supply one of them.
fn condition(classes: &[String], class: Option<&TemplateAttribute>) -> Option<Vec<Term>> {
    let Some(class) = class else {
        return Some(Vec::new());
    };
    let statics: Vec<&str> = class.value.split_whitespace().collect();
    let mut terms: Vec<Term> = Vec::new();
    for token in classes.iter().filter(|c| !statics.contains(&c.as_str())) {
        let term = class.dynamic_keys.iter().find_map(|dk| match &dk.key_type {
            DynamicKeyType::Boolean => dk
                .if_true_value
                .as_deref()
                .filter(|value| value.split_whitespace().any(|t| t == token))
                .map(|_| Term::Truthy(dk.key.clone())),
            DynamicKeyType::Enumeration(options) => options
                .iter()
                .find(|o| o.value.split_whitespace().any(|t| t == token))
                .map(|o| Term::Equals {
                    key: dk.key.clone(),
                    name: o.name.clone(),
                }),
            _ => None,
        })?;
        if !terms.contains(&term) {
            terms.push(term);
        }
    }
    Some(terms)
}

fn render_group(group: &Group, declarations: &str, out: &mut StyledRules) -> String {
    let mut block = declarations.to_string();

    if !group.conditions.iter().any(Vec::is_empty) {
        for term in group.conditions.iter().flatten() {
            if !out.used_props.iter().any(|p| p == term.key()) {
                out.used_props.push(term.key().to_string());
            }
        }
        out.uses_css_helper = true;
        block = format!(
            "${{(props) => ({}) && css`\n{}\n`}}",
            render_conditions(&group.conditions),
            indent(&block)
        );
    }

    if group.nest.is_empty() {
        block
    } else {
        format!("&{} {{\n{}\n}}", group.nest, indent(&block))
    }
}

fn render_conditions(conditions: &[Vec<Term>]) -> String {
    // several options of one enumeration
    let single_key = conditions.first().and_then(|first| match first.as_slice() {
        [Term::Equals { key, .. }] => Some(key),
        _ => None,
    });
    if let Some(key) = single_key
        && conditions.len() >= 2
        && conditions
            .iter()
            .all(|c| matches!(c.as_slice(), [Term::Equals { key: k, .. }] if k == key))
    {
        let names: Vec<String> = conditions
            .iter()
            .flatten()
            .filter_map(|term| match term {
                Term::Equals { name, .. } => Some(js_string(name)),
                Term::Truthy(_) => None,
            })
            .collect();
        return format!("[{}].includes(props.{key})", names.join(", "));
    }

    let rendered: Vec<String> = conditions
        .iter()
        .map(|terms| {
            let all: Vec<String> = terms.iter().map(Term::render).collect();
            if terms.len() > 1 && conditions.len() > 1 {
                format!("({})", all.join(" && "))
            } else {
                all.join(" && ")
            }
        })
        .collect();
    rendered.join(" || ")
}

fn indent(text: &str) -> String {
    text.lines()
        .map(|line| if line.is_empty() { String::new() } else { format!("  {line}") })
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn js_string(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DynamicKey, EnumOption};
    use metatemplate_style::Stylesheet;
    use pretty_assertions::assert_eq;

    fn flex_row_class() -> TemplateAttribute {
        TemplateAttribute {
            key: "class".into(),
            value: "g-flex-row".into(),
            data_type: DynamicKeyType::String,
            dynamic_keys: vec![
                DynamicKey {
                    key: "isReversed".into(),
                    optional: true,
                    key_type: DynamicKeyType::Boolean,
                    if_true_value: Some("g-flex-reverse".into()),
                },
                DynamicKey::new(
                    "gap",
                    DynamicKeyType::Enumeration(vec![
                        EnumOption::new("g-gap-s", "small"),
                        EnumOption::new("g-gap-m", "medium"),
                        EnumOption::new("g-gap-l", "large"),
                    ]),
                    true,
                ),
            ],
            is_omitted_if_empty: false,
        }
    }

    fn render(css: &str) -> StyledRules {
        let sheet = Stylesheet::parse(css).unwrap();
        render_styled_rules(&sheet.nodes, Some(&flex_row_class()))
    }

    #[test]
    fn static_class_rules_are_unconditional() {
        let rules = render(".g-flex-row { display: flex; }");
        assert_eq!(rules.body, "display: flex;");
        assert!(rules.used_props.is_empty());
        assert!(!rules.uses_css_helper);
    }

    #[test]
    fn boolean_class_becomes_a_prop_condition() {
        let rules = render(".g-flex-row.g-flex-reverse { flex-direction: row-reverse; }");
        assert_eq!(
            rules.body,
            "${(props) => (props.isReversed) && css`\n  flex-direction: row-reverse;\n`}"
        );
        assert_eq!(rules.used_props, vec!["isReversed"]);
        assert!(rules.uses_css_helper);
    }

    #[test]
    fn enumeration_options_collapse_into_includes() {
        let rules = render(".g-gap-s, .g-gap-m { gap: 1rem; }");
        assert_eq!(
            rules.body,
            "${(props) => ([\"small\", \"medium\"].includes(props.gap)) && css`\n  gap: 1rem;\n`}"
        );
    }

    #[test]
    fn pseudo_classes_nest() {
        let rules = render(".g-flex-row:hover { color: red; }");
        assert_eq!(rules.body, "&:hover {\n  color: red;\n}");
    }

    #[test]
    fn at_rules_wrap_their_rules() {
        let rules = render("@media (min-width: 48em) { .g-flex-row.g-gap-l { gap: 2rem; } }");
        assert_eq!(
            rules.body,
            concat!(
                "@media (min-width: 48em) {\n",
                "  ${(props) => (props.gap === \"large\") && css`\n",
                "    gap: 2rem;\n",
                "  `}\n",
                "}"
            )
        );
    }

    #[test]
    fn ancestor_selectors_are_dropped() {
        let rules = render(".page .g-flex-row { margin: 0; }");
        assert!(rules.is_empty());
    }

    #[test]
    fn mixed_conditions() {
        let rules = render(".g-flex-reverse.g-gap-s, .g-gap-l { order: 1; }");
        assert!(rules.body.starts_with(
            "${(props) => ((props.isReversed && props.gap === \"small\") || props.gap === \"large\") && css`"
        ));
        assert_eq!(rules.used_props, vec!["isReversed", "gap"]);
    }
}

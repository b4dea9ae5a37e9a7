use crate::CssNode;
use crate::selector::{Compound, parse_selector, split_selector_list};

/// What an element could look like at runtime, as far as selectors care.
///
/// `classes` holds every class the element might carry: the static ones plus
/// any a variable can switch on.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ElementMatch {
    pub tag: String,
    pub classes: Vec<String>,
    pub ids: Vec<String>,
}

impl ElementMatch {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into().to_ascii_lowercase(),
            ..Self::default()
        }
    }

    pub fn could_match(&self, compound: &Compound) -> bool {
        let tag = compound.tag.as_deref().filter(|t| *t != "*");
        if tag.is_none() && compound.classes.is_empty() && compound.ids.is_empty() {
            return false;
        }
        if let Some(tag) = tag
            && !tag.eq_ignore_ascii_case(&self.tag)
        {
            return false;
        }
        compound.classes.iter().all(|c| self.classes.contains(c))
            && compound.ids.iter().all(|id| self.ids.contains(id))
    }
}

/// The rules of `nodes` whose subject could be this element. A rule listing
/// several selectors keeps only the ones that apply; at-rules are kept when
/// any rule inside them is.
pub fn rules_for_element(nodes: &[CssNode], element: &ElementMatch) -> Vec<CssNode> {
    nodes
        .iter()
        .filter_map(|node| match node {
            CssNode::Rule { selector, nodes } => {
                let matching: Vec<String> = split_selector_list(selector)
                    .into_iter()
                    .filter(|s| element.could_match(&parse_selector(s).subject))
                    .collect();
                (!matching.is_empty()).then(|| CssNode::Rule {
                    selector: matching.join(", "),
                    nodes: nodes.clone(),
                })
            }
            CssNode::AtRule {
                name,
                params,
                nodes,
            } => {
                let inner = rules_for_element(nodes, element);
                (!inner.is_empty()).then(|| CssNode::AtRule {
                    name: name.clone(),
                    params: params.clone(),
                    nodes: inner,
                })
            }
            CssNode::Decl { .. } => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Stylesheet;
    use pretty_assertions::assert_eq;

    fn flex_row() -> ElementMatch {
        ElementMatch {
            tag: "div".into(),
            classes: vec!["g-flex-row".into(), "g-flex-reverse".into()],
            ids: vec![],
        }
    }

    #[test]
    fn keeps_rules_whose_classes_are_possible() {
        let sheet = Stylesheet::parse(
            ".g-flex-row { display: flex }\n\
             .g-flex-row.g-flex-reverse { flex-direction: row-reverse }\n\
             .g-flex-column { display: block }",
        )
        .unwrap();
        let kept = rules_for_element(&sheet.nodes, &flex_row());
        let selectors: Vec<_> = kept.iter().filter_map(CssNode::selector).collect();
        assert_eq!(selectors, vec![".g-flex-row", ".g-flex-row.g-flex-reverse"]);
    }

    #[test]
    fn narrows_selector_lists() {
        let sheet = Stylesheet::parse(".g-flex-row, .g-other { gap: 1rem }").unwrap();
        let kept = rules_for_element(&sheet.nodes, &flex_row());
        assert_eq!(kept[0].selector(), Some(".g-flex-row"));
    }

    #[test]
    fn at_rules_follow_their_children() {
        let sheet = Stylesheet::parse(
            "@media (min-width: 48em) { .g-flex-row { gap: 2rem } }\n\
             @media print { .g-other { display: none } }",
        )
        .unwrap();
        let kept = rules_for_element(&sheet.nodes, &flex_row());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].node_type(), "atrule");
    }

    #[test]
    fn universal_and_tag_selectors() {
        let sheet = Stylesheet::parse("* { margin: 0 }\ndiv { padding: 0 }\nspan { padding: 1px }")
            .unwrap();
        let kept = rules_for_element(&sheet.nodes, &flex_row());
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].selector(), Some("div"));
    }
}

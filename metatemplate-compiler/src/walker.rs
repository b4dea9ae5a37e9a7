//! Walks a template's HTML once per format and collects the files each one
//! produces.

use metatemplate_dom::{Element, Node, is_void_element, parse_html, read_attribute};
use metatemplate_style::{CssNode, ElementMatch, Stylesheet, rules_for_element};

use crate::attributes::compile_attributes;
use crate::error::{CompileError, FormatError};
use crate::formats::{ComponentOptions, FileMap, Format, FormatId, IfCondition, OnElement, TemplateFormat};
use crate::types::{DynamicKeyType, Template, TemplateAttribute, find_attribute};

/// `<mt-variable key="children">Default</mt-variable>`
pub const VARIABLE_TAG: &str = "mt-variable";
/// `<mt-if key="level?=error">...</mt-if>`
pub const IF_TAG: &str = "mt-if";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompileOptions {
    /// Overrides the language and CSS strategy of every component format.
    pub react: Option<ComponentOptions>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatOutput {
    pub format: FormatId,
    pub files: FileMap,
}

/// Compiles `template` into every format in `formats`.
///
/// Each format gets a fresh registry, so names never depend on which other
/// formats were requested. Any error aborts the whole template.
pub fn make_templates(
    template: &Template,
    formats: &[FormatId],
    options: &CompileOptions,
) -> Result<Vec<FormatOutput>, CompileError> {
    let nodes = parse_html(&template.html)?;
    let stylesheet = Stylesheet::parse(&template.css)?;
    let roots = nodes
        .iter()
        .filter(|n| !n.is_whitespace() && !matches!(n, Node::Comment(_)))
        .count();
    let mut bound = Vec::new();
    collect_bound_keys(&nodes, &mut bound)?;

    formats
        .iter()
        .map(|&id| -> Result<FormatOutput, CompileError> {
            log::debug!("compiling {} as {id}", template.id);
            let mut format = Format::with_component_options(id, template, options.react);
            for key in &bound {
                format.registry_mut().reserve(key);
            }
            Walker {
                format: &mut format,
                css: &stylesheet.nodes,
                template,
            }
            .walk(&nodes)?;
            let files = format
                .serialize(&template.css, roots > 1)
                .map_err(|source| format_error(template, source))?;
            Ok(FormatOutput { format: id, files })
        })
        .collect()
}

/// Barrel files for `file_paths`, all of which must belong to `format`.
pub fn make_index(
    format: FormatId,
    file_paths: &[String],
    options: &CompileOptions,
) -> Result<FileMap, FormatError> {
    Format::with_component_options(format, &Template::default(), options.react).generate_index(file_paths)
}

fn format_error(template: &Template, source: FormatError) -> CompileError {
    CompileError::Format {
        template_id: template.id.clone(),
        source,
    }
}

struct Walker<'a> {
    format: &'a mut Format,
    css: &'a [CssNode],
    template: &'a Template,
}

impl Walker<'_> {
    fn walk(&mut self, nodes: &[Node]) -> Result<(), CompileError> {
        for node in nodes {
            match node {
                Node::Text(text) => self.format.on_text(text),
                Node::Comment(_) => log::trace!("skipping comment"),
                Node::Element(el) => match el.tag.as_str() {
                    VARIABLE_TAG => self.variable(el)?,
                    IF_TAG => self.condition(el)?,
                    _ => self.element(el)?,
                },
            }
        }
        Ok(())
    }

    fn required_key(&self, el: &Element) -> Result<String, CompileError> {
        let key = read_attribute(el, "key")?.trim().to_string();
        if key.is_empty() {
            return Err(CompileError::MissingKey {
                template_id: self.template.id.clone(),
                tag: el.tag.clone(),
            });
        }
        Ok(key)
    }

    fn variable(&mut self, el: &Element) -> Result<(), CompileError> {
        let key = self.required_key(el)?;
        let name = self
            .format
            .registry_mut()
            .share(&key, DynamicKeyType::Node, true, None)
            .map_err(|e| format_error(self.template, e.into()))?;
        log::trace!("<{VARIABLE_TAG}> {name}");
        self.format.on_variable(&name, &el.inner_html());
        Ok(())
    }

    fn condition(&mut self, el: &Element) -> Result<(), CompileError> {
        let expression = self.required_key(el)?;
        let Some(mut condition) = IfCondition::parse(&expression) else {
            return Err(CompileError::InvalidCondition {
                template_id: self.template.id.clone(),
                expression,
            });
        };
        condition.key = self
            .format
            .registry_mut()
            .share(&condition.key, DynamicKeyType::String, true, None)
            .map_err(|e| format_error(self.template, e.into()))?;
        self.format
            .on_if(&condition)
            .map_err(|e| format_error(self.template, e))?;
        self.walk(&el.children)?;
        self.format.on_close_if();
        Ok(())
    }

    fn element(&mut self, el: &Element) -> Result<(), CompileError> {
        let attributes = compile_attributes(&el.tag, el, self.format.registry_mut(), self.template)?;
        let css = rules_for_element(self.css, &element_match(el, &attributes)?);
        let is_self_closing = el.self_closing || is_void_element(&el.tag);

        let alias = self
            .format
            .on_element(OnElement {
                tag_name: &el.tag,
                attributes,
                css: &css,
                is_self_closing,
            })
            .map_err(|e| format_error(self.template, e))?;
        if !is_self_closing {
            self.walk(&el.children)?;
            self.format.on_close_element(&alias);
        }
        Ok(())
    }
}

/// Keys named by `<mt-if>` and `<mt-variable>` anywhere under `nodes`.
fn collect_bound_keys(nodes: &[Node], out: &mut Vec<String>) -> Result<(), CompileError> {
    for node in nodes {
        let Node::Element(el) = node else {
            continue;
        };
        let key = match el.tag.as_str() {
            VARIABLE_TAG => Some(read_attribute(el, "key")?.trim().to_string()),
            IF_TAG => IfCondition::parse(&read_attribute(el, "key")?).map(|c| c.key),
            _ => None,
        };
        if let Some(key) = key.filter(|k| !k.is_empty() && !out.contains(k)) {
            out.push(key);
        }
        collect_bound_keys(&el.children, out)?;
    }
    Ok(())
}

/// Every class the element could carry, and its authored ids.
fn element_match(el: &Element, attributes: &[TemplateAttribute]) -> Result<ElementMatch, CompileError> {
    let mut matcher = ElementMatch::new(&el.tag);
    if let Some(class) = find_attribute(attributes, "class") {
        matcher.classes = class.possible_tokens();
    }
    // the compiled id is a variable; selectors name the authored one
    matcher.ids = read_attribute(el, "id")?
        .split_whitespace()
        .map(str::to_string)
        .collect();
    Ok(matcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn compile(html: &str, css: &str, format: FormatId) -> FileMap {
        let template = Template::new("card", html, css);
        let mut outputs = make_templates(&template, &[format], &CompileOptions::default()).unwrap();
        outputs.remove(0).files
    }

    #[test]
    fn mustache_document() {
        let files = compile(
            r#"<div class="card {{ isOpen?: card--open }}"><mt-variable key="children">Body</mt-variable></div>"#,
            "",
            FormatId::Mustache,
        );
        let body = &files["mustache/card.mustache"];
        assert!(body.ends_with(r#"<div class="card{{#isOpen}} card--open{{/isOpen}}">{{{children}}}</div>"#));
    }

    #[test]
    fn conditions_share_keys_with_attributes() {
        let files = compile(
            r#"<p class="{{ level: info | error }}"><mt-if key="level?=error">!</mt-if></p>"#,
            "",
            FormatId::TwigEmbed,
        );
        assert_eq!(
            files["twig-embed/card.twig"],
            concat!(
                r#"<p class="<% if $level == "info" %>info<% else_if $level == "error" %>error<% end_if %>">"#,
                r#"<% if $level == "error" %>!<% end_if %></p>"#
            )
        );
    }

    #[test]
    fn conditions_and_markers_share_one_key_in_either_order() {
        let condition_first = compile(
            r#"<section><mt-if key="isOpen">x</mt-if><div class="{{ isOpen?: open }}"></div></section>"#,
            "",
            FormatId::Mustache,
        );
        assert_eq!(
            condition_first["mustache/card.mustache"],
            r#"<section>{{#isOpen}}x{{/isOpen}}<div class="{{#isOpen}}open{{/isOpen}}"></div></section>"#
        );

        let marker_first = compile(
            r#"<section><div class="{{ isOpen?: open }}"></div><mt-if key="isOpen">x</mt-if></section>"#,
            "",
            FormatId::Mustache,
        );
        assert_eq!(
            marker_first["mustache/card.mustache"],
            r#"<section><div class="{{#isOpen}}open{{/isOpen}}"></div>{{#isOpen}}x{{/isOpen}}</section>"#
        );
    }

    #[test]
    fn condition_keys_take_the_marker_type() {
        let files = compile(
            r#"<section><mt-if key="isOpen">x</mt-if><div class="{{ isOpen?: open }}"></div></section>"#,
            "",
            FormatId::ReactTs,
        );
        let code = &files["react-ts/card.tsx"];
        assert!(code.contains("  isOpen?: boolean;\n"));
        assert!(!code.contains("isOpen2"));
    }

    #[test]
    fn void_elements_do_not_close() {
        let files = compile(r#"<img src="a.png" alt="">"#, "", FormatId::TwigEmbed);
        assert!(!files["twig-embed/card.twig"].contains("</img>"));
    }

    #[test]
    fn missing_key_aborts() {
        let template = Template::new("card", "<mt-if>x</mt-if>", "");
        let err = make_templates(&template, &[FormatId::ReactTs], &CompileOptions::default()).unwrap_err();
        assert!(matches!(err, CompileError::MissingKey { tag, .. } if tag == "mt-if"));
    }

    #[test]
    fn mustache_rejects_comparisons() {
        let template = Template::new("card", r#"<mt-if key="a?=b">x</mt-if>"#, "");
        let err = make_templates(&template, &[FormatId::Mustache], &CompileOptions::default()).unwrap_err();
        assert!(matches!(
            err,
            CompileError::Format {
                source: FormatError::UnsupportedCondition { .. },
                ..
            }
        ));
    }

    #[test]
    fn rules_reach_only_matching_elements() {
        let files = compile(
            r#"<div class="a"><span class="b">x</span></div>"#,
            ".a { color: red; } .b { color: blue; }",
            FormatId::ReactTsStyledComponents,
        );
        let code = &files["react-ts-styled-components/card.tsx"];
        assert!(code.contains("const StyledDiv = styled.div`\ncolor: red;\n`;"));
        assert!(code.contains("const StyledSpan = styled.span`\ncolor: blue;\n`;"));
        assert!(code.contains("<StyledDiv><StyledSpan>x</StyledSpan></StyledDiv>"));
    }
}

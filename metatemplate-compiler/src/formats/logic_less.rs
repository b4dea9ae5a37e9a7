//! Logic-less formats: Mustache, and the server-embed dialect used for the
//! Twig and SilverStripe outputs.
//!
//! Both share one renderer; [`Dialect`] picks the syntax. Mustache cannot
//! compare values, so enumeration keys are interpolated and a lookup table
//! (`<id>.lookup.json`) maps each option name to its literal.

use std::collections::BTreeMap;

use indexmap::IndexMap;

use super::{Comparison, FileMap, FormatId, IfCondition, OnElement, TemplateFormat};
use crate::error::FormatError;
use crate::registry::DynamicKeyRegistry;
use crate::types::{DynamicKey, DynamicKeyType, Template, TemplateAttribute};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dialect {
    /// `{{var}}`, `{{#var}}...{{/var}}`
    Mustache,
    /// `{$var}`, `<% if $var %>...<% end_if %>`
    ServerEmbed,
}

/// Variable name to option name to literal value.
pub type Lookup = IndexMap<String, IndexMap<String, String>>;

/// Replaces each enumeration variable's option name with its literal, so the
/// values can be handed straight to a Mustache renderer.
pub fn apply_lookup(lookup: &Lookup, values: &mut BTreeMap<String, String>) {
    for (key, table) in lookup {
        if let Some(value) = values.get_mut(key)
            && let Some(literal) = table.get(value.as_str())
        {
            *value = literal.clone();
        }
    }
}

#[derive(Debug)]
pub struct LogicLess {
    id: FormatId,
    dialect: Dialect,
    template_id: String,
    registry: DynamicKeyRegistry,
    data: String,
    unescaped_keys: Vec<String>,
    lookup: Lookup,
    // Mustache sections close by name
    open_ifs: Vec<String>,
}

impl LogicLess {
    pub fn new(id: FormatId, dialect: Dialect, template: &Template) -> Self {
        Self {
            id,
            dialect,
            template_id: template.id.clone(),
            registry: DynamicKeyRegistry::new(),
            data: String::new(),
            unescaped_keys: Vec::new(),
            lookup: Lookup::new(),
            open_ifs: Vec::new(),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self.id {
            FormatId::TwigEmbed => "twig",
            FormatId::SilverstripeComponents => "ss",
            _ => "mustache",
        }
    }

    fn var(&self, key: &str) -> String {
        match self.dialect {
            Dialect::Mustache => format!("{{{{{key}}}}}"),
            Dialect::ServerEmbed => format!("{{${key}}}"),
        }
    }

    fn open_if(&self, key: &str) -> String {
        match self.dialect {
            Dialect::Mustache => format!("{{{{#{key}}}}}"),
            Dialect::ServerEmbed => format!("<% if ${key} %>"),
        }
    }

    fn close_if(&self, key: &str) -> String {
        match self.dialect {
            Dialect::Mustache => format!("{{{{/{key}}}}}"),
            Dialect::ServerEmbed => "<% end_if %>".to_string(),
        }
    }

    /// `space` goes in front of the key's output and is only emitted when
    /// the key itself is set.
    fn render_key(&mut self, attribute: &TemplateAttribute, dk: &DynamicKey, space: &str) -> String {
        let guarded = if space.trim().is_empty() {
            space.to_string()
        } else {
            self.omit_unless_any(&[dk.key.as_str()], space)
        };
        match &dk.key_type {
            DynamicKeyType::Boolean => {
                let literal = dk.if_true_value.as_deref().unwrap_or(&attribute.key);
                format!(
                    "{}{space}{}{}",
                    self.open_if(&dk.key),
                    escape_attribute(literal),
                    self.close_if(&dk.key)
                )
            }
            DynamicKeyType::Enumeration(options) => match self.dialect {
                Dialect::Mustache => {
                    let table = options
                        .iter()
                        .map(|o| (o.name.clone(), o.value.clone()))
                        .collect();
                    self.lookup.insert(dk.key.clone(), table);
                    format!("{guarded}{}", self.var(&dk.key))
                }
                Dialect::ServerEmbed => {
                    let mut out = String::new();
                    for (i, option) in options.iter().enumerate() {
                        let keyword = if i == 0 { "if" } else { "else_if" };
                        out.push_str(&format!(
                            "<% {keyword} ${} == \"{}\" %>{space}{}",
                            dk.key,
                            option.name,
                            escape_attribute(&option.value)
                        ));
                    }
                    out.push_str("<% end_if %>");
                    out
                }
            },
            _ => format!("{guarded}{}", self.var(&dk.key)),
        }
    }

    fn render_attribute(&mut self, attribute: &TemplateAttribute) -> String {
        let mut out = format!(" {}=\"{}", attribute.key, escape_attribute(&attribute.value));
        let mut earlier: Vec<&str> = Vec::new();
        for dk in &attribute.dynamic_keys {
            // a separator only when something before this key was printed
            let space = match (attribute.value.is_empty(), earlier.as_slice()) {
                (false, _) => " ".to_string(),
                (true, []) => String::new(),
                (true, keys) => self.omit_unless_any(keys, " "),
            };
            out.push_str(&self.render_key(attribute, dk, &space));
            earlier.push(&dk.key);
        }
        out.push('"');

        if attribute.is_omitted_if_empty && !attribute.dynamic_keys.is_empty() {
            let keys: Vec<&str> = attribute.dynamic_keys.iter().map(|k| k.key.as_str()).collect();
            return self.omit_unless_any(&keys, &out);
        }
        out
    }

    /// `body` when any of `keys` is set, nothing otherwise.
    fn omit_unless_any(&self, keys: &[&str], body: &str) -> String {
        match self.dialect {
            // no `||` in Mustache: try each key in turn under the previous
            // ones' inverted sections
            Dialect::Mustache => match keys {
                [] => body.to_string(),
                [only] => format!("{{{{#{only}}}}}{body}{{{{/{only}}}}}"),
                [first, rest @ ..] => format!(
                    "{{{{#{first}}}}}{body}{{{{/{first}}}}}{{{{^{first}}}}}{}{{{{/{first}}}}}",
                    self.omit_unless_any(rest, body)
                ),
            },
            Dialect::ServerEmbed => {
                let condition: Vec<String> = keys.iter().map(|k| format!("${k}")).collect();
                format!("<% if {} %>{body}<% end_if %>", condition.join(" || "))
            }
        }
    }

    fn unescaped_warning(&self) -> String {
        format!(
            "{{{{! DEVELOPER NOTE: this template uses triple braces, which disable HTML escaping.\n    \
             Make sure these variables are escaped before rendering:\n     - {}\n    \
             They are unescaped so that values can hold markup such as <span lang=\"mi\">Māori</span>. }}}}\n\n",
            self.unescaped_keys.join("\n     - ")
        )
    }
}

fn escape_attribute(value: &str) -> String {
    value.replace('"', "&quot;")
}

/// Backslash escapes for a double-quoted string inside a `<% %>` block.
fn escape_quoted(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

impl TemplateFormat for LogicLess {
    fn id(&self) -> FormatId {
        self.id
    }

    fn registry(&self) -> &DynamicKeyRegistry {
        &self.registry
    }

    fn registry_mut(&mut self) -> &mut DynamicKeyRegistry {
        &mut self.registry
    }

    fn on_element(&mut self, element: OnElement<'_>) -> Result<String, FormatError> {
        let mut tag = format!("<{}", element.tag_name);
        for attribute in &element.attributes {
            let rendered = self.render_attribute(attribute);
            tag.push_str(&rendered);
        }
        tag.push_str(if element.is_self_closing { "/>" } else { ">" });
        self.data.push_str(&tag);
        Ok(element.tag_name.to_string())
    }

    fn on_close_element(&mut self, tag_name: &str) {
        self.data.push_str(&format!("</{tag_name}>"));
    }

    fn on_text(&mut self, text: &str) {
        self.data.push_str(text);
    }

    /// Mustache output is unescaped so the value may contain markup. There is
    /// no fallback for `default_value`; logic-less renderers show nothing.
    fn on_variable(&mut self, key: &str, _default_value: &str) {
        match self.dialect {
            Dialect::Mustache => {
                if !self.unescaped_keys.iter().any(|k| k == key) {
                    self.unescaped_keys.push(key.to_string());
                }
                self.data.push_str(&format!("{{{{{{{key}}}}}}}"));
            }
            Dialect::ServerEmbed => {
                let var = self.var(key);
                self.data.push_str(&var);
            }
        }
    }

    fn on_if(&mut self, condition: &IfCondition) -> Result<(), FormatError> {
        let opening = match (&condition.comparison, self.dialect) {
            (None, _) => self.open_if(&condition.key),
            (Some((comparison, value)), Dialect::ServerEmbed) => {
                let op = match comparison {
                    Comparison::Equals => "==",
                    Comparison::NotEquals => "!=",
                };
                format!("<% if ${} {op} \"{}\" %>", condition.key, escape_quoted(value))
            }
            (Some(_), Dialect::Mustache) => {
                return Err(FormatError::UnsupportedCondition {
                    format: self.id.to_string(),
                    key: condition.key.clone(),
                });
            }
        };
        self.data.push_str(&opening);
        self.open_ifs.push(condition.key.clone());
        Ok(())
    }

    fn on_close_if(&mut self) {
        let Some(key) = self.open_ifs.pop() else {
            log::warn!("{}: closing a condition that was never opened", self.id);
            return;
        };
        let closing = self.close_if(&key);
        self.data.push_str(&closing);
    }

    fn serialize(&mut self, _css: &str, _has_multiple_root_nodes: bool) -> Result<FileMap, FormatError> {
        let dirname = self.dirname();
        let mut files = FileMap::new();

        let warning = if self.dialect == Dialect::Mustache && !self.unescaped_keys.is_empty() {
            self.unescaped_warning()
        } else {
            String::new()
        };
        files.insert(
            format!("{dirname}/{}.{}", self.template_id, self.extension()),
            format!("{warning}{}", self.data).trim().to_string(),
        );

        if !self.lookup.is_empty() {
            files.insert(
                format!("{dirname}/{}.lookup.json", self.template_id),
                serde_json::to_string_pretty(&self.lookup)?,
            );
        }
        Ok(files)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::EnumOption;
    use pretty_assertions::assert_eq;

    fn format(id: FormatId) -> LogicLess {
        let template = Template::new("alert", "", "");
        LogicLess::new(id, id.dialect().unwrap(), &template)
    }

    fn class_attribute() -> TemplateAttribute {
        TemplateAttribute {
            key: "class".into(),
            value: "g-alert".into(),
            data_type: DynamicKeyType::String,
            dynamic_keys: vec![
                DynamicKey {
                    key: "isOpen".into(),
                    optional: true,
                    key_type: DynamicKeyType::Boolean,
                    if_true_value: Some("open".into()),
                },
                DynamicKey::new(
                    "level",
                    DynamicKeyType::Enumeration(vec![
                        EnumOption::new("g-alert--info", "info"),
                        EnumOption::new("g-alert--error", "error"),
                    ]),
                    false,
                ),
            ],
            is_omitted_if_empty: false,
        }
    }

    fn render(f: &mut LogicLess, attribute: TemplateAttribute) -> String {
        f.on_element(OnElement {
            tag_name: "div",
            attributes: vec![attribute],
            css: &[],
            is_self_closing: false,
        })
        .unwrap();
        f.data.clone()
    }

    #[test]
    fn mustache_attribute() {
        let mut f = format(FormatId::Mustache);
        assert_eq!(
            render(&mut f, class_attribute()),
            r#"<div class="g-alert{{#isOpen}} open{{/isOpen}} {{level}}">"#
        );
        assert_eq!(f.lookup["level"]["error"], "g-alert--error");
    }

    #[test]
    fn server_embed_attribute() {
        let mut f = format(FormatId::SilverstripeComponents);
        assert_eq!(
            render(&mut f, class_attribute()),
            concat!(
                r#"<div class="g-alert<% if $isOpen %> open<% end_if %>"#,
                r#"<% if $level == "info" %> g-alert--info<% else_if $level == "error" %> g-alert--error<% end_if %>">"#
            )
        );
    }

    #[test]
    fn omitted_attributes_are_wrapped() {
        let attribute = TemplateAttribute {
            key: "aria-describedby".into(),
            value: String::new(),
            data_type: DynamicKeyType::String,
            dynamic_keys: vec![
                DynamicKey::new("hintId", DynamicKeyType::String, true),
                DynamicKey::new("errorId", DynamicKeyType::String, true),
            ],
            is_omitted_if_empty: true,
        };
        let mut mustache = format(FormatId::Mustache);
        assert_eq!(
            render(&mut mustache, attribute.clone()),
            concat!(
                r#"<div{{#hintId}} aria-describedby="{{hintId}}{{#errorId}}{{#hintId}} {{/hintId}}{{/errorId}}{{errorId}}"{{/hintId}}"#,
                r#"{{^hintId}}{{#errorId}} aria-describedby="{{hintId}}{{#errorId}}{{#hintId}} {{/hintId}}{{/errorId}}{{errorId}}"{{/errorId}}{{/hintId}}>"#
            )
        );
        let mut twig = format(FormatId::TwigEmbed);
        assert_eq!(
            render(&mut twig, attribute),
            concat!(
                r#"<div<% if $hintId || $errorId %> aria-describedby="{$hintId}"#,
                r#"<% if $errorId %><% if $hintId %> <% end_if %><% end_if %>{$errorId}"<% end_if %>>"#
            )
        );
    }

    #[test]
    fn mustache_variables_are_unescaped_and_flagged() {
        let mut f = format(FormatId::Mustache);
        f.on_variable("children", "Default");
        f.on_variable("children", "Default");
        let files = f.serialize("", false).unwrap();
        let body = &files["mustache/alert.mustache"];
        assert!(body.starts_with("{{! DEVELOPER NOTE"));
        assert!(body.contains("     - children\n"));
        assert!(body.ends_with("{{{children}}}{{{children}}}"));
    }

    #[test]
    fn conditions() {
        let mut twig = format(FormatId::TwigEmbed);
        twig.on_if(&IfCondition::parse("level?!=error").unwrap()).unwrap();
        twig.on_text("ok");
        twig.on_close_if();
        assert_eq!(twig.data, r#"<% if $level != "error" %>ok<% end_if %>"#);

        let mut mustache = format(FormatId::Mustache);
        mustache.on_if(&IfCondition::parse("isOpen").unwrap()).unwrap();
        mustache.on_close_if();
        assert_eq!(mustache.data, "{{#isOpen}}{{/isOpen}}");
        assert!(matches!(
            mustache.on_if(&IfCondition::parse("level?=error").unwrap()),
            Err(FormatError::UnsupportedCondition { .. })
        ));
    }

    #[test]
    fn comparison_values_stay_inside_their_quotes() {
        let mut twig = format(FormatId::TwigEmbed);
        twig.on_if(&IfCondition::parse(r#"label?=say "hi" %> \o/"#).unwrap()).unwrap();
        twig.on_close_if();
        assert_eq!(
            twig.data,
            r#"<% if $label == "say \"hi\" %> \\o/" %><% end_if %>"#
        );
    }

    #[test]
    fn lookup_artifact_and_application() {
        let mut f = format(FormatId::Mustache);
        render(&mut f, class_attribute());
        let files = f.serialize("", false).unwrap();
        let lookup: Lookup = serde_json::from_str(&files["mustache/alert.lookup.json"]).unwrap();

        let mut values = BTreeMap::from([
            ("level".to_string(), "error".to_string()),
            ("isOpen".to_string(), "true".to_string()),
        ]);
        apply_lookup(&lookup, &mut values);
        assert_eq!(values["level"], "g-alert--error");
        assert_eq!(values["isOpen"], "true");
    }

    #[test]
    fn extensions() {
        assert_eq!(format(FormatId::Mustache).extension(), "mustache");
        assert_eq!(format(FormatId::TwigEmbed).extension(), "twig");
        assert_eq!(format(FormatId::SilverstripeComponents).extension(), "ss");
    }
}

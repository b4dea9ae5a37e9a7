//! React component output, with either styled-components or an imported
//! stylesheet.

use convert_case::{Case, Casing as _};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::styled::{js_string, render_styled_rules};
use super::{Comparison, FileMap, FormatId, IfCondition, OnElement, TemplateFormat};
use crate::error::FormatError;
use crate::registry::{DynamicKeyRegistry, KeyDefinition, unique_name};
use crate::types::{DynamicKey, DynamicKeyType, NamedType, Template, TemplateAttribute, find_attribute};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    TypeScript,
    JavaScript,
}

impl Language {
    pub fn extension(self) -> &'static str {
        match self {
            Language::TypeScript => "tsx",
            Language::JavaScript => "js",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CssStrategy {
    #[default]
    StyledComponents,
    ImportCss,
    None,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ComponentOptions {
    pub language: Language,
    pub css: CssStrategy,
}

/// HTML attribute names React spells differently.
const REACT_KEYS: &[(&str, &str)] = &[
    ("allowfullscreen", "allowFullScreen"),
    ("autocomplete", "autoComplete"),
    ("autofocus", "autoFocus"),
    ("autoplay", "autoPlay"),
    ("charset", "charSet"),
    ("class", "className"),
    ("colspan", "colSpan"),
    ("crossorigin", "crossOrigin"),
    ("datetime", "dateTime"),
    ("enctype", "encType"),
    ("fill-rule", "fillRule"),
    ("for", "htmlFor"),
    ("formaction", "formAction"),
    ("http-equiv", "httpEquiv"),
    ("inputmode", "inputMode"),
    ("maxlength", "maxLength"),
    ("minlength", "minLength"),
    ("novalidate", "noValidate"),
    ("playsinline", "playsInline"),
    ("readonly", "readOnly"),
    ("rowspan", "rowSpan"),
    ("spellcheck", "spellCheck"),
    ("srcset", "srcSet"),
    ("tabindex", "tabIndex"),
    ("usemap", "useMap"),
];

pub fn react_key(key: &str) -> &str {
    REACT_KEYS
        .iter()
        .find(|(html, _)| *html == key)
        .map_or(key, |(_, react)| *react)
}

/// Event handlers, refs and the like: always `{expression}`, never a string.
const EXPRESSION_ONLY: &[&str] = &["onChange", "onClick", "ref"];

#[derive(Debug)]
pub struct Component {
    id: FormatId,
    options: ComponentOptions,
    template_id: String,
    registry: DynamicKeyRegistry,
    render: String,
    style: String,
    uses_css_helper: bool,
    constants: IndexMap<String, IndexMap<String, String>>,
    style_tags: Vec<String>,
}

impl Component {
    pub fn new(id: FormatId, options: ComponentOptions, template: &Template) -> Self {
        Self {
            id,
            options,
            template_id: template.id.clone(),
            registry: DynamicKeyRegistry::new(),
            render: String::new(),
            style: String::new(),
            uses_css_helper: false,
            constants: IndexMap::new(),
            style_tags: Vec::new(),
        }
    }

    pub fn options(&self) -> ComponentOptions {
        self.options
    }

    fn is_styled(&self) -> bool {
        self.options.css == CssStrategy::StyledComponents
    }

    fn is_typescript(&self) -> bool {
        self.options.language == Language::TypeScript
    }

    fn component_name(&self) -> String {
        self.template_id.to_case(Case::Pascal)
    }

    fn handler(
        &mut self,
        attribute: &str,
        key_type: DynamicKeyType,
        tag: &str,
    ) -> Result<TemplateAttribute, FormatError> {
        let key = self.register_dynamic_key(attribute, key_type.clone(), true, Some(tag))?;
        Ok(TemplateAttribute {
            key: attribute.to_string(),
            value: String::new(),
            data_type: DynamicKeyType::Function,
            dynamic_keys: vec![DynamicKey::new(key, key_type, true)],
            is_omitted_if_empty: false,
        })
    }

    /// `onChange` and `ref` on form controls, `onClick` on things you press.
    fn add_events(&mut self, tag: &str, attributes: &mut Vec<TemplateAttribute>) -> Result<(), FormatError> {
        let input_type = find_attribute(attributes, "type")
            .filter(|a| a.is_static())
            .map(|a| a.value.to_ascii_lowercase());
        let is_press_input = tag == "input" && matches!(input_type.as_deref(), Some("submit" | "image"));

        if matches!(tag, "input" | "textarea" | "select") && !is_press_input {
            let on_change = self.handler("onChange", DynamicKeyType::Named(NamedType::OnChange), tag)?;
            let reference = self.handler("ref", DynamicKeyType::Reference, tag)?;
            attributes.push(on_change);
            attributes.push(reference);
        }
        if matches!(tag, "button" | "a") || is_press_input {
            let on_click = self.handler("onClick", DynamicKeyType::Named(NamedType::OnClick), tag)?;
            attributes.push(on_click);
        }
        Ok(())
    }

    fn render_attribute(&mut self, attribute: &TemplateAttribute) -> String {
        let key = react_key(&attribute.key);
        if attribute.key == "style" {
            if !attribute.is_static() {
                log::warn!(
                    "{}: ignoring variables in style=\"{}\" on {}",
                    self.id,
                    attribute.value,
                    self.template_id
                );
            }
            return format!(" style={{{}}}", style_object(&attribute.value));
        }
        if attribute.is_static() {
            return format!(" {key}={}", static_value(attribute));
        }

        let expression = match attribute.dynamic_keys.as_slice() {
            [dk] if attribute.value.is_empty() => self.single_key(attribute, dk),
            keys => {
                let mut template = escape_template(&attribute.value);
                let mut spaced = !attribute.value.is_empty();
                for dk in keys {
                    let piece = self.template_piece(attribute, dk, spaced);
                    template.push_str(&piece);
                    spaced = true;
                }
                // each piece carries its own leading space
                let template = if attribute.value.is_empty() && keys.len() > 1 {
                    format!("`{template}`.trimStart()")
                } else {
                    format!("`{template}`")
                };
                if attribute.is_omitted_if_empty {
                    let any_set: Vec<String> = keys.iter().map(is_set).collect();
                    format!("{} ? {template} : undefined", any_set.join(" || "))
                } else {
                    template
                }
            }
        };
        format!(" {key}={{{expression}}}")
    }

    fn single_key(&mut self, attribute: &TemplateAttribute, dk: &DynamicKey) -> String {
        let key = &dk.key;
        match &dk.key_type {
            DynamicKeyType::Boolean => match &dk.if_true_value {
                Some(literal) if attribute.data_type != DynamicKeyType::Boolean => {
                    format!("{key} ? {} : undefined", js_string(literal))
                }
                _ => key.clone(),
            },
            DynamicKeyType::Enumeration(options) => {
                self.remember_constants(key, options);
                format!("constants.{key}[{key}]")
            }
            _ => key.clone(),
        }
    }

    fn template_piece(&mut self, attribute: &TemplateAttribute, dk: &DynamicKey, spaced: bool) -> String {
        let space = if spaced { " " } else { "" };
        let key = &dk.key;
        match &dk.key_type {
            DynamicKeyType::Boolean => {
                let literal = dk.if_true_value.as_deref().unwrap_or(&attribute.key);
                format!("${{{key} ? {} : \"\"}}", js_string(&format!("{space}{literal}")))
            }
            DynamicKeyType::Enumeration(options) => {
                self.remember_constants(key, options);
                format!(
                    "${{constants.{key}[{key}] !== undefined ? \"{space}\" + constants.{key}[{key}] : \"\"}}"
                )
            }
            _ => format!("${{{key} !== undefined ? \"{space}\" + {key} : \"\"}}"),
        }
    }

    fn remember_constants(&mut self, key: &str, options: &[crate::types::EnumOption]) {
        let table = options
            .iter()
            .map(|o| (o.name.clone(), o.value.clone()))
            .collect();
        self.constants.insert(key.to_string(), table);
    }

    fn prop_type(&self, definition: &KeyDefinition) -> String {
        let element = element_interface(definition.tag.as_deref());
        match &definition.key_type {
            DynamicKeyType::String => "string".into(),
            DynamicKeyType::Boolean => "boolean".into(),
            DynamicKeyType::Number => "number".into(),
            DynamicKeyType::Function => "(...args: unknown[]) => void".into(),
            DynamicKeyType::Reference => format!("React.RefObject<{element}>"),
            DynamicKeyType::Node => "React.ReactNode".into(),
            DynamicKeyType::Enumeration(options) => options
                .iter()
                .map(|o| js_string(&o.name))
                .collect::<Vec<_>>()
                .join(" | "),
            DynamicKeyType::Named(named) => match named {
                NamedType::InputType => r#"React.InputHTMLAttributes<HTMLInputElement>["type"]"#.into(),
                NamedType::InputAutocomplete => {
                    r#"React.InputHTMLAttributes<HTMLInputElement>["autoComplete"]"#.into()
                }
                NamedType::ATarget => r#"React.AnchorHTMLAttributes<HTMLAnchorElement>["target"]"#.into(),
                NamedType::CrossOrigin => {
                    r#"React.MediaHTMLAttributes<HTMLMediaElement>["crossOrigin"]"#.into()
                }
                NamedType::ButtonType => r#"React.ButtonHTMLAttributes<HTMLButtonElement>["type"]"#.into(),
                NamedType::OnChange => format!(r#"React.DOMAttributes<{element}>["onChange"]"#),
                NamedType::OnClick => format!(r#"React.DOMAttributes<{element}>["onClick"]"#),
                NamedType::AriaCurrent => r#"React.AriaAttributes["aria-current"]"#.into(),
            },
        }
    }

    fn props_declaration(&self) -> String {
        let fields: String = self
            .registry
            .iter()
            .map(|(name, definition)| {
                let optional = if definition.optional { "?" } else { "" };
                format!("  {name}{optional}: {};\n", self.prop_type(definition))
            })
            .collect();
        format!("type Props = {{\n{fields}}};\n\n")
    }

    fn render_component(&self, css: &str, has_multiple_root_nodes: bool) -> Result<String, FormatError> {
        let mut code = String::from("import React from 'react';\n");
        match self.options.css {
            CssStrategy::StyledComponents if !self.style.is_empty() => {
                if self.uses_css_helper {
                    code.push_str("import styled, { css } from 'styled-components';\n");
                } else {
                    code.push_str("import styled from 'styled-components';\n");
                }
            }
            CssStrategy::ImportCss if !css.trim().is_empty() => {
                code.push_str(&format!("import '../{}';\n", self.css_filename()));
            }
            _ => {}
        }
        code.push('\n');

        if self.is_typescript() {
            code.push_str(&self.props_declaration());
        }
        code.push_str(&self.style);
        if !self.constants.is_empty() {
            code.push_str(&format!(
                "const constants = {};\n\n",
                serde_json::to_string(&self.constants)?
            ));
        }

        let name = self.component_name();
        let keys: Vec<&str> = self.registry.names().collect();
        let params = if keys.is_empty() {
            "{}".to_string()
        } else {
            format!("{{ {} }}", keys.join(", "))
        };
        let annotation = if self.is_typescript() { ": Props" } else { "" };
        let (open, close) = if has_multiple_root_nodes {
            ("<React.Fragment>", "</React.Fragment>")
        } else {
            ("", "")
        };
        code.push_str(&format!(
            "const {name} = ({params}{annotation}) => (\n  {open}{}{close}\n);\n\nexport default {name};\n",
            self.render.trim()
        ));
        Ok(code)
    }

    fn css_filename(&self) -> String {
        format!("css/{}.css", self.template_id)
    }
}

impl TemplateFormat for Component {
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
        let tag = element.tag_name.to_ascii_lowercase();
        let mut attributes = element.attributes;
        self.add_events(&tag, &mut attributes)?;

        let mut alias = element.tag_name.to_string();
        let mut style_props: Vec<String> = Vec::new();
        if self.is_styled() {
            let rules = render_styled_rules(element.css, find_attribute(&attributes, "class"));
            if !rules.is_empty() {
                alias = unique_name(&format!("Styled{}", tag.to_case(Case::Pascal)), &mut self.style_tags);
                let generic = if self.is_typescript() && !rules.used_props.is_empty() {
                    let picked: Vec<String> = rules.used_props.iter().map(|p| js_string(p)).collect();
                    format!("<Pick<Props, {}>>", picked.join(" | "))
                } else {
                    String::new()
                };
                self.style
                    .push_str(&format!("const {alias} = styled.{tag}{generic}`\n{}\n`;\n\n", rules.body));
                self.uses_css_helper |= rules.uses_css_helper;
                style_props = rules.used_props;
            }
        }

        let mut tag_text = format!("<{alias}");
        for prop in &style_props {
            tag_text.push_str(&format!(" {prop}={{{prop}}}"));
        }
        for attribute in &attributes {
            // styled-components owns class names
            if self.is_styled() && attribute.key == "class" {
                continue;
            }
            let rendered = if EXPRESSION_ONLY.contains(&attribute.key.as_str()) {
                let keys: Vec<&str> = attribute.dynamic_keys.iter().map(|k| k.key.as_str()).collect();
                format!(" {}={{{}}}", attribute.key, keys.join(""))
            } else {
                self.render_attribute(attribute)
            };
            tag_text.push_str(&rendered);
        }
        tag_text.push_str(if element.is_self_closing { " />" } else { ">" });
        self.render.push_str(&tag_text);
        Ok(alias)
    }

    fn on_close_element(&mut self, tag_name: &str) {
        self.render.push_str(&format!("</{tag_name}>"));
    }

    fn on_text(&mut self, text: &str) {
        self.render.push_str(&escape_jsx_text(text));
    }

    fn on_variable(&mut self, key: &str, default_value: &str) {
        if default_value.trim().is_empty() {
            self.render.push_str(&format!("{{{key}}}"));
        } else {
            self.render.push_str(&format!(
                "{{{key} !== undefined ? {key} : <React.Fragment>{}</React.Fragment>}}",
                escape_jsx_text(default_value)
            ));
        }
    }

    fn on_if(&mut self, condition: &IfCondition) -> Result<(), FormatError> {
        let key = &condition.key;
        let test = match &condition.comparison {
            None => format!("{key} !== undefined"),
            Some((Comparison::Equals, value)) => format!("{key} === {}", js_string(value)),
            Some((Comparison::NotEquals, value)) => format!("{key} !== {}", js_string(value)),
        };
        self.render.push_str(&format!("{{{test} ? <React.Fragment>"));
        Ok(())
    }

    fn on_close_if(&mut self) {
        self.render.push_str("</React.Fragment> : null}");
    }

    fn serialize(&mut self, css: &str, has_multiple_root_nodes: bool) -> Result<FileMap, FormatError> {
        let mut files = FileMap::new();
        files.insert(
            format!(
                "{}/{}.{}",
                self.dirname(),
                self.template_id,
                self.options.language.extension()
            ),
            self.render_component(css, has_multiple_root_nodes)?,
        );
        if self.options.css == CssStrategy::ImportCss && !css.trim().is_empty() {
            files.insert(self.css_filename(), css.to_string());
        }
        Ok(files)
    }

    /// A lazy-loading barrel (`index`) and an eager one (`indexNotLazy`).
    fn generate_index(&self, file_paths: &[String]) -> Result<FileMap, FormatError> {
        let dirname = self.dirname();
        let extension = format!(".{}", self.options.language.extension());
        let mut lazy = String::from(
            "// DEVELOPER NOTE: These components are ready to lazy-load. You may also import components directly.\n\n",
        );
        let mut eager = String::from(
            "// DEVELOPER NOTE: This file includes all components so importing it may be very inefficient. \
             Prefer importing components directly, or index which loads them on demand.\n\n",
        );

        for path in file_paths {
            let Some(file_name) = path.strip_prefix(&format!("{dirname}/")) else {
                return Err(FormatError::OutsideFormatDir {
                    path: path.clone(),
                    dirname: dirname.to_string(),
                });
            };
            let stem = file_name.strip_suffix(&extension).unwrap_or(file_name);
            if matches!(stem, "index" | "indexNotLazy") {
                continue;
            }
            lazy.push_str(&format!(
                "export const {} = () => import(\"./{stem}\");\n",
                stem.to_case(Case::Pascal)
            ));
            eager.push_str(&format!(
                "export {{ default as {} }} from \"./{stem}\";\n",
                stem.to_case(Case::Camel)
            ));
        }

        Ok(FileMap::from([
            (format!("{dirname}/index{extension}"), lazy),
            (format!("{dirname}/indexNotLazy{extension}"), eager),
        ]))
    }
}

/// `HTMLInputElement`, `HTMLAnchorElement`... `HTMLElement` when unknown.
fn element_interface(tag: Option<&str>) -> String {
    let name = match tag {
        None => String::new(),
        Some("a") => "Anchor".into(),
        Some("img") => "Image".into(),
        Some("textarea") => "TextArea".into(),
        Some("td" | "th") => "TableCell".into(),
        Some(other) => other.to_case(Case::Pascal),
    };
    format!("HTML{name}Element")
}

/// `{` and `}` start expressions in JSX text.
fn escape_jsx_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '{' => out.push_str("{\"{\"}"),
            '}' => out.push_str("{\"}\"}"),
            _ => out.push(c),
        }
    }
    out
}

fn escape_template(text: &str) -> String {
    text.replace('\\', "\\\\").replace('`', "\\`").replace("${", "\\${")
}

fn static_value(attribute: &TemplateAttribute) -> String {
    let value = attribute.value.trim();
    match attribute.data_type {
        DynamicKeyType::Boolean => {
            if value.eq_ignore_ascii_case("false") {
                "{false}".into()
            } else {
                "{true}".into()
            }
        }
        DynamicKeyType::Number if value.parse::<f64>().is_ok() => format!("{{{value}}}"),
        _ => js_string(&attribute.value),
    }
}

/// `{ dynamicKey }` is set: truthy for booleans, defined otherwise.
fn is_set(dk: &DynamicKey) -> String {
    if dk.is_boolean() {
        dk.key.clone()
    } else {
        format!("{} !== undefined", dk.key)
    }
}

/// `color: red; font-size: 2em` as a React style object literal.
fn style_object(css: &str) -> String {
    let mut entries = Vec::new();
    for declaration in css.split(';') {
        let Some((property, value)) = declaration.split_once(':') else {
            continue;
        };
        let (property, value) = (property.trim(), value.trim());
        if property.is_empty() || value.is_empty() {
            continue;
        }
        let property = if property.starts_with("--") {
            property.to_string()
        } else if let Some(ms) = property.strip_prefix("-ms-") {
            format!("ms-{ms}").to_case(Case::Camel)
        } else if let Some(vendor) = property.strip_prefix('-') {
            vendor.to_case(Case::Pascal)
        } else {
            property.to_case(Case::Camel)
        };
        entries.push(format!("{}:{}", js_string(&property), js_string(value)));
    }
    format!("{{{}}}", entries.join(","))
}

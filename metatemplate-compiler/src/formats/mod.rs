//! Output formats.
//!
//! Every format consumes the same stream of callbacks from the document walker
//! and owns its own [`DynamicKeyRegistry`], so key names never leak between
//! formats.

pub mod component;
pub mod logic_less;
pub mod styled;

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use metatemplate_style::CssNode;

use crate::error::{FormatError, RegistryError};
use crate::registry::DynamicKeyRegistry;
use crate::types::{DynamicKeyType, Template, TemplateAttribute};

pub use component::{ComponentOptions, CssStrategy, Language};
pub use logic_less::{Dialect, Lookup, apply_lookup};

/// Relative output path to file content.
pub type FileMap = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FormatId {
    Mustache,
    TwigEmbed,
    SilverstripeComponents,
    ReactTsStyledComponents,
    ReactTs,
    ReactJs,
}

impl FormatId {
    pub const ALL: [FormatId; 6] = [
        FormatId::Mustache,
        FormatId::TwigEmbed,
        FormatId::SilverstripeComponents,
        FormatId::ReactTsStyledComponents,
        FormatId::ReactTs,
        FormatId::ReactJs,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FormatId::Mustache => "mustache",
            FormatId::TwigEmbed => "twig-embed",
            FormatId::SilverstripeComponents => "silverstripe-components",
            FormatId::ReactTsStyledComponents => "react-ts-styled-components",
            FormatId::ReactTs => "react-ts",
            FormatId::ReactJs => "react-js",
        }
    }

    /// Output directory, relative to the build root.
    pub fn dirname(self) -> &'static str {
        self.as_str()
    }

    pub fn dialect(self) -> Option<Dialect> {
        match self {
            FormatId::Mustache => Some(Dialect::Mustache),
            FormatId::TwigEmbed | FormatId::SilverstripeComponents => Some(Dialect::ServerEmbed),
            _ => None,
        }
    }

    pub fn component_options(self) -> Option<ComponentOptions> {
        let (language, css) = match self {
            FormatId::ReactTsStyledComponents => (Language::TypeScript, CssStrategy::StyledComponents),
            FormatId::ReactTs => (Language::TypeScript, CssStrategy::ImportCss),
            FormatId::ReactJs => (Language::JavaScript, CssStrategy::ImportCss),
            _ => return None,
        };
        Some(ComponentOptions { language, css })
    }
}

impl fmt::Display for FormatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FormatId {
    type Err = FormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FormatId::ALL
            .into_iter()
            .find(|id| id.as_str() == s.trim())
            .ok_or_else(|| FormatError::UnknownFormat(s.to_string()))
    }
}

/// Everything a format sees about one element.
#[derive(Debug)]
pub struct OnElement<'a> {
    pub tag_name: &'a str,
    pub attributes: Vec<TemplateAttribute>,
    /// Rules that could apply to this element.
    pub css: &'a [CssNode],
    pub is_self_closing: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equals,
    NotEquals,
}

/// An `<mt-if key="...">` condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfCondition {
    pub key: String,
    pub comparison: Option<(Comparison, String)>,
}

impl IfCondition {
    /// `name`, `name?=value` or `name?!=value`. `None` when there is no name.
    pub fn parse(expression: &str) -> Option<Self> {
        let (key, comparison) = if let Some((key, value)) = expression.split_once("?!=") {
            (key, Some((Comparison::NotEquals, value.to_string())))
        } else if let Some((key, value)) = expression.split_once("?=") {
            (key, Some((Comparison::Equals, value.to_string())))
        } else {
            (expression, None)
        };
        let key = key.trim();
        (!key.is_empty()).then(|| IfCondition {
            key: key.to_string(),
            comparison,
        })
    }
}

pub trait TemplateFormat {
    fn id(&self) -> FormatId;

    fn dirname(&self) -> &'static str {
        self.id().dirname()
    }

    fn registry(&self) -> &DynamicKeyRegistry;

    fn registry_mut(&mut self) -> &mut DynamicKeyRegistry;

    fn register_dynamic_key(
        &mut self,
        name: &str,
        key_type: DynamicKeyType,
        optional: bool,
        tag: Option<&str>,
    ) -> Result<String, RegistryError> {
        self.registry_mut().register(name, key_type, optional, tag)
    }

    /// Appends the opening tag and returns the tag name to close it with.
    fn on_element(&mut self, element: OnElement<'_>) -> Result<String, FormatError>;

    fn on_close_element(&mut self, tag_name: &str);

    fn on_text(&mut self, text: &str);

    fn on_variable(&mut self, key: &str, default_value: &str);

    fn on_if(&mut self, condition: &IfCondition) -> Result<(), FormatError>;

    fn on_close_if(&mut self);

    fn serialize(&mut self, css: &str, has_multiple_root_nodes: bool) -> Result<FileMap, FormatError>;

    /// Barrel files for a set of generated paths. Empty for formats without
    /// such a concept.
    fn generate_index(&self, _file_paths: &[String]) -> Result<FileMap, FormatError> {
        Ok(FileMap::new())
    }
}

/// The closed set of formats.
#[derive(Debug)]
pub enum Format {
    LogicLess(logic_less::LogicLess),
    Component(component::Component),
}

impl Format {
    pub fn new(id: FormatId, template: &Template) -> Self {
        Self::with_component_options(id, template, None)
    }

    /// `options` replaces the defaults of component formats and is ignored by
    /// the others.
    pub fn with_component_options(
        id: FormatId,
        template: &Template,
        options: Option<ComponentOptions>,
    ) -> Self {
        match (id.dialect(), id.component_options()) {
            (Some(dialect), _) => Format::LogicLess(logic_less::LogicLess::new(id, dialect, template)),
            (None, defaults) => Format::Component(component::Component::new(
                id,
                options.or(defaults).unwrap_or_default(),
                template,
            )),
        }
    }

    fn inner(&self) -> &dyn TemplateFormat {
        match self {
            Format::LogicLess(f) => f,
            Format::Component(f) => f,
        }
    }

    fn inner_mut(&mut self) -> &mut dyn TemplateFormat {
        match self {
            Format::LogicLess(f) => f,
            Format::Component(f) => f,
        }
    }
}

impl TemplateFormat for Format {
    fn id(&self) -> FormatId {
        self.inner().id()
    }

    fn registry(&self) -> &DynamicKeyRegistry {
        self.inner().registry()
    }

    fn registry_mut(&mut self) -> &mut DynamicKeyRegistry {
        self.inner_mut().registry_mut()
    }

    fn on_element(&mut self, element: OnElement<'_>) -> Result<String, FormatError> {
        self.inner_mut().on_element(element)
    }

    fn on_close_element(&mut self, tag_name: &str) {
        self.inner_mut().on_close_element(tag_name)
    }

    fn on_text(&mut self, text: &str) {
        self.inner_mut().on_text(text)
    }

    fn on_variable(&mut self, key: &str, default_value: &str) {
        self.inner_mut().on_variable(key, default_value)
    }

    fn on_if(&mut self, condition: &IfCondition) -> Result<(), FormatError> {
        self.inner_mut().on_if(condition)
    }

    fn on_close_if(&mut self) {
        self.inner_mut().on_close_if()
    }

    fn serialize(&mut self, css: &str, has_multiple_root_nodes: bool) -> Result<FileMap, FormatError> {
        self.inner_mut().serialize(css, has_multiple_root_nodes)
    }

    fn generate_index(&self, file_paths: &[String]) -> Result<FileMap, FormatError> {
        self.inner().generate_index(file_paths)
    }
}

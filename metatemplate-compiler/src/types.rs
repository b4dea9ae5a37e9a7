use std::fmt;

use serde::{Deserialize, Serialize};

/// One canonical template: the unit every format compiles.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: String,
    pub html: String,
    #[serde(default)]
    pub css: String,
}

impl Template {
    pub fn new(id: impl Into<String>, html: impl Into<String>, css: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            html: html.into(),
            css: css.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EnumOption {
    pub value: String,
    pub name: String,
}

impl EnumOption {
    pub fn new(value: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: name.into(),
        }
    }
}

/// Value sets taken from the DOM itself rather than declared by the author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NamedType {
    InputType,
    InputAutocomplete,
    ATarget,
    CrossOrigin,
    ButtonType,
    #[serde(rename = "ONCHANGE")]
    OnChange,
    #[serde(rename = "ONCLICK")]
    OnClick,
    AriaCurrent,
}

impl NamedType {
    pub fn as_str(self) -> &'static str {
        match self {
            NamedType::InputType => "INPUT_TYPE",
            NamedType::InputAutocomplete => "INPUT_AUTOCOMPLETE",
            NamedType::ATarget => "A_TARGET",
            NamedType::CrossOrigin => "CROSS_ORIGIN",
            NamedType::ButtonType => "BUTTON_TYPE",
            NamedType::OnChange => "ONCHANGE",
            NamedType::OnClick => "ONCLICK",
            NamedType::AriaCurrent => "ARIA_CURRENT",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DynamicKeyType {
    String,
    Boolean,
    Number,
    Function,
    Reference,
    Node,
    Named(NamedType),
    Enumeration(Vec<EnumOption>),
}

impl DynamicKeyType {
    pub fn options(&self) -> Option<&[EnumOption]> {
        match self {
            DynamicKeyType::Enumeration(options) => Some(options),
            _ => None,
        }
    }
}

impl fmt::Display for DynamicKeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DynamicKeyType::String => f.write_str("string"),
            DynamicKeyType::Boolean => f.write_str("boolean"),
            DynamicKeyType::Number => f.write_str("number"),
            DynamicKeyType::Function => f.write_str("function"),
            DynamicKeyType::Reference => f.write_str("reference"),
            DynamicKeyType::Node => f.write_str("node"),
            DynamicKeyType::Named(named) => f.write_str(named.as_str()),
            DynamicKeyType::Enumeration(options) => {
                let names: Vec<&str> = options.iter().map(|o| o.name.as_str()).collect();
                write!(f, "enum({})", names.join("|"))
            }
        }
    }
}

/// A runtime-bindable variable bound into one attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DynamicKey {
    /// The registered name, unique within one format run.
    pub key: String,
    pub optional: bool,
    #[serde(rename = "type")]
    pub key_type: DynamicKeyType,
    /// Only for boolean keys: the literal emitted when the key is truthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub if_true_value: Option<String>,
}

impl DynamicKey {
    pub fn new(key: impl Into<String>, key_type: DynamicKeyType, optional: bool) -> Self {
        Self {
            key: key.into(),
            optional,
            key_type,
            if_true_value: None,
        }
    }

    pub fn boolean(key: impl Into<String>, optional: bool) -> Self {
        Self::new(key, DynamicKeyType::Boolean, optional)
    }

    pub fn is_boolean(&self) -> bool {
        self.key_type == DynamicKeyType::Boolean
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateAttribute {
    /// The HTML attribute name.
    pub key: String,
    /// Static text with every marker removed.
    pub value: String,
    pub data_type: DynamicKeyType,
    pub dynamic_keys: Vec<DynamicKey>,
    pub is_omitted_if_empty: bool,
}

impl TemplateAttribute {
    pub fn is_static(&self) -> bool {
        self.dynamic_keys.is_empty()
    }

    /// Every class token this attribute could ever contain.
    pub fn possible_tokens(&self) -> Vec<String> {
        let mut tokens: Vec<String> = self.value.split_whitespace().map(str::to_string).collect();
        for dk in &self.dynamic_keys {
            if let Some(value) = &dk.if_true_value {
                tokens.extend(value.split_whitespace().map(str::to_string));
            }
            if let Some(options) = dk.key_type.options() {
                for option in options {
                    tokens.extend(option.value.split_whitespace().map(str::to_string));
                }
            }
        }
        tokens
    }
}

pub fn find_attribute<'a>(
    attributes: &'a [TemplateAttribute],
    key: &str,
) -> Option<&'a TemplateAttribute> {
    attributes.iter().find(|a| a.key == key)
}

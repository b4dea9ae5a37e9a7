//! Per-tag default attributes.
//!
//! Every tag gets the attributes a consumer would reasonably want to set, even
//! when the template author left them out. Authored attributes that already
//! carry variables are left alone; the rest are replaced by a dynamic key.

use convert_case::{Case, Casing as _};

use crate::error::RegistryError;
use crate::registry::DynamicKeyRegistry;
use crate::types::{
    DynamicKey, DynamicKeyType, EnumOption, NamedType, TemplateAttribute, find_attribute,
};

/// Input types that accept `maxlength`.
pub const TYPES_THAT_SUPPORT_MAX_LENGTH: &[&str] =
    &["text", "email", "search", "password", "tel", "url"];

/// Input types that act as buttons and so need no `name`.
pub const BUTTON_INPUT_TYPES: &[&str] = &["submit", "image", "button"];

enum Policy {
    Required,
    Optional,
    Keys(Vec<DynamicKey>),
}

pub(crate) struct Defaults<'a> {
    tag: &'a str,
    registry: &'a mut DynamicKeyRegistry,
    attributes: &'a mut Vec<TemplateAttribute>,
}

impl<'a> Defaults<'a> {
    pub(crate) fn new(
        tag: &'a str,
        registry: &'a mut DynamicKeyRegistry,
        attributes: &'a mut Vec<TemplateAttribute>,
    ) -> Self {
        Self {
            tag,
            registry,
            attributes,
        }
    }

    fn get(&self, key: &str) -> Option<&TemplateAttribute> {
        find_attribute(self.attributes, key)
    }

    fn literal(&self, key: &str) -> Option<&str> {
        self.get(key).map(|a| a.value.as_str())
    }

    fn register(
        &mut self,
        name: &str,
        key_type: DynamicKeyType,
        optional: bool,
    ) -> Result<String, RegistryError> {
        self.registry.register(name, key_type, optional, Some(self.tag))
    }

    fn boolean(&mut self, attribute: &str, name: &str) -> Result<(), RegistryError> {
        if self.is_authored_dynamic(attribute) {
            return Ok(());
        }
        let key = self.register(name, DynamicKeyType::Boolean, true)?;
        self.ensure(attribute, Policy::Keys(vec![DynamicKey::boolean(key, true)]))
    }

    fn number(&mut self, attribute: &str, name: &str) -> Result<(), RegistryError> {
        self.single(attribute, name, DynamicKeyType::Number, DynamicKeyType::Number, true)
    }

    fn named(
        &mut self,
        attribute: &str,
        name: &str,
        named: NamedType,
        optional: bool,
    ) -> Result<(), RegistryError> {
        self.single(
            attribute,
            name,
            DynamicKeyType::Named(named),
            DynamicKeyType::String,
            optional,
        )
    }

    /// One key whose registry type may differ from what the attribute renders.
    fn single(
        &mut self,
        attribute: &str,
        name: &str,
        registered: DynamicKeyType,
        rendered: DynamicKeyType,
        optional: bool,
    ) -> Result<(), RegistryError> {
        if self.is_authored_dynamic(attribute) {
            return Ok(());
        }
        let key = self.register(name, registered, optional)?;
        self.ensure(
            attribute,
            Policy::Keys(vec![DynamicKey::new(key, rendered, optional)]),
        )
    }

    /// A string key named after the attribute itself.
    fn attribute_key(
        &mut self,
        attribute: &str,
        optional: bool,
    ) -> Result<DynamicKey, RegistryError> {
        let name = attribute.to_case(Case::Camel);
        let key = self.register(&name, DynamicKeyType::String, optional)?;
        Ok(DynamicKey::new(key, DynamicKeyType::String, optional))
    }

    fn is_authored_dynamic(&self, attribute: &str) -> bool {
        self.get(attribute).is_some_and(|a| !a.is_static())
    }

    fn ensure(&mut self, attribute: &str, policy: Policy) -> Result<(), RegistryError> {
        if self.is_authored_dynamic(attribute) {
            return Ok(());
        }
        let dynamic_keys = match policy {
            Policy::Keys(keys) => keys,
            Policy::Required => vec![self.attribute_key(attribute, false)?],
            Policy::Optional => vec![self.attribute_key(attribute, true)?],
        };
        let data_type = match dynamic_keys.first().map(|k| &k.key_type) {
            Some(DynamicKeyType::Enumeration(options)) => {
                DynamicKeyType::Enumeration(options.clone())
            }
            _ => crate::attributes::data_type_for(self.tag, attribute),
        };
        let replacement = TemplateAttribute {
            key: attribute.to_string(),
            value: String::new(),
            data_type,
            dynamic_keys,
            is_omitted_if_empty: true,
        };
        match self.attributes.iter_mut().find(|a| a.key == attribute) {
            Some(existing) => *existing = replacement,
            None => self.attributes.push(replacement),
        }
        Ok(())
    }

    pub(crate) fn apply(mut self) -> Result<(), RegistryError> {
        match self.tag.to_ascii_lowercase().as_str() {
            "html" => self.ensure("lang", Policy::Required)?,
            "link" => {
                self.ensure("href", Policy::Required)?;
                self.ensure("rel", Policy::Optional)?;
            }
            "meta" => {
                for attribute in ["name", "http-equiv", "charset", "content"] {
                    self.ensure(attribute, Policy::Optional)?;
                }
            }
            "details" => self.boolean("open", "open")?,
            "input" => self.input()?,
            "textarea" => {
                self.ensure("name", Policy::Required)?;
                self.boolean("disabled", "disabled")?;
                self.boolean("readonly", "readOnly")?;
                self.number("rows", "rows")?;
                self.number("cols", "cols")?;
                self.boolean("autofocus", "autoFocus")?;
                self.boolean("spellcheck", "spellCheck")?;
                self.named(
                    "autocomplete",
                    "autoComplete",
                    NamedType::InputAutocomplete,
                    false,
                )?;
                self.number("maxlength", "maxLength")?;
                // modelled as an attribute rather than child text
                self.ensure("value", Policy::Optional)?;
            }
            "select" => {
                self.ensure("name", Policy::Required)?;
                self.boolean("multiple", "multiple")?;
            }
            "option" => self.boolean("selected", "selected")?,
            "a" => {
                // an anchor without href is an id target, and any element can
                // carry an id
                self.ensure("href", Policy::Required)?;
                self.ensure("rel", Policy::Optional)?;
                self.named("target", "target", NamedType::ATarget, true)?;
            }
            "abbr" => self.ensure("title", Policy::Required)?,
            "time" => self.ensure("datetime", Policy::Required)?,
            "img" => {
                self.ensure("src", Policy::Required)?;
                self.ensure("width", Policy::Optional)?;
                self.ensure("height", Policy::Optional)?;
                self.ensure("srcset", Policy::Optional)?;
                self.named("crossorigin", "crossOrigin", NamedType::CrossOrigin, true)?;
            }
            "audio" => {
                self.ensure("src", Policy::Optional)?;
                self.media_flags()?;
            }
            "video" => {
                self.ensure("src", Policy::Optional)?;
                self.ensure("width", Policy::Optional)?;
                self.ensure("height", Policy::Optional)?;
                self.ensure("poster", Policy::Optional)?;
                self.media_flags()?;
                if !self.is_authored_dynamic("crossorigin") {
                    let key = self.register(
                        "crossOrigin",
                        DynamicKeyType::Named(NamedType::CrossOrigin),
                        true,
                    )?;
                    let options = DynamicKeyType::Enumeration(vec![
                        EnumOption::new("anonymous", "anonymous"),
                        EnumOption::new("use-credentials", "use-credentials"),
                    ]);
                    self.ensure(
                        "crossorigin",
                        Policy::Keys(vec![DynamicKey::new(key, options, true)]),
                    )?;
                }
            }
            "iframe" => {
                self.ensure("src", Policy::Optional)?;
                self.ensure("width", Policy::Optional)?;
                self.ensure("height", Policy::Optional)?;
                self.single(
                    "allow",
                    "allow",
                    DynamicKeyType::String,
                    DynamicKeyType::String,
                    true,
                )?;
                self.boolean("allowfullscreen", "allowFullscreen")?;
                self.boolean("allowpaymentrequest", "allowPaymentRequest")?;
            }
            "td" => {
                self.ensure("colspan", Policy::Optional)?;
                self.ensure("rowspan", Policy::Optional)?;
            }
            "button" => {
                self.ensure("name", Policy::Optional)?;
                self.named("type", "type", NamedType::ButtonType, true)?;
            }
            // `label` only has `for`, which the id synonyms already cover
            _ => {}
        }
        Ok(())
    }

    fn media_flags(&mut self) -> Result<(), RegistryError> {
        for attribute in ["controls", "autoplay", "muted", "preload", "loop"] {
            self.boolean(attribute, attribute)?;
        }
        Ok(())
    }

    fn input(&mut self) -> Result<(), RegistryError> {
        let name_literal = self.literal("name").unwrap_or_default().to_string();
        let value_literal = self.literal("value").unwrap_or_default().to_string();
        let input_type = self.literal("type").map(str::to_string);

        self.boolean("disabled", "disabled")?;
        self.boolean("readonly", "readOnly")?;
        self.boolean("autofocus", "autoFocus")?;

        let name_optional = is_name_optional(input_type.as_deref());
        if name_literal.is_empty() {
            self.ensure(
                "name",
                if name_optional {
                    Policy::Optional
                } else {
                    Policy::Required
                },
            )?;
        } else {
            self.single(
                "name",
                &literal_key(&name_literal),
                DynamicKeyType::String,
                DynamicKeyType::String,
                name_optional,
            )?;
        }

        let is_checked = matches!(input_type.as_deref(), Some("radio" | "checkbox"));
        let is_file = input_type.as_deref() == Some("file");

        if !is_file {
            // <input type=file> has a value that can't be set
            if value_literal.is_empty() {
                self.ensure("value", Policy::Optional)?;
            } else {
                self.single(
                    "value",
                    &literal_key(&value_literal),
                    DynamicKeyType::String,
                    DynamicKeyType::String,
                    true,
                )?;
            }
        }

        if is_checked {
            self.boolean("checked", "checked")?;
            return Ok(());
        }
        if is_file {
            return Ok(());
        }

        // anything else is treated as a text box
        if matches!(input_type.as_deref(), None | Some("number")) {
            self.number("min", "min")?;
            self.number("max", "max")?;
        }
        if input_type.is_none() {
            self.named("type", "type", NamedType::InputType, false)?;
        }
        self.boolean("spellcheck", "spellCheck")?;

        let supports_max_length = input_type
            .as_deref()
            .is_none_or(|t| TYPES_THAT_SUPPORT_MAX_LENGTH.contains(&t));
        let has_max_length = self.get("maxlength").is_some();
        if has_max_length && !supports_max_length {
            log::warn!(
                "input type={:?} and maxlength are incompatible, see https://html.spec.whatwg.org/multipage/input.html#do-not-apply",
                input_type.as_deref().unwrap_or_default()
            );
        }
        if !has_max_length && supports_max_length {
            self.number("maxlength", "maxLength")?;
        }
        if let Some(max_length) = self.attributes.iter_mut().find(|a| a.key == "maxlength") {
            max_length.is_omitted_if_empty = true;
        }

        self.named(
            "autocomplete",
            "autoComplete",
            NamedType::InputAutocomplete,
            false,
        )?;
        Ok(())
    }
}

/// An authored literal as a key name: kept as written when it is already an
/// identifier, camelCased otherwise (`first-name` becomes `firstName`).
fn literal_key(literal: &str) -> String {
    let mut chars = literal.chars();
    let is_identifier = chars
        .next()
        .is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if is_identifier {
        literal.to_string()
    } else {
        literal.to_case(Case::Camel)
    }
}

/// `name` may be left unset only on a button-like input whose type was
/// written out literally. A missing type is an implicit `text`.
pub fn is_name_optional(input_type: Option<&str>) -> bool {
    input_type.is_some_and(|t| BUTTON_INPUT_TYPES.contains(&t))
}

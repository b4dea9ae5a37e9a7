//! Attribute compiler: one element's attributes in, `TemplateAttribute`s out.

use std::collections::HashSet;

use convert_case::{Case, Casing as _};
use metatemplate_dom::{NodeAccess, read_attribute};

use crate::error::{AttributeError, CompileError};
use crate::registry::DynamicKeyRegistry;
use crate::ruleset::Defaults;
use crate::types::{DynamicKey, DynamicKeyType, NamedType, Template, TemplateAttribute};
use crate::variable::parse_attribute_value;

/// Attributes whose values are ids of other elements. The same id anywhere in
/// a template is the same variable.
pub const ID_SYNONYMS: &[&str] = &[
    "id",
    "for",
    "aria-controls",
    "aria-labelledby",
    "aria-describedby",
];

const BOOLEAN_ATTRIBUTES: &[&str] = &[
    "allowfullscreen",
    "allowpaymentrequest",
    "aria-expanded",
    "aria-hidden",
    "aria-pressed",
    "aria-selected",
    "autofocus",
    "autoplay",
    "checked",
    "controls",
    "disabled",
    "hidden",
    "loop",
    "multiple",
    "muted",
    "novalidate",
    "open",
    "readonly",
    "required",
    "selected",
    "spellcheck",
];

const NUMERIC_ATTRIBUTES: &[&str] = &[
    "cols",
    "colspan",
    "max",
    "maxlength",
    "min",
    "minlength",
    "rows",
    "rowspan",
    "size",
    "step",
    "tabindex",
];

/// The value type an attribute carries on a given element.
pub fn data_type_for(tag: &str, key: &str) -> DynamicKeyType {
    let key = key.to_ascii_lowercase();
    match (tag.to_ascii_lowercase().as_str(), key.as_str()) {
        ("audio" | "video", "preload") => DynamicKeyType::Boolean,
        (_, k) if BOOLEAN_ATTRIBUTES.contains(&k) => DynamicKeyType::Boolean,
        (_, k) if NUMERIC_ATTRIBUTES.contains(&k) => DynamicKeyType::Number,
        _ => DynamicKeyType::String,
    }
}

/// Key type for plain `{{ key }}` markers in this attribute.
fn string_type_for(key: &str) -> DynamicKeyType {
    match key {
        "aria-current" => DynamicKeyType::Named(NamedType::AriaCurrent),
        _ => DynamicKeyType::String,
    }
}

/// Compiles one element's attributes against a format's registry.
///
/// Attribute names are processed in sorted order so output never depends on
/// how the author ordered them. Any failure aborts the template.
pub fn compile_attributes<N: NodeAccess + ?Sized>(
    tag_name: &str,
    node: &N,
    registry: &mut DynamicKeyRegistry,
    template: &Template,
) -> Result<Vec<TemplateAttribute>, CompileError> {
    compile(tag_name, node, registry).map_err(|source| CompileError::Attribute {
        template_id: template.id.clone(),
        snippet: describe(tag_name, node),
        source,
    })
}

fn compile<N: NodeAccess + ?Sized>(
    tag_name: &str,
    node: &N,
    registry: &mut DynamicKeyRegistry,
) -> Result<Vec<TemplateAttribute>, AttributeError> {
    let tag = tag_name.to_ascii_lowercase();
    let mut names = node.attribute_names()?;
    names.sort();

    let mut attributes = Vec::with_capacity(names.len());
    for name in names {
        let raw = read_attribute(node, &name)?;
        let parsed = parse_attribute_value(&raw, registry, &tag, &string_type_for(&name))
            .map_err(|source| AttributeError::Variable {
                attribute: name.clone(),
                source,
            })?;
        log::trace!("<{tag}> {name}: {} key(s)", parsed.dynamic_keys.len());
        attributes.push(TemplateAttribute {
            data_type: data_type_for(&tag, &name),
            key: name,
            value: parsed.value,
            dynamic_keys: parsed.dynamic_keys,
            is_omitted_if_empty: false,
        });
    }

    apply_id_synonyms(&tag, &mut attributes, registry)?;
    Defaults::new(&tag, registry, &mut attributes).apply()?;
    validate(&attributes)?;
    Ok(attributes)
}

fn apply_id_synonyms(
    tag: &str,
    attributes: &mut [TemplateAttribute],
    registry: &mut DynamicKeyRegistry,
) -> Result<(), AttributeError> {
    for synonym in ID_SYNONYMS {
        let Some(attribute) = attributes.iter_mut().find(|a| a.key == *synonym) else {
            continue;
        };
        if attribute.value.is_empty() {
            continue;
        }
        let mut dynamic_keys = Vec::new();
        for token in attribute.value.split_whitespace() {
            let name = token.to_case(Case::Camel);
            if name.is_empty() {
                return Err(AttributeError::InvalidIdSynonym {
                    attribute: synonym.to_string(),
                    value: attribute.value.clone(),
                });
            }
            let key = registry.share(&name, DynamicKeyType::String, true, Some(tag))?;
            // optional: one attribute can point at several ids
            dynamic_keys.push(DynamicKey::new(key, DynamicKeyType::String, true));
        }
        attribute.value.clear();
        attribute.data_type = DynamicKeyType::String;
        attribute.dynamic_keys = dynamic_keys;
        attribute.is_omitted_if_empty = true;
    }
    Ok(())
}

fn validate(attributes: &[TemplateAttribute]) -> Result<(), AttributeError> {
    let mut seen = HashSet::new();
    for attribute in attributes {
        if !seen.insert(attribute.key.as_str()) {
            return Err(AttributeError::DuplicateKey {
                key: attribute.key.clone(),
            });
        }
    }
    Ok(())
}

/// `<tag a="..." b="...">` as read through the node, for error messages.
fn describe<N: NodeAccess + ?Sized>(tag_name: &str, node: &N) -> String {
    let mut out = format!("<{tag_name}");
    for name in node.attribute_names().unwrap_or_default() {
        let value = read_attribute(node, &name).unwrap_or_default();
        out.push_str(&format!(" {name}=\"{value}\""));
    }
    out.push('>');
    out
}

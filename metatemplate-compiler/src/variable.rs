//! `{{ key[?][: options] }}` markers inside attribute values.

use pest::Parser;
use pest::iterators::Pair;

use crate::error::VariableError;
use crate::registry::DynamicKeyRegistry;
use crate::types::{DynamicKey, DynamicKeyType, EnumOption};

#[derive(pest_derive::Parser)]
#[grammar = "grammar.pest"]
struct ValueParser;

/// One marker before registration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Marker {
    pub key: String,
    pub optional: bool,
    /// `None` when the marker had no `:`.
    pub options: Option<Vec<EnumOption>>,
    /// The marker as written, braces included.
    pub source: String,
}

impl Marker {
    /// The key type the marker asks for; plain markers get `string_type`.
    pub fn key_type(&self, string_type: &DynamicKeyType) -> DynamicKeyType {
        match &self.options {
            Some(options) if options.len() >= 2 => DynamicKeyType::Enumeration(options.clone()),
            Some(_) => DynamicKeyType::Boolean,
            None => string_type.clone(),
        }
    }

    fn if_true_value(&self) -> Option<String> {
        match self.options.as_deref() {
            Some([only]) => Some(only.value.clone()),
            _ => None,
        }
    }
}

/// The static text of `raw` (markers removed, trimmed) and its markers in
/// left-to-right order.
pub fn parse_markers(raw: &str) -> Result<(String, Vec<Marker>), VariableError> {
    let mut pairs = ValueParser::parse(Rule::value, raw).map_err(|e| VariableError::Syntax {
        value: raw.to_string(),
        message: e.to_string(),
    })?;
    let Some(value) = pairs.next() else {
        return Ok((raw.trim().to_string(), Vec::new()));
    };

    let mut text = String::new();
    let mut markers = Vec::new();
    for pair in value.into_inner() {
        match pair.as_rule() {
            Rule::text => text.push_str(pair.as_str()),
            Rule::marker => markers.push(marker(pair)?),
            _ => {}
        }
    }
    Ok((text.trim().to_string(), markers))
}

fn marker(pair: Pair<'_, Rule>) -> Result<Marker, VariableError> {
    let source = pair.as_str().to_string();
    let mut key_segment = "";
    let mut options = None;
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::key => key_segment = inner.as_str(),
            Rule::options => {
                let parsed = inner
                    .into_inner()
                    .map(|option| enum_option(option.as_str()))
                    .collect::<Vec<_>>();
                options = Some(parsed);
            }
            _ => {}
        }
    }

    let optional = key_segment.contains('?');
    let key = key_segment.replacen('?', "", 1).trim().to_string();
    if key.is_empty() {
        return Err(VariableError::BlankKey { expression: source });
    }
    if let Some(options) = &options
        && options.iter().any(|o| o.value.is_empty() || o.name.is_empty())
    {
        return Err(VariableError::EmptyOption { expression: source });
    }

    Ok(Marker {
        key,
        optional,
        options,
        source,
    })
}

/// `value` or `value as name`.
fn enum_option(token: &str) -> EnumOption {
    match token.split_once(" as ") {
        Some((value, name)) => EnumOption::new(value.trim(), name.trim()),
        None => EnumOption::new(token.trim(), token.trim()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedValue {
    pub value: String,
    pub dynamic_keys: Vec<DynamicKey>,
}

/// Parses `raw` and registers every marker's key in order.
pub fn parse_attribute_value(
    raw: &str,
    registry: &mut DynamicKeyRegistry,
    tag: &str,
    string_type: &DynamicKeyType,
) -> Result<ParsedValue, VariableError> {
    let (value, markers) = parse_markers(raw)?;
    let mut dynamic_keys = Vec::with_capacity(markers.len());
    for marker in markers {
        let key_type = marker.key_type(string_type);
        let key = registry
            .register_marker(&marker.key, key_type.clone(), marker.optional, Some(tag))
            .map_err(|source| VariableError::Registry {
                expression: marker.source.clone(),
                source,
            })?;
        dynamic_keys.push(DynamicKey {
            key,
            optional: marker.optional,
            if_true_value: marker.if_true_value(),
            key_type,
        });
    }
    Ok(ParsedValue {
        value,
        dynamic_keys,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(raw: &str) -> ParsedValue {
        let mut registry = DynamicKeyRegistry::new();
        parse_attribute_value(raw, &mut registry, "div", &DynamicKeyType::String).unwrap()
    }

    #[test]
    fn plain_values_have_no_keys() {
        assert_eq!(
            parse("  g-flex-row  "),
            ParsedValue {
                value: "g-flex-row".into(),
                dynamic_keys: vec![]
            }
        );
    }

    #[test]
    fn string_marker() {
        let parsed = parse("{{ href }}");
        assert_eq!(parsed.value, "");
        assert_eq!(
            parsed.dynamic_keys,
            vec![DynamicKey::new("href", DynamicKeyType::String, false)]
        );
    }

    #[test]
    fn boolean_sugar() {
        let parsed = parse("{{ isOpen?: open }}");
        assert_eq!(
            parsed.dynamic_keys,
            vec![DynamicKey {
                key: "isOpen".into(),
                optional: true,
                key_type: DynamicKeyType::Boolean,
                if_true_value: Some("open".into()),
            }]
        );
    }

    #[test]
    fn enumeration_with_and_without_names() {
        let parsed = parse("{{ level: a as x | b as y | c }}");
        assert_eq!(
            parsed.dynamic_keys[0].key_type,
            DynamicKeyType::Enumeration(vec![
                EnumOption::new("a", "x"),
                EnumOption::new("b", "y"),
                EnumOption::new("c", "c"),
            ])
        );
        assert_eq!(parsed.dynamic_keys[0].if_true_value, None);
    }

    #[test]
    fn static_text_between_markers_is_kept() {
        let parsed = parse("g-flex-row {{ isReversed?: g-flex-reverse }} g-gap {{ size: s | l }}");
        assert_eq!(parsed.value, "g-flex-row  g-gap");
        let keys: Vec<_> = parsed.dynamic_keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, vec!["isReversed", "size"]);
    }

    #[test]
    fn repeated_keys_in_one_value_are_suffixed() {
        let parsed = parse("{{ a }} {{ a }}");
        let keys: Vec<_> = parsed.dynamic_keys.iter().map(|k| k.key.as_str()).collect();
        assert_eq!(keys, vec!["a", "a2"]);
    }

    #[test]
    fn unterminated_marker_is_text() {
        let (value, markers) = parse_markers("a {{ b").unwrap();
        assert_eq!(value, "a {{ b");
        assert!(markers.is_empty());
    }

    #[test]
    fn blank_key_is_an_error() {
        assert!(matches!(
            parse_markers("{{ ?: open }}"),
            Err(VariableError::BlankKey { .. })
        ));
    }

    #[test]
    fn empty_option_is_an_error() {
        assert!(matches!(
            parse_markers("{{ level: a | }}"),
            Err(VariableError::EmptyOption { .. })
        ));
    }
}

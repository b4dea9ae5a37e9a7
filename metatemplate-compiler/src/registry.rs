use std::collections::HashSet;

use indexmap::IndexMap;

use crate::error::RegistryError;
use crate::types::DynamicKeyType;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDefinition {
    pub key_type: DynamicKeyType,
    pub optional: bool,
    /// Tag of the element the key was first registered for, when known.
    pub tag: Option<String>,
}

/// Names handed out during one format's compilation of one template.
///
/// Registration order is kept so generated declarations are stable.
#[derive(Debug, Clone, Default)]
pub struct DynamicKeyRegistry {
    keys: IndexMap<String, KeyDefinition>,
    // names bound by <mt-if>/<mt-variable> somewhere in the template
    reserved: HashSet<String>,
}

impl DynamicKeyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `name`, or `name2`, `name3`... when it is taken.
    pub fn register(
        &mut self,
        name: &str,
        key_type: DynamicKeyType,
        optional: bool,
        tag: Option<&str>,
    ) -> Result<String, RegistryError> {
        let name = checked_name(name, &key_type)?;
        let safe = self.unused_name(name);
        if safe != name {
            log::debug!("dynamic key {name:?} is taken, using {safe:?}");
        } else {
            log::debug!("registered dynamic key {safe:?} ({key_type})");
        }
        self.keys.insert(
            safe.clone(),
            KeyDefinition {
                key_type,
                optional,
                tag: tag.map(str::to_string),
            },
        );
        Ok(safe)
    }

    /// Registers `name` unless it already exists, in which case the existing
    /// key is reused. A key becomes required if any sharer requires it.
    pub fn share(
        &mut self,
        name: &str,
        key_type: DynamicKeyType,
        optional: bool,
        tag: Option<&str>,
    ) -> Result<String, RegistryError> {
        let name = checked_name(name, &key_type)?;
        if let Some(existing) = self.keys.get_mut(name) {
            existing.optional &= optional;
            return Ok(name.to_string());
        }
        self.register(name, key_type, optional, tag)
    }

    /// Marks `name` as bound by a template-level tag. Markers with that name
    /// then share one key wherever they appear in the document.
    pub fn reserve(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.reserved.insert(name.to_string());
        }
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.reserved.contains(name.trim())
    }

    /// Registration for attribute markers. A reserved name that is already
    /// registered is reused and takes the marker's type; anything else goes
    /// through [`register`](Self::register).
    pub fn register_marker(
        &mut self,
        name: &str,
        key_type: DynamicKeyType,
        optional: bool,
        tag: Option<&str>,
    ) -> Result<String, RegistryError> {
        let name = checked_name(name, &key_type)?;
        if self.reserved.contains(name)
            && let Some(existing) = self.keys.get_mut(name)
        {
            log::debug!("marker reuses reserved key {name:?} as {key_type}");
            existing.key_type = key_type;
            existing.optional &= optional;
            if existing.tag.is_none() {
                existing.tag = tag.map(str::to_string);
            }
            return Ok(name.to_string());
        }
        self.register(name, key_type, optional, tag)
    }

    pub fn get(&self, name: &str) -> Option<&KeyDefinition> {
        self.keys.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.keys.contains_key(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &KeyDefinition)> {
        self.keys.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.keys.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    fn unused_name(&self, name: &str) -> String {
        if !self.keys.contains_key(name) {
            return name.to_string();
        }
        (2..)
            .map(|n| format!("{name}{n}"))
            .find(|candidate| !self.keys.contains_key(candidate))
            .unwrap_or_else(|| name.to_string())
    }
}

fn checked_name<'a>(name: &'a str, key_type: &DynamicKeyType) -> Result<&'a str, RegistryError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(RegistryError::BlankName {
            key_type: key_type.to_string(),
        });
    }
    Ok(name)
}

/// Picks a name not in `taken` the same way the registry does, for names
/// that are not dynamic keys (e.g. generated component names).
pub fn unique_name(name: &str, taken: &mut Vec<String>) -> String {
    let candidate = if taken.iter().any(|t| t == name) {
        (2..)
            .map(|n| format!("{name}{n}"))
            .find(|c| !taken.contains(c))
            .unwrap_or_else(|| name.to_string())
    } else {
        name.to_string()
    };
    taken.push(candidate.clone());
    candidate
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn suffixes_collisions() {
        let mut registry = DynamicKeyRegistry::new();
        let keys: Vec<String> = (0..3)
            .map(|_| {
                registry
                    .register("onClick", DynamicKeyType::Function, true, Some("button"))
                    .unwrap()
            })
            .collect();
        assert_eq!(keys, vec!["onClick", "onClick2", "onClick3"]);
    }

    #[test]
    fn suffix_skips_names_taken_explicitly() {
        let mut registry = DynamicKeyRegistry::new();
        registry.register("href2", DynamicKeyType::String, true, None).unwrap();
        registry.register("href", DynamicKeyType::String, true, None).unwrap();
        assert_eq!(
            registry.register("href", DynamicKeyType::String, true, None).unwrap(),
            "href3"
        );
    }

    #[test]
    fn rejects_blank_names() {
        let mut registry = DynamicKeyRegistry::new();
        assert!(matches!(
            registry.register("  ", DynamicKeyType::String, false, None),
            Err(RegistryError::BlankName { .. })
        ));
        assert!(registry.is_empty());
    }

    #[test]
    fn shared_names_are_reused_and_required_wins() {
        let mut registry = DynamicKeyRegistry::new();
        registry.share("textId", DynamicKeyType::String, true, Some("input")).unwrap();
        let again = registry
            .share("textId", DynamicKeyType::String, false, Some("label"))
            .unwrap();
        assert_eq!(again, "textId");
        assert_eq!(registry.len(), 1);
        let def = registry.get("textId").unwrap();
        assert!(!def.optional);
        assert_eq!(def.tag.as_deref(), Some("input"));
    }

    #[test]
    fn markers_reuse_reserved_keys_in_either_order() {
        let mut condition_first = DynamicKeyRegistry::new();
        condition_first.reserve("isOpen");
        condition_first.share("isOpen", DynamicKeyType::String, true, None).unwrap();
        let key = condition_first
            .register_marker("isOpen", DynamicKeyType::Boolean, true, Some("div"))
            .unwrap();
        assert_eq!(key, "isOpen");

        let mut marker_first = DynamicKeyRegistry::new();
        marker_first.reserve("isOpen");
        marker_first
            .register_marker("isOpen", DynamicKeyType::Boolean, true, Some("div"))
            .unwrap();
        marker_first
            .register_marker("isOpen", DynamicKeyType::Boolean, true, Some("div"))
            .unwrap();
        marker_first.share("isOpen", DynamicKeyType::String, true, None).unwrap();

        for registry in [&condition_first, &marker_first] {
            assert_eq!(registry.names().collect::<Vec<_>>(), vec!["isOpen"]);
            let def = registry.get("isOpen").unwrap();
            assert_eq!(def.key_type, DynamicKeyType::Boolean);
            assert_eq!(def.tag.as_deref(), Some("div"));
        }
    }

    #[test]
    fn unreserved_markers_still_suffix() {
        let mut registry = DynamicKeyRegistry::new();
        registry.share("isOpen", DynamicKeyType::String, true, None).unwrap();
        assert_eq!(
            registry
                .register_marker("isOpen", DynamicKeyType::Boolean, true, None)
                .unwrap(),
            "isOpen2"
        );
    }

    #[test]
    fn unique_component_names() {
        let mut taken = Vec::new();
        assert_eq!(unique_name("StyledDiv", &mut taken), "StyledDiv");
        assert_eq!(unique_name("StyledDiv", &mut taken), "StyledDiv2");
    }
}

use serde::{Deserialize, Serialize};

use crate::{DomError, Element};

/// The inverse of one attribute mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Undo {
    Restore { name: String, value: String },
    Remove { name: String },
    AddClass { class: String },
    RemoveClass { class: String },
    Nothing,
}

/// Attribute-level access to one element, whether it lives in this process or
/// in a remote browser. Every mutation hands back the [`Undo`] that reverses it.
pub trait NodeAccess {
    fn tag_name(&self) -> Result<String, DomError>;

    /// Attribute names in source order.
    fn attribute_names(&self) -> Result<Vec<String>, DomError>;

    fn attribute(&self, name: &str) -> Result<Option<String>, DomError>;

    /// The value before any transformation touched the attribute.
    fn original_attribute(&self, name: &str) -> Result<Option<String>, DomError>;

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<Undo, DomError>;

    fn remove_attribute(&mut self, name: &str) -> Result<Undo, DomError>;

    fn add_class(&mut self, class: &str) -> Result<Undo, DomError>;

    fn remove_class(&mut self, class: &str) -> Result<Undo, DomError>;

    fn apply_undo(&mut self, undo: Undo) -> Result<(), DomError> {
        match undo {
            Undo::Restore { name, value } => self.set_attribute(&name, &value).map(drop),
            Undo::Remove { name } => self.remove_attribute(&name).map(drop),
            Undo::AddClass { class } => self.add_class(&class).map(drop),
            Undo::RemoveClass { class } => self.remove_class(&class).map(drop),
            Undo::Nothing => Ok(()),
        }
    }
}

/// Reads an attribute the way the compiler wants it: the pre-transformation
/// value wins when there is one, a missing attribute reads as empty.
pub fn read_attribute<N: NodeAccess + ?Sized>(node: &N, name: &str) -> Result<String, DomError> {
    if let Some(original) = node.original_attribute(name)?
        && !original.is_empty()
    {
        return Ok(original);
    }
    Ok(node.attribute(name)?.unwrap_or_default())
}

impl NodeAccess for Element {
    fn tag_name(&self) -> Result<String, DomError> {
        Ok(self.tag.clone())
    }

    fn attribute_names(&self) -> Result<Vec<String>, DomError> {
        Ok(self.attrs.iter().map(|a| a.name.clone()).collect())
    }

    fn attribute(&self, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.get(name).map(str::to_string))
    }

    fn original_attribute(&self, name: &str) -> Result<Option<String>, DomError> {
        Ok(self.original(name).map(str::to_string))
    }

    fn set_attribute(&mut self, name: &str, value: &str) -> Result<Undo, DomError> {
        self.remember_original(name);
        Ok(match self.put(name.to_string(), value.to_string()) {
            Some(previous) => Undo::Restore {
                name: name.to_string(),
                value: previous,
            },
            None => Undo::Remove {
                name: name.to_string(),
            },
        })
    }

    fn remove_attribute(&mut self, name: &str) -> Result<Undo, DomError> {
        self.remember_original(name);
        Ok(match self.take(name) {
            Some(previous) => Undo::Restore {
                name: name.to_string(),
                value: previous,
            },
            None => Undo::Nothing,
        })
    }

    fn add_class(&mut self, class: &str) -> Result<Undo, DomError> {
        let mut classes: Vec<String> = self.class_list().into_iter().map(str::to_string).collect();
        if classes.iter().any(|c| c == class) {
            return Ok(Undo::Nothing);
        }
        classes.push(class.to_string());
        self.remember_original("class");
        self.put("class".to_string(), classes.join(" "));
        Ok(Undo::RemoveClass {
            class: class.to_string(),
        })
    }

    fn remove_class(&mut self, class: &str) -> Result<Undo, DomError> {
        let classes = self.class_list();
        if !classes.contains(&class) {
            return Ok(Undo::Nothing);
        }
        let remaining: Vec<String> = classes
            .into_iter()
            .filter(|c| *c != class)
            .map(str::to_string)
            .collect();
        self.remember_original("class");
        self.put("class".to_string(), remaining.join(" "));
        Ok(Undo::AddClass {
            class: class.to_string(),
        })
    }
}

/// Mutations that are rolled back when the guard goes away.
///
/// Call [`Scoped::rollback`] to observe rollback errors; dropping the guard
/// rolls back too and logs any failure.
pub struct Scoped<'a, N: NodeAccess + ?Sized> {
    node: &'a mut N,
    undo: Vec<Undo>,
}

impl<'a, N: NodeAccess + ?Sized> Scoped<'a, N> {
    pub fn new(node: &'a mut N) -> Self {
        Self {
            node,
            undo: Vec::new(),
        }
    }

    /// `class` is additive: each token is added to the class list instead of
    /// replacing it.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> Result<(), DomError> {
        if name == "class" {
            for class in value.split_whitespace() {
                self.add_class(class)?;
            }
            return Ok(());
        }
        let undo = self.node.set_attribute(name, value)?;
        self.undo.push(undo);
        Ok(())
    }

    pub fn remove_attribute(&mut self, name: &str) -> Result<(), DomError> {
        let undo = self.node.remove_attribute(name)?;
        self.undo.push(undo);
        Ok(())
    }

    pub fn add_class(&mut self, class: &str) -> Result<(), DomError> {
        let undo = self.node.add_class(class)?;
        self.undo.push(undo);
        Ok(())
    }

    pub fn node(&self) -> &N {
        &*self.node
    }

    pub fn node_mut(&mut self) -> &mut N {
        &mut *self.node
    }

    pub fn pending(&self) -> usize {
        self.undo.len()
    }

    pub fn rollback(mut self) -> Result<(), DomError> {
        self.unwind()
    }

    fn unwind(&mut self) -> Result<(), DomError> {
        while let Some(undo) = self.undo.pop() {
            self.node.apply_undo(undo)?;
        }
        Ok(())
    }
}

impl<N: NodeAccess + ?Sized> Drop for Scoped<'_, N> {
    fn drop(&mut self) {
        if let Err(e) = self.unwind() {
            log::warn!("failed to roll back attribute mutation: {e}");
        }
    }
}

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ElementId(pub usize);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "element#{}", self.0)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DomError {
    #[error("unknown element {0}")]
    UnknownElement(ElementId),
    #[error("cannot append {child} to its own descendant {parent}")]
    Cycle { parent: ElementId, child: ElementId },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomPatch {
    CreateElement {
        element: ElementId,
        tag_name: String,
    },
    AppendChild {
        parent: ElementId,
        child: ElementId,
    },
    Attribute {
        element: ElementId,
        name: String,
        value: String,
    },
    RemoveAttribute {
        element: ElementId,
        name: String,
    },
}

/// Attribute primitive shared by the binder (writes) and the delegated
/// listener (reads).
pub trait DomHelper {
    fn set_attribute(&mut self, element: ElementId, name: &str, value: &str)
        -> Result<(), DomError>;

    fn get_attribute(&self, element: ElementId, name: &str) -> Option<String>;

    fn remove_attribute(&mut self, element: ElementId, name: &str) -> Result<(), DomError>;
}

#[derive(Debug)]
struct ElementData {
    tag_name: String,
    parent: Option<ElementId>,
    attributes: BTreeMap<String, String>,
}

/// Minimal element tree that records every mutation as a [`DomPatch`].
#[derive(Debug, Default)]
pub struct MemoryDom {
    elements: HashMap<ElementId, ElementData>,
    next_id: usize,
    mutations: Vec<DomPatch>,
}

impl MemoryDom {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_element(&mut self, tag_name: &str) -> ElementId {
        let element = ElementId(self.next_id);
        self.next_id += 1;
        self.elements.insert(
            element,
            ElementData {
                tag_name: tag_name.to_string(),
                parent: None,
                attributes: BTreeMap::new(),
            },
        );
        self.mutations.push(DomPatch::CreateElement {
            element,
            tag_name: tag_name.to_string(),
        });
        element
    }

    pub fn append_child(&mut self, parent: ElementId, child: ElementId) -> Result<(), DomError> {
        if !self.elements.contains_key(&parent) {
            return Err(DomError::UnknownElement(parent));
        }
        if self.node_chain(parent).contains(&child) {
            return Err(DomError::Cycle { parent, child });
        }
        let data = self
            .elements
            .get_mut(&child)
            .ok_or(DomError::UnknownElement(child))?;
        data.parent = Some(parent);
        self.mutations.push(DomPatch::AppendChild { parent, child });
        Ok(())
    }

    pub fn contains(&self, element: ElementId) -> bool {
        self.elements.contains_key(&element)
    }

    pub fn tag_name(&self, element: ElementId) -> Option<&str> {
        self.elements
            .get(&element)
            .map(|data| data.tag_name.as_str())
    }

    pub fn parent(&self, element: ElementId) -> Option<ElementId> {
        self.elements.get(&element).and_then(|data| data.parent)
    }

    /// Propagation path of an event fired on `element`, target first.
    pub fn node_chain(&self, element: ElementId) -> Vec<ElementId> {
        let mut chain = Vec::new();
        let mut current = self.contains(element).then_some(element);
        while let Some(id) = current {
            chain.push(id);
            current = self.parent(id);
        }
        chain
    }

    pub fn drain_mutations(&mut self) -> Vec<DomPatch> {
        std::mem::take(&mut self.mutations)
    }
}

impl DomHelper for MemoryDom {
    fn set_attribute(
        &mut self,
        element: ElementId,
        name: &str,
        value: &str,
    ) -> Result<(), DomError> {
        let data = self
            .elements
            .get_mut(&element)
            .ok_or(DomError::UnknownElement(element))?;
        data.attributes.insert(name.to_string(), value.to_string());
        self.mutations.push(DomPatch::Attribute {
            element,
            name: name.to_string(),
            value: value.to_string(),
        });
        Ok(())
    }

    fn get_attribute(&self, element: ElementId, name: &str) -> Option<String> {
        self.elements
            .get(&element)
            .and_then(|data| data.attributes.get(name).cloned())
    }

    fn remove_attribute(&mut self, element: ElementId, name: &str) -> Result<(), DomError> {
        let data = self
            .elements
            .get_mut(&element)
            .ok_or(DomError::UnknownElement(element))?;
        if data.attributes.remove(name).is_some() {
            self.mutations.push(DomPatch::RemoveAttribute {
                element,
                name: name.to_string(),
            });
        }
        Ok(())
    }
}

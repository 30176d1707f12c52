//! Form definition: the static schema of fields and regions, wrapped into
//! observable nodes.
//!
//! Nodes live in an arena owned by [`DefinitionModel`]; regions refer to
//! their children by [`NodeId`]. Two derived views are kept in sync with the
//! tree: the flat sequence of all plain fields in depth-first order (region
//! contents inlined) and the flat index from field identifier to node.

use std::rc::Rc;

use idoc_util::clone_map;
use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::ModelError;

mod node;
mod property;

pub use node::{NodeId, SchemaNode, SchemaNodeKind};
pub use property::{DefinitionAttribute, DefinitionModelProperty};

pub const FIELDS: &str = "fields";
pub const IDENTIFIER: &str = "identifier";

/// Attributes that always have an accessor, on the definition itself and on
/// every node, whether or not the payload carried them.
pub const PREDEFINED_ATTRIBUTES: [&str; 16] = [
    "isMandatory",
    "displayType",
    "previewEmpty",
    "rendered",
    "identifier",
    "maxLength",
    "codelist",
    "label",
    "multivalue",
    "tooltip",
    "uri",
    "isDataProperty",
    "filtered",
    "validators",
    "control",
    "disabled",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionOptions {
    pub predefined: Vec<String>,
}

impl Default for DefinitionOptions {
    fn default() -> Self {
        Self {
            predefined: PREDEFINED_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

pub struct DefinitionModel {
    attributes: IndexMap<String, DefinitionAttribute>,
    nodes: Vec<SchemaNode>,
    roots: Vec<NodeId>,
    has_fields: bool,
    flat_index: IndexMap<String, NodeId>,
    flat_sequence: Vec<NodeId>,
    predefined: Rc<[String]>,
    options: DefinitionOptions,
}

impl DefinitionModel {
    pub fn new(payload: &Value) -> Result<Self, ModelError> {
        Self::with_options(payload, DefinitionOptions::default())
    }

    /// Builds the model from a deep copy of `payload`.
    ///
    /// Fails when the payload is not an object, when `fields` (at any depth)
    /// is not a sequence, or when a field lacks a string identifier.
    pub fn with_options(payload: &Value, options: DefinitionOptions) -> Result<Self, ModelError> {
        let Value::Object(source) = payload else {
            return Err(ModelError::NotObject("definition".to_string()));
        };
        let fields = match source.get(FIELDS) {
            None => None,
            Some(Value::Array(fields)) => Some(fields.as_slice()),
            Some(_) => return Err(ModelError::NotSequence(FIELDS.to_string())),
        };
        for field in fields.unwrap_or_default() {
            validate_field(field)?;
        }

        let mut attributes: IndexMap<String, DefinitionAttribute> = clone_map(source)
            .into_iter()
            .filter(|(name, _)| name != FIELDS)
            .map(|(name, value)| (name.clone(), DefinitionAttribute::new(&name, Some(value))))
            .collect();
        for name in &options.predefined {
            if !attributes.contains_key(name) {
                attributes.insert(name.clone(), DefinitionAttribute::new(name, None));
            }
        }

        let mut model = Self {
            attributes,
            nodes: Vec::new(),
            roots: Vec::new(),
            has_fields: fields.is_some(),
            flat_index: IndexMap::new(),
            flat_sequence: Vec::new(),
            predefined: options.predefined.iter().cloned().collect(),
            options,
        };
        for field in fields.unwrap_or_default() {
            let id = model.build_node(field, None)?;
            model.roots.push(id);
        }
        model.reindex();
        Ok(model)
    }

    pub fn options(&self) -> &DefinitionOptions {
        &self.options
    }

    pub fn attribute(&self, name: &str) -> Option<&DefinitionAttribute> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &IndexMap<String, DefinitionAttribute> {
        &self.attributes
    }

    pub fn node(&self, id: NodeId) -> Option<&SchemaNode> {
        self.nodes.get(id.0)
    }

    /// Top-level nodes in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &SchemaNode> {
        self.roots.iter().map(|id| &self.nodes[id.0])
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &SchemaNode> {
        self.nodes
            .get(id.0)
            .map(SchemaNode::children)
            .unwrap_or_default()
            .iter()
            .map(|child| &self.nodes[child.0])
    }

    /// Plain field by identifier, at any depth.
    pub fn field(&self, identifier: &str) -> Option<&SchemaNode> {
        self.flat_index.get(identifier).map(|id| &self.nodes[id.0])
    }

    /// Field or region by identifier, searched depth-first.
    pub fn find(&self, identifier: &str) -> Option<&SchemaNode> {
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id.0];
            if node.identifier == identifier {
                return Some(node);
            }
            stack.extend(node.children().iter().rev().copied());
        }
        None
    }

    pub fn flat_index(&self) -> &IndexMap<String, NodeId> {
        &self.flat_index
    }

    pub fn flat_sequence(&self) -> &[NodeId] {
        &self.flat_sequence
    }

    /// Plain fields in depth-first order.
    pub fn flat_fields(&self) -> impl Iterator<Item = &SchemaNode> {
        self.flat_sequence.iter().map(|id| &self.nodes[id.0])
    }

    /// Merges `new_fields` into the tree and returns the nodes created.
    ///
    /// Each new field lands right after the last sibling matched so far (at
    /// the end while nothing has matched), so the new fields keep their
    /// relative order. A field whose identifier already exists among its
    /// siblings is not inserted but moves the insertion point behind the
    /// existing one; when both are regions their children are merged the
    /// same way. All fields are validated before anything is inserted.
    pub fn add_fields_to_model(&mut self, new_fields: &[Value]) -> Result<Vec<NodeId>, ModelError> {
        for field in new_fields {
            validate_field(field)?;
        }
        let mut roots = std::mem::take(&mut self.roots);
        let mut inserted = Vec::new();
        let merged = self.merge_fields(&mut roots, new_fields, None, &mut inserted);
        self.roots = roots;
        self.has_fields = true;
        self.reindex();
        merged?;
        tracing::debug!(inserted = inserted.len(), flat = self.flat_sequence.len(), "added fields to definition");
        Ok(inserted)
    }

    fn merge_fields(
        &mut self,
        siblings: &mut Vec<NodeId>,
        new_fields: &[Value],
        parent: Option<NodeId>,
        inserted: &mut Vec<NodeId>,
    ) -> Result<(), ModelError> {
        let mut cursor: Option<usize> = None;
        for field in new_fields {
            let identifier = field_identifier(field)?;
            let existing = siblings
                .iter()
                .position(|id| self.nodes[id.0].identifier == identifier);
            match existing {
                Some(pos) => {
                    cursor = Some(pos + 1);
                    let existing = siblings[pos];
                    let nested = field.get(FIELDS).and_then(Value::as_array);
                    if let (SchemaNodeKind::Region { children }, Some(nested)) =
                        (self.nodes[existing.0].kind.clone(), nested)
                    {
                        let mut children = children;
                        self.merge_fields(&mut children, nested, Some(existing), inserted)?;
                        self.nodes[existing.0].kind = SchemaNodeKind::Region { children };
                    }
                }
                None => {
                    let id = self.build_node(field, parent)?;
                    let at = cursor.unwrap_or(siblings.len());
                    siblings.insert(at, id);
                    cursor = Some(at + 1);
                    inserted.push(id);
                }
            }
        }
        Ok(())
    }

    fn build_node(&mut self, value: &Value, parent: Option<NodeId>) -> Result<NodeId, ModelError> {
        let Value::Object(source) = value else {
            return Err(ModelError::NotObject("field".to_string()));
        };
        let identifier = field_identifier(value)?.to_string();
        let mut data = clone_map(source);
        let nested = match data.shift_remove(FIELDS) {
            None => None,
            Some(Value::Array(items)) => Some(items),
            Some(_) => return Err(ModelError::MalformedRegion(identifier)),
        };
        let parent_id = parent.map(|p| self.nodes[p.0].identifier.clone());
        let id = NodeId(self.nodes.len());
        self.nodes.push(SchemaNode {
            identifier,
            property: DefinitionModelProperty::new(data, Rc::clone(&self.predefined)),
            kind: SchemaNodeKind::Field,
            parent,
            parent_id,
        });
        if let Some(items) = nested {
            let mut children = Vec::with_capacity(items.len());
            for item in &items {
                children.push(self.build_node(item, Some(id))?);
            }
            self.nodes[id.0].kind = SchemaNodeKind::Region { children };
        }
        Ok(id)
    }

    fn reindex(&mut self) {
        let mut sequence = Vec::with_capacity(self.flat_sequence.len());
        collect_fields(&self.nodes, &self.roots, &mut sequence);
        self.flat_index = sequence
            .iter()
            .map(|id| (self.nodes[id.0].identifier.clone(), *id))
            .collect();
        self.flat_sequence = sequence;
    }

    /// Plain nested schema, the inverse of construction.
    pub fn serialize(&self) -> Value {
        let mut out: Map<String, Value> = self
            .attributes
            .iter()
            .filter_map(|(name, attribute)| attribute.get().map(|value| (name.clone(), value)))
            .collect();
        if self.has_fields {
            out.insert(FIELDS.to_string(), self.serialize_nodes(&self.roots));
        }
        Value::Object(out)
    }

    pub fn serialize_node(&self, id: NodeId) -> Option<Value> {
        let node = self.nodes.get(id.0)?;
        let mut data = node.property.serialize();
        if let SchemaNodeKind::Region { children } = &node.kind {
            data.insert(FIELDS.to_string(), self.serialize_nodes(children));
        }
        Some(Value::Object(data))
    }

    fn serialize_nodes(&self, ids: &[NodeId]) -> Value {
        Value::Array(ids.iter().filter_map(|id| self.serialize_node(*id)).collect())
    }
}

/// Independent copy with fresh emitters on every node.
impl Clone for DefinitionModel {
    fn clone(&self) -> Self {
        Self {
            attributes: self.attributes.clone(),
            nodes: self.nodes.clone(),
            roots: self.roots.clone(),
            has_fields: self.has_fields,
            flat_index: self.flat_index.clone(),
            flat_sequence: self.flat_sequence.clone(),
            predefined: Rc::clone(&self.predefined),
            options: self.options.clone(),
        }
    }
}

impl std::fmt::Debug for DefinitionModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DefinitionModel")
            .field("attributes", &self.attributes)
            .field("fields", &self.serialize_nodes(&self.roots))
            .finish()
    }
}

fn field_identifier(field: &Value) -> Result<&str, ModelError> {
    field
        .get(IDENTIFIER)
        .and_then(Value::as_str)
        .ok_or(ModelError::MissingIdentifier)
}

fn validate_field(field: &Value) -> Result<(), ModelError> {
    if !field.is_object() {
        return Err(ModelError::NotObject("field".to_string()));
    }
    let identifier = field_identifier(field)?;
    match field.get(FIELDS) {
        None => Ok(()),
        Some(Value::Array(children)) => children.iter().try_for_each(validate_field),
        Some(_) => Err(ModelError::MalformedRegion(identifier.to_string())),
    }
}

fn collect_fields(nodes: &[SchemaNode], ids: &[NodeId], out: &mut Vec<NodeId>) {
    for id in ids {
        match &nodes[id.0].kind {
            SchemaNodeKind::Region { children } => collect_fields(nodes, children, out),
            SchemaNodeKind::Field => out.push(*id),
        }
    }
}

//! Model-management trees: class and definition models whose members may be
//! inherited from a template.
//!
//! Every node lives in the arena of a [`ModelTree`]. A node's `parent` is the
//! model that owns it; a model holding a member whose parent is some other
//! model (usually the template it was derived from) holds that member by
//! inheritance. Editing an inherited member goes through
//! [`ModelTree::copy_from_path`], which replaces each inherited node along a
//! path with an owned copy; [`ModelTree::restore_from_path`] goes the other
//! way.

use std::collections::BTreeMap;

use idoc_util::deep_equal;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ModelError;

mod copy;
mod dispatch;
mod path;
mod restore;

pub use dispatch::{Attach, Dispatch, Duplicate, Resolve};
pub use path::{parse_path, PathStep};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Class,
    Definition,
    Field,
    Region,
    Property,
    Header,
    Action,
    ActionGroup,
    Attribute,
    Control,
    #[serde(rename = "param")]
    ControlParam,
}

impl ModelKind {
    pub const ALL: [ModelKind; 11] = [
        ModelKind::Class,
        ModelKind::Definition,
        ModelKind::Field,
        ModelKind::Region,
        ModelKind::Property,
        ModelKind::Header,
        ModelKind::Action,
        ModelKind::ActionGroup,
        ModelKind::Attribute,
        ModelKind::Control,
        ModelKind::ControlParam,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ModelKind::Class => "class",
            ModelKind::Definition => "definition",
            ModelKind::Field => "field",
            ModelKind::Region => "region",
            ModelKind::Property => "property",
            ModelKind::Header => "header",
            ModelKind::Action => "action",
            ModelKind::ActionGroup => "action_group",
            ModelKind::Attribute => "attribute",
            ModelKind::Control => "control",
            ModelKind::ControlParam => "param",
        }
    }

    pub fn parse(text: &str) -> Option<ModelKind> {
        ModelKind::ALL.into_iter().find(|kind| kind.as_str() == text)
    }
}

impl std::fmt::Display for ModelKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ModelId(usize);

impl ModelId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModelNode {
    kind: ModelKind,
    identifier: String,
    parent: Option<ModelId>,
    reference: Option<ModelId>,
    value: Value,
    members: BTreeMap<ModelKind, IndexMap<String, ModelId>>,
}

impl ModelNode {
    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    /// Model owning this node.
    pub fn parent(&self) -> Option<ModelId> {
        self.parent
    }

    /// Node this one was copied or derived from.
    pub fn reference(&self) -> Option<ModelId> {
        self.reference
    }

    /// Attribute value; `null` for structural nodes.
    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn members(&self, kind: ModelKind) -> Option<&IndexMap<String, ModelId>> {
        self.members.get(&kind)
    }

    pub fn member(&self, kind: ModelKind, identifier: &str) -> Option<ModelId> {
        self.members.get(&kind)?.get(identifier).copied()
    }

    fn all_members(&self) -> impl Iterator<Item = (ModelKind, &str, ModelId)> {
        self.members.iter().flat_map(|(kind, members)| {
            members
                .iter()
                .map(move |(identifier, id)| (*kind, identifier.as_str(), *id))
        })
    }
}

/// Arena of model-management nodes.
#[derive(Debug, Clone, Default)]
pub struct ModelTree {
    nodes: Vec<ModelNode>,
}

impl ModelTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: ModelId) -> Option<&ModelNode> {
        self.nodes.get(id.0)
    }

    fn node(&self, id: ModelId) -> &ModelNode {
        &self.nodes[id.0]
    }

    fn node_mut(&mut self, id: ModelId) -> &mut ModelNode {
        &mut self.nodes[id.0]
    }

    fn push(&mut self, node: ModelNode) -> ModelId {
        let id = ModelId(self.nodes.len());
        self.nodes.push(node);
        id
    }

    /// Creates a structural node owned by `parent` and attaches it there.
    pub fn create(&mut self, kind: ModelKind, identifier: &str, parent: Option<ModelId>) -> ModelId {
        let id = self.push(ModelNode {
            kind,
            identifier: identifier.to_string(),
            parent,
            reference: None,
            value: Value::Null,
            members: BTreeMap::new(),
        });
        if let Some(parent) = parent {
            self.attach(parent, id);
        }
        id
    }

    /// Creates an attribute owned by and attached to `owner`.
    pub fn create_attribute(&mut self, owner: ModelId, name: &str, value: Value) -> ModelId {
        let id = self.create(ModelKind::Attribute, name, Some(owner));
        self.node_mut(id).value = value;
        id
    }

    /// New model of the same kind as `template` that inherits every member
    /// of it: the member tables point at the template's own nodes.
    pub fn derive(&mut self, template: ModelId, identifier: &str, parent: Option<ModelId>) -> ModelId {
        let source = self.node(template);
        let node = ModelNode {
            kind: source.kind,
            identifier: identifier.to_string(),
            parent,
            reference: Some(template),
            value: source.value.clone(),
            members: source.members.clone(),
        };
        let id = self.push(node);
        if let Some(parent) = parent {
            self.attach(parent, id);
        }
        id
    }

    /// Shallow copy of `original` owned by `owner`. Members of the copy
    /// still point at the original's members.
    pub fn duplicate(&mut self, original: ModelId, owner: ModelId) -> ModelId {
        let mut node = self.node(original).clone();
        node.parent = Some(owner);
        node.reference = Some(original);
        self.push(node)
    }

    /// Puts `member` in the member table of `owner` under its identifier,
    /// replacing in place whatever was held there.
    pub fn attach(&mut self, owner: ModelId, member: ModelId) {
        let (kind, identifier) = {
            let node = self.node(member);
            (node.kind, node.identifier.clone())
        };
        self.node_mut(owner)
            .members
            .entry(kind)
            .or_default()
            .insert(identifier, member);
    }

    pub fn detach(&mut self, owner: ModelId, kind: ModelKind, identifier: &str) -> Option<ModelId> {
        self.node_mut(owner)
            .members
            .get_mut(&kind)?
            .shift_remove(identifier)
    }

    pub fn set_value(&mut self, node: ModelId, value: Value) {
        self.node_mut(node).value = value;
    }

    pub fn member(&self, owner: ModelId, kind: ModelKind, identifier: &str) -> Option<ModelId> {
        self.get(owner)?.member(kind, identifier)
    }

    /// A node is inherited relative to `model` when `model` does not own it.
    pub fn is_inherited(&self, node: ModelId, model: ModelId) -> bool {
        self.node(node).parent != Some(model)
    }

    /// Attribute value visible from `owner`, inherited or not.
    pub fn attribute_value(&self, owner: ModelId, name: &str) -> Option<&Value> {
        self.member(owner, ModelKind::Attribute, name)
            .map(|id| &self.node(id).value)
    }

    /// Resolves `path` from `model` without copying anything.
    pub fn resolve(&self, path: &[PathStep], model: ModelId) -> Result<ModelId, ModelError> {
        path.iter().try_fold(model, |current, step| {
            self.member(current, step.kind, &step.identifier)
                .ok_or_else(|| ModelError::PathNotFound(step.to_string()))
        })
    }

    /// True when `copy` carries no change relative to `original`: equal
    /// values and the same members, each either identical or itself an
    /// unchanged copy of the original member.
    pub fn is_pristine_copy(&self, copy: ModelId, original: ModelId) -> bool {
        if copy == original {
            return true;
        }
        let (a, b) = (self.node(copy), self.node(original));
        if a.kind != b.kind || !deep_equal(&a.value, &b.value) {
            return false;
        }
        let count = |node: &ModelNode| node.members.values().map(IndexMap::len).sum::<usize>();
        if count(a) != count(b) {
            return false;
        }
        a.all_members().all(|(kind, identifier, member)| match b.member(kind, identifier) {
            Some(theirs) if theirs == member => true,
            Some(theirs) => {
                self.node(member).reference == Some(theirs) && self.is_pristine_copy(member, theirs)
            }
            None => false,
        })
    }
}

use std::collections::BTreeMap;

use super::{ModelId, ModelKind, ModelTree, PathStep};
use crate::error::ModelError;

/// Finds the node a step names inside `owner`.
pub type Resolve = fn(&ModelTree, ModelId, &PathStep) -> Option<ModelId>;
/// Copies `original` into a new node owned by `owner`.
pub type Duplicate = fn(&mut ModelTree, ModelId, ModelId) -> ModelId;
/// Attaches `node` into `owner`, replacing the entry with the same
/// identifier.
pub type Attach = fn(&mut ModelTree, ModelId, ModelId);

/// Per-kind handlers used while walking a path.
///
/// [`Dispatch::shared`] holds the defaults every operation starts from;
/// [`Dispatch::copy`] and [`Dispatch::restore`] overlay the field handlers.
#[derive(Debug, Clone)]
pub struct Dispatch {
    resolve: BTreeMap<ModelKind, Resolve>,
    duplicate: BTreeMap<ModelKind, Duplicate>,
    attach: BTreeMap<ModelKind, Attach>,
}

impl Dispatch {
    pub fn shared() -> Self {
        let mut dispatch = Self {
            resolve: BTreeMap::new(),
            duplicate: BTreeMap::new(),
            attach: BTreeMap::new(),
        };
        for kind in ModelKind::ALL {
            dispatch.resolve.insert(kind, resolve_member);
            dispatch.duplicate.insert(kind, ModelTree::duplicate);
            dispatch.attach.insert(kind, ModelTree::attach);
        }
        dispatch
    }

    /// Field copies take their attributes along and are re-pointed from the
    /// regions that list them.
    pub fn copy() -> Self {
        Self::shared()
            .with_duplicate(ModelKind::Field, duplicate_field)
            .with_attach(ModelKind::Field, attach_field)
    }

    /// Restored fields are re-pointed from their regions, and regions left
    /// without changes fall back to the template's.
    pub fn restore() -> Self {
        Self::shared().with_attach(ModelKind::Field, attach_restored_field)
    }

    pub fn with_resolve(mut self, kind: ModelKind, resolve: Resolve) -> Self {
        self.resolve.insert(kind, resolve);
        self
    }

    pub fn with_duplicate(mut self, kind: ModelKind, duplicate: Duplicate) -> Self {
        self.duplicate.insert(kind, duplicate);
        self
    }

    pub fn with_attach(mut self, kind: ModelKind, attach: Attach) -> Self {
        self.attach.insert(kind, attach);
        self
    }

    pub fn without(mut self, kind: ModelKind) -> Self {
        self.resolve.remove(&kind);
        self.duplicate.remove(&kind);
        self.attach.remove(&kind);
        self
    }

    pub fn resolver(&self, kind: ModelKind) -> Result<Resolve, ModelError> {
        self.resolve
            .get(&kind)
            .copied()
            .ok_or_else(|| ModelError::UnsupportedStep(kind.to_string()))
    }

    pub fn duplicator(&self, kind: ModelKind) -> Result<Duplicate, ModelError> {
        self.duplicate
            .get(&kind)
            .copied()
            .ok_or_else(|| ModelError::UnsupportedStep(kind.to_string()))
    }

    pub fn attacher(&self, kind: ModelKind) -> Result<Attach, ModelError> {
        self.attach
            .get(&kind)
            .copied()
            .ok_or_else(|| ModelError::UnsupportedStep(kind.to_string()))
    }
}

impl Default for Dispatch {
    fn default() -> Self {
        Self::shared()
    }
}

fn resolve_member(tree: &ModelTree, owner: ModelId, step: &PathStep) -> Option<ModelId> {
    tree.member(owner, step.kind, &step.identifier)
}

fn duplicate_field(tree: &mut ModelTree, original: ModelId, owner: ModelId) -> ModelId {
    let copy = tree.duplicate(original, owner);
    let attributes: Vec<ModelId> = tree
        .node(original)
        .members(ModelKind::Attribute)
        .map(|members| members.values().copied().collect())
        .unwrap_or_default();
    for attribute in attributes {
        let owned = tree.duplicate(attribute, copy);
        tree.attach(copy, owned);
    }
    copy
}

fn attach_field(tree: &mut ModelTree, owner: ModelId, field: ModelId) {
    tree.attach(owner, field);
    repoint_regions(tree, owner, field);
}

fn attach_restored_field(tree: &mut ModelTree, owner: ModelId, field: ModelId) {
    attach_field(tree, owner, field);
    tree.prune_redundant_regions(owner);
}

/// Makes every region of `owner` that lists the field's identifier list
/// `field` instead, copying inherited regions first so a template region is
/// never edited through a derived model.
fn repoint_regions(tree: &mut ModelTree, owner: ModelId, field: ModelId) {
    let identifier = tree.node(field).identifier.clone();
    let regions: Vec<ModelId> = tree
        .node(owner)
        .members(ModelKind::Region)
        .map(|members| members.values().copied().collect())
        .unwrap_or_default();
    for region in regions {
        match tree.node(region).member(ModelKind::Field, &identifier) {
            Some(listed) if listed != field => {}
            _ => continue,
        }
        let region = if tree.is_inherited(region, owner) {
            let copy = tree.duplicate(region, owner);
            tree.attach(owner, copy);
            tracing::debug!(region = %tree.node(copy).identifier, "copied inherited region for field");
            copy
        } else {
            region
        };
        tree.attach(region, field);
    }
}

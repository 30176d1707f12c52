use super::property::DefinitionModelProperty;

/// Index of a node in the arena of a [`DefinitionModel`](super::DefinitionModel).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaNodeKind {
    Field,
    Region { children: Vec<NodeId> },
}

/// One field or region of a form definition.
#[derive(Debug, Clone)]
pub struct SchemaNode {
    pub(crate) identifier: String,
    pub(crate) property: DefinitionModelProperty,
    pub(crate) kind: SchemaNodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) parent_id: Option<String>,
}

impl SchemaNode {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn property(&self) -> &DefinitionModelProperty {
        &self.property
    }

    pub fn kind(&self) -> &SchemaNodeKind {
        &self.kind
    }

    pub fn is_region(&self) -> bool {
        matches!(self.kind, SchemaNodeKind::Region { .. })
    }

    /// Child nodes of a region; empty for plain fields.
    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            SchemaNodeKind::Region { children } => children,
            SchemaNodeKind::Field => &[],
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Identifier of the region that directly contains this node.
    pub fn parent_id(&self) -> Option<&str> {
        self.parent_id.as_deref()
    }
}

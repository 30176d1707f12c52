use serde::{Deserialize, Serialize};

use super::ModelKind;

/// One typed step of a path into a model-management tree, e.g. the
/// `field:title` in `field:title / control:PICKER / param:range`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathStep {
    pub kind: ModelKind,
    pub identifier: String,
}

impl PathStep {
    pub fn new(kind: ModelKind, identifier: impl Into<String>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
        }
    }

    pub fn class(identifier: impl Into<String>) -> Self {
        Self::new(ModelKind::Class, identifier)
    }

    pub fn definition(identifier: impl Into<String>) -> Self {
        Self::new(ModelKind::Definition, identifier)
    }

    pub fn field(identifier: impl Into<String>) -> Self {
        Self::new(ModelKind::Field, identifier)
    }

    pub fn region(identifier: impl Into<String>) -> Self {
        Self::new(ModelKind::Region, identifier)
    }

    pub fn control(identifier: impl Into<String>) -> Self {
        Self::new(ModelKind::Control, identifier)
    }

    pub fn param(identifier: impl Into<String>) -> Self {
        Self::new(ModelKind::ControlParam, identifier)
    }

    pub fn attribute(identifier: impl Into<String>) -> Self {
        Self::new(ModelKind::Attribute, identifier)
    }
}

impl std::fmt::Display for PathStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.kind, self.identifier)
    }
}

/// Parses `kind:identifier` steps separated by `/`.
///
/// ```
/// use idoc_model::management::{parse_path, PathStep};
///
/// let path = parse_path("field:title/attribute:label").unwrap();
/// assert_eq!(path, vec![PathStep::field("title"), PathStep::attribute("label")]);
/// ```
pub fn parse_path(text: &str) -> Option<Vec<PathStep>> {
    text.split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            let (kind, identifier) = segment.split_once(':')?;
            Some(PathStep::new(ModelKind::parse(kind)?, identifier))
        })
        .collect()
}

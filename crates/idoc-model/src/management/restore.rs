use super::{Dispatch, ModelId, ModelKind, ModelTree, PathStep};
use crate::error::ModelError;

impl ModelTree {
    /// Restores the node at the end of `path` in `model` from the same path
    /// in `source`, then walks back up restoring every copy on the path that
    /// no longer differs from its source.
    ///
    /// Attributes can always be restored. A structural node is restored
    /// only when that does not drop members authored in `model` that the
    /// source lacks; for the last step of the path this is an error, for
    /// the steps above it the copy is simply kept.
    pub fn restore_from_path(
        &mut self,
        path: &[PathStep],
        model: ModelId,
        source: ModelId,
    ) -> Result<ModelId, ModelError> {
        self.restore_from_path_with(&Dispatch::restore(), path, model, source)
    }

    pub fn restore_from_path_with(
        &mut self,
        dispatch: &Dispatch,
        path: &[PathStep],
        model: ModelId,
        source: ModelId,
    ) -> Result<ModelId, ModelError> {
        let Some((step, rest)) = path.split_first() else {
            return Ok(model);
        };
        let resolve = dispatch.resolver(step.kind)?;
        let not_found = || ModelError::PathNotFound(step.to_string());
        let original = resolve(self, source, step).ok_or_else(not_found)?;
        let current = resolve(self, model, step).ok_or_else(not_found)?;
        if current == original {
            return self.resolve(rest, current);
        }

        if rest.is_empty() {
            if !self.can_restore(model, current, original) {
                return Err(ModelError::RestoreNotPermitted(step.to_string()));
            }
            (dispatch.attacher(step.kind)?)(self, model, original);
            tracing::debug!(step = %step, "restored model");
            return Ok(original);
        }

        let restored = self.restore_from_path_with(dispatch, rest, current, original)?;
        if self.is_pristine_copy(current, original) && self.can_restore(model, current, original) {
            (dispatch.attacher(step.kind)?)(self, model, original);
            tracing::debug!(step = %step, "restored unchanged ancestor");
        }
        Ok(restored)
    }

    /// Whether `current` (held by `model`) can be swapped for `original`
    /// without losing a member that only exists on the `model` side.
    pub fn can_restore(&self, model: ModelId, current: ModelId, original: ModelId) -> bool {
        let node = self.node(current);
        if node.kind == ModelKind::Attribute {
            return true;
        }
        let source = self.node(original);
        node.all_members().all(|(kind, identifier, member)| {
            source.member(kind, identifier).is_some() || {
                let owner = self.node(member).parent;
                owner != Some(current) && owner != Some(model)
            }
        })
    }
}

use super::{Dispatch, ModelId, ModelKind, ModelTree, PathStep};
use crate::error::ModelError;

impl ModelTree {
    /// Walks `path` from `model`, replacing every inherited node on the way
    /// with an owned copy, and returns the node at the end of the path.
    ///
    /// Nodes already owned are left untouched, as is everything off the
    /// path.
    pub fn copy_from_path(&mut self, path: &[PathStep], model: ModelId) -> Result<ModelId, ModelError> {
        self.copy_from_path_with(&Dispatch::copy(), path, model)
    }

    pub fn copy_from_path_with(
        &mut self,
        dispatch: &Dispatch,
        path: &[PathStep],
        model: ModelId,
    ) -> Result<ModelId, ModelError> {
        let mut model = model;
        for step in path {
            let current = (dispatch.resolver(step.kind)?)(self, model, step)
                .ok_or_else(|| ModelError::PathNotFound(step.to_string()))?;
            model = if self.is_inherited(current, model) {
                let copy = (dispatch.duplicator(step.kind)?)(self, current, model);
                (dispatch.attacher(step.kind)?)(self, model, copy);
                tracing::debug!(step = %step, original = current.index(), copy = copy.index(), "copied inherited model");
                copy
            } else {
                current
            };
        }
        Ok(model)
    }

    /// Adds a new field owned by `definition`, optionally placed in
    /// `region`. An inherited region is copied before the field goes in.
    pub fn add_field(
        &mut self,
        definition: ModelId,
        identifier: &str,
        region: Option<&str>,
    ) -> Result<ModelId, ModelError> {
        let region = region
            .map(|region| self.copy_from_path(&[PathStep::region(region)], definition))
            .transpose()?;
        let field = self.create(ModelKind::Field, identifier, Some(definition));
        if let Some(region) = region {
            self.attach(region, field);
        }
        self.prune_redundant_regions(definition);
        tracing::debug!(field = identifier, "added field");
        Ok(field)
    }

    /// Moves a field of `definition` into `target` (or out of every region
    /// when `None`). Regions touched on the way are copied when inherited;
    /// regions that end up identical to their template are restored.
    pub fn move_field(
        &mut self,
        definition: ModelId,
        identifier: &str,
        target: Option<&str>,
    ) -> Result<(), ModelError> {
        let field = self
            .member(definition, ModelKind::Field, identifier)
            .ok_or_else(|| ModelError::PathNotFound(PathStep::field(identifier).to_string()))?;
        let sources: Vec<String> = self
            .node(definition)
            .members(ModelKind::Region)
            .map(|regions| {
                regions
                    .iter()
                    .filter(|(name, region)| {
                        Some(name.as_str()) != target
                            && self.node(**region).member(ModelKind::Field, identifier).is_some()
                    })
                    .map(|(name, _)| name.clone())
                    .collect()
            })
            .unwrap_or_default();
        for source in sources {
            let region = self.copy_from_path(&[PathStep::region(source)], definition)?;
            self.detach(region, ModelKind::Field, identifier);
        }
        if let Some(target) = target {
            let region = self.copy_from_path(&[PathStep::region(target)], definition)?;
            self.attach(region, field);
        }
        self.prune_redundant_regions(definition);
        Ok(())
    }

    /// Replaces every owned region copy of `definition` that carries no
    /// change relative to its original with the original. Returns the
    /// restored originals.
    pub fn prune_redundant_regions(&mut self, definition: ModelId) -> Vec<ModelId> {
        let candidates: Vec<(ModelId, ModelId)> = self
            .node(definition)
            .members(ModelKind::Region)
            .map(|regions| {
                regions
                    .values()
                    .filter(|region| !self.is_inherited(**region, definition))
                    .filter_map(|region| Some((*region, self.node(*region).reference?)))
                    .collect()
            })
            .unwrap_or_default();
        let mut restored = Vec::new();
        for (copy, original) in candidates {
            if self.is_pristine_copy(copy, original) {
                self.attach(definition, original);
                restored.push(original);
                tracing::debug!(region = %self.node(original).identifier, "restored unchanged region");
            }
        }
        restored
    }
}

use super::StatusDefinition;
use crate::config::StatusConstants;
use crate::hit::Skill;
use crate::ContentError;
use combat_types::{StatusCategory, StatusId};
use std::collections::HashMap;
use std::sync::Arc;

/// Status definitions known to an encounter, keyed by id
///
/// Hit status rolls and hook commands refer to statuses by id; this is where
/// those ids are turned back into definitions.
#[derive(Debug, Clone, Default)]
pub struct StatusCatalog {
    definitions: HashMap<StatusId, Arc<StatusDefinition>>,
}

impl StatusCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog holding only the built-in incapacitation status
    pub fn with_builtins(constants: &StatusConstants) -> Self {
        let mut catalog = Self::new();
        catalog.ensure_builtins(constants);
        catalog
    }

    /// Register the incapacitation status unless content already defines it
    pub fn ensure_builtins(&mut self, constants: &StatusConstants) {
        if !self.contains(&constants.incapacitation) {
            self.insert(Arc::new(incapacitation_status(constants)));
        }
    }

    /// Register a definition, replacing any previous one with the same id
    pub fn insert(&mut self, definition: Arc<StatusDefinition>) -> Option<Arc<StatusDefinition>> {
        self.definitions.insert(definition.id.clone(), definition)
    }

    pub fn get(&self, id: &StatusId) -> Option<&Arc<StatusDefinition>> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &StatusId) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Ensure every status a skill's hit can roll is known
    pub fn check_skill(&self, skill: &Skill) -> Result<(), ContentError> {
        match skill.hit.statuses.keys().find(|id| !self.contains(id)) {
            Some(missing) => Err(ContentError::UnknownStatus {
                skill: skill.id.clone(),
                status: missing.to_string(),
            }),
            None => Ok(()),
        }
    }
}

fn incapacitation_status(constants: &StatusConstants) -> StatusDefinition {
    StatusDefinition::new(constants.incapacitation.clone(), StatusCategory::Impairment)
        .with_name("Incapacitated")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hit::Hit;
    use combat_types::AttackAttributes;

    #[test]
    fn test_builtins_include_incapacitation() {
        let constants = StatusConstants::default();
        let catalog = StatusCatalog::with_builtins(&constants);
        let status = catalog.get(&constants.incapacitation).unwrap();
        assert!(!status.stackable);
        assert!(status.hooks().is_empty());
    }

    #[test]
    fn test_check_skill_reports_unknown_status() {
        let catalog = StatusCatalog::with_builtins(&StatusConstants::default());
        let skill = Skill::new(
            "venom_bite",
            Hit::new(12.0, AttackAttributes::PHYSICAL).with_status("poison", 50.0),
        );
        match catalog.check_skill(&skill) {
            Err(ContentError::UnknownStatus { skill, status }) => {
                assert_eq!(skill, "venom_bite");
                assert_eq!(status, "poison");
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }
}

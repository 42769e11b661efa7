use std::collections::HashSet;

use tracing::debug;

use crate::error::{OcciError, Result};

use super::action_instance::ActionInstance;
use super::category::{Category, CategoryLookup};
use super::entity::Entity;
use super::registry::Model;

/// Validation and rendering scope. Categories are borrowed from a model,
/// entities and action instances are owned.
#[derive(Debug, Clone, Default)]
pub struct Collection<'m> {
    categories: Vec<&'m Category>,
    entities: Vec<Entity>,
    action_instances: Vec<ActionInstance>,
}

impl<'m> Collection<'m> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Collection observing every category of `model`.
    #[must_use]
    pub fn with_model(model: &'m Model) -> Self {
        Self {
            categories: model.iter().collect(),
            ..Self::default()
        }
    }

    pub fn add_category(&mut self, category: &'m Category) {
        self.categories.push(category);
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.entities.push(entity);
    }

    pub fn add_action_instance(&mut self, action_instance: ActionInstance) {
        self.action_instances.push(action_instance);
    }

    pub fn remove_entity(&mut self, id: &str) -> Option<Entity> {
        let position = self.entities.iter().position(|entity| entity.id() == id)?;
        Some(self.entities.remove(position))
    }

    pub fn categories(&self) -> impl Iterator<Item = &'m Category> + '_ {
        self.categories.iter().copied()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &'m Category> + '_ {
        self.categories().filter(|category| category.is_kind())
    }

    pub fn mixins(&self) -> impl Iterator<Item = &'m Category> + '_ {
        self.categories().filter(|category| category.is_mixin())
    }

    pub fn actions(&self) -> impl Iterator<Item = &'m Category> + '_ {
        self.categories().filter(|category| category.is_action())
    }

    #[must_use]
    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    #[must_use]
    pub fn action_instances(&self) -> &[ActionInstance] {
        &self.action_instances
    }

    pub fn resources(&self) -> impl Iterator<Item = &Entity> {
        self.entities.iter().filter(|entity| entity.is_resource())
    }

    /// Top-level links plus the links held by resources.
    pub fn links(&self) -> impl Iterator<Item = &Entity> {
        self.all().filter(|entity| entity.is_link())
    }

    /// Every entity, including links nested in resources.
    pub fn all(&self) -> impl Iterator<Item = &Entity> {
        self.entities
            .iter()
            .flat_map(|entity| std::iter::once(entity).chain(entity.links()))
    }

    pub fn find_by_kind<'a>(&'a self, kind: &Category) -> Vec<&'a Entity> {
        let identifier = kind.identifier();
        self.all()
            .filter(|entity| entity.kind() == identifier)
            .collect()
    }

    pub fn find_by_mixin<'a>(&'a self, mixin: &Category) -> Vec<&'a Entity> {
        let identifier = mixin.identifier();
        self.all()
            .filter(|entity| entity.has_mixin(&identifier))
            .collect()
    }

    #[must_use]
    pub fn find_by_id(&self, id: &str) -> Option<&Entity> {
        self.all().find(|entity| entity.id() == id)
    }

    pub fn require_by_id(&self, id: &str) -> Result<&Entity> {
        self.find_by_id(id).ok_or_else(|| {
            OcciError::CollectionLookup(format!("entity with id '{id}' not found"))
        })
    }

    pub fn find_by_action<'a>(&'a self, action: &Category) -> Vec<&'a ActionInstance> {
        let identifier = action.identifier();
        self.action_instances
            .iter()
            .filter(|instance| instance.action() == identifier)
            .collect()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.entities.is_empty() && self.action_instances.is_empty()
    }

    #[must_use]
    pub fn only_categories(&self) -> bool {
        !self.categories.is_empty() && self.entities.is_empty() && self.action_instances.is_empty()
    }

    #[must_use]
    pub fn only_entities(&self) -> bool {
        self.categories.is_empty() && !self.entities.is_empty() && self.action_instances.is_empty()
    }

    #[must_use]
    pub fn only_action_instances(&self) -> bool {
        self.categories.is_empty() && self.entities.is_empty() && !self.action_instances.is_empty()
    }

    /// Fails on the first violation: duplicate categories, then entity kinds
    /// and mixins, then action instances, then each instance's attributes.
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for category in &self.categories {
            if !seen.insert(category.identifier()) {
                return Err(OcciError::CategoryValidation(format!(
                    "duplicate category '{category}' in collection"
                )));
            }
        }

        let kinds = identifiers(self.kinds());
        let mixins = identifiers(self.mixins());
        let actions = identifiers(self.actions());

        for entity in self.all() {
            if !kinds.contains(entity.kind()) {
                return Err(OcciError::InstanceValidation(format!(
                    "entity '{}' has kind '{}' which is not in the collection",
                    entity.id(),
                    entity.kind()
                )));
            }
            if let Some(missing) = entity.mixins().find(|mixin| !mixins.contains(*mixin)) {
                return Err(OcciError::InstanceValidation(format!(
                    "entity '{}' has mixin '{missing}' which is not in the collection",
                    entity.id()
                )));
            }
        }

        for instance in &self.action_instances {
            if !actions.contains(instance.action()) {
                return Err(OcciError::InstanceValidation(format!(
                    "action instance refers to '{}' which is not in the collection",
                    instance.action()
                )));
            }
        }

        for entity in &self.entities {
            entity.validate()?;
        }
        for instance in &self.action_instances {
            instance.validate()?;
        }

        debug!(
            categories = self.categories.len(),
            entities = self.entities.len(),
            action_instances = self.action_instances.len(),
            "collection validated"
        );
        Ok(())
    }

    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }
}

fn identifiers<'a>(categories: impl Iterator<Item = &'a Category>) -> HashSet<String> {
    categories.map(Category::identifier).collect()
}

impl CategoryLookup for Collection<'_> {
    fn lookup(&self, identifier: &str) -> Option<&Category> {
        self.categories()
            .find(|category| category.has_identifier(identifier))
    }
}

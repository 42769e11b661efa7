use std::collections::{BTreeMap, BTreeSet};

use tracing::trace;
use uuid::Uuid;

use crate::error::{OcciError, Result};

use super::attribute::{Attribute, AttributeValue, validate_attributes};
use super::category::{Category, CategoryLookup};
use super::core::{ATTR_ID, ATTR_SOURCE, ATTR_TARGET, ATTR_TITLE};

#[derive(Debug, Clone, PartialEq)]
pub enum EntityVariant {
    Resource {
        links: Vec<Entity>,
    },
    Link {
        source: String,
        target: String,
        rel: Option<String>,
    },
}

/// Resource or link instance. Kind and mixins are held by identifier and
/// resolved through a [`CategoryLookup`] when needed.
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    id: String,
    kind: String,
    mixins: BTreeSet<String>,
    attributes: BTreeMap<String, Attribute>,
    kind_location: String,
    location: Option<String>,
    variant: EntityVariant,
}

impl Entity {
    pub fn resource(kind: &Category) -> Result<Self> {
        Self::build(kind, EntityVariant::Resource { links: Vec::new() })
    }

    pub fn link(
        kind: &Category,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Result<Self> {
        let source = source.into();
        let target = target.into();
        let mut entity = Self::build(
            kind,
            EntityVariant::Link {
                source: source.clone(),
                target: target.clone(),
                rel: None,
            },
        )?;
        entity.store(ATTR_SOURCE, AttributeValue::Uri(source));
        entity.store(ATTR_TARGET, AttributeValue::Uri(target));
        Ok(entity)
    }

    fn build(kind: &Category, variant: EntityVariant) -> Result<Self> {
        if !kind.is_kind() {
            return Err(OcciError::InstanceValidation(format!(
                "'{kind}' is not a kind"
            )));
        }
        let id = Uuid::new_v4().to_string();
        let attributes = kind
            .attributes()
            .iter()
            .map(|(name, definition)| {
                (name.clone(), Attribute::from_definition(definition.clone()))
            })
            .collect();
        let mut entity = Self {
            id: id.clone(),
            kind: kind.identifier(),
            mixins: BTreeSet::new(),
            attributes,
            kind_location: kind.location().unwrap_or_default(),
            location: None,
            variant,
        };
        entity.store(ATTR_ID, AttributeValue::String(id));
        Ok(entity)
    }

    fn store(&mut self, name: &str, value: AttributeValue) {
        if let Some(attribute) = self.attributes.get_mut(name) {
            attribute.value = Some(value);
        }
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn set_id(&mut self, id: impl Into<String>) {
        let id = id.into();
        self.store(ATTR_ID, AttributeValue::String(id.clone()));
        self.id = id;
    }

    #[must_use]
    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn mixins(&self) -> impl Iterator<Item = &str> {
        self.mixins.iter().map(String::as_str)
    }

    #[must_use]
    pub fn has_mixin(&self, identifier: &str) -> bool {
        self.mixins.contains(identifier)
    }

    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&AttributeValue> {
        self.attribute(name)
            .and_then(|attribute| attribute.value.as_ref())
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.value(ATTR_TITLE).and_then(AttributeValue::as_text)
    }

    /// Explicit location, or the kind location followed by the id.
    #[must_use]
    pub fn location(&self) -> String {
        self.location
            .clone()
            .unwrap_or_else(|| format!("{}{}", self.kind_location, self.id))
    }

    pub fn set_location(&mut self, location: impl Into<String>) {
        self.location = Some(location.into());
    }

    #[must_use]
    pub const fn variant(&self) -> &EntityVariant {
        &self.variant
    }

    #[must_use]
    pub const fn is_link(&self) -> bool {
        matches!(self.variant, EntityVariant::Link { .. })
    }

    #[must_use]
    pub const fn is_resource(&self) -> bool {
        matches!(self.variant, EntityVariant::Resource { .. })
    }

    #[must_use]
    pub fn source(&self) -> Option<&str> {
        match &self.variant {
            EntityVariant::Link { source, .. } => Some(source),
            EntityVariant::Resource { .. } => None,
        }
    }

    #[must_use]
    pub fn target(&self) -> Option<&str> {
        match &self.variant {
            EntityVariant::Link { target, .. } => Some(target),
            EntityVariant::Resource { .. } => None,
        }
    }

    /// Kind identifier of the link target, when known.
    #[must_use]
    pub fn rel(&self) -> Option<&str> {
        match &self.variant {
            EntityVariant::Link { rel, .. } => rel.as_deref(),
            EntityVariant::Resource { .. } => None,
        }
    }

    pub fn set_rel(&mut self, identifier: impl Into<String>) -> Result<()> {
        match &mut self.variant {
            EntityVariant::Link { rel, .. } => {
                *rel = Some(identifier.into());
                Ok(())
            }
            EntityVariant::Resource { .. } => Err(OcciError::InstanceValidation(format!(
                "resource '{}' has no rel",
                self.id
            ))),
        }
    }

    /// Links held by a resource; always empty for links.
    #[must_use]
    pub fn links(&self) -> &[Entity] {
        match &self.variant {
            EntityVariant::Resource { links } => links,
            EntityVariant::Link { .. } => &[],
        }
    }

    pub fn add_link(&mut self, link: Entity) -> Result<()> {
        if !link.is_link() {
            return Err(OcciError::InstanceValidation(format!(
                "'{}' is not a link",
                link.id
            )));
        }
        match &mut self.variant {
            EntityVariant::Resource { links } => {
                links.push(link);
                Ok(())
            }
            EntityVariant::Link { .. } => Err(OcciError::InstanceValidation(format!(
                "link '{}' cannot hold links",
                self.id
            ))),
        }
    }

    /// Adds the mixin and its attribute definitions. Definitions already on
    /// the entity are kept.
    pub fn add_mixin(&mut self, mixin: &Category) -> Result<()> {
        if !mixin.is_mixin() {
            return Err(OcciError::InstanceValidation(format!(
                "'{mixin}' is not a mixin"
            )));
        }
        for (name, definition) in mixin.attributes() {
            self.attributes
                .entry(name.clone())
                .or_insert_with(|| Attribute::from_definition(definition.clone()));
        }
        self.mixins.insert(mixin.identifier());
        Ok(())
    }

    pub fn remove_mixin(&mut self, identifier: &str) -> bool {
        self.mixins.remove(identifier)
    }

    /// Stores `value` for a defined attribute. Core id, source and target
    /// attributes stay in sync with the entity fields.
    pub fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<()> {
        let Some(attribute) = self.attributes.get_mut(name) else {
            return Err(OcciError::AttributeValidation(format!(
                "'{name}' is not defined for entity '{}'",
                self.id
            )));
        };
        attribute.value = Some(value.clone());

        let text = value.as_text().map(ToString::to_string);
        match (name, text, &mut self.variant) {
            (ATTR_ID, Some(id), _) => self.id = id,
            (ATTR_SOURCE, Some(uri), EntityVariant::Link { source, .. }) => *source = uri,
            (ATTR_TARGET, Some(uri), EntityVariant::Link { target, .. }) => *target = uri,
            _ => {}
        }
        Ok(())
    }

    pub fn select_mixins<'a, L>(&self, filter: &Category, lookup: &'a L) -> Vec<&'a Category>
    where
        L: CategoryLookup + ?Sized,
    {
        self.mixins
            .iter()
            .filter_map(|identifier| lookup.lookup(identifier))
            .filter(|mixin| mixin.depends_on(filter))
            .collect()
    }

    pub fn select_mixin<'a, L>(&self, filter: &Category, lookup: &'a L) -> Option<&'a Category>
    where
        L: CategoryLookup + ?Sized,
    {
        self.mixins
            .iter()
            .filter_map(|identifier| lookup.lookup(identifier))
            .find(|mixin| mixin.depends_on(filter))
    }

    pub fn require_mixin<'a, L>(&self, filter: &Category, lookup: &'a L) -> Result<&'a Category>
    where
        L: CategoryLookup + ?Sized,
    {
        self.select_mixin(filter, lookup).ok_or_else(|| {
            OcciError::InstanceLookup(format!("mixin dependent on '{filter}' not found"))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.is_empty() {
            return Err(OcciError::InstanceValidation(
                "entity is missing an id".to_string(),
            ));
        }
        if self.kind.is_empty() {
            return Err(OcciError::InstanceValidation(format!(
                "entity '{}' is missing a kind",
                self.id
            )));
        }
        validate_attributes(&self.id, &self.attributes)?;

        match &self.variant {
            EntityVariant::Link { source, target, .. } => {
                if source.is_empty() || target.is_empty() {
                    return Err(OcciError::InstanceValidation(format!(
                        "link '{}' needs both source and target",
                        self.id
                    )));
                }
            }
            EntityVariant::Resource { links } => {
                for link in links {
                    link.validate()?;
                }
            }
        }
        trace!(id = %self.id, kind = %self.kind, "entity validated");
        Ok(())
    }
}

use std::collections::BTreeMap;

use crate::error::{OcciError, Result};

use super::attribute::{Attribute, AttributeValue, validate_attributes};
use super::category::Category;

/// One invocation of an action with its arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionInstance {
    action: String,
    attributes: BTreeMap<String, Attribute>,
}

impl ActionInstance {
    pub fn new(action: &Category) -> Result<Self> {
        if !action.is_action() {
            return Err(OcciError::InstanceValidation(format!(
                "'{action}' is not an action"
            )));
        }
        Ok(Self {
            action: action.identifier(),
            attributes: action
                .attributes()
                .iter()
                .map(|(name, definition)| {
                    (name.clone(), Attribute::from_definition(definition.clone()))
                })
                .collect(),
        })
    }

    #[must_use]
    pub fn action(&self) -> &str {
        &self.action
    }

    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, Attribute> {
        &self.attributes
    }

    #[must_use]
    pub fn value(&self, name: &str) -> Option<&AttributeValue> {
        self.attributes
            .get(name)
            .and_then(|attribute| attribute.value.as_ref())
    }

    pub fn set_attribute(&mut self, name: &str, value: AttributeValue) -> Result<()> {
        let Some(attribute) = self.attributes.get_mut(name) else {
            return Err(OcciError::AttributeValidation(format!(
                "'{name}' is not an argument of action '{}'",
                self.action
            )));
        };
        attribute.value = Some(value);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.action.is_empty() {
            return Err(OcciError::InstanceValidation(
                "action instance is missing its action".to_string(),
            ));
        }
        validate_attributes(&self.action, &self.attributes)
    }
}

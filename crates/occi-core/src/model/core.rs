use std::collections::BTreeMap;

use crate::error::Result;

use super::attribute::{AttributeDefinition, AttributeType};
use super::category::{Category, KindSpec};

pub const CORE_SCHEME: &str = "http://schemas.ogf.org/occi/core#";
pub const ENTITY: &str = "http://schemas.ogf.org/occi/core#entity";
pub const RESOURCE: &str = "http://schemas.ogf.org/occi/core#resource";
pub const LINK: &str = "http://schemas.ogf.org/occi/core#link";

pub const ATTR_ID: &str = "occi.core.id";
pub const ATTR_TITLE: &str = "occi.core.title";
pub const ATTR_SUMMARY: &str = "occi.core.summary";
pub const ATTR_SOURCE: &str = "occi.core.source";
pub const ATTR_TARGET: &str = "occi.core.target";

fn definitions<const N: usize>(
    entries: [(&str, AttributeDefinition); N],
) -> BTreeMap<String, AttributeDefinition> {
    entries
        .into_iter()
        .map(|(name, definition)| (name.to_string(), definition))
        .collect()
}

pub fn entity_kind() -> Result<Category> {
    Category::kind(KindSpec {
        title: Some("Entity".to_string()),
        attributes: definitions([
            (
                ATTR_ID,
                AttributeDefinition::of_type(AttributeType::String)
                    .required()
                    .immutable(),
            ),
            (ATTR_TITLE, AttributeDefinition::of_type(AttributeType::String)),
        ]),
        ..KindSpec::new("entity", CORE_SCHEME)
    })
}

pub fn resource_kind(entity: &Category) -> Result<Category> {
    Category::kind(KindSpec {
        title: Some("Resource".to_string()),
        attributes: definitions([(
            ATTR_SUMMARY,
            AttributeDefinition::of_type(AttributeType::String).with_pattern(".*"),
        )]),
        parent: Some(entity),
        ..KindSpec::new("resource", CORE_SCHEME)
    })
}

pub fn link_kind(entity: &Category) -> Result<Category> {
    Category::kind(KindSpec {
        title: Some("Link".to_string()),
        attributes: definitions([
            (
                ATTR_SOURCE,
                AttributeDefinition::of_type(AttributeType::Uri).required(),
            ),
            (
                ATTR_TARGET,
                AttributeDefinition::of_type(AttributeType::Uri).required(),
            ),
        ]),
        parent: Some(entity),
        ..KindSpec::new("link", CORE_SCHEME)
    })
}

/// `entity`, `resource` and `link`, parents first.
pub fn core_categories() -> Result<Vec<Category>> {
    let entity = entity_kind()?;
    let resource = resource_kind(&entity)?;
    let link = link_kind(&entity)?;
    Ok(vec![entity, resource, link])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn core_kinds_inherit_entity_attributes() {
        let categories = core_categories().expect("core categories");
        let resource = &categories[1];
        let link = &categories[2];

        assert_eq!(resource.identifier(), RESOURCE);
        assert_eq!(resource.parent(), Some(ENTITY));
        for name in [ATTR_ID, ATTR_TITLE, ATTR_SUMMARY] {
            assert!(resource.attributes().contains_key(name), "{name}");
        }
        for name in [ATTR_ID, ATTR_TITLE, ATTR_SOURCE, ATTR_TARGET] {
            assert!(link.attributes().contains_key(name), "{name}");
        }
        assert!(!link.attributes().contains_key(ATTR_SUMMARY));
        assert_eq!(
            link.related(&categories)
                .iter()
                .map(|category| category.term())
                .collect::<Vec<_>>(),
            vec!["link", "entity"]
        );
    }
}

use std::collections::BTreeMap;

use crate::error::{OcciError, Result};
use crate::model::core::{self, ATTR_SOURCE, ATTR_TARGET};
use crate::model::{ActionInstance, Attribute, Category, CategoryLookup, Collection, Entity};

use super::attributes::render_attribute;
use super::category::{render_category, render_category_reference};
use super::{ATTRIBUTE_HEADER, LINK_HEADER, LOCATION_HEADER, Rendering, quote};

fn resolve<'a, L>(lookup: &'a L, identifier: &str) -> Result<&'a Category>
where
    L: CategoryLookup + ?Sized,
{
    lookup
        .lookup(identifier)
        .ok_or_else(|| OcciError::Rendering(format!("category '{identifier}' is not known")))
}

fn push_attributes(
    rendering: &mut Rendering,
    attributes: &BTreeMap<String, Attribute>,
) -> Result<()> {
    for (name, attribute) in attributes {
        if let Some(value) = &attribute.value {
            rendering.push(
                ATTRIBUTE_HEADER,
                render_attribute(name, attribute.definition.as_ref(), value)?,
            );
        }
    }
    Ok(())
}

fn link_line(link: &Entity) -> Result<String> {
    let target = link
        .target()
        .ok_or_else(|| OcciError::Rendering(format!("'{}' is not a link", link.id())))?;
    let mut line = format!(
        "<{target}>;rel={};self={};category={}",
        quote(link.rel().unwrap_or(core::RESOURCE)),
        quote(&link.location()),
        quote(link.kind())
    );
    for (name, attribute) in link.attributes() {
        if name == ATTR_SOURCE || name == ATTR_TARGET {
            continue;
        }
        if let Some(value) = &attribute.value {
            line.push(';');
            line.push_str(&render_attribute(
                name,
                attribute.definition.as_ref(),
                value,
            )?);
        }
    }
    Ok(line)
}

fn action_term(identifier: &str, lookup: &(impl CategoryLookup + ?Sized)) -> String {
    lookup.lookup(identifier).map_or_else(
        || identifier.rsplit('#').next().unwrap_or(identifier).to_string(),
        |action| action.term().to_string(),
    )
}

/// Kind and mixin references, one `Link:` per held link and per action of
/// the kind, then every attribute that has a value. Any attribute that cannot
/// be rendered fails the whole entity.
pub fn render_entity<L>(entity: &Entity, lookup: &L) -> Result<Rendering>
where
    L: CategoryLookup + ?Sized,
{
    let kind = resolve(lookup, entity.kind())?;
    let mut rendering = render_category_reference(kind);
    for mixin in entity.mixins() {
        rendering.append(render_category_reference(resolve(lookup, mixin)?));
    }

    for link in entity.links() {
        rendering.push(LINK_HEADER, link_line(link)?);
    }
    let location = entity.location();
    for action in kind.actions() {
        rendering.push(
            LINK_HEADER,
            format!(
                "<{location}?action={}>;rel={}",
                action_term(action, lookup),
                quote(action)
            ),
        );
    }

    push_attributes(&mut rendering, entity.attributes())?;
    Ok(rendering)
}

pub fn render_action_instance<L>(instance: &ActionInstance, lookup: &L) -> Result<Rendering>
where
    L: CategoryLookup + ?Sized,
{
    let action = resolve(lookup, instance.action())?;
    let mut rendering = render_category_reference(action);
    push_attributes(&mut rendering, instance.attributes())?;
    Ok(rendering)
}

#[must_use]
pub fn render_locations<I>(locations: I) -> Rendering
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut rendering = Rendering::new();
    for location in locations {
        rendering.push(LOCATION_HEADER, location.as_ref());
    }
    rendering
}

/// Full category definitions, then entities, then action instances, each
/// resolved against the collection's own categories.
pub fn render_collection(collection: &Collection<'_>) -> Result<Rendering> {
    let mut rendering = Rendering::new();
    for category in collection.categories() {
        rendering.append(render_category(category));
    }
    for entity in collection.entities() {
        rendering.append(render_entity(entity, collection)?);
    }
    for instance in collection.action_instances() {
        rendering.append(render_action_instance(instance, collection)?);
    }
    Ok(rendering)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{
        ActionSpec, AttributeDefinition, AttributeType, AttributeValue, KindSpec, Model,
    };

    const INFRA: &str = "http://schemas.ogf.org/occi/infrastructure#";
    const START: &str = "http://schemas.ogf.org/occi/infrastructure/compute/action#start";

    fn model() -> Model {
        let mut model = Model::with_core().expect("core");
        let resource = model.get(core::RESOURCE).expect("resource").clone();
        let start = Category::action(ActionSpec::new(
            "start",
            "http://schemas.ogf.org/occi/infrastructure/compute/action#",
        ))
        .expect("start");
        let compute = Category::kind(KindSpec {
            parent: Some(&resource),
            actions: Some(BTreeSet::from([START.to_string()])),
            attributes: [(
                "occi.compute.memory".to_string(),
                AttributeDefinition::of_type(AttributeType::Number),
            )]
            .into(),
            ..KindSpec::new("compute", INFRA)
        })
        .expect("compute");
        model.extend([start, compute]).expect("insert");
        model
    }

    fn vm(model: &Model) -> Entity {
        let mut vm = Entity::resource(model.get(&format!("{INFRA}compute")).expect("compute"))
            .expect("entity");
        vm.set_id("vm-1");
        vm.set_attribute("occi.core.title", AttributeValue::from("My VM"))
            .expect("title");
        vm.set_attribute("occi.compute.memory", AttributeValue::Integer(4096))
            .expect("memory");
        vm
    }

    #[test]
    fn entity_renders_references_links_and_attributes() {
        let model = model();
        let mut vm = vm(&model);
        let mut link = Entity::link(
            model.get(core::LINK).expect("link"),
            "/compute/vm-1",
            "/network/net-1",
        )
        .expect("link");
        link.set_id("nic-1");
        vm.add_link(link).expect("attach");

        let plain = render_entity(&vm, &model).expect("render").render_plain();
        assert_eq!(
            plain.lines().collect::<Vec<_>>(),
            vec![
                "Category: compute;scheme=\"http://schemas.ogf.org/occi/infrastructure#\";class=\"kind\"",
                "Link: </network/net-1>;rel=\"http://schemas.ogf.org/occi/core#resource\";\
                 self=\"/link/nic-1\";category=\"http://schemas.ogf.org/occi/core#link\";\
                 occi.core.id=\"nic-1\"",
                "Link: </compute/vm-1?action=start>;rel=\"http://schemas.ogf.org/occi/infrastructure/compute/action#start\"",
                "X-OCCI-Attribute: occi.compute.memory=4096",
                "X-OCCI-Attribute: occi.core.id=\"vm-1\"",
                "X-OCCI-Attribute: occi.core.title=\"My VM\"",
            ]
        );
    }

    #[test]
    fn unrenderable_attribute_fails_the_whole_entity() {
        let model = model();
        let mut vm = vm(&model);
        vm.set_attribute("occi.compute.memory", AttributeValue::from("lots"))
            .expect("set");
        assert!(matches!(
            render_entity(&vm, &model),
            Err(OcciError::Rendering(_))
        ));
    }

    #[test]
    fn unknown_kind_is_a_rendering_error() {
        let model = model();
        let vm = vm(&model);
        assert!(render_entity(&vm, &Model::new()).is_err());
    }

    #[test]
    fn action_instances_and_locations() {
        let model = model();
        let instance = ActionInstance::new(model.get(START).expect("start")).expect("instance");
        assert_eq!(
            render_action_instance(&instance, &model)
                .expect("render")
                .render_plain(),
            "Category: start;scheme=\"http://schemas.ogf.org/occi/infrastructure/compute/action#\";class=\"action\""
        );

        let headers = render_locations(["/compute/1", "/compute/2"]).render_headers();
        assert_eq!(
            headers["X-OCCI-Location"],
            vec!["/compute/1".to_string(), "/compute/2".to_string()]
        );
    }

    #[test]
    fn collection_renders_categories_before_instances() {
        let model = model();
        let mut collection = Collection::with_model(&model);
        collection.add_entity(vm(&model));
        let rendering = render_collection(&collection).expect("render");
        let headers = rendering
            .lines()
            .iter()
            .map(|(header, _)| *header)
            .collect::<Vec<_>>();
        assert_eq!(headers.iter().filter(|h| **h == "Category").count(), model.len() + 1);
        assert_eq!(headers.last(), Some(&"X-OCCI-Attribute"));
    }
}

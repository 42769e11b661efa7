//! Turns parsed records into model objects.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use tracing::{debug, trace};

use crate::error::{OcciError, Result};
use crate::model::core::{self, ATTR_SOURCE, ATTR_TARGET};
use crate::model::{
    ActionInstance, ActionSpec, AttributeDefinition, AttributeLookup, AttributeType,
    AttributeValue, Category, CategoryClass, CategoryLookup, Entity, IpValue, KindSpec, MixinSpec,
};

use super::document::ParsedText;
use super::record::{Number, Record, Value};

fn required_text<'r>(record: &'r Record, key: &str) -> Result<&'r str> {
    record.get_text(key).ok_or_else(|| {
        OcciError::MandatoryArgument(format!("category record is missing '{key}'"))
    })
}

fn text_list(record: &Record, key: &str) -> Vec<String> {
    record
        .get(key)
        .and_then(Value::as_list)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_text)
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn reference(record: &Record) -> Result<String> {
    Ok(format!(
        "{}{}",
        required_text(record, "scheme")?,
        required_text(record, "term")?
    ))
}

/// Builds a Kind, Mixin or Action from a category record. Attribute names
/// unknown to `lookup` get the default definition; a kind's `rel` must name a
/// kind `lookup` already holds.
pub fn category<L>(record: &Record, lookup: &L) -> Result<Category>
where
    L: CategoryLookup + AttributeLookup + ?Sized,
{
    let term = required_text(record, "term")?.to_string();
    let scheme = required_text(record, "scheme")?.to_string();
    let class = CategoryClass::from_str(required_text(record, "class")?)?;
    let title = record.get_text("title").map(ToString::to_string);
    let location = record.get_text("location").map(ToString::to_string);
    let attributes = text_list(record, "attributes")
        .into_iter()
        .map(|name| {
            let definition = lookup
                .attribute_definition(&name)
                .cloned()
                .unwrap_or_default();
            (name, definition)
        })
        .collect::<BTreeMap<_, _>>();

    let category = match class {
        CategoryClass::Kind => {
            let parent = match record.get_text("rel") {
                Some(rel) => Some(
                    lookup
                        .lookup(rel)
                        .filter(|parent| parent.is_kind())
                        .ok_or_else(|| {
                            OcciError::InstanceLookup(format!(
                                "parent kind '{rel}' of '{scheme}{term}' not found"
                            ))
                        })?,
                ),
                None => None,
            };
            Category::kind(KindSpec {
                term,
                scheme,
                title,
                attributes,
                parent,
                actions: Some(text_list(record, "actions").into_iter().collect()),
                location,
            })?
        }
        CategoryClass::Mixin => Category::mixin(MixinSpec {
            term,
            scheme,
            title,
            attributes,
            applies: BTreeSet::new(),
            depends: record
                .get_text("rel")
                .map(ToString::to_string)
                .into_iter()
                .collect(),
            location,
        })?,
        CategoryClass::Action => Category::action(ActionSpec {
            term,
            scheme,
            title,
            attributes,
        })?,
    };
    debug!(category = %category, class = %category.class(), "bound category");
    Ok(category)
}

fn coerce(
    name: &str,
    definition: Option<&AttributeDefinition>,
    raw: &Value,
) -> Result<AttributeValue> {
    let invalid =
        |expected: &str| OcciError::AttributeValidation(format!("'{name}' expects {expected}"));
    let type_tag = definition
        .and_then(|definition| definition.type_tag.clone())
        .unwrap_or(AttributeType::String);

    match (&type_tag, raw) {
        (AttributeType::Number, Value::Number(Number::Integer(value))) => i64::try_from(*value)
            .map(AttributeValue::Integer)
            .or_else(|_| Ok(AttributeValue::Float(Number::Integer(*value).as_f64()))),
        (AttributeType::Number, Value::Number(Number::Decimal(value))) => {
            Ok(AttributeValue::Float(*value))
        }
        (AttributeType::Number, Value::Text(text)) => {
            let text = text.trim();
            text.parse::<i64>()
                .map(AttributeValue::Integer)
                .or_else(|_| text.parse::<f64>().map(AttributeValue::Float))
                .map_err(|_| invalid("a number"))
        }
        (AttributeType::Boolean, Value::Text(text)) => match text.as_str() {
            "true" => Ok(AttributeValue::Boolean(true)),
            "false" => Ok(AttributeValue::Boolean(false)),
            _ => Err(invalid("true or false")),
        },
        (AttributeType::Uri, Value::Text(text)) => Ok(AttributeValue::Uri(text.clone())),
        (AttributeType::Ip, Value::Text(text)) => text.parse::<IpValue>().map(AttributeValue::Ip),
        (AttributeType::Json, Value::Text(text)) => {
            Ok(AttributeValue::Json(serde_json::from_str(text)?))
        }
        (AttributeType::Json, Value::Number(number)) => {
            Ok(AttributeValue::Json(serde_json::from_str(&number.to_string())?))
        }
        (AttributeType::String | AttributeType::Other(_), Value::Text(text)) => {
            Ok(AttributeValue::String(text.clone()))
        }
        (AttributeType::String | AttributeType::Other(_), Value::Number(number)) => {
            Ok(AttributeValue::String(number.to_string()))
        }
        (type_tag, _) => Err(invalid(type_tag.name())),
    }
}

#[derive(Default)]
struct References<'a> {
    kinds: Vec<&'a Category>,
    mixins: Vec<&'a Category>,
    actions: Vec<&'a Category>,
}

/// Resolves every category reference through `lookup`, grouped by class.
fn resolve_references<'a, L>(categories: &[Record], lookup: &'a L) -> Result<References<'a>>
where
    L: CategoryLookup + ?Sized,
{
    let mut references = References::default();
    for record in categories {
        let identifier = reference(record)?;
        let category = lookup.lookup(&identifier).ok_or_else(|| {
            OcciError::InstanceLookup(format!("category '{identifier}' not found"))
        })?;
        match category.class() {
            CategoryClass::Kind => references.kinds.push(category),
            CategoryClass::Mixin => references.mixins.push(category),
            CategoryClass::Action => references.actions.push(category),
        }
    }
    Ok(references)
}

fn apply_attributes(
    attributes: &Record,
    mut set: impl FnMut(&str, AttributeValue) -> Result<()>,
    definition: impl Fn(&str) -> Option<AttributeDefinition>,
) -> Result<()> {
    for (name, raw) in attributes.flatten() {
        let value = coerce(&name, definition(&name).as_ref(), raw)?;
        set(&name, value)?;
    }
    Ok(())
}

/// Builds an entity from a parsed request: exactly one kind reference, any
/// number of mixin references, attributes and `Link:` lines.
pub fn entity<L>(parsed: &ParsedText, lookup: &L) -> Result<Entity>
where
    L: CategoryLookup + ?Sized,
{
    let references = resolve_references(&parsed.categories, lookup)?;
    let [kind] = references.kinds.as_slice() else {
        return Err(OcciError::InstanceValidation(format!(
            "an entity needs exactly one kind, found {}",
            references.kinds.len()
        )));
    };

    let is_link = lookup
        .lookup(core::LINK)
        .is_some_and(|link| kind.is_related(link, lookup));
    let mut entity = if is_link {
        let endpoint = |name: &str| {
            parsed
                .attributes
                .get_path(name)
                .and_then(Value::as_text)
                .map(ToString::to_string)
                .ok_or_else(|| OcciError::MandatoryArgument(format!("link requires '{name}'")))
        };
        Entity::link(kind, endpoint(ATTR_SOURCE)?, endpoint(ATTR_TARGET)?)?
    } else {
        Entity::resource(kind)?
    };
    for mixin in &references.mixins {
        entity.add_mixin(mixin)?;
    }

    let definitions = entity.attributes().clone();
    apply_attributes(
        &parsed.attributes,
        |name, value| entity.set_attribute(name, value),
        |name| definitions.get(name).and_then(|attribute| attribute.definition.clone()),
    )?;
    if let Some(location) = parsed.locations.first() {
        entity.set_location(location.clone());
    }

    for record in &parsed.links {
        if is_action_link(record) {
            trace!(target = ?record.get_text("target"), "skipping action link");
            continue;
        }
        let link = link(record, &entity.location(), lookup)?;
        entity.add_link(link)?;
    }
    debug!(id = %entity.id(), kind = %entity.kind(), links = entity.links().len(), "bound entity");
    Ok(entity)
}

/// `<location?action=term>` lines advertise invocable actions; they are not links.
fn is_action_link(record: &Record) -> bool {
    record
        .get_text("target")
        .is_some_and(|target| target.contains("?action="))
}

fn link<L>(record: &Record, source: &str, lookup: &L) -> Result<Entity>
where
    L: CategoryLookup + ?Sized,
{
    let kind_id = record.get_text("category").unwrap_or(core::LINK);
    let kind = lookup
        .lookup(kind_id)
        .filter(|kind| kind.is_kind())
        .ok_or_else(|| OcciError::InstanceLookup(format!("link kind '{kind_id}' not found")))?;
    let target = record
        .get_text("target")
        .ok_or_else(|| OcciError::MandatoryArgument("link record is missing 'target'".to_string()))?;

    let mut link = Entity::link(kind, source, target)?;
    if let Some(rel) = record.get_text("rel") {
        link.set_rel(rel)?;
    }
    if let Some(location) = record.get_text("self") {
        link.set_location(location);
    }
    if let Some(attributes) = record.get_record("attributes") {
        let definitions = link.attributes().clone();
        apply_attributes(
            attributes,
            |name, value| link.set_attribute(name, value),
            |name| definitions.get(name).and_then(|attribute| attribute.definition.clone()),
        )?;
    }
    Ok(link)
}

/// Builds an action invocation from one action reference and its arguments.
pub fn action_instance<L>(parsed: &ParsedText, lookup: &L) -> Result<ActionInstance>
where
    L: CategoryLookup + ?Sized,
{
    let references = resolve_references(&parsed.categories, lookup)?;
    let [action] = references.actions.as_slice() else {
        return Err(OcciError::InstanceValidation(format!(
            "an action invocation needs exactly one action, found {}",
            references.actions.len()
        )));
    };
    let mut instance = ActionInstance::new(action)?;
    apply_attributes(
        &parsed.attributes,
        |name, value| instance.set_attribute(name, value),
        |name| action.attributes().get(name).cloned(),
    )?;
    Ok(instance)
}

#[cfg(test)]
mod tests {
    use std::net::{IpAddr, Ipv4Addr};

    use super::*;
    use crate::config::TextConfig;
    use crate::model::Model;
    use crate::text::document::parse_text;
    use crate::text::parser::parse_category;

    const INFRA: &str = "http://schemas.ogf.org/occi/infrastructure#";

    fn model() -> Model {
        let mut model = Model::with_core().expect("core");
        for line in [
            format!(
                "Category: network;scheme=\"{INFRA}\";class=\"kind\";rel=\"{}\";\
                 attributes=\"occi.network.address occi.network.vlan\"",
                core::RESOURCE
            ),
            format!(
                "Category: networkinterface;scheme=\"{INFRA}\";class=\"kind\";rel=\"{}\"",
                core::LINK
            ),
            "Category: up;scheme=\"http://schemas.ogf.org/occi/infrastructure/network/action#\";class=\"action\""
                .to_string(),
        ] {
            let record = parse_category(&line).expect("parse");
            let bound = category(&record, &model).expect("bind");
            model.insert(bound).expect("insert");
        }
        model
    }

    #[test]
    fn unknown_attributes_get_the_default_definition() {
        let model = model();
        let network = model.get(&format!("{INFRA}network")).expect("network");
        assert_eq!(
            network.attributes()["occi.network.vlan"],
            AttributeDefinition::default()
        );
        assert_eq!(network.parent(), Some(core::RESOURCE));
        assert!(network.attributes().contains_key("occi.core.summary"));
    }

    #[test]
    fn kind_parent_must_be_known() {
        let record = parse_category(&format!(
            "Category: compute;scheme=\"{INFRA}\";class=\"kind\";rel=\"http://example.org/missing#kind\""
        ))
        .expect("parse");
        assert!(matches!(
            category(&record, &Model::new()),
            Err(OcciError::InstanceLookup(_))
        ));
    }

    #[test]
    fn mixin_rel_becomes_dependency() {
        let record = parse_category(
            "Category: ubuntu;scheme=\"http://example.org/tpl#\";class=\"mixin\";rel=\"http://schemas.ogf.org/occi/infrastructure#os_tpl\"",
        )
        .expect("parse");
        let mixin = category(&record, &Model::new()).expect("bind");
        assert_eq!(
            mixin.as_mixin().map(|data| data.depends.len()),
            Some(1)
        );
    }

    #[test]
    fn entity_binding_coerces_attributes_and_links() {
        let model = model();
        let payload = format!(
            "Category: network;scheme=\"{INFRA}\";class=\"kind\"\n\
             X-OCCI-Attribute: occi.core.title=\"backbone\"\n\
             X-OCCI-Attribute: occi.network.vlan=12\n\
             X-OCCI-Location: /network/backbone\n\
             Link: </compute/1>;rel=\"{INFRA}compute\";category=\"{INFRA}networkinterface\";occi.core.title=\"uplink\"\n"
        );
        let parsed = parse_text(&payload, &TextConfig::default());
        assert!(parsed.is_ok(), "{:?}", parsed.errors);

        let entity = entity(&parsed, &model).expect("bind entity");
        assert_eq!(entity.title(), Some("backbone"));
        assert_eq!(
            entity.value("occi.network.vlan"),
            Some(&AttributeValue::String("12".to_string()))
        );
        assert_eq!(entity.location(), "/network/backbone");

        let link = &entity.links()[0];
        assert_eq!(link.source(), Some("/network/backbone"));
        assert_eq!(link.target(), Some("/compute/1"));
        assert_eq!(link.rel(), Some(format!("{INFRA}compute").as_str()));
        assert_eq!(link.title(), Some("uplink"));
        entity.validate().expect("valid entity");
    }

    #[test]
    fn entity_binding_requires_one_known_kind() {
        let model = model();
        let parsed = parse_text(
            "Category: storage;scheme=\"http://schemas.ogf.org/occi/infrastructure#\";class=\"kind\"",
            &TextConfig::default(),
        );
        assert!(matches!(
            entity(&parsed, &model),
            Err(OcciError::InstanceLookup(_))
        ));

        let parsed = parse_text("X-OCCI-Attribute: occi.core.title=\"x\"", &TextConfig::default());
        assert!(matches!(
            entity(&parsed, &model),
            Err(OcciError::InstanceValidation(_))
        ));
    }

    #[test]
    fn link_entities_read_source_and_target_attributes() {
        let model = model();
        let payload = format!(
            "Category: networkinterface;scheme=\"{INFRA}\";class=\"kind\"\n\
             X-OCCI-Attribute: occi.core.source=\"/compute/1\"\n\
             X-OCCI-Attribute: occi.core.target=\"/network/2\""
        );
        let parsed = parse_text(&payload, &TextConfig::default());
        let link = entity(&parsed, &model).expect("bind link");
        assert!(link.is_link());
        assert_eq!(link.target(), Some("/network/2"));
    }

    #[test]
    fn action_instance_binding() {
        let model = model();
        let parsed = parse_text(
            "Category: up;scheme=\"http://schemas.ogf.org/occi/infrastructure/network/action#\";class=\"action\"",
            &TextConfig::default(),
        );
        let instance = action_instance(&parsed, &model).expect("bind action");
        assert_eq!(
            instance.action(),
            "http://schemas.ogf.org/occi/infrastructure/network/action#up"
        );
    }

    #[test]
    fn coercion_follows_the_definition_type() {
        let ip = AttributeDefinition::of_type(AttributeType::Ip);
        assert_eq!(
            coerce("ip", Some(&ip), &Value::from("10.0.0.1")).expect("ip"),
            AttributeValue::Ip(IpValue::host(IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1))))
        );

        let number = AttributeDefinition::of_type(AttributeType::Number);
        assert_eq!(
            coerce("n", Some(&number), &Value::Number(Number::Decimal(2.5))).expect("number"),
            AttributeValue::Float(2.5)
        );

        let boolean = AttributeDefinition::of_type(AttributeType::Boolean);
        assert!(coerce("b", Some(&boolean), &Value::Number(Number::Integer(1))).is_err());

        let json = AttributeDefinition::of_type(AttributeType::Json);
        assert_eq!(
            coerce("j", Some(&json), &Value::from("{\"a\":[1,2]}")).expect("json"),
            AttributeValue::Json(serde_json::json!({"a": [1, 2]}))
        );
    }
}

mod action_instance;
mod attribute;
mod category;
mod collection;
pub mod core;
mod entity;
mod registry;

pub use action_instance::ActionInstance;
pub use attribute::{
    Attribute, AttributeDefinition, AttributeLookup, AttributeType, AttributeValue, IpValue,
};
pub use category::{
    ActionSpec, Category, CategoryClass, CategoryLookup, CategoryVariant, KindData, KindSpec,
    MixinData, MixinSpec, default_location,
};
pub use collection::Collection;
pub use entity::{Entity, EntityVariant};
pub use registry::Model;

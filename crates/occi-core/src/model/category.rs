use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt::{Display, Formatter};
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use crate::error::{OcciError, Result};
use crate::text::parser::is_renderable_term;

use super::attribute::{AttributeDefinition, AttributeLookup};

/// Resolves category identifiers (`scheme` + `term`) without owning the
/// categories.
pub trait CategoryLookup {
    fn lookup(&self, identifier: &str) -> Option<&Category>;
}

impl CategoryLookup for [Category] {
    fn lookup(&self, identifier: &str) -> Option<&Category> {
        self.iter()
            .find(|category| category.identifier() == identifier)
    }
}

impl CategoryLookup for Vec<Category> {
    fn lookup(&self, identifier: &str) -> Option<&Category> {
        self.as_slice().lookup(identifier)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CategoryClass {
    Kind,
    Mixin,
    Action,
}

impl CategoryClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Kind => "kind",
            Self::Mixin => "mixin",
            Self::Action => "action",
        }
    }
}

impl Display for CategoryClass {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CategoryClass {
    type Err = OcciError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "kind" => Ok(Self::Kind),
            "mixin" => Ok(Self::Mixin),
            "action" => Ok(Self::Action),
            other => Err(OcciError::CategoryValidation(format!(
                "unknown category class '{other}'"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KindData {
    pub parent: Option<String>,
    pub actions: BTreeSet<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MixinData {
    pub applies: BTreeSet<String>,
    pub depends: BTreeSet<String>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryVariant {
    Kind(KindData),
    Mixin(MixinData),
    Action,
}

/// Arguments for [`Category::kind`]. `actions: None` is rejected, the
/// default is an empty set.
#[derive(Debug, Clone)]
pub struct KindSpec<'a> {
    pub term: String,
    pub scheme: String,
    pub title: Option<String>,
    pub attributes: BTreeMap<String, AttributeDefinition>,
    pub parent: Option<&'a Category>,
    pub actions: Option<BTreeSet<String>>,
    pub location: Option<String>,
}

impl Default for KindSpec<'_> {
    fn default() -> Self {
        Self {
            term: String::new(),
            scheme: String::new(),
            title: None,
            attributes: BTreeMap::new(),
            parent: None,
            actions: Some(BTreeSet::new()),
            location: None,
        }
    }
}

impl KindSpec<'_> {
    #[must_use]
    pub fn new(term: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: scheme.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct MixinSpec {
    pub term: String,
    pub scheme: String,
    pub title: Option<String>,
    pub attributes: BTreeMap<String, AttributeDefinition>,
    pub applies: BTreeSet<String>,
    pub depends: BTreeSet<String>,
    pub location: Option<String>,
}

impl MixinSpec {
    #[must_use]
    pub fn new(term: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: scheme.into(),
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ActionSpec {
    pub term: String,
    pub scheme: String,
    pub title: Option<String>,
    pub attributes: BTreeMap<String, AttributeDefinition>,
}

impl ActionSpec {
    #[must_use]
    pub fn new(term: impl Into<String>, scheme: impl Into<String>) -> Self {
        Self {
            term: term.into(),
            scheme: scheme.into(),
            ..Self::default()
        }
    }
}

/// Kind, Mixin or Action. Identity is `scheme + term`; equality and hashing
/// only look at the identifier.
#[derive(Debug, Clone)]
pub struct Category {
    term: String,
    scheme: String,
    title: Option<String>,
    attributes: BTreeMap<String, AttributeDefinition>,
    variant: CategoryVariant,
}

/// `/<term>/`, the location a kind gets when none is configured.
pub fn default_location(term: &str) -> Result<String> {
    if term.trim().is_empty() {
        return Err(OcciError::MandatoryArgument(
            "cannot generate a default location without a term".to_string(),
        ));
    }
    Ok(format!("/{term}/"))
}

fn check_identity(term: &str, scheme: &str) -> Result<()> {
    if term.is_empty() {
        return Err(OcciError::MandatoryArgument(
            "term is a mandatory argument for categories".to_string(),
        ));
    }
    if scheme.is_empty() {
        return Err(OcciError::MandatoryArgument(format!(
            "scheme is a mandatory argument for category '{term}'"
        )));
    }
    let mut chars = term.chars();
    let valid_head = chars.next().is_some_and(|ch| ch.is_ascii_lowercase());
    let valid_tail =
        chars.all(|ch| ch.is_ascii_lowercase() || ch.is_ascii_digit() || ch == '-' || ch == '_');
    if !valid_head || !valid_tail {
        return Err(OcciError::CategoryValidation(format!(
            "term '{term}' must be lowercase letters, digits, '-' or '_' starting with a letter"
        )));
    }
    if !is_renderable_term(term) {
        return Err(OcciError::CategoryValidation(format!(
            "term '{term}' contains a reserved word that cannot be rendered back"
        )));
    }
    Ok(())
}

impl Category {
    pub fn kind(spec: KindSpec<'_>) -> Result<Self> {
        check_identity(&spec.term, &spec.scheme)?;
        let Some(actions) = spec.actions else {
            return Err(OcciError::MandatoryArgument(format!(
                "actions is a mandatory argument for kind '{}'",
                spec.term
            )));
        };

        let mut attributes = spec.attributes;
        let parent = match spec.parent {
            Some(parent) => {
                if !parent.is_kind() {
                    return Err(OcciError::CategoryValidation(format!(
                        "parent '{}' of kind '{}' is not a kind",
                        parent.identifier(),
                        spec.term
                    )));
                }
                for (name, definition) in &parent.attributes {
                    attributes
                        .entry(name.clone())
                        .or_insert_with(|| definition.clone());
                }
                Some(parent.identifier())
            }
            None => None,
        };

        Ok(Self {
            term: spec.term,
            scheme: spec.scheme,
            title: spec.title,
            attributes,
            variant: CategoryVariant::Kind(KindData {
                parent,
                actions,
                location: spec.location,
            }),
        })
    }

    pub fn mixin(spec: MixinSpec) -> Result<Self> {
        check_identity(&spec.term, &spec.scheme)?;
        Ok(Self {
            term: spec.term,
            scheme: spec.scheme,
            title: spec.title,
            attributes: spec.attributes,
            variant: CategoryVariant::Mixin(MixinData {
                applies: spec.applies,
                depends: spec.depends,
                location: spec.location,
            }),
        })
    }

    pub fn action(spec: ActionSpec) -> Result<Self> {
        check_identity(&spec.term, &spec.scheme)?;
        Ok(Self {
            term: spec.term,
            scheme: spec.scheme,
            title: spec.title,
            attributes: spec.attributes,
            variant: CategoryVariant::Action,
        })
    }

    #[must_use]
    pub fn term(&self) -> &str {
        &self.term
    }

    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    #[must_use]
    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    #[must_use]
    pub fn identifier(&self) -> String {
        format!("{}{}", self.scheme, self.term)
    }

    #[must_use]
    pub fn has_identifier(&self, identifier: &str) -> bool {
        identifier
            .strip_prefix(self.scheme.as_str())
            .is_some_and(|term| term == self.term)
    }

    #[must_use]
    pub const fn attributes(&self) -> &BTreeMap<String, AttributeDefinition> {
        &self.attributes
    }

    #[must_use]
    pub const fn variant(&self) -> &CategoryVariant {
        &self.variant
    }

    #[must_use]
    pub const fn class(&self) -> CategoryClass {
        match self.variant {
            CategoryVariant::Kind(_) => CategoryClass::Kind,
            CategoryVariant::Mixin(_) => CategoryClass::Mixin,
            CategoryVariant::Action => CategoryClass::Action,
        }
    }

    #[must_use]
    pub const fn is_kind(&self) -> bool {
        matches!(self.variant, CategoryVariant::Kind(_))
    }

    #[must_use]
    pub const fn is_mixin(&self) -> bool {
        matches!(self.variant, CategoryVariant::Mixin(_))
    }

    #[must_use]
    pub const fn is_action(&self) -> bool {
        matches!(self.variant, CategoryVariant::Action)
    }

    #[must_use]
    pub const fn as_kind(&self) -> Option<&KindData> {
        match &self.variant {
            CategoryVariant::Kind(kind) => Some(kind),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_mixin(&self) -> Option<&MixinData> {
        match &self.variant {
            CategoryVariant::Mixin(mixin) => Some(mixin),
            _ => None,
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<&str> {
        self.as_kind().and_then(|kind| kind.parent.as_deref())
    }

    /// Action identifiers of a kind; empty for mixins and actions.
    pub fn actions(&self) -> impl Iterator<Item = &str> {
        self.as_kind()
            .into_iter()
            .flat_map(|kind| kind.actions.iter().map(String::as_str))
    }

    /// Explicit location, or `/<term>/` for kinds. Actions have none.
    #[must_use]
    pub fn location(&self) -> Option<String> {
        match &self.variant {
            CategoryVariant::Kind(kind) => kind
                .location
                .clone()
                .or_else(|| default_location(&self.term).ok()),
            CategoryVariant::Mixin(mixin) => mixin.location.clone(),
            CategoryVariant::Action => None,
        }
    }

    #[must_use]
    pub const fn is_hierarchy_root(&self) -> bool {
        match &self.variant {
            CategoryVariant::Kind(kind) => kind.parent.is_none(),
            _ => true,
        }
    }

    /// `[self, parent, parent.parent, ...]` up to the hierarchy root. The walk
    /// stops at a parent the lookup cannot resolve or at a repeated identifier.
    pub fn related<'a, L>(&'a self, lookup: &'a L) -> Vec<&'a Category>
    where
        L: CategoryLookup + ?Sized,
    {
        let mut chain = vec![self];
        let mut seen = HashSet::from([self.identifier()]);
        let mut current = self;
        while let Some(parent_id) = current.parent() {
            let Some(parent) = lookup.lookup(parent_id) else {
                break;
            };
            if !seen.insert(parent.identifier()) {
                break;
            }
            chain.push(parent);
            current = parent;
        }
        chain
    }

    /// `[self]` for hierarchy roots, `[self, parent]` otherwise.
    pub fn directly_related<'a, L>(&'a self, lookup: &'a L) -> Vec<&'a Category>
    where
        L: CategoryLookup + ?Sized,
    {
        let mut out = vec![self];
        if let Some(parent) = self.parent().and_then(|id| lookup.lookup(id)) {
            out.push(parent);
        }
        out
    }

    pub fn is_related<L>(&self, other: &Category, lookup: &L) -> bool
    where
        L: CategoryLookup + ?Sized,
    {
        self.related(lookup).iter().any(|candidate| *candidate == other)
    }

    pub fn is_directly_related<L>(&self, other: &Category, lookup: &L) -> bool
    where
        L: CategoryLookup + ?Sized,
    {
        self.directly_related(lookup)
            .iter()
            .any(|candidate| *candidate == other)
    }

    #[must_use]
    pub fn depends_on(&self, mixin: &Category) -> bool {
        self.as_mixin()
            .is_some_and(|data| data.depends.contains(&mixin.identifier()))
    }

    #[must_use]
    pub fn applies_to(&self, kind: &Category) -> bool {
        self.as_mixin()
            .is_some_and(|data| data.applies.contains(&kind.identifier()))
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.scheme == other.scheme && self.term == other.term
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.scheme.hash(state);
        self.term.hash(state);
    }
}

impl Display for Category {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.scheme, self.term)
    }
}

impl AttributeLookup for Category {
    fn attribute_definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.attributes.get(name)
    }
}

use std::collections::{HashMap, HashSet};

use tracing::debug;

use crate::error::{OcciError, Result};

use super::attribute::{AttributeDefinition, AttributeLookup};
use super::category::{Category, CategoryLookup};
use super::core;

/// Owned registry of categories, keyed by identifier, in insertion order.
#[derive(Debug, Clone, Default)]
pub struct Model {
    categories: Vec<Category>,
    index: HashMap<String, usize>,
}

impl Model {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A model holding the OCCI core `entity`, `resource` and `link` kinds.
    pub fn with_core() -> Result<Self> {
        let mut model = Self::new();
        for category in core::core_categories()? {
            model.insert(category)?;
        }
        Ok(model)
    }

    pub fn insert(&mut self, category: Category) -> Result<()> {
        let identifier = category.identifier();
        if self.index.contains_key(&identifier) {
            return Err(OcciError::CategoryValidation(format!(
                "duplicate category identifier '{identifier}'"
            )));
        }
        self.index.insert(identifier, self.categories.len());
        self.categories.push(category);
        Ok(())
    }

    pub fn extend(&mut self, categories: impl IntoIterator<Item = Category>) -> Result<()> {
        for category in categories {
            self.insert(category)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn get(&self, identifier: &str) -> Option<&Category> {
        self.index
            .get(identifier)
            .and_then(|position| self.categories.get(*position))
    }

    pub fn require_kind(&self, identifier: &str) -> Result<&Category> {
        self.get(identifier)
            .filter(|category| category.is_kind())
            .ok_or_else(|| OcciError::InstanceLookup(format!("kind '{identifier}' not found")))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Category> {
        self.categories.iter()
    }

    pub fn kinds(&self) -> impl Iterator<Item = &Category> {
        self.iter().filter(|category| category.is_kind())
    }

    pub fn mixins(&self) -> impl Iterator<Item = &Category> {
        self.iter().filter(|category| category.is_mixin())
    }

    pub fn actions(&self) -> impl Iterator<Item = &Category> {
        self.iter().filter(|category| category.is_action())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.categories.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    /// Checks references between categories: kind parents and actions must
    /// resolve, parent chains and mixin dependencies must be acyclic.
    pub fn validate(&self) -> Result<()> {
        for kind in self.kinds() {
            if let Some(parent) = kind.parent() {
                if !self.get(parent).is_some_and(Category::is_kind) {
                    return Err(OcciError::CategoryValidation(format!(
                        "kind '{kind}' has unknown parent '{parent}'"
                    )));
                }
            }
            for action in kind.actions() {
                if !self.get(action).is_some_and(Category::is_action) {
                    return Err(OcciError::CategoryValidation(format!(
                        "kind '{kind}' references unknown action '{action}'"
                    )));
                }
            }
            self.check_parent_chain(kind)?;
        }

        for mixin in self.mixins() {
            for dependency in mixin.as_mixin().into_iter().flat_map(|data| &data.depends) {
                if !self.get(dependency).is_some_and(Category::is_mixin) {
                    return Err(OcciError::CategoryValidation(format!(
                        "mixin '{mixin}' depends on unknown mixin '{dependency}'"
                    )));
                }
            }
        }
        self.check_mixin_dependencies()?;

        debug!(categories = self.len(), "model validated");
        Ok(())
    }

    fn check_parent_chain(&self, kind: &Category) -> Result<()> {
        let mut seen = HashSet::from([kind.identifier()]);
        let mut current = kind;
        while let Some(parent_id) = current.parent() {
            let Some(parent) = self.get(parent_id) else {
                return Ok(());
            };
            if !seen.insert(parent.identifier()) {
                return Err(OcciError::CategoryValidation(format!(
                    "kind '{kind}' has a cyclic parent chain through '{parent}'"
                )));
            }
            current = parent;
        }
        Ok(())
    }

    fn check_mixin_dependencies(&self) -> Result<()> {
        #[derive(Clone, Copy, PartialEq, Eq)]
        enum Mark {
            Visiting,
            Done,
        }

        fn visit(
            model: &Model,
            identifier: &str,
            marks: &mut HashMap<String, Mark>,
        ) -> Result<()> {
            match marks.get(identifier) {
                Some(Mark::Done) => return Ok(()),
                Some(Mark::Visiting) => {
                    return Err(OcciError::CategoryValidation(format!(
                        "mixin dependency cycle through '{identifier}'"
                    )));
                }
                None => {}
            }
            marks.insert(identifier.to_string(), Mark::Visiting);
            if let Some(data) = model.get(identifier).and_then(Category::as_mixin) {
                for dependency in &data.depends {
                    visit(model, dependency, marks)?;
                }
            }
            marks.insert(identifier.to_string(), Mark::Done);
            Ok(())
        }

        let mut marks = HashMap::new();
        for mixin in self.mixins() {
            visit(self, &mixin.identifier(), &mut marks)?;
        }
        Ok(())
    }
}

impl CategoryLookup for Model {
    fn lookup(&self, identifier: &str) -> Option<&Category> {
        self.get(identifier)
    }
}

impl AttributeLookup for Model {
    fn attribute_definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.categories
            .iter()
            .find_map(|category| category.attributes().get(name))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::*;
    use crate::model::category::{ActionSpec, KindSpec, MixinSpec};

    const SCHEME: &str = "http://test.org/model#";

    fn id(term: &str) -> String {
        format!("{SCHEME}{term}")
    }

    #[test]
    fn insert_rejects_duplicate_identifiers() {
        let mut model = Model::new();
        model
            .insert(Category::action(ActionSpec::new("start", SCHEME)).expect("action"))
            .expect("first insert");
        let err = model
            .insert(Category::action(ActionSpec::new("start", SCHEME)).expect("action"))
            .expect_err("must fail");
        assert!(matches!(err, OcciError::CategoryValidation(_)));
        assert_eq!(model.len(), 1);
    }

    #[test]
    fn core_model_validates() {
        let model = Model::with_core().expect("core model");
        model.validate().expect("core model is consistent");
        assert_eq!(model.kinds().count(), 3);
        assert!(model.attribute_definition("occi.core.summary").is_some());
        assert!(model.require_kind(core::RESOURCE).is_ok());
        assert!(matches!(
            model.require_kind(&id("missing")),
            Err(OcciError::InstanceLookup(_))
        ));
    }

    #[test]
    fn validate_reports_dangling_parent_and_action() {
        let root = Category::kind(KindSpec::new("root", SCHEME)).expect("root");
        let child = Category::kind(KindSpec {
            parent: Some(&root),
            ..KindSpec::new("child", SCHEME)
        })
        .expect("child");
        let mut model = Model::new();
        model.insert(child).expect("insert child");
        let err = model.validate().expect_err("parent is missing");
        assert!(err.to_string().contains("unknown parent"));

        let mut model = Model::new();
        model
            .insert(
                Category::kind(KindSpec {
                    actions: Some(BTreeSet::from([id("stop")])),
                    ..KindSpec::new("compute", SCHEME)
                })
                .expect("kind"),
            )
            .expect("insert");
        let err = model.validate().expect_err("action is missing");
        assert!(err.to_string().contains("unknown action"));
    }

    #[test]
    fn validate_reports_parent_cycles() {
        let first_b = Category::kind(KindSpec::new("b", SCHEME)).expect("b");
        let a = Category::kind(KindSpec {
            parent: Some(&first_b),
            ..KindSpec::new("a", SCHEME)
        })
        .expect("a");
        let b = Category::kind(KindSpec {
            parent: Some(&a),
            ..KindSpec::new("b", SCHEME)
        })
        .expect("b");
        let mut model = Model::new();
        model.extend([a, b]).expect("insert kinds");
        let err = model.validate().expect_err("cycle");
        assert!(err.to_string().contains("cyclic parent chain"));
    }

    #[test]
    fn validate_reports_mixin_dependency_cycles() {
        let a = Category::mixin(MixinSpec {
            depends: BTreeSet::from([id("b")]),
            ..MixinSpec::new("a", SCHEME)
        })
        .expect("a");
        let b = Category::mixin(MixinSpec {
            depends: BTreeSet::from([id("a")]),
            ..MixinSpec::new("b", SCHEME)
        })
        .expect("b");
        let mut model = Model::new();
        model.extend([a, b]).expect("insert mixins");
        let err = model.validate().expect_err("cycle");
        assert!(err.to_string().contains("cycle"));
    }
}

use crate::model::{Category, CategoryVariant};

use super::{CATEGORY_HEADER, Rendering, quote, quote_escaped};

fn identity(category: &Category) -> String {
    format!(
        "{};scheme={};class={}",
        category.term(),
        quote(category.scheme()),
        quote(category.class().as_str())
    )
}

fn rel(category: &Category) -> Option<&str> {
    match category.variant() {
        CategoryVariant::Kind(kind) => kind.parent.as_deref(),
        // The grammar carries one rel; extra dependencies are not rendered.
        CategoryVariant::Mixin(mixin) => mixin.depends.first().map(String::as_str),
        CategoryVariant::Action => None,
    }
}

/// Full definition line with every clause the category has, in grammar
/// order.
#[must_use]
pub fn render_category(category: &Category) -> Rendering {
    let mut line = identity(category);
    if let Some(title) = category.title() {
        line.push_str(&format!(";title={}", quote_escaped(title)));
    }
    if let Some(rel) = rel(category) {
        line.push_str(&format!(";rel={}", quote(rel)));
    }
    if let Some(location) = category.location() {
        line.push_str(&format!(";location={}", quote(&location)));
    }
    if !category.attributes().is_empty() {
        let names = category
            .attributes()
            .keys()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(" ");
        line.push_str(&format!(";attributes={}", quote(&names)));
    }
    let actions = category.actions().collect::<Vec<_>>();
    if !actions.is_empty() {
        line.push_str(&format!(";actions={}", quote(&actions.join(" "))));
    }

    let mut rendering = Rendering::new();
    rendering.push(CATEGORY_HEADER, line);
    rendering
}

/// `term;scheme="...";class="..."`, the form used to classify instances.
#[must_use]
pub fn render_category_reference(category: &Category) -> Rendering {
    let mut rendering = Rendering::new();
    rendering.push(CATEGORY_HEADER, identity(category));
    rendering
}

#[must_use]
pub fn render_categories<'a>(categories: impl IntoIterator<Item = &'a Category>) -> Rendering {
    let mut rendering = Rendering::new();
    for category in categories {
        rendering.append(render_category(category));
    }
    rendering
}

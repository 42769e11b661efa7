use std::collections::BTreeMap;

mod attributes;
mod category;
mod instance;

pub use attributes::{render_attribute, render_value};
pub use category::{render_categories, render_category, render_category_reference};
pub use instance::{render_action_instance, render_collection, render_entity, render_locations};

pub const CATEGORY_HEADER: &str = "Category";
pub const LINK_HEADER: &str = "Link";
pub const ATTRIBUTE_HEADER: &str = "X-OCCI-Attribute";
pub const LOCATION_HEADER: &str = "X-OCCI-Location";

/// Ordered `(header, value)` pairs; the same content can be emitted as plain
/// text lines or grouped per header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rendering {
    lines: Vec<(&'static str, String)>,
}

impl Rendering {
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    pub fn push(&mut self, header: &'static str, value: impl Into<String>) {
        self.lines.push((header, value.into()));
    }

    pub fn append(&mut self, other: Self) {
        self.lines.extend(other.lines);
    }

    #[must_use]
    pub fn lines(&self) -> &[(&'static str, String)] {
        &self.lines
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    #[must_use]
    pub fn render_plain(&self) -> String {
        self.lines
            .iter()
            .map(|(header, value)| format!("{header}: {value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[must_use]
    pub fn render_headers(&self) -> BTreeMap<String, Vec<String>> {
        let mut headers = BTreeMap::<String, Vec<String>>::new();
        for (header, value) in &self.lines {
            headers
                .entry((*header).to_string())
                .or_default()
                .push(value.clone());
        }
        headers
    }
}

/// Double-quoted with `\`, `"` and control characters escaped so the parser
/// reads back the same text.
pub(crate) fn quote_escaped(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push('"');
    for ch in text.chars() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }
    out.push('"');
    out
}

pub(crate) fn quote(text: &str) -> String {
    format!("\"{text}\"")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_and_header_forms_share_order() {
        let mut rendering = Rendering::new();
        rendering.push(CATEGORY_HEADER, "a");
        rendering.push(ATTRIBUTE_HEADER, "x=1");
        rendering.push(CATEGORY_HEADER, "b");

        assert_eq!(
            rendering.render_plain(),
            "Category: a\nX-OCCI-Attribute: x=1\nCategory: b"
        );
        let headers = rendering.render_headers();
        assert_eq!(headers["Category"], vec!["a".to_string(), "b".to_string()]);
        assert_eq!(headers["X-OCCI-Attribute"], vec!["x=1".to_string()]);
    }

    #[test]
    fn escaping_covers_quotes_backslashes_and_controls() {
        assert_eq!(quote_escaped("a\"b\\c\nd"), r#""a\"b\\c\nd""#);
        assert_eq!(quote("http://x/y"), "\"http://x/y\"");
    }
}

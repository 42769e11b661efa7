use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::config::TextConfig;
use crate::error::{OcciError, Result};

use super::lexer::LexError;
use super::parser::{Statement, parse_statement};
use super::record::Record;

const HEADER_NAMES: [&str; 4] = ["Category", "Link", "X-OCCI-Attribute", "X-OCCI-Location"];

#[derive(Debug)]
pub struct LineError {
    /// 1-based line number within the payload.
    pub line: usize,
    /// Header the failing value came from, for header-style input.
    pub header: Option<&'static str>,
    pub error: OcciError,
}

/// Records collected from a multi-line payload. Malformed lines are reported
/// in `errors` and do not stop the remaining lines from being parsed.
#[derive(Debug, Default)]
pub struct ParsedText {
    pub categories: Vec<Record>,
    pub links: Vec<Record>,
    pub attributes: Record,
    pub locations: Vec<String>,
    pub errors: Vec<LineError>,
}

impl ParsedText {
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fails with the first line error, if any.
    pub fn into_result(mut self) -> Result<Self> {
        if self.errors.is_empty() {
            return Ok(self);
        }
        Err(self.errors.remove(0).error)
    }

    fn push(&mut self, statement: Statement) {
        match statement {
            Statement::Category(record) => self.categories.push(record),
            Statement::Link(record) => self.links.push(record),
            Statement::Attribute(record) => self.attributes.merge(record),
            Statement::Location(record) => {
                if let Some(location) = record.get_text("location") {
                    self.locations.push(location.to_string());
                }
            }
        }
    }
}

fn parse_line(line: &str, config: &TextConfig) -> Result<Statement> {
    if line.len() > config.max_line_bytes {
        return Err(LexError::LineTooLong {
            limit: config.max_line_bytes,
        }
        .into());
    }
    parse_statement(line)
}

pub fn parse_text(payload: &str, config: &TextConfig) -> ParsedText {
    let mut parsed = ParsedText::default();
    for (index, raw) in payload.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        let number = index + 1;
        match parse_line(line, config) {
            Ok(statement) => parsed.push(statement),
            Err(error) => {
                warn!(line = number, code = error.code(), %error, "skipping malformed line");
                parsed.errors.push(LineError {
                    line: number,
                    header: None,
                    error,
                });
                if parsed.errors.len() >= config.max_errors {
                    warn!(
                        max_errors = config.max_errors,
                        "error limit reached, ignoring the rest of the payload"
                    );
                    break;
                }
            }
        }
    }
    debug!(
        categories = parsed.categories.len(),
        links = parsed.links.len(),
        locations = parsed.locations.len(),
        errors = parsed.errors.len(),
        "parsed text payload"
    );
    parsed
}

/// Header-style input: each value of a known OCCI header becomes one line.
/// Comma separated values are split, other headers are ignored.
///
/// `LineError::line` counts the rebuilt `Name: value` lines in header-name
/// order, one per split value; `LineError::header` names the source header.
pub fn parse_headers(headers: &BTreeMap<String, Vec<String>>, config: &TextConfig) -> ParsedText {
    let mut lines = Vec::new();
    let mut origins = Vec::new();
    for (name, values) in headers {
        let Some(canonical) = HEADER_NAMES
            .iter()
            .find(|known| known.eq_ignore_ascii_case(name.trim()))
        else {
            debug!(header = %name, "ignoring non-OCCI header");
            continue;
        };
        for value in values.iter().flat_map(|value| value.split(',')) {
            let value = value.trim();
            if !value.is_empty() {
                lines.push(format!("{canonical}: {value}"));
                origins.push(*canonical);
            }
        }
    }
    let mut parsed = parse_text(&lines.join("\n"), config);
    for error in &mut parsed.errors {
        error.header = error
            .line
            .checked_sub(1)
            .and_then(|index| origins.get(index))
            .copied();
    }
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::text::record::Value;

    const PAYLOAD: &str = "\
Category: compute;scheme=\"http://schemas.ogf.org/occi/infrastructure#\";class=\"kind\"
Category: ubuntu;scheme=\"http://example.org/tpl#\";class=\"mixin\"

X-OCCI-Attribute: occi.core.title=\"vm\"
X-OCCI-Attribute: occi.compute.cores=2
X-OCCI-Location: /compute/1
";

    #[test]
    fn collects_each_statement_kind() {
        let parsed = parse_text(PAYLOAD, &TextConfig::default());
        assert!(parsed.is_ok(), "{:?}", parsed.errors);
        assert_eq!(parsed.categories.len(), 2);
        assert_eq!(parsed.locations, vec!["/compute/1".to_string()]);
        assert_eq!(
            parsed.attributes.get_path("occi.core.title"),
            Some(&Value::from("vm"))
        );
        assert!(parsed.attributes.get_path("occi.compute.cores").is_some());
    }

    #[test]
    fn malformed_lines_are_reported_and_skipped() {
        let payload = "X-OCCI-Attribute: occi.core.title=-1\nX-OCCI-Location: /a\nLink: nope\n";
        let parsed = parse_text(payload, &TextConfig::default());
        let lines = parsed.errors.iter().map(|err| err.line).collect::<Vec<_>>();
        assert_eq!(lines, vec![1, 3]);
        assert_eq!(parsed.locations, vec!["/a".to_string()]);
        assert!(parsed.into_result().is_err());
    }

    #[test]
    fn error_limit_stops_parsing() {
        let payload = "bad\nbad\nX-OCCI-Location: /a\n";
        let parsed = parse_text(payload, &TextConfig::default().with_max_errors(2));
        assert_eq!(parsed.errors.len(), 2);
        assert!(parsed.locations.is_empty());
    }

    #[test]
    fn overlong_lines_fail_before_lexing() {
        let payload = format!("X-OCCI-Location: /{}", "a".repeat(100));
        let parsed = parse_text(&payload, &TextConfig::default().with_max_line_bytes(64));
        assert!(matches!(
            parsed.errors[0].error,
            OcciError::Lex(LexError::LineTooLong { limit: 64 })
        ));
    }

    #[test]
    fn headers_are_split_into_lines() {
        let headers = BTreeMap::from([
            (
                "category".to_string(),
                vec![
                    "compute;scheme=\"http://schemas.ogf.org/occi/infrastructure#\";class=\"kind\", \
                     ubuntu;scheme=\"http://example.org/tpl#\";class=\"mixin\""
                        .to_string(),
                ],
            ),
            (
                "X-OCCI-Location".to_string(),
                vec!["/compute/1".to_string(), "/compute/2".to_string()],
            ),
            ("Content-Type".to_string(), vec!["text/occi".to_string()]),
        ]);
        let parsed = parse_headers(&headers, &TextConfig::default());
        assert!(parsed.is_ok(), "{:?}", parsed.errors);
        assert_eq!(parsed.categories.len(), 2);
        assert_eq!(parsed.locations.len(), 2);
    }

    #[test]
    fn header_errors_name_their_source_header() {
        let headers = BTreeMap::from([
            ("Link".to_string(), vec!["nope".to_string()]),
            (
                "X-OCCI-Attribute".to_string(),
                vec!["occi.core.title=\"ok\", occi.core.summary=-1".to_string()],
            ),
            ("X-OCCI-Location".to_string(), vec!["/compute/1".to_string()]),
        ]);
        let parsed = parse_headers(&headers, &TextConfig::default());
        let failures = parsed
            .errors
            .iter()
            .map(|err| (err.line, err.header))
            .collect::<Vec<_>>();
        assert_eq!(
            failures,
            vec![(1, Some("Link")), (3, Some("X-OCCI-Attribute"))]
        );
        assert!(parse_text("Link: nope", &TextConfig::default()).errors[0]
            .header
            .is_none());
    }
}

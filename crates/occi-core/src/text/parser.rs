use std::collections::VecDeque;

use thiserror::Error;
use tracing::{debug, trace};

use crate::error::{OcciError, Result};

use super::lexer::{Lexer, Token, TokenKind, tokenize};
use super::record::{Number, Record, Value};

/// Optional clauses share the `';' (WS)? keyword` prefix, so deciding a branch
/// needs three tokens of lookahead.
pub const LOOKAHEAD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("expected {} but found {found} at offset {position}", expected_set(.expected))]
    Mismatch {
        expected: Vec<TokenKind>,
        found: String,
        position: usize,
    },

    #[error("{rule} requires at least one token but found {found} at offset {position}")]
    EmptyRepetition {
        rule: &'static str,
        found: String,
        position: usize,
    },
}

impl ParseError {
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Mismatch { position, .. } | Self::EmptyRepetition { position, .. } => *position,
        }
    }

    #[must_use]
    pub fn expected(&self) -> &[TokenKind] {
        match self {
            Self::Mismatch { expected, .. } => expected,
            Self::EmptyRepetition { .. } => &[],
        }
    }
}

fn expected_set(expected: &[TokenKind]) -> String {
    match expected {
        [] => "nothing".to_string(),
        [single] => single.name().to_string(),
        [init @ .., last] => format!(
            "{} or {}",
            init.iter().map(|kind| kind.name()).collect::<Vec<_>>().join(", "),
            last.name()
        ),
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    Category(Record),
    Link(Record),
    Attribute(Record),
    Location(Record),
}

impl Statement {
    #[must_use]
    pub const fn record(&self) -> &Record {
        match self {
            Self::Category(record)
            | Self::Link(record)
            | Self::Attribute(record)
            | Self::Location(record) => record,
        }
    }
}

const HEADERS: &[TokenKind] = &[
    TokenKind::CategoryHeader,
    TokenKind::LinkHeader,
    TokenKind::AttributeHeader,
    TokenKind::LocationHeader,
];

const fn is_uri_token(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LoAlpha
            | TokenKind::UpAlpha
            | TokenKind::Digit
            | TokenKind::At
            | TokenKind::Colon
            | TokenKind::Percent
            | TokenKind::Underscore
            | TokenKind::Backslash
            | TokenKind::Plus
            | TokenKind::Dot
            | TokenKind::Tilde
            | TokenKind::Hash
            | TokenKind::Question
            | TokenKind::Amp
            | TokenKind::Slash
            | TokenKind::Equals
            | TokenKind::Minus
            | TokenKind::Action
            | TokenKind::Kind
            | TokenKind::Mixin
    )
}

const fn is_name_continuation(kind: TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::LoAlpha | TokenKind::Digit | TokenKind::Minus | TokenKind::Underscore
    ) || kind.is_lowercase_keyword()
}

/// Whether `term` reads back both as a `term` and inside a `/<term>/` uri.
/// Keywords other than `action`, `kind` and `mixin` end a uri, and no keyword
/// may open a term.
pub(crate) fn is_renderable_term(term: &str) -> bool {
    let Ok(tokens) = tokenize(term) else {
        return false;
    };
    match tokens.split_first() {
        Some((head, tail)) => {
            head.kind == TokenKind::LoAlpha
                && tail
                    .iter()
                    .all(|token| is_name_continuation(token.kind) && is_uri_token(token.kind))
        }
        None => false,
    }
}

fn unescape(escape: &str) -> char {
    match escape.chars().nth(1) {
        Some('n') => '\n',
        Some('t') => '\t',
        Some('r') => '\r',
        Some(other) => other,
        None => '\\',
    }
}

/// Predictive recursive-descent parser over one line. The lookahead buffer is
/// per-instance state: use one parser per input, or [`Parser::reset`] it.
#[derive(Debug, Clone)]
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    lookahead: VecDeque<Token<'a>>,
    end: usize,
}

impl<'a> Parser<'a> {
    #[must_use]
    pub fn new(source: &'a str) -> Self {
        Self::from_lexer(Lexer::new(source))
    }

    #[must_use]
    pub fn from_lexer(lexer: Lexer<'a>) -> Self {
        let end = lexer.source().len();
        Self {
            lexer,
            lookahead: VecDeque::with_capacity(LOOKAHEAD),
            end,
        }
    }

    pub fn reset(&mut self) {
        self.lexer.reset();
        self.lookahead.clear();
    }

    pub fn statement(&mut self) -> Result<Statement> {
        match self.peek(0)? {
            TokenKind::CategoryHeader => self.category().map(Statement::Category),
            TokenKind::LinkHeader => self.link().map(Statement::Link),
            TokenKind::AttributeHeader => self.x_occi_attribute().map(Statement::Attribute),
            TokenKind::LocationHeader => self.x_occi_location().map(Statement::Location),
            _ => Err(self.mismatch(HEADERS)),
        }
    }

    pub fn category(&mut self) -> Result<Record> {
        self.expect(TokenKind::CategoryHeader)?;
        self.expect(TokenKind::Colon)?;
        let record = self.category_value()?;
        self.finish()?;
        Ok(record)
    }

    pub fn link(&mut self) -> Result<Record> {
        self.expect(TokenKind::LinkHeader)?;
        self.expect(TokenKind::Colon)?;
        let record = self.link_value()?;
        self.finish()?;
        Ok(record)
    }

    pub fn x_occi_attribute(&mut self) -> Result<Record> {
        self.expect(TokenKind::AttributeHeader)?;
        self.expect(TokenKind::Colon)?;
        self.eat(TokenKind::Ws)?;
        let record = self.attribute()?;
        self.finish()?;
        Ok(record)
    }

    pub fn x_occi_location(&mut self) -> Result<Record> {
        self.expect(TokenKind::LocationHeader)?;
        self.expect(TokenKind::Colon)?;
        self.eat(TokenKind::Ws)?;
        let mut record = Record::new();
        record.insert("location", self.uri("location")?);
        self.finish()?;
        Ok(record)
    }

    fn category_value(&mut self) -> Result<Record> {
        let mut record = Record::new();
        self.eat(TokenKind::Ws)?;
        record.insert("term", self.term()?);

        self.clause(TokenKind::Scheme)?;
        record.insert("scheme", self.quoted(|p| p.uri("scheme"))?);

        self.clause(TokenKind::Class)?;
        record.insert("class", self.quoted(Self::class_type)?);

        if self.at_clause(TokenKind::Title)? {
            self.clause(TokenKind::Title)?;
            record.insert("title", self.quoted(Self::quoted_text)?);
        }
        if self.at_clause(TokenKind::Rel)? {
            self.clause(TokenKind::Rel)?;
            record.insert("rel", self.quoted(|p| p.uri("rel"))?);
        }
        if self.at_clause(TokenKind::Location)? {
            self.clause(TokenKind::Location)?;
            record.insert("location", self.quoted(|p| p.uri("location"))?);
        }
        if self.at_clause(TokenKind::Attributes)? {
            self.clause(TokenKind::Attributes)?;
            record.insert(
                "attributes",
                Value::List(self.quoted(Self::attribute_names)?),
            );
        }
        if self.at_clause(TokenKind::Actions)? {
            self.clause(TokenKind::Actions)?;
            record.insert("actions", Value::List(self.quoted(Self::action_locations)?));
        }
        Ok(record)
    }

    fn link_value(&mut self) -> Result<Record> {
        let mut record = Record::new();
        self.eat(TokenKind::Ws)?;
        self.expect(TokenKind::Lt)?;
        record.insert("target", self.uri("target")?);
        self.expect(TokenKind::Gt)?;

        self.clause(TokenKind::Rel)?;
        record.insert("rel", self.quoted(|p| p.uri("rel"))?);

        if self.at_clause(TokenKind::SelfKw)? {
            self.clause(TokenKind::SelfKw)?;
            record.insert("self", self.quoted(|p| p.uri("self"))?);
        }
        if self.at_clause(TokenKind::Category)? {
            self.clause(TokenKind::Category)?;
            record.insert("category", self.quoted(|p| p.uri("category"))?);
        }

        let mut attributes = Record::new();
        while self.at_link_attribute()? {
            self.expect(TokenKind::Semicolon)?;
            self.eat(TokenKind::Ws)?;
            attributes.merge(self.attribute()?);
        }
        record.insert("attributes", attributes);
        Ok(record)
    }

    fn term(&mut self) -> Result<String> {
        let mut out = self.expect(TokenKind::LoAlpha)?.text.to_string();
        while is_name_continuation(self.peek(0)?) {
            out.push_str(self.bump()?.text);
        }
        Ok(out)
    }

    fn class_type(&mut self) -> Result<String> {
        match self.peek(0)? {
            TokenKind::Kind | TokenKind::Mixin | TokenKind::Action => {
                Ok(self.bump()?.text.to_string())
            }
            _ => Err(self.mismatch(&[TokenKind::Kind, TokenKind::Mixin, TokenKind::Action])),
        }
    }

    fn uri(&mut self, rule: &'static str) -> Result<String> {
        let mut out = String::new();
        while is_uri_token(self.peek(0)?) {
            out.push_str(self.bump()?.text);
        }
        if out.is_empty() {
            let found = self.peek_token(0)?;
            return Err(ParseError::EmptyRepetition {
                rule,
                found: found.describe(),
                position: found.position,
            }
            .into());
        }
        Ok(out)
    }

    fn attribute_names(&mut self) -> Result<Vec<Value>> {
        let mut names = vec![Value::Text(self.attribute_name()?.join("."))];
        while self.at_repetition(|kind| kind == TokenKind::LoAlpha)? {
            self.eat(TokenKind::Ws)?;
            names.push(Value::Text(self.attribute_name()?.join(".")));
        }
        Ok(names)
    }

    fn action_locations(&mut self) -> Result<Vec<Value>> {
        let mut actions = vec![Value::Text(self.uri("action location")?)];
        while self.at_repetition(is_uri_token)? {
            self.eat(TokenKind::Ws)?;
            actions.push(Value::Text(self.uri("action location")?));
        }
        Ok(actions)
    }

    fn attribute(&mut self) -> Result<Record> {
        let path = self.attribute_name()?;
        self.expect(TokenKind::Equals)?;
        let value = self.attribute_value()?;
        Ok(Record::from_path(&path, value))
    }

    fn attribute_name(&mut self) -> Result<Vec<String>> {
        let mut components = vec![self.attribute_component(true)?];
        while self.peek(0)? == TokenKind::Dot {
            self.bump()?;
            components.push(self.attribute_component(false)?);
        }
        Ok(components)
    }

    fn attribute_component(&mut self, leading: bool) -> Result<String> {
        let head = self.peek(0)?;
        if head != TokenKind::LoAlpha && (leading || !head.is_lowercase_keyword()) {
            return Err(self.mismatch(&[TokenKind::LoAlpha]));
        }
        let mut out = self.bump()?.text.to_string();
        while is_name_continuation(self.peek(0)?) {
            out.push_str(self.bump()?.text);
        }
        Ok(out)
    }

    fn attribute_value(&mut self) -> Result<Value> {
        match self.peek(0)? {
            TokenKind::Quote => Ok(Value::Text(self.quoted(Self::quoted_text)?)),
            TokenKind::Digit => self.number(),
            _ => Err(self.mismatch(&[TokenKind::Quote, TokenKind::Digit])),
        }
    }

    fn number(&mut self) -> Result<Value> {
        let mut raw = self.digits()?;
        if self.peek(0)? == TokenKind::Dot && self.peek(1)? == TokenKind::Digit {
            self.bump()?;
            raw.push('.');
            raw.push_str(&self.digits()?);
        }
        match Number::parse(&raw) {
            Some(number) => Ok(Value::Number(number)),
            None => Err(self.mismatch(&[TokenKind::Digit])),
        }
    }

    fn digits(&mut self) -> Result<String> {
        let mut out = self.expect(TokenKind::Digit)?.text.to_string();
        while self.peek(0)? == TokenKind::Digit {
            out.push_str(self.bump()?.text);
        }
        Ok(out)
    }

    fn quoted_text(&mut self) -> Result<String> {
        let mut out = String::new();
        loop {
            let token = self.peek_token(0)?;
            match token.kind {
                TokenKind::Quote | TokenKind::Backslash | TokenKind::Eof => return Ok(out),
                TokenKind::Esc => out.push(unescape(token.text)),
                _ => out.push_str(token.text),
            }
            self.bump()?;
        }
    }

    fn quoted<T>(&mut self, inner: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        self.expect(TokenKind::Quote)?;
        let value = inner(self)?;
        self.expect(TokenKind::Quote)?;
        Ok(value)
    }

    // `';' (WS)? keyword '='`
    fn clause(&mut self, keyword: TokenKind) -> Result<()> {
        self.expect(TokenKind::Semicolon)?;
        self.eat(TokenKind::Ws)?;
        self.expect(keyword)?;
        self.expect(TokenKind::Equals)?;
        Ok(())
    }

    fn at_clause(&mut self, keyword: TokenKind) -> Result<bool> {
        let matched = self.peek(0)? == TokenKind::Semicolon
            && match self.peek(1)? {
                TokenKind::Ws => self.peek(2)? == keyword,
                next => next == keyword,
            };
        trace!(clause = keyword.name(), matched, "optional clause lookahead");
        Ok(matched)
    }

    fn at_link_attribute(&mut self) -> Result<bool> {
        if self.peek(0)? != TokenKind::Semicolon {
            return Ok(false);
        }
        Ok(match self.peek(1)? {
            TokenKind::LoAlpha => true,
            TokenKind::Ws => self.peek(2)? == TokenKind::LoAlpha,
            _ => false,
        })
    }

    // `((WS)? item)*` continues only when the token after the optional
    // whitespace can start another item.
    fn at_repetition(&mut self, starts_item: fn(TokenKind) -> bool) -> Result<bool> {
        Ok(match self.peek(0)? {
            TokenKind::Ws => starts_item(self.peek(1)?),
            next => starts_item(next),
        })
    }

    fn finish(&mut self) -> Result<()> {
        let trailing = self.eat(TokenKind::Semicolon)?;
        if self.peek(0)? == TokenKind::Eof {
            return Ok(());
        }
        let expected: &[TokenKind] = if trailing {
            &[TokenKind::Eof]
        } else {
            &[TokenKind::Semicolon, TokenKind::Eof]
        };
        Err(self.mismatch(expected))
    }

    fn fill(&mut self, n: usize) -> Result<()> {
        while self.lookahead.len() <= n {
            match self.lexer.next() {
                Some(token) => self.lookahead.push_back(token?),
                None => break,
            }
        }
        Ok(())
    }

    fn eof(&self) -> Token<'a> {
        Token {
            kind: TokenKind::Eof,
            text: "",
            position: self.end,
        }
    }

    fn peek_token(&mut self, n: usize) -> Result<Token<'a>> {
        debug_assert!(n < LOOKAHEAD, "lookahead is bounded to {LOOKAHEAD} tokens");
        self.fill(n)?;
        Ok(self
            .lookahead
            .get(n)
            .copied()
            .unwrap_or_else(|| self.eof()))
    }

    fn peek(&mut self, n: usize) -> Result<TokenKind> {
        Ok(self.peek_token(n)?.kind)
    }

    fn bump(&mut self) -> Result<Token<'a>> {
        self.fill(0)?;
        Ok(self.lookahead.pop_front().unwrap_or_else(|| self.eof()))
    }

    fn eat(&mut self, kind: TokenKind) -> Result<bool> {
        if self.peek(0)? == kind {
            self.bump()?;
            return Ok(true);
        }
        Ok(false)
    }

    fn expect(&mut self, kind: TokenKind) -> Result<Token<'a>> {
        if self.peek(0)? == kind {
            return self.bump();
        }
        Err(self.mismatch(&[kind]))
    }

    fn mismatch(&mut self, expected: &[TokenKind]) -> OcciError {
        match self.peek_token(0) {
            Ok(found) => ParseError::Mismatch {
                expected: expected.to_vec(),
                found: found.describe(),
                position: found.position,
            }
            .into(),
            Err(err) => err,
        }
    }
}

fn parse_with<'a>(
    line: &'a str,
    production: &'static str,
    rule: impl FnOnce(&mut Parser<'a>) -> Result<Record>,
) -> Result<Record> {
    let record = rule(&mut Parser::new(line))?;
    debug!(production, keys = record.len(), "parsed line");
    Ok(record)
}

pub fn parse_category(line: &str) -> Result<Record> {
    parse_with(line, "category", Parser::category)
}

pub fn parse_link(line: &str) -> Result<Record> {
    parse_with(line, "link", Parser::link)
}

pub fn parse_x_occi_attribute(line: &str) -> Result<Record> {
    parse_with(line, "x_occi_attribute", Parser::x_occi_attribute)
}

pub fn parse_x_occi_location(line: &str) -> Result<Record> {
    parse_with(line, "x_occi_location", Parser::x_occi_location)
}

pub fn parse_statement(line: &str) -> Result<Statement> {
    Parser::new(line).statement()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::text::lexer::LexError;

    const INFRA: &str = "http://schemas.ogf.org/occi/infrastructure#";

    fn texts(value: Option<&Value>) -> Vec<&str> {
        value
            .and_then(Value::as_list)
            .map(|items| items.iter().filter_map(Value::as_text).collect())
            .unwrap_or_default()
    }

    fn parse_error(result: Result<Record>) -> ParseError {
        match result.expect_err("must fail") {
            OcciError::Parse(err) => err,
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn category_with_title_leaves_other_clauses_absent() {
        let record = parse_category(&format!(
            "Category: compute;scheme=\"{INFRA}\";class=\"kind\";title=\"Compute\""
        ))
        .expect("parse category");

        assert_eq!(record.get_text("term"), Some("compute"));
        assert_eq!(record.get_text("scheme"), Some(INFRA));
        assert_eq!(record.get_text("class"), Some("kind"));
        assert_eq!(record.get_text("title"), Some("Compute"));
        for absent in ["rel", "location", "attributes", "actions"] {
            assert!(!record.contains_key(absent), "{absent} must be absent");
        }
        assert_eq!(
            record.keys().collect::<Vec<_>>(),
            vec!["term", "scheme", "class", "title"]
        );
    }

    #[test]
    fn category_with_every_clause_and_whitespace_after_separators() {
        let line = format!(
            "Category: compute; scheme=\"{INFRA}\"; class=\"kind\"; title=\"Compute Resource\"; \
             rel=\"http://schemas.ogf.org/occi/core#resource\"; location=\"/compute/\"; \
             attributes=\"occi.compute.cores occi.compute.hostname occi.core.title\"; \
             actions=\"http://schemas.ogf.org/occi/infrastructure/compute/action#start \
             http://schemas.ogf.org/occi/infrastructure/compute/action#stop\";"
        );
        let record = parse_category(&line).expect("parse category");

        assert_eq!(
            record.get_text("rel"),
            Some("http://schemas.ogf.org/occi/core#resource")
        );
        assert_eq!(record.get_text("location"), Some("/compute/"));
        assert_eq!(
            texts(record.get("attributes")),
            vec!["occi.compute.cores", "occi.compute.hostname", "occi.core.title"]
        );
        assert_eq!(
            texts(record.get("actions")),
            vec![
                "http://schemas.ogf.org/occi/infrastructure/compute/action#start",
                "http://schemas.ogf.org/occi/infrastructure/compute/action#stop"
            ]
        );
    }

    #[test]
    fn optional_clauses_out_of_order_are_rejected() {
        let err = parse_error(parse_category(&format!(
            "Category: compute;scheme=\"{INFRA}\";class=\"kind\";location=\"/compute/\";title=\"Compute\""
        )));
        assert_eq!(err.expected(), &[TokenKind::Eof]);
        assert!(err.to_string().contains("'title'"), "{err}");
    }

    #[test]
    fn unknown_class_reports_expected_set() {
        let err = parse_error(parse_category(&format!(
            "Category: compute;scheme=\"{INFRA}\";class=\"resource\""
        )));
        assert_eq!(
            err.expected(),
            &[TokenKind::Kind, TokenKind::Mixin, TokenKind::Action]
        );
    }

    #[test]
    fn empty_uri_is_an_empty_repetition() {
        let err = parse_error(parse_category(&format!(
            "Category: compute;scheme=\"{INFRA}\";class=\"kind\";rel=\"\""
        )));
        assert!(matches!(err, ParseError::EmptyRepetition { rule: "rel", .. }));
    }

    #[test]
    fn uri_accepts_class_keywords_as_literal_text() {
        let record = parse_category(
            "Category: start;scheme=\"http://example.org/kind/mixin/action#\";class=\"action\"",
        )
        .expect("parse category");
        assert_eq!(
            record.get_text("scheme"),
            Some("http://example.org/kind/mixin/action#")
        );
    }

    #[test]
    fn uri_rejects_other_keywords() {
        let err = parse_error(parse_category(&format!(
            "Category: compute;scheme=\"{INFRA}\";class=\"kind\";rel=\"http://example.org/location#x\""
        )));
        assert_eq!(err.expected(), &[TokenKind::Quote]);
    }

    #[test]
    fn terms_start_with_a_lowercase_letter() {
        let err = parse_error(parse_category(&format!(
            "Category: Compute;scheme=\"{INFRA}\";class=\"kind\""
        )));
        assert_eq!(err.expected(), &[TokenKind::LoAlpha]);
    }

    #[test]
    fn keyword_spellings_after_the_first_letter_are_plain_text() {
        let record = parse_category(&format!(
            "Category: network_kind_location;scheme=\"{INFRA}\";class=\"mixin\""
        ))
        .expect("parse category");
        assert_eq!(record.get_text("term"), Some("network_kind_location"));
    }

    #[test]
    fn x_occi_attribute_string_value_is_text() {
        let record =
            parse_x_occi_attribute("X-OCCI-Attribute: occi.core.title=\"My VM\"").expect("parse");
        assert_eq!(
            record.get_path("occi.core.title"),
            Some(&Value::Text("My VM".to_string()))
        );
        assert!(
            record
                .get_record("occi")
                .and_then(|occi| occi.get_record("core"))
                .is_some()
        );
    }

    #[test]
    fn x_occi_attribute_numbers_are_unquoted_digits() {
        let record = parse_x_occi_attribute("X-OCCI-Attribute: occi.compute.memory=4096;")
            .expect("parse integer");
        assert_eq!(
            record.get_path("occi.compute.memory"),
            Some(&Value::Number(Number::Integer(4096)))
        );

        let record = parse_x_occi_attribute("X-OCCI-Attribute: occi.compute.speed=2.5")
            .expect("parse decimal");
        assert_eq!(
            record.get_path("occi.compute.speed"),
            Some(&Value::Number(Number::Decimal(2.5)))
        );
    }

    #[test]
    fn x_occi_attribute_rejects_signed_numbers() {
        let err = parse_error(parse_x_occi_attribute(
            "X-OCCI-Attribute: occi.compute.cores=-2",
        ));
        assert_eq!(err.expected(), &[TokenKind::Quote, TokenKind::Digit]);
    }

    #[test]
    fn escapes_are_resolved_in_quoted_values() {
        let record = parse_x_occi_attribute(
            r#"X-OCCI-Attribute: occi.core.summary="say \"hi\"\nit's fine""#,
        )
        .expect("parse");
        assert_eq!(
            record
                .get_path("occi.core.summary")
                .and_then(Value::as_text),
            Some("say \"hi\"\nit's fine")
        );
    }

    #[test]
    fn link_with_self_category_and_attributes() {
        let record = parse_link(
            "Link: </network/123>;rel=\"http://schemas.ogf.org/occi/infrastructure#network\";\
             self=\"/link/networkinterface/456\";\
             category=\"http://schemas.ogf.org/occi/infrastructure#networkinterface\";\
             occi.networkinterface.interface=\"eth0\"; occi.networkinterface.mac=\"00:11:22:33:44:55\";\
             occi.core.id=\"456\"",
        )
        .expect("parse link");

        assert_eq!(record.get_text("target"), Some("/network/123"));
        assert_eq!(
            record.get_text("rel"),
            Some("http://schemas.ogf.org/occi/infrastructure#network")
        );
        assert_eq!(record.get_text("self"), Some("/link/networkinterface/456"));
        let attributes = record.get_record("attributes").expect("attributes");
        let flat = attributes
            .flatten()
            .into_iter()
            .map(|(name, _)| name)
            .collect::<Vec<_>>();
        assert_eq!(
            flat,
            vec![
                "occi.networkinterface.interface",
                "occi.networkinterface.mac",
                "occi.core.id"
            ]
        );
    }

    #[test]
    fn link_without_optional_clauses_has_empty_attributes() {
        let record = parse_link(
            "Link: </compute/1?action=start>;rel=\"http://schemas.ogf.org/occi/infrastructure/compute/action#start\"",
        )
        .expect("parse link");
        assert_eq!(record.get_text("target"), Some("/compute/1?action=start"));
        assert!(!record.contains_key("self"));
        assert!(!record.contains_key("category"));
        assert_eq!(record.get_record("attributes"), Some(&Record::new()));
    }

    #[test]
    fn x_occi_location_reads_one_uri() {
        let record =
            parse_x_occi_location("X-OCCI-Location: http://example.org/compute/1;").expect("parse");
        assert_eq!(
            record.get_text("location"),
            Some("http://example.org/compute/1")
        );
    }

    #[test]
    fn statement_dispatches_on_header() {
        let statement = parse_statement("X-OCCI-Location: /storage/9").expect("parse");
        assert!(matches!(statement, Statement::Location(_)));

        let err = match parse_statement("Content-Type: text/plain").expect_err("must fail") {
            OcciError::Parse(err) => err,
            other => panic!("expected parse error, got {other:?}"),
        };
        assert_eq!(err.expected(), HEADERS);
    }

    #[test]
    fn lexer_failures_surface_through_the_parser() {
        let err = parse_x_occi_attribute("X-OCCI-Attribute: occi.core.title=\"a,b\"")
            .expect_err("must fail");
        assert!(matches!(
            err,
            OcciError::Lex(LexError::Unrecognized { character: ',', .. })
        ));
    }

    #[test]
    fn reset_allows_reuse_of_one_parser() {
        let mut parser = Parser::new("X-OCCI-Location: /compute/1");
        let first = parser.x_occi_location().expect("first parse");
        parser.reset();
        let second = parser.x_occi_location().expect("second parse");
        assert_eq!(first, second);
    }
}

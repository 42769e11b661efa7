use std::fmt::{Display, Formatter};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Ws,
    LoAlpha,
    UpAlpha,
    Digit,
    Esc,
    CategoryHeader,
    LinkHeader,
    AttributeHeader,
    LocationHeader,
    Scheme,
    Class,
    Title,
    Rel,
    Location,
    Attributes,
    Actions,
    SelfKw,
    Category,
    Action,
    Kind,
    Mixin,
    Colon,
    Semicolon,
    Equals,
    Quote,
    Apostrophe,
    Lt,
    Gt,
    At,
    Percent,
    Underscore,
    Backslash,
    Plus,
    Dot,
    Tilde,
    Hash,
    Question,
    Amp,
    Slash,
    Minus,
    Eof,
}

// Longest spelling first so `actions` wins over `action` and `X-OCCI-Attribute`
// is never split.
const KEYWORDS: &[(&str, TokenKind)] = &[
    ("X-OCCI-Attribute", TokenKind::AttributeHeader),
    ("X-OCCI-Location", TokenKind::LocationHeader),
    ("attributes", TokenKind::Attributes),
    ("Category", TokenKind::CategoryHeader),
    ("category", TokenKind::Category),
    ("location", TokenKind::Location),
    ("actions", TokenKind::Actions),
    ("action", TokenKind::Action),
    ("scheme", TokenKind::Scheme),
    ("class", TokenKind::Class),
    ("title", TokenKind::Title),
    ("mixin", TokenKind::Mixin),
    ("Link", TokenKind::LinkHeader),
    ("kind", TokenKind::Kind),
    ("self", TokenKind::SelfKw),
    ("rel", TokenKind::Rel),
];

impl TokenKind {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Ws => "WS",
            Self::LoAlpha => "LOALPHA",
            Self::UpAlpha => "UPALPHA",
            Self::Digit => "DIGIT",
            Self::Esc => "ESC",
            Self::CategoryHeader => "'Category'",
            Self::LinkHeader => "'Link'",
            Self::AttributeHeader => "'X-OCCI-Attribute'",
            Self::LocationHeader => "'X-OCCI-Location'",
            Self::Scheme => "'scheme'",
            Self::Class => "'class'",
            Self::Title => "'title'",
            Self::Rel => "'rel'",
            Self::Location => "'location'",
            Self::Attributes => "'attributes'",
            Self::Actions => "'actions'",
            Self::SelfKw => "'self'",
            Self::Category => "'category'",
            Self::Action => "'action'",
            Self::Kind => "'kind'",
            Self::Mixin => "'mixin'",
            Self::Colon => "':'",
            Self::Semicolon => "';'",
            Self::Equals => "'='",
            Self::Quote => "'\"'",
            Self::Apostrophe => "'''",
            Self::Lt => "'<'",
            Self::Gt => "'>'",
            Self::At => "'@'",
            Self::Percent => "'%'",
            Self::Underscore => "'_'",
            Self::Backslash => "'\\'",
            Self::Plus => "'+'",
            Self::Dot => "'.'",
            Self::Tilde => "'~'",
            Self::Hash => "'#'",
            Self::Question => "'?'",
            Self::Amp => "'&'",
            Self::Slash => "'/'",
            Self::Minus => "'-'",
            Self::Eof => "end of input",
        }
    }

    /// Keyword tokens spelled in lowercase; these read as plain letters inside
    /// terms and attribute names.
    #[must_use]
    pub const fn is_lowercase_keyword(self) -> bool {
        matches!(
            self,
            Self::Scheme
                | Self::Class
                | Self::Title
                | Self::Rel
                | Self::Location
                | Self::Attributes
                | Self::Actions
                | Self::SelfKw
                | Self::Category
                | Self::Action
                | Self::Kind
                | Self::Mixin
        )
    }

    #[must_use]
    pub const fn is_header(self) -> bool {
        matches!(
            self,
            Self::CategoryHeader | Self::LinkHeader | Self::AttributeHeader | Self::LocationHeader
        )
    }

    const fn from_punct(ch: char) -> Option<Self> {
        let kind = match ch {
            ':' => Self::Colon,
            ';' => Self::Semicolon,
            '=' => Self::Equals,
            '"' => Self::Quote,
            '\'' => Self::Apostrophe,
            '<' => Self::Lt,
            '>' => Self::Gt,
            '@' => Self::At,
            '%' => Self::Percent,
            '_' => Self::Underscore,
            '+' => Self::Plus,
            '.' => Self::Dot,
            '~' => Self::Tilde,
            '#' => Self::Hash,
            '?' => Self::Question,
            '&' => Self::Amp,
            '/' => Self::Slash,
            '-' => Self::Minus,
            _ => return None,
        };
        Some(kind)
    }
}

impl Display for TokenKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    pub position: usize,
}

impl Token<'_> {
    #[must_use]
    pub fn describe(&self) -> String {
        match self.kind {
            TokenKind::Eof => TokenKind::Eof.name().to_string(),
            kind if kind.is_header() || kind.is_lowercase_keyword() => kind.name().to_string(),
            kind => format!("{} {:?}", kind.name(), self.text),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("unrecognized character {character:?} at offset {position}")]
    Unrecognized { position: usize, character: char },

    #[error("line exceeds {limit} bytes")]
    LineTooLong { limit: usize },
}

impl LexError {
    #[must_use]
    pub const fn position(&self) -> usize {
        match self {
            Self::Unrecognized { position, .. } => *position,
            Self::LineTooLong { limit } => *limit,
        }
    }
}

/// Lazy token stream over one line of OCCI text. Cloning or calling
/// [`Lexer::reset`] restarts the scan from the beginning.
#[derive(Debug, Clone)]
pub struct Lexer<'a> {
    source: &'a str,
    offset: usize,
    failed: bool,
}

impl<'a> Lexer<'a> {
    #[must_use]
    pub const fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            failed: false,
        }
    }

    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.source
    }

    pub fn reset(&mut self) {
        self.offset = 0;
        self.failed = false;
    }

    fn token(&mut self, kind: TokenKind, len: usize) -> Token<'a> {
        let start = self.offset;
        self.offset += len;
        Token {
            kind,
            text: &self.source[start..self.offset],
            position: start,
        }
    }

    fn scan(&mut self) -> Option<Result<Token<'a>, LexError>> {
        let rest = &self.source[self.offset..];
        let ch = rest.chars().next()?;

        if ch == ' ' || ch == '\t' {
            let len = rest
                .find(|c: char| c != ' ' && c != '\t')
                .unwrap_or(rest.len());
            return Some(Ok(self.token(TokenKind::Ws, len)));
        }

        if ch == '\\' {
            return Some(Ok(match rest[1..].chars().next() {
                Some(escaped) => self.token(TokenKind::Esc, 1 + escaped.len_utf8()),
                None => self.token(TokenKind::Backslash, 1),
            }));
        }

        if let Some((spelling, kind)) = KEYWORDS
            .iter()
            .find(|(spelling, _)| rest.starts_with(spelling))
        {
            return Some(Ok(self.token(*kind, spelling.len())));
        }

        let kind = match ch {
            'a'..='z' => TokenKind::LoAlpha,
            'A'..='Z' => TokenKind::UpAlpha,
            '0'..='9' => TokenKind::Digit,
            other => match TokenKind::from_punct(other) {
                Some(kind) => kind,
                None => {
                    self.failed = true;
                    return Some(Err(LexError::Unrecognized {
                        position: self.offset,
                        character: other,
                    }));
                }
            },
        };
        Some(Ok(self.token(kind, 1)))
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token<'a>, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        self.scan()
    }
}

pub fn tokenize(source: &str) -> Result<Vec<Token<'_>>, LexError> {
    Lexer::new(source).collect()
}

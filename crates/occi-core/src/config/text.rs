use super::env::{parse_usize, read_non_empty_env};

const ENV_MAX_LINE_BYTES: &str = "OCCI_TEXT_MAX_LINE_BYTES";
const ENV_MAX_ERRORS: &str = "OCCI_TEXT_MAX_ERRORS";

const DEFAULT_MAX_LINE_BYTES: usize = 64 * 1024;
const DEFAULT_MAX_ERRORS: usize = 64;
const MIN_MAX_LINE_BYTES: usize = 64;
const MIN_MAX_ERRORS: usize = 1;

/// Limits applied when a multi-line text payload is parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextConfig {
    /// Lines longer than this fail with a lexer error before tokenizing.
    pub max_line_bytes: usize,
    /// Batch parsing stops collecting once this many lines have failed.
    pub max_errors: usize,
}

impl Default for TextConfig {
    fn default() -> Self {
        Self {
            max_line_bytes: DEFAULT_MAX_LINE_BYTES,
            max_errors: DEFAULT_MAX_ERRORS,
        }
    }
}

impl TextConfig {
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_values(
            read_non_empty_env(ENV_MAX_LINE_BYTES).as_deref(),
            read_non_empty_env(ENV_MAX_ERRORS).as_deref(),
        )
    }

    #[must_use]
    pub(crate) fn from_values(max_line_bytes: Option<&str>, max_errors: Option<&str>) -> Self {
        Self {
            max_line_bytes: parse_usize(max_line_bytes, DEFAULT_MAX_LINE_BYTES, MIN_MAX_LINE_BYTES),
            max_errors: parse_usize(max_errors, DEFAULT_MAX_ERRORS, MIN_MAX_ERRORS),
        }
    }

    #[must_use]
    pub const fn with_max_line_bytes(mut self, max_line_bytes: usize) -> Self {
        self.max_line_bytes = max_line_bytes;
        self
    }

    #[must_use]
    pub const fn with_max_errors(mut self, max_errors: usize) -> Self {
        self.max_errors = max_errors;
        self
    }
}

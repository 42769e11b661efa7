use serde::Serialize;
use thiserror::Error;

use crate::text::lexer::LexError;
use crate::text::parser::ParseError;

pub type Result<T> = std::result::Result<T, OcciError>;

#[derive(Debug, Error)]
pub enum OcciError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("mandatory argument missing: {0}")]
    MandatoryArgument(String),

    #[error("instance validation failed: {0}")]
    InstanceValidation(String),

    #[error("attribute validation failed: {0}")]
    AttributeValidation(String),

    #[error("category validation failed: {0}")]
    CategoryValidation(String),

    #[error("instance lookup failed: {0}")]
    InstanceLookup(String),

    #[error("collection lookup failed: {0}")]
    CollectionLookup(String),

    #[error("rendering failed: {0}")]
    Rendering(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorPayload {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<usize>,
}

impl OcciError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Lex(_) => "LEX_ERROR",
            Self::Parse(_) => "PARSE_ERROR",
            Self::MandatoryArgument(_) => "MANDATORY_ARGUMENT",
            Self::InstanceValidation(_) => "INSTANCE_VALIDATION",
            Self::AttributeValidation(_) => "ATTRIBUTE_VALIDATION",
            Self::CategoryValidation(_) => "CATEGORY_VALIDATION",
            Self::InstanceLookup(_) => "INSTANCE_LOOKUP",
            Self::CollectionLookup(_) => "COLLECTION_LOOKUP",
            Self::Rendering(_) => "RENDERING_ERROR",
            Self::Json(_) => "JSON_ERROR",
        }
    }

    #[must_use]
    pub fn position(&self) -> Option<usize> {
        match self {
            Self::Lex(err) => Some(err.position()),
            Self::Parse(err) => Some(err.position()),
            _ => None,
        }
    }

    pub fn to_payload(&self, line: Option<usize>) -> ErrorPayload {
        ErrorPayload {
            code: self.code().to_string(),
            message: self.to_string(),
            line,
            position: self.position(),
        }
    }
}

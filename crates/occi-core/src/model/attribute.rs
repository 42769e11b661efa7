use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use std::str::FromStr;

use regex::Regex;

use crate::error::{OcciError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AttributeType {
    String,
    Number,
    Boolean,
    Uri,
    Ip,
    Json,
    Other(String),
}

impl AttributeType {
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "string" => Self::String,
            "number" | "integer" | "float" => Self::Number,
            "boolean" => Self::Boolean,
            "uri" => Self::Uri,
            "ip" | "ipaddr" => Self::Ip,
            "json" | "object" | "array" | "hash" => Self::Json,
            _ => Self::Other(name.to_string()),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::String => "string",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Uri => "uri",
            Self::Ip => "ip",
            Self::Json => "json",
            Self::Other(name) => name,
        }
    }
}

impl Display for AttributeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Address plus prefix length. The address is always stored masked to its
/// network, so `10.0.0.7/24` reads back as `10.0.0.0/24`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct IpValue {
    addr: IpAddr,
    prefix_len: u8,
}

impl IpValue {
    pub fn new(addr: IpAddr, prefix_len: u8) -> Result<Self> {
        let max = max_prefix(addr);
        if prefix_len > max {
            return Err(OcciError::AttributeValidation(format!(
                "prefix length {prefix_len} exceeds {max} for {addr}"
            )));
        }
        Ok(Self {
            addr: mask(addr, prefix_len),
            prefix_len,
        })
    }

    #[must_use]
    pub fn host(addr: IpAddr) -> Self {
        Self {
            addr,
            prefix_len: max_prefix(addr),
        }
    }

    #[must_use]
    pub const fn addr(&self) -> IpAddr {
        self.addr
    }

    #[must_use]
    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    #[must_use]
    pub fn is_host(&self) -> bool {
        self.prefix_len == max_prefix(self.addr)
    }
}

const fn max_prefix(addr: IpAddr) -> u8 {
    match addr {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn mask(addr: IpAddr, prefix_len: u8) -> IpAddr {
    match addr {
        IpAddr::V4(v4) => {
            let bits = u32::from(v4);
            let mask = u32::MAX.checked_shl(32 - u32::from(prefix_len)).unwrap_or(0);
            IpAddr::V4(Ipv4Addr::from(bits & mask))
        }
        IpAddr::V6(v6) => {
            let bits = u128::from(v6);
            let mask = u128::MAX.checked_shl(128 - u32::from(prefix_len)).unwrap_or(0);
            IpAddr::V6(Ipv6Addr::from(bits & mask))
        }
    }
}

impl Display for IpValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if self.is_host() {
            write!(f, "{}", self.addr)
        } else {
            write!(f, "{}/{}", self.addr, self.prefix_len)
        }
    }
}

impl FromStr for IpValue {
    type Err = OcciError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || OcciError::AttributeValidation(format!("invalid ip value: {s}"));
        let (raw_addr, raw_prefix) = match s.trim().split_once('/') {
            Some((addr, prefix)) => (addr, Some(prefix)),
            None => (s.trim(), None),
        };
        let addr = raw_addr.parse::<IpAddr>().map_err(|_| invalid())?;
        match raw_prefix {
            Some(prefix) => Self::new(addr, prefix.parse::<u8>().map_err(|_| invalid())?),
            None => Ok(Self::host(addr)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Uri(String),
    Ip(IpValue),
    Json(serde_json::Value),
}

impl AttributeValue {
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::String(_) => "string",
            Self::Integer(_) | Self::Float(_) => "number",
            Self::Boolean(_) => "boolean",
            Self::Uri(_) => "uri",
            Self::Ip(_) => "ip",
            Self::Json(_) => "json",
        }
    }

    #[must_use]
    pub fn matches(&self, type_tag: &AttributeType) -> bool {
        matches!(
            (type_tag, self),
            (AttributeType::String, Self::String(_))
                | (AttributeType::Number, Self::Integer(_) | Self::Float(_))
                | (AttributeType::Boolean, Self::Boolean(_))
                | (AttributeType::Uri, Self::Uri(_))
                | (AttributeType::Ip, Self::Ip(_))
                | (AttributeType::Json, Self::Json(_))
        )
    }

    /// Text that a `pattern` is matched against, if the value is textual.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::String(text) | Self::Uri(text) => Some(text),
            _ => None,
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<i64> for AttributeValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<IpValue> for AttributeValue {
    fn from(value: IpValue) -> Self {
        Self::Ip(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AttributeDefinition {
    pub type_tag: Option<AttributeType>,
    pub mutable: bool,
    pub required: bool,
    pub default: Option<AttributeValue>,
    pub pattern: Option<String>,
    pub description: Option<String>,
}

impl Default for AttributeDefinition {
    fn default() -> Self {
        Self {
            type_tag: Some(AttributeType::String),
            mutable: true,
            required: false,
            default: None,
            pattern: None,
            description: None,
        }
    }
}

impl AttributeDefinition {
    #[must_use]
    pub fn of_type(type_tag: AttributeType) -> Self {
        Self {
            type_tag: Some(type_tag),
            ..Self::default()
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub const fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: impl Into<AttributeValue>) -> Self {
        self.default = Some(default.into());
        self
    }

    #[must_use]
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Type tag and `pattern` check for one value of the attribute `name`.
    pub fn validate_value(&self, name: &str, value: &AttributeValue) -> Result<()> {
        if let Some(type_tag) = &self.type_tag {
            if !matches!(type_tag, AttributeType::Other(_)) && !value.matches(type_tag) {
                return Err(OcciError::AttributeValidation(format!(
                    "'{name}' expects {type_tag} but holds {}",
                    value.type_name()
                )));
            }
        }

        let (Some(pattern), Some(text)) = (&self.pattern, value.as_text()) else {
            return Ok(());
        };
        let regex = Regex::new(&format!("^(?:{pattern})$")).map_err(|err| {
            OcciError::AttributeValidation(format!("'{name}' has invalid pattern: {err}"))
        })?;
        if !regex.is_match(text) {
            return Err(OcciError::AttributeValidation(format!(
                "'{name}' value {text:?} does not match pattern {pattern:?}"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attribute {
    pub definition: Option<AttributeDefinition>,
    pub value: Option<AttributeValue>,
}

impl Attribute {
    #[must_use]
    pub fn from_definition(definition: AttributeDefinition) -> Self {
        Self {
            value: definition.default.clone(),
            definition: Some(definition),
        }
    }

    #[must_use]
    pub fn is_required(&self) -> bool {
        self.definition
            .as_ref()
            .is_some_and(|definition| definition.required)
    }
}

/// Required attributes must hold a value; present values must satisfy their
/// definition.
pub(crate) fn validate_attributes(
    owner: &str,
    attributes: &BTreeMap<String, Attribute>,
) -> Result<()> {
    for (name, attribute) in attributes {
        let Some(definition) = &attribute.definition else {
            continue;
        };
        match &attribute.value {
            Some(value) => definition.validate_value(name, value)?,
            None if definition.required => {
                return Err(OcciError::AttributeValidation(format!(
                    "'{name}' is required on '{owner}'"
                )));
            }
            None => {}
        }
    }
    Ok(())
}

/// Resolves attribute names to their definitions, e.g. from a category
/// registry.
pub trait AttributeLookup {
    fn attribute_definition(&self, name: &str) -> Option<&AttributeDefinition>;
}

impl AttributeLookup for BTreeMap<String, AttributeDefinition> {
    fn attribute_definition(&self, name: &str) -> Option<&AttributeDefinition> {
        self.get(name)
    }
}

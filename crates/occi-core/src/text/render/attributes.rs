use crate::error::{OcciError, Result};
use crate::model::{AttributeDefinition, AttributeType, AttributeValue};

use super::{quote, quote_escaped};

fn mismatch(type_tag: &AttributeType, value: &AttributeValue) -> OcciError {
    OcciError::Rendering(format!(
        "{} value cannot be rendered as {type_tag}",
        value.type_name()
    ))
}

fn render_float(value: f64) -> Result<String> {
    if !value.is_finite() {
        return Err(OcciError::Rendering(format!(
            "non-finite number {value} has no text form"
        )));
    }
    // `Display` never switches to exponent notation; the grammar has none.
    let text = value.to_string();
    if text.contains('.') {
        Ok(text)
    } else {
        Ok(format!("{text}.0"))
    }
}

/// Wire form of one attribute value, chosen by the definition's type tag.
///
/// Addresses are checked first, then URI-like values, then JSON values, then
/// primitives. A missing definition, a missing or unknown type tag and a
/// value that does not fit the tag all fail.
pub fn render_value(
    definition: Option<&AttributeDefinition>,
    value: &AttributeValue,
) -> Result<String> {
    let Some(definition) = definition else {
        return Err(OcciError::Rendering(
            "attribute value has no definition".to_string(),
        ));
    };
    let Some(type_tag) = &definition.type_tag else {
        return Err(OcciError::Rendering(
            "attribute definition has no type".to_string(),
        ));
    };

    match (type_tag, value) {
        (AttributeType::Ip, AttributeValue::Ip(ip)) => Ok(quote(&ip.to_string())),
        (AttributeType::Uri, AttributeValue::Uri(uri)) => Ok(quote(uri)),
        (AttributeType::Json, AttributeValue::Json(json)) => {
            Ok(quote_escaped(&serde_json::to_string(json)?))
        }
        (AttributeType::String, AttributeValue::String(text)) => Ok(quote_escaped(text)),
        (AttributeType::Number, AttributeValue::Integer(number)) => Ok(number.to_string()),
        (AttributeType::Number, AttributeValue::Float(number)) => render_float(*number),
        (AttributeType::Boolean, AttributeValue::Boolean(flag)) => Ok(flag.to_string()),
        (AttributeType::Other(name), _) => Err(OcciError::Rendering(format!(
            "unrecognized attribute type '{name}'"
        ))),
        (type_tag, value) => Err(mismatch(type_tag, value)),
    }
}

/// `name=value` as it follows an `X-OCCI-Attribute:` header or a link `;`.
pub fn render_attribute(
    name: &str,
    definition: Option<&AttributeDefinition>,
    value: &AttributeValue,
) -> Result<String> {
    let rendered = render_value(definition, value).map_err(|err| match err {
        OcciError::Rendering(message) => {
            OcciError::Rendering(format!("attribute '{name}': {message}"))
        }
        other => other,
    })?;
    Ok(format!("{name}={rendered}"))
}

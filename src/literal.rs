use crate::ir::Literal;
use encoding_rs::Encoding;
use fancy_regex::Regex as FancyRegex;
use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

static RE_KEYWORD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:True|False|None)$").unwrap());
// Requires at least one digit so a lone sign or dot stays a string.
static RE_NUMBER: LazyLock<FancyRegex> =
    LazyLock::new(|| FancyRegex::new(r"^(?=[+-]?\.?[0-9])[+-]?[0-9]*(?:\.[0-9]+)?$").unwrap());
static RE_INTEGER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+$").unwrap());
static RE_ELLIPSIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\.\.\.$").unwrap());

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CastError {
    #[error("couldn't cast to '{0}'")]
    UnknownCast(String),
    #[error("{text:?} is not a valid {cast}")]
    InvalidCast { cast: String, text: String },
    #[error("unknown encoding '{0}'")]
    UnknownEncoding(String),
    #[error("{ch:?} cannot be encoded as {encoding}")]
    Unencodable { encoding: String, ch: char },
}

/// Keywords are tried first, then numbers, then the ellipsis. Anything else
/// is kept verbatim as a string; this never fails.
pub fn coerce(text: &str) -> Literal {
    if RE_KEYWORD.is_match(text) {
        return match text {
            "True" => Literal::Bool(true),
            "False" => Literal::Bool(false),
            _ => Literal::None,
        };
    }
    if RE_NUMBER.is_match(text).unwrap_or(false) {
        return number(text);
    }
    if RE_ELLIPSIS.is_match(text) {
        return Literal::Ellipsis;
    }
    Literal::Str(text.to_string())
}

fn number(text: &str) -> Literal {
    let parsed = if text.contains('.') {
        float(text).map(Literal::Float)
    } else {
        integer(text)
    };
    parsed.unwrap_or_else(|| Literal::Str(text.to_string()))
}

fn integer(text: &str) -> Option<Literal> {
    if !RE_INTEGER.is_match(text) {
        return None;
    }
    Some(match text.parse::<i64>() {
        Ok(n) => Literal::Int(n),
        Err(_) => Literal::BigInt(canonical_digits(text)),
    })
}

fn canonical_digits(text: &str) -> String {
    let (sign, digits) = match text.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", text.strip_prefix('+').unwrap_or(text)),
    };
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        "0".to_string()
    } else {
        format!("{}{}", sign, digits)
    }
}

// Overflow saturates to infinity; NaN has no literal form.
fn float(text: &str) -> Option<f64> {
    text.parse::<f64>().ok().filter(|f| !f.is_nan())
}

pub fn cast(text: &str, kind: &str, encoding: &str) -> Result<Literal, CastError> {
    let invalid = || CastError::InvalidCast {
        cast: kind.to_string(),
        text: text.to_string(),
    };
    match kind.trim().to_ascii_lowercase().as_str() {
        "str" | "string" => Ok(Literal::Str(text.to_string())),
        "bytes" => encode(text, encoding).map(Literal::Bytes),
        "int" => integer(text).ok_or_else(invalid),
        "float" => float(text).map(Literal::Float).ok_or_else(invalid),
        "bool" => parse_bool(text).map(Literal::Bool).ok_or_else(invalid),
        "num" | "number" => {
            if RE_NUMBER.is_match(text).unwrap_or(false) {
                Ok(number(text))
            } else {
                Err(invalid())
            }
        }
        _ => Err(CastError::UnknownCast(kind.to_string())),
    }
}

/// strtobool: `y yes t true on 1` / `n no f false off 0`, case-insensitive.
pub fn parse_bool(text: &str) -> Option<bool> {
    match text.trim().to_ascii_lowercase().as_str() {
        "y" | "yes" | "t" | "true" | "on" | "1" => Some(true),
        "n" | "no" | "f" | "false" | "off" | "0" => Some(false),
        _ => None,
    }
}

pub fn encode(text: &str, encoding: &str) -> Result<Vec<u8>, CastError> {
    let name = encoding.trim().to_ascii_lowercase().replace('_', "-");
    let unencodable = |ch: char| CastError::Unencodable {
        encoding: encoding.to_string(),
        ch,
    };
    match name.as_str() {
        "utf-8" | "utf8" => Ok(text.as_bytes().to_vec()),
        "ascii" | "us-ascii" => text
            .chars()
            .map(|c| if c.is_ascii() { Ok(c as u8) } else { Err(unencodable(c)) })
            .collect(),
        "latin-1" | "latin1" | "iso-8859-1" | "iso8859-1" | "l1" => text
            .chars()
            .map(|c| u8::try_from(u32::from(c)).map_err(|_| unencodable(c)))
            .collect(),
        // BOM variants are little-endian
        "utf-16" | "utf16" => Ok([0xff, 0xfe]
            .into_iter()
            .chain(text.encode_utf16().flat_map(u16::to_le_bytes))
            .collect()),
        "utf-16-le" | "utf-16le" => Ok(text.encode_utf16().flat_map(u16::to_le_bytes).collect()),
        "utf-16-be" | "utf-16be" => Ok(text.encode_utf16().flat_map(u16::to_be_bytes).collect()),
        "utf-32" | "utf32" => Ok([0xff, 0xfe, 0x00, 0x00]
            .into_iter()
            .chain(text.chars().flat_map(|c| u32::from(c).to_le_bytes()))
            .collect()),
        "utf-32-le" | "utf-32le" => Ok(text.chars().flat_map(|c| u32::from(c).to_le_bytes()).collect()),
        "utf-32-be" | "utf-32be" => Ok(text.chars().flat_map(|c| u32::from(c).to_be_bytes()).collect()),
        _ => encode_labelled(text, encoding, &name),
    }
}

// Single- and multi-byte legacy codecs by their WHATWG labels.
fn encode_labelled(text: &str, encoding: &str, name: &str) -> Result<Vec<u8>, CastError> {
    let codec = Encoding::for_label(encoding.trim().as_bytes())
        .or_else(|| Encoding::for_label(name.as_bytes()))
        // UTF-16 and the replacement encoding are decode-only
        .filter(|codec| codec.output_encoding() == *codec)
        .ok_or_else(|| CastError::UnknownEncoding(encoding.to_string()))?;
    let (bytes, _, unmappable) = codec.encode(text);
    if unmappable {
        let ch = text
            .chars()
            .find(|c| codec.encode(c.encode_utf8(&mut [0; 4])).2)
            .unwrap_or(char::REPLACEMENT_CHARACTER);
        return Err(CastError::Unencodable {
            encoding: encoding.to_string(),
            ch,
        });
    }
    Ok(bytes.into_owned())
}

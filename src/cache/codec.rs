// src/cache/codec.rs
//! Entry file names carry their own metadata:
//! `{max_age}.{expire_at}.{identity_tag}{extension}`, e.g.
//! `14400.1790149400.9f2c…e1.webp`.

use std::num::ParseIntError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    /// Freshness window advertised to clients, seconds.
    pub max_age: u64,
    /// Unix seconds after which the entry is dead.
    pub expire_at: i64,
    pub identity_tag: String,
    /// Includes the leading dot.
    pub extension: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("entry name has no extension")]
    MissingExtension,

    #[error("entry name has fewer than 3 parts")]
    MalformedEntryName,

    #[error("invalid max-age: {0}")]
    InvalidMaxAge(ParseIntError),

    #[error("invalid expire-at: {0}")]
    InvalidExpireAt(ParseIntError),
}

/// `extension` must carry its leading separator (`.webp`).
pub fn encode_name(max_age: u64, expire_at: i64, identity_tag: &str, extension: &str) -> String {
    format!("{max_age}.{expire_at}.{identity_tag}{extension}")
}

pub fn decode_name(name: &str) -> Result<EntryMeta, DecodeError> {
    let (stem, ext) = match name.rfind('.') {
        Some(idx) if idx + 1 < name.len() => (&name[..idx], &name[idx..]),
        _ => return Err(DecodeError::MissingExtension),
    };

    // Anything past the third part is ignored so the format can grow.
    let parts: Vec<&str> = stem.split('.').collect();
    if parts.len() < 3 {
        return Err(DecodeError::MalformedEntryName);
    }

    let max_age = parts[0].parse::<u64>().map_err(DecodeError::InvalidMaxAge)?;
    let expire_at = parts[1].parse::<i64>().map_err(DecodeError::InvalidExpireAt)?;

    Ok(EntryMeta {
        max_age,
        expire_at,
        identity_tag: parts[2].to_string(),
        extension: ext.to_string(),
    })
}

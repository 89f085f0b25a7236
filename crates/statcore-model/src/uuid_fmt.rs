/// Failure to parse a caller-supplied uuid string into normalized form.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("not a valid uuid: {0}")]
pub struct UuidFormatError(pub String);

/// Normalizes a uuid to lowercase, hyphenated form (`xxxxxxxx-xxxx-...`).
/// Accepts both hyphenated and simple (32 hex, no dashes) input, matching
/// what the identity provider and callers may hand in.
pub fn normalize_uuid(raw: &str) -> Result<String, UuidFormatError> {
    uuid::Uuid::parse_str(raw)
        .map(|u| u.hyphenated().to_string())
        .map_err(|_| UuidFormatError(raw.to_string()))
}

//! Validation for identifiers that end up next to SQL.
//!
//! Collection names are bound as parameters, but they come from
//! configuration and are checked once at startup so a typo fails loudly.

/// Maximum length for a collection name
pub const MAX_IDENTIFIER_LENGTH: usize = 255;

/// Validates a collection name: lowercase alphanumeric and underscore,
/// starting with a letter or underscore.
pub fn validate_collection_name(s: &str) -> Result<(), SanitizeError> {
  let Some(first) = s.chars().next() else {
    return Err(SanitizeError::EmptyIdentifier);
  };

  if s.len() > MAX_IDENTIFIER_LENGTH {
    return Err(SanitizeError::IdentifierTooLong(s.len()));
  }

  if !first.is_ascii_lowercase() && first != '_' {
    return Err(SanitizeError::InvalidIdentifierStart(first));
  }

  if let Some(c) = s
    .chars()
    .find(|c| !c.is_ascii_lowercase() && !c.is_ascii_digit() && *c != '_')
  {
    return Err(SanitizeError::InvalidCollectionChar(c));
  }

  Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SanitizeError {
  #[error("Identifier cannot be empty")]
  EmptyIdentifier,
  #[error("Identifier too long: {0} > 255")]
  IdentifierTooLong(usize),
  #[error("Identifier must start with a lowercase letter or underscore, got '{0}'")]
  InvalidIdentifierStart(char),
  #[error("Collection names must be lowercase alphanumeric, got '{0}'")]
  InvalidCollectionChar(char),
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_validate_collection_name_valid() {
    assert!(validate_collection_name("parcels").is_ok());
    assert!(validate_collection_name("_staging").is_ok());
    assert!(validate_collection_name("parcels_2024").is_ok());
  }

  #[test]
  fn test_validate_collection_name_invalid() {
    assert_eq!(
      validate_collection_name(""),
      Err(SanitizeError::EmptyIdentifier)
    );
    assert_eq!(
      validate_collection_name("1parcels"),
      Err(SanitizeError::InvalidIdentifierStart('1'))
    );
    assert_eq!(
      validate_collection_name("Parcels"),
      Err(SanitizeError::InvalidIdentifierStart('P'))
    );
    assert_eq!(
      validate_collection_name("par-cels"),
      Err(SanitizeError::InvalidCollectionChar('-'))
    );
    assert!(matches!(
      validate_collection_name(&"a".repeat(300)),
      Err(SanitizeError::IdentifierTooLong(300))
    ));
  }
}

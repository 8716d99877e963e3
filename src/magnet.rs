//! Magnet link validation.

use url::Url;

use crate::error::AppError;

const BTIH_PREFIX: &str = "urn:btih:";

/// Check that `link` is a BitTorrent magnet URI and return it trimmed.
///
/// At least one `xt` parameter must be a `urn:btih:` info-hash, either 40 hex
/// digits or 32 base32 characters.
pub fn validate(link: &str) -> Result<&str, AppError> {
  let link = link.trim();
  let invalid = || AppError::validation("Not a valid magnet link", Some("magnet"));

  let url = Url::parse(link).map_err(|_| invalid())?;
  if url.scheme() != "magnet" {
    return Err(invalid());
  }

  let has_info_hash = url
    .query_pairs()
    .filter(|(key, _)| key == "xt")
    .any(|(_, value)| {
      value
        .get(..BTIH_PREFIX.len())
        .is_some_and(|prefix| prefix.eq_ignore_ascii_case(BTIH_PREFIX))
        && is_info_hash(&value[BTIH_PREFIX.len()..])
    });

  if has_info_hash {
    Ok(link)
  } else {
    Err(invalid())
  }
}

fn is_info_hash(hash: &str) -> bool {
  match hash.len() {
    40 => hash.chars().all(|c| c.is_ascii_hexdigit()),
    32 => hash
      .chars()
      .all(|c| matches!(c.to_ascii_uppercase(), 'A'..='Z' | '2'..='7')),
    _ => false,
  }
}

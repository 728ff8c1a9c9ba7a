//! URL slugs.
//!
//! Public slugs end with the hex-encoded ObjectId of the document they point
//! to, e.g. `my-first-post-5dd9b0bd9e5e41e0b2a0b6a4`. Storage slugs also carry
//! the original file extension.

use std::path::Path;

use mongodb::bson::oid::ObjectId;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::{BlogError, Result};

static NON_WORD_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-z0-9ก-๙]+").expect("non-word regex should compile"));
static COLLAPSE_WHITESPACE_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex should compile"));

/// Lowercase `text`, keep ASCII alphanumerics and Thai letters, and join the words with `-`.
pub fn slugify(text: &str) -> String {
    let lowered = text.to_lowercase();
    let spaced = NON_WORD_REGEX.replace_all(&lowered, " ");
    let collapsed = COLLAPSE_WHITESPACE_REGEX.replace_all(&spaced, " ");
    collapsed.trim().replace(' ', "-")
}

/// Slug for a titled document: `{slugify(title)}-{hex id}`.
pub fn compose(title: &str, id: &ObjectId) -> String {
    let words = slugify(title);
    if words.is_empty() {
        id.to_hex()
    } else {
        format!("{words}-{}", id.to_hex())
    }
}

/// Extract the ObjectId from the last `-` separated segment.
pub fn id_from_slug(slug: &str) -> Result<ObjectId> {
    let last = slug.rsplit('-').next().unwrap_or(slug);
    ObjectId::parse_str(last)
        .map_err(|_| BlogError::Validation(format!("malformed slug: {slug}")))
}

/// Same as [`id_from_slug`], ignoring the file extension of a storage slug.
pub fn id_from_storage_slug(slug: &str) -> Result<ObjectId> {
    let last = slug.rsplit('-').next().unwrap_or(slug);
    let stem = Path::new(last)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .unwrap_or(last);
    ObjectId::parse_str(stem)
        .map_err(|_| BlogError::Validation(format!("malformed storage slug: {slug}")))
}

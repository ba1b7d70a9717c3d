//! Tag list encoding and the attachment reconciliation rule.
//!
//! Detected tags for an attachment are persisted in a single text column as a
//! comma-joined list (`"Tag1,Tag2"`), with the empty string meaning "no tags
//! yet". [`TagList`] is the typed view of that column and [`merge_tag_list`]
//! is the one place that decides how newly detected tags change it. Every
//! repository implementation calls `merge_tag_list` inside its own atomic
//! section.

use serde::{Deserialize, Serialize};

use crate::defaults::{FILE_NAME_MAX_LEN, TAG_MAX_LEN, TAG_SEPARATOR};
use crate::models::{DuplicatePolicy, ReconcileAction};

/// Ordered list of tags attached to a file.
///
/// Insertion order is preserved. Duplicates are allowed unless the caller
/// merges with [`DuplicatePolicy::SkipExisting`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TagList(Vec<String>);

impl TagList {
    /// Create an empty tag list (encodes to the empty sentinel).
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the stored column value.
    ///
    /// The empty string decodes to an empty list. Any other value is split on
    /// the separator without further interpretation, so a legacy value such as
    /// `"a,,b"` keeps its empty middle element and re-encodes unchanged.
    pub fn decode(encoded: &str) -> Self {
        if encoded.is_empty() {
            return Self::new();
        }
        Self(encoded.split(TAG_SEPARATOR).map(String::from).collect())
    }

    /// Encode for storage.
    pub fn encode(&self) -> String {
        let sep = TAG_SEPARATOR.to_string();
        self.0.join(sep.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.0.iter().any(|t| t == tag)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn push(&mut self, tag: impl Into<String>) {
        self.0.push(tag.into());
    }
}

impl From<Vec<String>> for TagList {
    fn from(tags: Vec<String>) -> Self {
        Self(tags)
    }
}

impl<'a> FromIterator<&'a str> for TagList {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(String::from).collect())
    }
}

impl std::fmt::Display for TagList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.encode())
    }
}

/// Result of merging detected tags into an existing list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMerge {
    /// The list to persist.
    pub tags: TagList,
    /// Decision taken.
    pub action: ReconcileAction,
    /// Tags that were actually appended, in order.
    pub added: Vec<String>,
}

/// Decide the new tag list for a file.
///
/// - `existing == None`: no record yet, create one holding `detected`
///   (possibly the empty sentinel).
/// - existing list is the empty sentinel: replace it with `detected`.
/// - otherwise: append `detected` after the existing tags.
///
/// When nothing would be appended to an existing record the action is
/// [`ReconcileAction::Unchanged`] and callers skip the write.
///
/// `detected` is expected to be normalized already (see [`normalize_tags`]).
pub fn merge_tag_list(
    existing: Option<&TagList>,
    detected: &[String],
    policy: DuplicatePolicy,
) -> TagMerge {
    let mut tags = existing.cloned().unwrap_or_default();
    let mut added = Vec::with_capacity(detected.len());

    for tag in detected {
        if policy == DuplicatePolicy::SkipExisting && tags.contains(tag) {
            continue;
        }
        tags.push(tag.clone());
        added.push(tag.clone());
    }

    let action = match existing {
        None => ReconcileAction::Created,
        Some(_) if added.is_empty() => ReconcileAction::Unchanged,
        Some(current) if current.is_empty() => ReconcileAction::Replaced,
        Some(_) => ReconcileAction::Appended,
    };

    TagMerge {
        tags,
        action,
        added,
    }
}

/// Validate a single tag.
///
/// Rules:
/// - Length between 1-100 characters
/// - Must not contain the list separator `,`
/// - No control characters
///
/// Returns Ok(()) if valid, Err with message if invalid.
pub fn validate_tag_name(tag: &str) -> std::result::Result<(), String> {
    if tag.is_empty() {
        return Err("Tag name cannot be empty".to_string());
    }
    if tag.chars().count() > TAG_MAX_LEN {
        return Err(format!(
            "Tag name must be {} characters or less",
            TAG_MAX_LEN
        ));
    }
    if tag.contains(TAG_SEPARATOR) {
        return Err(format!(
            "Tag '{}' contains the list separator '{}'",
            tag, TAG_SEPARATOR
        ));
    }
    if tag.chars().any(char::is_control) {
        return Err(format!("Tag '{}' contains control characters", tag.escape_debug()));
    }
    Ok(())
}

/// Trim tags, drop blanks, and validate what remains.
///
/// Order and duplicates are preserved; deduplication is a merge policy, not
/// a normalization step.
pub fn normalize_tags<S: AsRef<str>>(tags: &[S]) -> std::result::Result<Vec<String>, String> {
    let mut out = Vec::with_capacity(tags.len());
    for raw in tags {
        let tag = raw.as_ref().trim();
        if tag.is_empty() {
            continue;
        }
        validate_tag_name(tag)?;
        out.push(tag.to_string());
    }
    Ok(out)
}

/// Validate an attachment file name used as the reconciliation key.
///
/// Returns the trimmed name.
pub fn validate_file_name(file_name: &str) -> std::result::Result<&str, String> {
    let name = file_name.trim();
    if name.is_empty() {
        return Err("File name cannot be empty".to_string());
    }
    if name.len() > FILE_NAME_MAX_LEN {
        return Err(format!(
            "File name must be {} bytes or less",
            FILE_NAME_MAX_LEN
        ));
    }
    if name.chars().any(char::is_control) {
        return Err("File name contains control characters".to_string());
    }
    Ok(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_decode_empty_sentinel() {
        let list = TagList::decode("");
        assert!(list.is_empty());
        assert_eq!(list.encode(), "");
    }

    #[test]
    fn test_decode_encode_preserves_order() {
        let list = TagList::decode("Tag2,Tag1,Tag2");
        assert_eq!(list.as_slice(), &tags(&["Tag2", "Tag1", "Tag2"])[..]);
        assert_eq!(list.encode(), "Tag2,Tag1,Tag2");
    }

    #[test]
    fn test_decode_keeps_legacy_empty_segments() {
        let list = TagList::decode("a,,b");
        assert_eq!(list.len(), 3);
        assert_eq!(list.encode(), "a,,b");
    }

    #[test]
    fn test_serde_is_plain_array() {
        let list: TagList = ["door", "window"].into_iter().collect();
        let json = serde_json::to_value(&list).unwrap();
        assert_eq!(json, serde_json::json!(["door", "window"]));
    }

    #[test]
    fn test_merge_creates_when_absent() {
        let merge = merge_tag_list(None, &tags(&["Tag1", "Tag2"]), DuplicatePolicy::Keep);
        assert_eq!(merge.action, ReconcileAction::Created);
        assert_eq!(merge.tags.encode(), "Tag1,Tag2");
        assert_eq!(merge.added, tags(&["Tag1", "Tag2"]));
    }

    #[test]
    fn test_merge_creates_empty_sentinel_for_no_tags() {
        let merge = merge_tag_list(None, &[], DuplicatePolicy::Keep);
        assert_eq!(merge.action, ReconcileAction::Created);
        assert_eq!(merge.tags.encode(), "");
    }

    #[test]
    fn test_merge_replaces_empty_sentinel() {
        let existing = TagList::decode("");
        let merge = merge_tag_list(Some(&existing), &tags(&["Tag3"]), DuplicatePolicy::Keep);
        assert_eq!(merge.action, ReconcileAction::Replaced);
        assert_eq!(merge.tags.encode(), "Tag3");
    }

    #[test]
    fn test_merge_appends_after_comma() {
        let existing = TagList::decode("Tag1,Tag2");
        let merge = merge_tag_list(Some(&existing), &tags(&["Tag3"]), DuplicatePolicy::Keep);
        assert_eq!(merge.action, ReconcileAction::Appended);
        assert_eq!(merge.tags.encode(), "Tag1,Tag2,Tag3");
    }

    #[test]
    fn test_merge_keep_policy_accumulates_duplicates() {
        let existing = TagList::decode("Tag1,Tag2");
        let merge = merge_tag_list(
            Some(&existing),
            &tags(&["Tag1", "Tag2"]),
            DuplicatePolicy::Keep,
        );
        assert_eq!(merge.action, ReconcileAction::Appended);
        assert_eq!(merge.tags.encode(), "Tag1,Tag2,Tag1,Tag2");
    }

    #[test]
    fn test_merge_skip_existing_policy() {
        let existing = TagList::decode("Tag1,Tag2");
        let merge = merge_tag_list(
            Some(&existing),
            &tags(&["Tag2", "Tag3", "Tag3"]),
            DuplicatePolicy::SkipExisting,
        );
        assert_eq!(merge.action, ReconcileAction::Appended);
        assert_eq!(merge.tags.encode(), "Tag1,Tag2,Tag3");
        assert_eq!(merge.added, tags(&["Tag3"]));
    }

    #[test]
    fn test_merge_skip_existing_all_present_is_unchanged() {
        let existing = TagList::decode("Tag1");
        let merge = merge_tag_list(Some(&existing), &tags(&["Tag1"]), DuplicatePolicy::SkipExisting);
        assert_eq!(merge.action, ReconcileAction::Unchanged);
        assert_eq!(merge.tags, existing);
    }

    #[test]
    fn test_merge_nothing_into_existing_is_unchanged() {
        let existing = TagList::decode("");
        let merge = merge_tag_list(Some(&existing), &[], DuplicatePolicy::Keep);
        assert_eq!(merge.action, ReconcileAction::Unchanged);
        assert!(merge.added.is_empty());
    }

    #[test]
    fn test_validate_tag_name() {
        assert!(validate_tag_name("door-D01").is_ok());
        assert!(validate_tag_name("Fire Extinguisher").is_ok());
        assert!(validate_tag_name("").is_err());
        assert!(validate_tag_name("a,b").is_err());
        assert!(validate_tag_name("tab\there").is_err());
        assert!(validate_tag_name(&"x".repeat(101)).is_err());
        assert!(validate_tag_name(&"x".repeat(100)).is_ok());
    }

    #[test]
    fn test_normalize_trims_and_drops_blank() {
        let out = normalize_tags(&["  Tag1 ", "", "   ", "Tag2", "Tag1"]).unwrap();
        assert_eq!(out, tags(&["Tag1", "Tag2", "Tag1"]));
    }

    #[test]
    fn test_normalize_rejects_separator() {
        let err = normalize_tags(&["Tag1", "Tag2,Tag3"]).unwrap_err();
        assert!(err.contains("separator"));
    }

    #[test]
    fn test_validate_file_name() {
        assert_eq!(validate_file_name("  plan_A.pdf ").unwrap(), "plan_A.pdf");
        assert!(validate_file_name("").is_err());
        assert!(validate_file_name("   ").is_err());
        assert!(validate_file_name("bad\nname.pdf").is_err());
        assert!(validate_file_name(&"a".repeat(256)).is_err());
    }
}

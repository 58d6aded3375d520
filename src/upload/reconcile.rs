use std::sync::LazyLock;

use itertools::Itertools;
use regex::{Captures, Regex};

use crate::upload::UploadReferenceMap;

// Stops at anything that would end an attribute value, a CSS url() or a JSON string.
static LOCAL_REFERENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"blob:[^\s"'<>()\\]+"#).unwrap());

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("wait for uploads to finish: {} image(s) not uploaded yet", .pending.len())]
pub struct UnresolvedReferences {
    pub pending: Vec<String>,
}

/// Every distinct local reference in the content, in order of first appearance.
pub fn local_references(content: &str) -> Vec<&str> {
    LOCAL_REFERENCE
        .find_iter(content)
        .map(|found| found.as_str())
        .unique()
        .collect()
}

/// Rewrites every local reference to its persisted URL, or rewrites nothing at all.
///
/// Works on any textual form of the document (HTML or a JSON tree); content without
/// local references comes back unchanged.
pub fn process_for_submit(
    content: &str,
    map: &UploadReferenceMap,
) -> Result<String, UnresolvedReferences> {
    let pending = local_references(content)
        .into_iter()
        .filter(|reference| map.get(reference).is_none())
        .map(ToOwned::to_owned)
        .collect::<Vec<_>>();
    if !pending.is_empty() {
        return Err(UnresolvedReferences { pending });
    }
    Ok(LOCAL_REFERENCE
        .replace_all(content, |captures: &Captures| match map.get(&captures[0]) {
            Some(url) => url.to_string(),
            None => captures[0].to_owned(),
        })
        .into_owned())
}

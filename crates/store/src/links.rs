//! Link references — parsing `[[wiki links]]` and relative markdown links,
//! and resolving them against the set of documents in a vault.

use std::sync::LazyLock;
use notewright_core::store::{join, normalize_path, parent_of, LinkRef};
use regex_lite::Regex;

static WIKI_LINK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"!?\[\[([^\[\]]+?)\]\]").expect("valid wiki link pattern"));

static MARKDOWN_LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"\[[^\]]*\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("valid markdown link pattern")
});

/// Every link reference in `content`, in order of appearance.
///
/// Self-references (`[[#Heading]]`) and external URLs are skipped.
pub fn parse_links(content: &str) -> Vec<LinkRef> {
    let mut found: Vec<(usize, LinkRef)> = Vec::new();

    for caps in WIKI_LINK.captures_iter(content) {
        let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let target = strip_subpath(inner.as_str().split('|').next().unwrap_or_default());
        if target.is_empty() {
            continue;
        }
        found.push((
            whole.start(),
            LinkRef {
                link: target.to_string(),
                original: whole.as_str().to_string(),
            },
        ));
    }

    for caps in MARKDOWN_LINK.captures_iter(content) {
        let (Some(whole), Some(target)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        // Image embeds of the form ![](...) share this syntax; keep them, they are links too.
        let raw = target.as_str();
        if raw.contains("://") || raw.starts_with("mailto:") || raw.starts_with('#') {
            continue;
        }
        let decoded = raw.replace("%20", " ");
        let target = strip_subpath(&decoded);
        if target.is_empty() {
            continue;
        }
        found.push((
            whole.start(),
            LinkRef {
                link: target.to_string(),
                original: whole.as_str().to_string(),
            },
        ));
    }

    found.sort_by_key(|(pos, _)| *pos);
    found.into_iter().map(|(_, link)| link).collect()
}

/// Drop `#heading` and `^block` suffixes.
fn strip_subpath(target: &str) -> &str {
    let end = target.find(['#', '^']).unwrap_or(target.len());
    target[..end].trim()
}

/// Resolve `link`, written in the document at `from_path`, against `documents`.
///
/// Order: exact vault path, then relative to the source folder, then the
/// shortest document whose path ends with the link. Each stage tries the link
/// as written, then with `.md` appended, so `[[Dr. Smith]]` finds
/// `Dr. Smith.md`. Matching is case-insensitive.
pub fn resolve_link(link: &str, from_path: &str, documents: &[String]) -> Option<String> {
    let Ok(target) = normalize_path(link) else {
        return None;
    };
    if target.is_empty() {
        return None;
    }
    let mut candidates = vec![target.to_lowercase()];
    if !candidates[0].ends_with(".md") {
        candidates.push(format!("{}.md", candidates[0]));
    }
    let folder = parent_of(from_path).to_lowercase();

    let find_exact = |candidate: &str| {
        documents
            .iter()
            .find(|doc| doc.to_lowercase() == candidate)
            .cloned()
    };
    let find_suffix = |candidate: &str| {
        let suffix = format!("/{candidate}");
        documents
            .iter()
            .filter(|doc| doc.to_lowercase().ends_with(&suffix))
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .cloned()
    };

    candidates
        .iter()
        .find_map(|c| find_exact(c))
        .or_else(|| candidates.iter().find_map(|c| find_exact(&join(&folder, c))))
        .or_else(|| candidates.iter().find_map(|c| find_suffix(c)))
}

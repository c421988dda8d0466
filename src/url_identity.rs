/// URL identity: the comparison key shared by every context
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use url::{Origin, Position, Url};

/// Normalize a URL to its comparison key: origin + path.
///
/// Query string and fragment are dropped, default ports disappear through
/// parsing, and nothing else is rewritten. Strings that do not parse as an
/// absolute URL come back unchanged, so they still compare literally.
///
/// Examples:
/// - https://a.com/p?x=1#y → https://a.com/p
/// - https://a.com:443 → https://a.com/
/// - not a url → not a url
pub fn normalize(raw: &str) -> String {
    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(_) => return raw.to_string(),
    };

    let origin = url.origin();
    match &origin {
        Origin::Tuple(scheme, ..) if scheme == url.scheme() => {
            format!("{}{}", origin.ascii_serialization(), url.path())
        }
        // mailto:, data:, file: have no serializable origin, and blob: borrows
        // the origin of the URL it wraps. Keep those up to the end of the path.
        // Parsing trims trailing whitespace, so the key must too.
        _ => url[..Position::AfterPath]
            .trim_end_matches(|c: char| c <= ' ')
            .to_string(),
    }
}

/// The set of normalized URLs produced by one history query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VisitedSet(BTreeSet<String>);

impl VisitedSet {
    pub fn new() -> Self {
        VisitedSet(BTreeSet::new())
    }

    /// Build a set from raw URLs, normalizing each one and dropping empties
    pub fn from_urls<I, S>(urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        urls.into_iter()
            .map(|url| normalize(url.as_ref()))
            .filter(|url| !url.is_empty())
            .collect()
    }

    /// Membership test for an already-normalized key
    pub fn contains(&self, normalized: &str) -> bool {
        self.0.contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.0.iter()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl FromIterator<String> for VisitedSet {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        VisitedSet(iter.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_query_and_fragment() {
        assert_eq!(normalize("https://a.com/p?x=1#y"), "https://a.com/p");
        assert_eq!(normalize("https://a.com/p#top"), "https://a.com/p");
        assert_eq!(normalize("http://x.com/b?q=1"), "http://x.com/b");
    }

    #[test]
    fn test_normalize_keeps_non_default_port() {
        assert_eq!(normalize("http://localhost:3000/app?debug"), "http://localhost:3000/app");
        assert_eq!(normalize("https://a.com:443/p"), "https://a.com/p");
        assert_eq!(normalize("http://a.com:80"), "http://a.com/");
    }

    #[test]
    fn test_normalize_drops_credentials() {
        assert_eq!(normalize("https://user:pw@a.com/inbox"), "https://a.com/inbox");
    }

    #[test]
    fn test_normalize_lowercases_host() {
        assert_eq!(normalize("HTTPS://Example.COM/Path"), "https://example.com/Path");
    }

    #[test]
    fn test_normalize_malformed_passthrough() {
        assert_eq!(normalize("not a url"), "not a url");
        assert_eq!(normalize("/relative/path"), "/relative/path");
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("https://"), "https://");
    }

    #[test]
    fn test_normalize_opaque_origins() {
        assert_eq!(normalize("mailto:someone@a.com?subject=hi"), "mailto:someone@a.com");
        assert_eq!(normalize("file:///tmp/notes.txt#L3"), "file:///tmp/notes.txt");
    }

    #[test]
    fn test_normalize_keeps_wrapped_urls_whole() {
        assert_eq!(normalize("blob:https://a.com/uuid-1"), "blob:https://a.com/uuid-1");
        assert_eq!(normalize("blob:https://a.com/uuid-1#frag"), "blob:https://a.com/uuid-1");
        assert_eq!(normalize("view-source:https://a.com/p?x=1"), "view-source:https://a.com/p");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let inputs = [
            "https://a.com/p?x=1#y",
            "http://localhost:8080",
            "not a url",
            "mailto:x@y.z?cc=w",
            "javascript:a #frag",
            "javascript:foo:bar",
            "https://münchen.de/straße",
            "http://[::1]:9000/x/../y",
            "  https://padded.com/  ",
            "blob:https://a.com/uuid-1",
            "blob:http://localhost:3000/9f1c?x=1#y",
            "view-source:https://a.com/p",
            "data:text/plain,hello#x",
            "",
        ];

        for input in inputs {
            let once = normalize(input);
            assert_eq!(normalize(&once), once, "not idempotent for {input:?}");
        }
    }

    #[test]
    fn test_visited_set_normalizes_and_dedupes() {
        let set = VisitedSet::from_urls([
            "https://x.com/a",
            "https://x.com/b?q=1",
            "https://x.com/b?q=2",
            "",
        ]);

        assert_eq!(set.len(), 2);
        assert!(set.contains("https://x.com/a"));
        assert!(set.contains("https://x.com/b"));
        assert!(!set.contains("https://x.com/b?q=1"));
    }

    #[test]
    fn test_visited_set_serializes_as_list() {
        let set = VisitedSet::from_urls(["https://b.com/", "https://a.com/"]);

        let json = serde_json::to_string(&set).unwrap();

        assert_eq!(json, r#"["https://a.com/","https://b.com/"]"#);
    }
}

//! Slash-separated storage path helpers
//!
//! Storage paths always use `/` regardless of the host platform, so these
//! work on plain strings rather than `std::path`.

/// Extension of the final path element, dot included, or `""` when it has none.
///
/// `"/a/b.tar.gz"` yields `".gz"`; a dot in a parent directory is ignored.
pub fn extension(path: &str) -> &str {
    let name_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[name_start..].rfind('.') {
        Some(dot) => &path[name_start + dot..],
        None => "",
    }
}

/// All but the last element of `path`, cleaned.
///
/// Returns `"."` for a bare file name and `"/"` for a file at the root.
pub fn dir(path: &str) -> String {
    let parent = match path.rfind('/') {
        Some(i) => &path[..=i],
        None => "",
    };
    clean(parent)
}

/// Lexically normalise a slash path: collapse repeated separators, drop `.`
/// elements, resolve `..` against preceding elements.
pub fn clean(path: &str) -> String {
    if path.is_empty() {
        return ".".to_string();
    }

    let rooted = path.starts_with('/');
    let mut parts: Vec<&str> = Vec::new();
    for segment in path.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                if matches!(parts.last(), Some(last) if *last != "..") {
                    parts.pop();
                } else if !rooted {
                    parts.push("..");
                }
            }
            other => parts.push(other),
        }
    }

    let joined = parts.join("/");
    match (rooted, joined.is_empty()) {
        (true, _) => format!("/{joined}"),
        (false, true) => ".".to_string(),
        (false, false) => joined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("/home/report.odt", ".odt")]
    #[case("/home/archive.tar.gz", ".gz")]
    #[case("/home/v1.2/README", "")]
    #[case("/home/.profile", ".profile")]
    #[case("report.", ".")]
    #[case("", "")]
    fn test_extension(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(extension(path), expected);
    }

    #[rstest]
    #[case("/home/Letters/Draft.odt", "/home/Letters")]
    #[case("/Draft.odt", "/")]
    #[case("Draft.odt", ".")]
    #[case("", ".")]
    #[case("/home//Letters/./Draft.odt", "/home/Letters")]
    #[case("/home/Letters/", "/home/Letters")]
    #[case("a/b/c.odt", "a/b")]
    fn test_dir(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(dir(path), expected);
    }

    #[rstest]
    #[case("/a/../b", "/b")]
    #[case("/../a", "/a")]
    #[case("../a", "../a")]
    #[case("a/..", ".")]
    #[case("a/../..", "..")]
    #[case("//", "/")]
    fn test_clean(#[case] path: &str, #[case] expected: &str) {
        assert_eq!(clean(path), expected);
    }
}

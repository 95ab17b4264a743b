//! Cache key to filename transform.

use regex::Regex;
use std::sync::LazyLock;

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\W").unwrap());

/// Flatten an opaque cache key (usually a URL) into a filename.
///
/// Every non-word character becomes an underscore, which keeps the transform
/// deterministic and filesystem-safe on every platform we care about. The
/// transform is lossy: `https://a/b` and `https_//a/b` collide, but keys in
/// this system are always full URLs or prefixed digests, so in practice they
/// never do.
///
/// # Examples
///
/// ```
/// use packrat_cache::entry_name;
///
/// assert_eq!(
///     entry_name("https://api.github.com/repos/a/b/git/trees/abc123"),
///     "https___api_github_com_repos_a_b_git_trees_abc123",
/// );
/// ```
pub fn entry_name(key: impl AsRef<str>) -> String {
    NON_WORD.replace_all(key.as_ref(), "_").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("plain_key", "plain_key")]
    #[case("https://example.com/x?a=1&b=2", "https___example_com_x_a_1_b_2")]
    #[case("pack-0123abcdef", "pack_0123abcdef")]
    #[case("spaces and/slashes", "spaces_and_slashes")]
    fn test_transform(#[case] key: &str, #[case] expected: &str) {
        assert_eq!(entry_name(key), expected);
    }

    #[test]
    fn test_deterministic() {
        let key = "https://api.github.com/repos/a/b/branches?per_page=99999";
        assert_eq!(entry_name(key), entry_name(key));
    }
}

//! Branch name filtering and per-version branch selection.

use packrat_remote::Branch;
use regex::Regex;
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Strictly numeric `major.minor[.patch]` branch names. Everything else on
/// the remote (feature branches, "combined" snapshots, pre-releases with
/// letter suffixes) is ignored.
static VERSION_BRANCH: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^(\d+)\.(\d+)(?:\.(\d+))?$").unwrap());

/// Versions that predate numeric custom model data. This is a fixed table,
/// not something inferred from the assets themselves.
static UNSUPPORTED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^1\.(\d|1[0-2])$").unwrap());

/// Pick, per `major.minor` label, the branch to resolve for that version.
///
/// Branches with non-version names or versions without custom model data
/// are dropped. Within one label the numerically highest patch wins (a bare
/// `1.13` counts as patch zero), with the full branch name breaking exact
/// ties.
pub(crate) fn select_branches(branches: &[Branch]) -> BTreeMap<String, Branch> {
    let mut chosen: BTreeMap<String, (u64, Branch)> = BTreeMap::new();
    for branch in branches {
        let Some(captures) = VERSION_BRANCH.captures(&branch.name) else {
            continue;
        };
        let label = format!("{}.{}", &captures[1], &captures[2]);
        if UNSUPPORTED.is_match(&label) {
            continue;
        }
        let patch: u64 = captures.get(3).map_or(0, |m| m.as_str().parse().unwrap_or(0));
        let newer = match chosen.get(&label) {
            Some((best, incumbent)) => (patch, branch.name.as_str()) > (*best, incumbent.name.as_str()),
            None => true,
        };
        if newer {
            chosen.insert(label, (patch, branch.clone()));
        }
    }
    chosen.into_iter().map(|(label, (_, branch))| (label, branch)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn branches(names: &[&str]) -> Vec<Branch> {
        names.iter().map(|name| Branch::new(*name, format!("sha-{name}"))).collect()
    }

    #[rstest]
    #[case::feature_work("my-feature-branch")]
    #[case::combined("combined")]
    #[case::prerelease("1.17-pre1")]
    #[case::snapshot("21w37a")]
    fn test_non_version_names_are_ignored(#[case] name: &str) {
        assert!(select_branches(&branches(&[name])).is_empty());
    }

    #[rstest]
    #[case::one_nine("1.9", false)]
    #[case::one_ten("1.10", false)]
    #[case::one_twelve("1.12", false)]
    #[case::one_twelve_patch("1.12.2", false)]
    #[case::one_thirteen("1.13", true)]
    #[case::one_twenty("1.20", true)]
    #[case::two_oh("2.0", true)]
    fn test_custom_model_data_cutoff(#[case] name: &str, #[case] kept: bool) {
        assert_eq!(select_branches(&branches(&[name])).len(), usize::from(kept));
    }

    #[test]
    fn test_highest_patch_wins_per_label() {
        let selected = select_branches(&branches(&["1.13", "1.13.2", "1.13.1", "1.14"]));
        assert_eq!(selected.len(), 2);
        assert_eq!(selected["1.13"].name, "1.13.2");
        assert_eq!(selected["1.14"].name, "1.14");
    }

    #[test]
    fn test_labels_sort_lexicographically() {
        let selected = select_branches(&branches(&["1.14", "1.13"]));
        let labels: Vec<&String> = selected.keys().collect();
        assert_eq!(labels, ["1.13", "1.14"]);
    }
}

//! Pod-name pattern compaction.
//!
//! Turns the resolved pod names of a workload into a short regular-expression
//! operand for a `pod=~"..."` matcher. Pods created by one controller share a
//! name prefix (`mg-sh-shard0-0`, `mg-sh-shard0-1`, ...), so the common prefix
//! followed by a wildcard keeps the query short no matter how many replicas
//! are running.

/// Suffix appended to a common prefix, matching any continuation.
pub const WILDCARD: &str = ".*";

/// Separator used when the names share no prefix.
pub const ALTERNATION: &str = "|";

/// Longest common prefix of all `names`, compared byte-for-byte.
///
/// Returns an empty string for an empty input. The result is always a prefix
/// of the first name ending on a character boundary.
pub fn longest_common_prefix<S: AsRef<str>>(names: &[S]) -> &str {
    let Some(first) = names.first().map(AsRef::as_ref) else {
        return "";
    };

    let mut len = names
        .iter()
        .map(|n| n.as_ref().len())
        .min()
        .unwrap_or_default();

    for name in &names[1..] {
        let common = first
            .bytes()
            .zip(name.as_ref().bytes())
            .take(len)
            .take_while(|(a, b)| a == b)
            .count();
        len = len.min(common);
        if len == 0 {
            break;
        }
    }

    while !first.is_char_boundary(len) {
        len -= 1;
    }

    &first[..len]
}

/// Compact pod names into a matcher pattern.
///
/// A non-empty common prefix yields `prefix.*`, including the single-name
/// case. Without one, the names are joined into an alternation in input
/// order, which is empty for an empty input.
pub fn compact<S: AsRef<str>>(names: &[S]) -> String {
    let prefix = longest_common_prefix(names);

    if prefix.is_empty() {
        names
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join(ALTERNATION)
    } else {
        format!("{}{}", prefix, WILDCARD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_compact_empty() {
        let names: [&str; 0] = [];
        assert_eq!(compact(&names), "");
        assert_eq!(longest_common_prefix(&names), "");
    }

    #[test]
    fn test_compact_single_name_keeps_wildcard() {
        assert_eq!(compact(&["x"]), "x.*");
        assert_eq!(compact(&["mg-sh-shard0-0"]), "mg-sh-shard0-0.*");
    }

    #[test]
    fn test_compact_statefulset_replicas() {
        let pods = ["app-0", "app-1", "app-2"];
        assert_eq!(longest_common_prefix(&pods), "app-");
        assert_eq!(compact(&pods), "app-.*");
    }

    #[test]
    fn test_compact_no_common_prefix() {
        let pods = ["alpha-0", "beta-0", "gamma-0"];
        assert_eq!(compact(&pods), "alpha-0|beta-0|gamma-0");
    }

    #[test]
    fn test_prefix_bounded_by_shortest_name() {
        let pods = vec!["web".to_string(), "web-1".to_string(), "webhook".to_string()];
        assert_eq!(longest_common_prefix(&pods), "web");
        assert_eq!(compact(&pods), "web.*");
    }

    #[test]
    fn test_prefix_mismatch_in_later_name() {
        let pods = ["db-a-0", "db-a-1", "db-b-0"];
        assert_eq!(compact(&pods), "db-.*");
    }

    #[test]
    fn test_duplicates_are_harmless() {
        assert_eq!(compact(&["app-0", "app-0"]), "app-0.*");
    }

    #[test]
    fn test_prefix_stops_on_char_boundary() {
        // 'é' and 'è' share their first UTF-8 byte
        let names = ["caé", "caè"];
        assert_eq!(longest_common_prefix(&names), "ca");
    }

    proptest! {
        #[test]
        fn prop_shared_prefix_is_found(
            prefix in "[a-z][a-z0-9-]{0,10}",
            suffixes in prop::collection::vec("[a-z0-9]{0,6}", 1..6),
        ) {
            let names: Vec<String> = suffixes
                .iter()
                .map(|s| format!("{}{}", prefix, s))
                .collect();
            let lcp = longest_common_prefix(&names);

            prop_assert!(lcp.starts_with(prefix.as_str()));
            prop_assert!(names.iter().all(|n| n.starts_with(lcp)));
            prop_assert_eq!(compact(&names), format!("{}.*", lcp));
        }

        #[test]
        fn prop_prefix_is_maximal(
            names in prop::collection::vec("[a-c]{1,6}", 2..6),
        ) {
            let lcp = longest_common_prefix(&names);
            let shortest = names.iter().map(String::len).min().unwrap();
            if lcp.len() < shortest {
                let next = names[0].as_bytes()[lcp.len()];
                prop_assert!(names.iter().any(|n| n.as_bytes()[lcp.len()] != next));
            }
        }

        #[test]
        fn prop_distinct_first_chars_alternate_in_order(
            firsts in prop::sample::subsequence(('a'..='z').collect::<Vec<_>>(), 2..8),
            tail in "[0-9-]{0,5}",
        ) {
            let mut firsts = firsts;
            firsts.reverse();
            let names: Vec<String> = firsts.iter().map(|c| format!("{}{}", c, tail)).collect();
            prop_assert_eq!(compact(&names), names.join("|"));
        }
    }
}

use crate::models::repo::RepoId;
use crate::models::snapshot::GitMetrics;

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Git workflow metrics derived from the repository name.
///
/// Stands in for cloning and walking history. The hash is stable across runs
/// and platforms, so the same repository always gets the same numbers.
pub fn estimate_git_metrics(repo: &RepoId) -> GitMetrics {
    let h = fnv1a(repo.full_name().as_bytes());

    GitMetrics {
        total_commits: 50 + h % 500,
        recent_commits: 5 + h % 20,
        avg_commit_message_length: (40 + h % 30) as f64,
        unique_contributors: 1 + h % 10,
        branches: 1 + h % 5,
        has_conventional_commits: h % 3 == 0,
    }
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fnv1a_matches_reference_vectors() {
        assert_eq!(fnv1a(b""), 0xcbf2_9ce4_8422_2325);
        assert_eq!(fnv1a(b"a"), 0xaf63_dc4c_8601_ec8c);
    }

    #[test]
    fn metrics_are_stable_and_in_range() {
        let repo = RepoId::parse("https://github.com/tiangolo/fastapi").expect("valid url");
        let first = estimate_git_metrics(&repo);
        assert_eq!(first, estimate_git_metrics(&repo));

        assert!((50..550).contains(&first.total_commits));
        assert!((5..25).contains(&first.recent_commits));
        assert!((40.0..70.0).contains(&first.avg_commit_message_length));
        assert!((1..11).contains(&first.unique_contributors));
        assert!((1..6).contains(&first.branches));
    }
}

use stackfall_core::protocol::LeaderboardEntry;

use crate::registry::Registry;

/// Top `n` sessions by score, highest first. Equal scores keep insertion
/// order. Computed fresh from the registry on every call.
pub fn top_n(registry: &Registry, n: usize) -> Vec<LeaderboardEntry> {
    let mut rows = registry.scores();
    rows.sort_by(|a, b| b.score.cmp(&a.score).then(a.seq.cmp(&b.seq)));
    rows.into_iter()
        .take(n)
        .map(|row| LeaderboardEntry {
            session_id: row.id,
            score: row.score,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use stackfall_core::PlayerState;

    fn registry_with(scores: &[(u64, u64)]) -> Registry {
        let registry = Registry::new();
        for &(id, score) in scores {
            let mut player = PlayerState::new(id);
            player.score = score;
            registry.put(player, None);
        }
        registry
    }

    #[test]
    fn returns_ten_highest_of_fifteen() {
        let scores: Vec<_> = (1..=15).map(|id| (id, id * 100)).collect();
        let registry = registry_with(&scores);

        let top = top_n(&registry, 10);
        assert_eq!(top.len(), 10);
        let got: Vec<_> = top.iter().map(|e| e.score).collect();
        let want: Vec<_> = (6..=15).rev().map(|s| s * 100).collect();
        assert_eq!(got, want);
        assert_eq!(top[0].session_id, 15);
    }

    #[test]
    fn ties_keep_insertion_order() {
        let registry = registry_with(&[(7, 300), (2, 300), (9, 500), (4, 300)]);
        let ids: Vec<_> = top_n(&registry, 10).iter().map(|e| e.session_id).collect();
        assert_eq!(ids, vec![9, 7, 2, 4]);
    }

    #[test]
    fn reflects_latest_scores() {
        let registry = registry_with(&[(1, 100), (2, 200)]);
        assert_eq!(top_n(&registry, 1)[0].session_id, 2);

        registry.get_mut(1).unwrap().player.score = 900;
        assert_eq!(top_n(&registry, 1)[0].session_id, 1);

        registry.remove(1);
        assert_eq!(top_n(&registry, 10).len(), 1);
    }

    #[test]
    fn empty_registry_gives_empty_board() {
        assert!(top_n(&Registry::new(), 10).is_empty());
    }
}

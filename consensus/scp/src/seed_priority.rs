//! Seed-based priority: a deterministic rotation over candidate nominators,
//! re-derived fresh for each slot from that slot's seed value (the hash of
//! the previous slot's externalized value). Grounded on
//! `consensus/seed_sort.go`.

use fbc_crypto::hash_string;

/// Sorts `input` by `hash_string(seed + item)`, ascending.
pub fn seed_sort(seed: &str, input: &[String]) -> Vec<String> {
    let mut sorted: Vec<String> = input.to_vec();
    sorted.sort_by_key(|item| hash_string(format!("{seed}{item}").as_bytes()));
    sorted
}

/// The index of `node` in `seed_sort(seed, input)`, or `None` if it is not
/// present. Nodes take turns proposing values in this order; a result of
/// `None` means the node is not a nomination candidate for this slot.
pub fn seed_priority(seed: &str, input: &[String], node: &str) -> Option<usize> {
    seed_sort(seed, input).iter().position(|n| n == node)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_sort_is_deterministic() {
        let input = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        assert_eq!(seed_sort("seed1", &input), seed_sort("seed1", &input));
    }

    #[test]
    fn different_seeds_can_produce_different_orders() {
        let input = vec!["a".to_string(), "b".to_string(), "c".to_string(), "d".to_string()];
        let order1 = seed_sort("seed-one", &input);
        let order2 = seed_sort("seed-two", &input);
        // Not a hard guarantee for every seed pair, but true for this
        // fixed pair and confirms the seed actually participates in the
        // sort key.
        assert_ne!(order1, order2);
    }

    #[test]
    fn priority_is_the_sorted_index() {
        let input = vec!["x".to_string(), "y".to_string(), "z".to_string()];
        let sorted = seed_sort("s", &input);
        for (i, node) in sorted.iter().enumerate() {
            assert_eq!(seed_priority("s", &input, node), Some(i));
        }
    }

    #[test]
    fn priority_is_none_for_absent_node() {
        let input = vec!["x".to_string(), "y".to_string()];
        assert_eq!(seed_priority("s", &input, "not-present"), None);
    }
}

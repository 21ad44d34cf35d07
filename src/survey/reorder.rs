//! Drag-and-drop reordering of survey items.

/// Move the element at `from` to `to`, shifting the elements in between.
///
/// Returns false and leaves `items` untouched when either index is out of
/// range, which is how a drop outside the list is reported.
pub fn reorder<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids() -> Vec<&'static str> {
        vec!["q1", "q2", "q3", "q4", "q5", "q6"]
    }

    #[test]
    fn test_move_down() {
        let mut items = ids();
        assert!(reorder(&mut items, 0, 3));
        assert_eq!(items, vec!["q2", "q3", "q4", "q1", "q5", "q6"]);
    }

    #[test]
    fn test_move_up() {
        let mut items = ids();
        assert!(reorder(&mut items, 5, 1));
        assert_eq!(items, vec!["q1", "q6", "q2", "q3", "q4", "q5"]);
    }

    #[test]
    fn test_invalid_target_is_ignored() {
        let mut items = ids();
        assert!(!reorder(&mut items, 2, 6));
        assert!(!reorder(&mut items, 9, 0));
        assert_eq!(items, ids());
    }

    #[test]
    fn test_reorder_is_permutation_and_invertible() {
        let original = ids();
        let n = original.len();
        for from in 0..n {
            for to in 0..n {
                let mut items = original.clone();
                assert!(reorder(&mut items, from, to));

                let mut sorted = items.clone();
                sorted.sort_unstable();
                assert_eq!(sorted, original);

                assert!(reorder(&mut items, to, from));
                assert_eq!(items, original);
            }
        }
    }
}

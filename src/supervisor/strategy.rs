//! Pure decision logic for which children a strategy restarts together.

use crate::supervisor::SupervisionStrategy;

/// Given the child that failed (by its spec-order index) and the total
/// child count, returns every index that must be torn down and restarted
/// together under `strategy`. Always includes `failed_index`.
pub(crate) fn affected_indices(
    strategy: SupervisionStrategy,
    failed_index: usize,
    child_count: usize,
) -> Vec<usize> {
    match strategy {
        SupervisionStrategy::OneForOne => vec![failed_index],
        SupervisionStrategy::OneForAll => (0..child_count).collect(),
        SupervisionStrategy::RestForOne => (failed_index..child_count).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_for_one_restarts_only_the_failed_child() {
        assert_eq!(affected_indices(SupervisionStrategy::OneForOne, 2, 5), vec![2]);
    }

    #[test]
    fn one_for_all_restarts_every_child() {
        assert_eq!(
            affected_indices(SupervisionStrategy::OneForAll, 2, 5),
            vec![0, 1, 2, 3, 4]
        );
    }

    #[test]
    fn rest_for_one_restarts_failed_and_later_children() {
        assert_eq!(
            affected_indices(SupervisionStrategy::RestForOne, 2, 5),
            vec![2, 3, 4]
        );
    }

    #[test]
    fn rest_for_one_on_the_last_child_restarts_only_it() {
        assert_eq!(
            affected_indices(SupervisionStrategy::RestForOne, 4, 5),
            vec![4]
        );
    }
}

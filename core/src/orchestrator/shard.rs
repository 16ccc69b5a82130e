use std::collections::HashSet;

use crate::error::OrchestratorError;
use crate::orchestrator::types::Task;

/// Split a task batch into bounded-size shards.
///
/// Deterministic and side-effect-free: shards preserve the relative
/// submission order of the batch, except that tasks inside a shard are
/// reordered by descending priority (stable, so ties keep submission order).
/// An empty batch yields zero shards; rejecting it outright is left to the
/// controller so library callers can decide.
///
/// Fails on duplicate task IDs, which would otherwise corrupt the aggregate.
pub fn build_shards(tasks: &[Task], shard_size: usize) -> Result<Vec<Vec<Task>>, OrchestratorError> {
    let mut seen = HashSet::with_capacity(tasks.len());
    for task in tasks {
        if !seen.insert(task.id.as_str()) {
            return Err(OrchestratorError::DuplicateTaskId(task.id.clone()));
        }
    }

    let size = shard_size.max(1);
    let shards = tasks
        .chunks(size)
        .map(|chunk| {
            let mut shard = chunk.to_vec();
            shard.sort_by_key(|t| std::cmp::Reverse(t.priority));
            shard
        })
        .collect();

    Ok(shards)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: &str) -> Task {
        Task::new(id, serde_json::Value::Null)
    }

    #[test]
    fn empty_batch_yields_zero_shards() {
        let shards = build_shards(&[], 10).unwrap();
        assert!(shards.is_empty());
    }

    #[test]
    fn shards_are_bounded_and_ordered() {
        let tasks: Vec<Task> = (0..7).map(|i| task(&format!("t{i}"))).collect();
        let shards = build_shards(&tasks, 3).unwrap();

        assert_eq!(shards.len(), 3);
        assert_eq!(shards[0].len(), 3);
        assert_eq!(shards[1].len(), 3);
        assert_eq!(shards[2].len(), 1);

        let flattened: Vec<&str> = shards
            .iter()
            .flatten()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(flattened, vec!["t0", "t1", "t2", "t3", "t4", "t5", "t6"]);
    }

    #[test]
    fn priority_reorders_within_shard_only() {
        let tasks = vec![
            task("a"),
            task("b").with_priority(5),
            task("c"),
            task("d").with_priority(5),
        ];
        let shards = build_shards(&tasks, 10).unwrap();

        let ids: Vec<&str> = shards[0].iter().map(|t| t.id.as_str()).collect();
        // Stable sort: b and d keep their relative order.
        assert_eq!(ids, vec!["b", "d", "a", "c"]);
    }

    #[test]
    fn duplicate_task_id_is_rejected() {
        let tasks = vec![task("x"), task("y"), task("x")];
        let err = build_shards(&tasks, 10).unwrap_err();
        assert!(matches!(err, OrchestratorError::DuplicateTaskId(id) if id == "x"));
    }

    #[test]
    fn zero_shard_size_is_clamped() {
        let tasks = vec![task("a"), task("b")];
        let shards = build_shards(&tasks, 0).unwrap();
        assert_eq!(shards.len(), 2);
    }
}

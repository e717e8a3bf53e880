use std::collections::HashMap;

use crate::models::TaskId;

/// Would adding `task_id -> depends_on_id` close a cycle?
///
/// `existing` are `(task_id, depends_on_id)` pairs. The new edge closes a
/// cycle exactly when `task_id` is already reachable from `depends_on_id`.
/// Returns that cycle starting at `task_id`, or `None`. Cycles elsewhere in
/// `existing` are not reported.
pub fn would_create_cycle(
    existing: &[(TaskId, TaskId)],
    task_id: TaskId,
    depends_on_id: TaskId,
) -> Option<Vec<TaskId>> {
    if task_id == depends_on_id {
        return Some(vec![task_id]);
    }
    let mut adj: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
    for &(from, to) in existing {
        adj.entry(from).or_default().push(to);
    }

    // Depth-first from the prerequisite, remembering how each node was reached.
    let mut parent: HashMap<TaskId, TaskId> = HashMap::new();
    let mut stack = vec![depends_on_id];
    while let Some(node) = stack.pop() {
        for &next in adj.get(&node).map(Vec::as_slice).unwrap_or_default() {
            if next == task_id {
                return Some(cycle_path(&parent, task_id, depends_on_id, node));
            }
            if next != depends_on_id && !parent.contains_key(&next) {
                parent.insert(next, node);
                stack.push(next);
            }
        }
    }
    None
}

fn cycle_path(
    parent: &HashMap<TaskId, TaskId>,
    task_id: TaskId,
    depends_on_id: TaskId,
    last: TaskId,
) -> Vec<TaskId> {
    let mut back = vec![last];
    let mut node = last;
    while node != depends_on_id {
        match parent.get(&node) {
            Some(&p) => {
                back.push(p);
                node = p;
            }
            None => break,
        }
    }
    back.push(task_id);
    back.reverse();
    back
}

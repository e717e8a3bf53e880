use crate::error::{Result, WorktaskError};
use crate::models::{ChecklistItem, ChecklistOrder};

/// Move the item at `from` to `to` (remove then insert, not a swap) and
/// renumber every item's `order` to its 0-based position.
///
/// Out-of-range indices are rejected. `from == to` still renumbers, which
/// leaves an already-dense list unchanged.
pub fn move_item(items: &[ChecklistItem], from: usize, to: usize) -> Result<Vec<ChecklistItem>> {
    let len = items.len();
    if from >= len || to >= len {
        return Err(WorktaskError::validation(format!(
            "Checklist position out of range: {from} -> {to} (have {len} items)"
        )));
    }

    let mut moved = items.to_vec();
    let item = moved.remove(from);
    moved.insert(to, item);
    for (position, item) in moved.iter_mut().enumerate() {
        item.order = position as i64;
    }
    Ok(moved)
}

/// The batch payload that persists an ordering.
pub fn order_updates(items: &[ChecklistItem]) -> Vec<ChecklistOrder> {
    items
        .iter()
        .map(|i| ChecklistOrder {
            id: i.id,
            order: i.order,
        })
        .collect()
}

/// Sort a checklist by `order`, breaking ties by id.
pub fn sort_by_order(items: &mut [ChecklistItem]) {
    items.sort_by_key(|i| (i.order, i.id));
}

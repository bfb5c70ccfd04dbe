//! Array-move helpers shared by every reorderable list.

/// Move the element at `from` so that it ends up at index `to`.
///
/// Out-of-range indices and `from == to` leave the list untouched. Returns
/// `true` when the list changed.
pub fn array_move<T>(items: &mut Vec<T>, from: usize, to: usize) -> bool {
    if from == to || from >= items.len() || to >= items.len() {
        return false;
    }
    let item = items.remove(from);
    items.insert(to, item);
    true
}

/// Move the element matching `moved` to the slot currently held by the
/// element matching `target`.
///
/// No-op when the keys are equal or either one is missing.
pub fn move_by_key<T, K, F>(items: &mut Vec<T>, moved: &K, target: &K, key: F) -> bool
where
    K: PartialEq + ?Sized,
    F: Fn(&T) -> &K,
{
    if moved == target {
        return false;
    }
    let from = items.iter().position(|item| key(item) == moved);
    let to = items.iter().position(|item| key(item) == target);
    match (from, to) {
        (Some(from), Some(to)) => array_move(items, from, to),
        _ => false,
    }
}

//! Selection recomputation after a removal.
//!
//! Pure functions over the registry's entry sequence; all locking and
//! notification is the caller's business.

use browser_state_core::SessionId;

use crate::registry::SessionEntry;

/// Recompute the selection after removing the entry at `removed_index`.
///
/// `entries` is the sequence *after* the removal; `selected_index` is the
/// selection *before* it. Returns the new selection.
///
/// Panics if `select_parent` was requested and the removed session's
/// recorded parent no longer resolves to any entry - a recorded parent id
/// must always be valid, so this is a registry bug rather than a
/// recoverable condition.
pub(crate) fn recompute_selection(
    entries: &[SessionEntry],
    selected_index: Option<usize>,
    removed_index: usize,
    select_parent: bool,
    removed_private: bool,
    removed_parent_id: Option<&SessionId>,
) -> Option<usize> {
    if entries.is_empty() {
        return None;
    }

    let selected = selected_index?;

    let candidate = if removed_index == selected {
        new_selection(
            entries,
            removed_index,
            select_parent,
            removed_private,
            removed_parent_id,
        )
    } else if removed_index < selected {
        // An earlier removal shifts all later indices down
        Some(selected - 1)
    } else if selected == entries.len() {
        // The selection pointed at the old last element
        Some(selected - 1)
    } else {
        Some(selected)
    };

    // A custom tab must not end up selected by recomputation
    match candidate {
        Some(index) if entries[index].session.is_custom_tab() => {
            let start = if select_parent { removed_index } else { index };
            nearby_index(entries, start, |entry| !entry.session.is_custom_tab())
        }
        other => other,
    }
}

/// Pick a replacement for a removed selected entry.
fn new_selection(
    entries: &[SessionEntry],
    removed_index: usize,
    select_parent: bool,
    removed_private: bool,
    removed_parent_id: Option<&SessionId>,
) -> Option<usize> {
    if select_parent {
        if let Some(parent_id) = removed_parent_id {
            let index = entries
                .iter()
                .position(|entry| entry.session.id() == parent_id)
                .unwrap_or_else(|| {
                    panic!(
                        "data integrity violation: parent session {parent_id} \
                         referenced by removed session does not exist"
                    )
                });
            return Some(index);
        }
    }

    // Find the nearest session with the same privacy mode
    let nearby = nearby_index(entries, removed_index, |entry| {
        entry.session.is_private() == removed_private
    });

    // If there is no other private session to select, prefer the newest
    // non-private one over leaving the registry unselected
    match nearby {
        None if removed_private => Some(entries.len() - 1),
        other => other,
    }
}

/// Outward search from `index` for the first entry satisfying `predicate`.
///
/// Checks `index` itself, then offsets 1, 2, ... up to the larger distance
/// to either boundary, probing `index - offset` before `index + offset` at
/// each step.
fn nearby_index(
    entries: &[SessionEntry],
    index: usize,
    predicate: impl Fn(&SessionEntry) -> bool,
) -> Option<usize> {
    if index < entries.len() && predicate(&entries[index]) {
        return Some(index);
    }

    let last = entries.len() as isize - 1;
    let start = index as isize;
    let max_offset = std::cmp::max(last - start, start);

    for offset in 1..=max_offset {
        for candidate in [start - offset, start + offset] {
            if (0..=last).contains(&candidate) {
                let candidate = candidate as usize;
                if predicate(&entries[candidate]) {
                    return Some(candidate);
                }
            }
        }
    }

    None
}

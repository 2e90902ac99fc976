/// Tags of the children that get a slot this layout pass, in slot order.
///
/// The full tag sequence is rotated so `current_index` comes first, then the middle element is
/// dropped until `num_slots` remain. Removing at `len / 2` biases even-length removals to the
/// right of center, which keeps the visible set stable while the carousel turns.
pub fn visible_order(current_index: usize, num_slots: usize, total_children: usize) -> Vec<usize> {
    if total_children == 0 {
        return Vec::new();
    }

    let mut tags: Vec<usize> = (0..total_children).collect();
    tags.rotate_left(current_index % total_children);

    while tags.len() > num_slots {
        tags.remove(tags.len() / 2);
    }

    tags
}

/// Slot index of `tag` within a visible order, if it has one.
pub fn slot_of(order: &[usize], tag: usize) -> Option<usize> {
    order.iter().position(|&t| t == tag)
}

//! Bento grid: card ordering, sizing and packing into rows.
//!
//! Cards flow left to right over a 12-column grid, wrapping when the next card
//! does not fit. A row is as tall as its tallest card.

use crate::domain::{CardStyle, DashboardLayout};

/// Where a card lands, in cells relative to the top of the scrollable body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub id: String,
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

/// Card ids sorted by `order` (id breaks ties).
pub fn ordered_ids(layout: &DashboardLayout) -> Vec<String> {
    let mut ids: Vec<(&String, &CardStyle)> = layout.iter().collect();
    ids.sort_by(|a, b| (a.1.order, a.0).cmp(&(b.1.order, b.0)));
    ids.into_iter().map(|(id, _)| id.clone()).collect()
}

/// Keep only `ids`, append any that are missing, and renumber orders 0..n.
pub fn reconcile(stored: Option<DashboardLayout>, ids: &[&str], fallback: &DashboardLayout) -> DashboardLayout {
    let mut layout: DashboardLayout = stored
        .unwrap_or_default()
        .into_iter()
        .filter(|(id, _)| ids.contains(&id.as_str()))
        .collect();
    let next = layout.values().map(|s| s.order + 1).max().unwrap_or(0);
    let mut offset = 0;
    for id in ids {
        if layout.contains_key(*id) {
            continue;
        }
        let style = fallback.get(*id).copied().unwrap_or(CardStyle {
            order: 0,
            span: CardStyle::GRID_COLUMNS / 2,
            height: 14,
        });
        layout.insert(id.to_string(), CardStyle { order: next + offset, ..style });
        offset += 1;
    }
    renumber(&mut layout);
    layout
}

fn renumber(layout: &mut DashboardLayout) {
    for (order, id) in ordered_ids(layout).into_iter().enumerate() {
        if let Some(style) = layout.get_mut(&id) {
            style.order = order;
        }
    }
}

/// Swap a card with its neighbour (`delta` = -1 earlier, +1 later).
/// Returns false when the card is already at that edge.
pub fn move_card(layout: &mut DashboardLayout, id: &str, delta: isize) -> bool {
    let ids = ordered_ids(layout);
    let Some(pos) = ids.iter().position(|c| c == id) else {
        return false;
    };
    let Some(target) = pos.checked_add_signed(delta).filter(|t| *t < ids.len()) else {
        return false;
    };
    let (a, b) = (layout[&ids[pos]].order, layout[&ids[target]].order);
    if let Some(s) = layout.get_mut(&ids[pos]) {
        s.order = b;
    }
    if let Some(s) = layout.get_mut(&ids[target]) {
        s.order = a;
    }
    true
}

/// Grow or shrink a card, clamped to the grid and the minimum card size.
/// Returns false when nothing changed.
pub fn resize_card(layout: &mut DashboardLayout, id: &str, d_span: i16, d_height: i16) -> bool {
    let Some(style) = layout.get_mut(id) else {
        return false;
    };
    let resized = CardStyle {
        order: style.order,
        span: style.span.saturating_add_signed(d_span),
        height: style.height.saturating_add_signed(d_height),
    }
    .clamped();
    let changed = resized != *style;
    *style = resized;
    changed
}

/// Pack cards into rows for a body `width` cells wide.
///
/// Returns the placements and the total content height.
pub fn pack(layout: &DashboardLayout, width: u16) -> (Vec<Placement>, u16) {
    let columns = CardStyle::GRID_COLUMNS;
    let col_x = |col: u16| (u32::from(width) * u32::from(col) / u32::from(columns)) as u16;

    let mut out = Vec::with_capacity(layout.len());
    let (mut col, mut y, mut row_h) = (0u16, 0u16, 0u16);
    for id in ordered_ids(layout) {
        let style = layout[&id].clamped();
        if col + style.span > columns {
            y = y.saturating_add(row_h);
            col = 0;
            row_h = 0;
        }
        let x = col_x(col);
        out.push(Placement {
            id,
            x,
            y,
            width: col_x(col + style.span) - x,
            height: style.height,
        });
        col += style.span;
        row_h = row_h.max(style.height);
    }
    (out, y.saturating_add(row_h))
}

//! Fill and tooltip placement rules for the map surface.
//!
//! Everything here is a pure function of the active mode, membership and
//! hover state so the drawing code in `ui` only maps results to cells.

use ratatui::layout::Rect;
use ratatui::style::Color;

use crate::controller::ViewMode;

/// Which colour family a shape belongs to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tone {
    /// Entity exists in the database
    Present,
    /// Entity missing from the database
    Absent,
    /// The United States in the world view, inviting the drill-down click
    Invite,
}

/// Resolved fill for one shape
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fill {
    pub tone: Tone,
    pub hovered: bool,
}

/// Pick the fill for a shape. `drill_target` marks the United States shape;
/// it keeps its own colours in the world view whatever its membership.
pub fn classify(mode: ViewMode, present: bool, drill_target: bool, hovered: bool) -> Fill {
    let tone = if mode == ViewMode::World && drill_target {
        Tone::Invite
    } else if present {
        Tone::Present
    } else {
        Tone::Absent
    };
    Fill { tone, hovered }
}

/// Background behind the shapes
pub const OCEAN: Color = Color::Rgb(0xEE, 0xF6, 0xFA);
/// Shape outline stroke
pub const STROKE: Color = Color::Rgb(0xFF, 0xFF, 0xFF);
/// Tooltip label colours
pub const TOOLTIP_BG: Color = Color::Rgb(0x0B, 0x33, 0x45);
pub const TOOLTIP_FG: Color = Color::Rgb(0xFF, 0xFF, 0xFF);

/// Map a fill to its colour in the given mode
pub fn color(mode: ViewMode, fill: Fill) -> Color {
    let (normal, hover) = match (mode, fill.tone) {
        (ViewMode::World, Tone::Present) => ((0x24, 0x78, 0xA0), (0x0B, 0x33, 0x45)),
        (ViewMode::World, Tone::Absent) => ((0xE8, 0xD9, 0xC0), (0xD4, 0xBF, 0x9A)),
        (ViewMode::World, Tone::Invite) | (ViewMode::Us, Tone::Invite) => {
            ((0x14, 0x50, 0x6E), (0x0A, 0x2F, 0x42))
        }
        (ViewMode::Us, Tone::Present) => ((0x3D, 0x7A, 0x50), (0x2A, 0x57, 0x38)),
        (ViewMode::Us, Tone::Absent) => ((0xD4, 0xE8, 0xD9), (0xB0, 0x94, 0x68)),
    };
    let (r, g, b) = if fill.hovered { hover } else { normal };
    Color::Rgb(r, g, b)
}

/// Top-left cell of the tooltip label: two columns right of and one row
/// above the pointer, pulled back inside `area` when it would overflow.
pub fn tooltip_anchor(pointer: (u16, u16), label_width: u16, area: Rect) -> (u16, u16) {
    let (col, row) = pointer;
    let right = area.x + area.width;
    let bottom = area.y + area.height;

    let mut x = col.saturating_add(2);
    if x.saturating_add(label_width) > right {
        x = right.saturating_sub(label_width).max(area.x);
    }
    let y = if row > area.y { row - 1 } else { (row + 1).min(bottom.saturating_sub(1)) };
    (x.max(area.x), y.max(area.y))
}

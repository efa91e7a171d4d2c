//! Maps the terminal area onto tile and button rectangles.

use ratatui::layout::{Constraint, Direction, Layout, Rect as Area};
use unicode_width::UnicodeWidthStr;

use crate::geometry::{BoardGeometry, Point, Rect};
use crate::view::EXIT_LABEL;

pub const HEADER_LINES: u16 = 2;
pub const FOOTER_LINES: u16 = 4;
const BUTTON_PADDING: u16 = 4;

/// Areas of the game screen: header (title, score), board, exit button row.
pub fn chunks(area: Area) -> [Area; 3] {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(HEADER_LINES),
            Constraint::Min(1),
            Constraint::Length(FOOTER_LINES),
        ])
        .split(area);
    [parts[0], parts[1], parts[2]]
}

/// Tile placement for a `columns` x `rows` board centred in `area`.
///
/// Tiles are kept about twice as wide as tall so they look square in a
/// terminal. A one-cell gap separates tiles when there is room for it.
pub fn board_geometry(area: Area, columns: usize, rows: usize) -> BoardGeometry {
    let [_, board, footer] = chunks(area);
    let cols = u32::try_from(columns.max(1)).unwrap_or(u32::MAX);
    let rws = u32::try_from(rows.max(1)).unwrap_or(u32::MAX);
    let (width, height) = (u32::from(board.width), u32::from(board.height));

    let gap_x = u32::from(width >= cols.saturating_mul(3));
    let gap_y = u32::from(height >= rws.saturating_mul(2));
    let fit_w = ((width + gap_x) / cols).saturating_sub(gap_x).max(1);
    let fit_h = ((height + gap_y) / rws).saturating_sub(gap_y).max(1);
    let tile_h = fit_h.min((fit_w / 2).max(1));
    let tile_w = fit_w.min(tile_h * 2);

    let used_w = cols
        .saturating_mul(tile_w)
        .saturating_add((cols - 1).saturating_mul(gap_x));
    let used_h = rws
        .saturating_mul(tile_h)
        .saturating_add((rws - 1).saturating_mul(gap_y));
    let origin = Point::new(
        clamp_u16(u32::from(board.x) + width.saturating_sub(used_w) / 2),
        clamp_u16(u32::from(board.y) + height.saturating_sub(used_h) / 2),
    );

    BoardGeometry::uniform(
        columns,
        rows,
        origin,
        (clamp_u16(tile_w), clamp_u16(tile_h)),
        (clamp_u16(gap_x), clamp_u16(gap_y)),
        exit_button(footer),
    )
}

fn clamp_u16(v: u32) -> u16 {
    u16::try_from(v).unwrap_or(u16::MAX)
}

fn exit_button(footer: Area) -> Rect {
    let width = (EXIT_LABEL.width() as u16 + BUTTON_PADDING + 2).min(footer.width);
    let height = 3.min(footer.height);
    Rect::new(
        footer.x + footer.width.saturating_sub(width) / 2,
        footer.y,
        width,
        height,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Position;

    #[test]
    fn tiles_fit_inside_board_area() {
        let area = Area::new(0, 0, 80, 30);
        let geo = board_geometry(area, 5, 5);
        let [_, board, _] = chunks(area);
        for c in 0..5 {
            for r in 0..5 {
                let t = geo.tile(Position::new(c, r));
                assert!(!t.is_empty());
                assert!(t.x >= board.x && t.x + t.width <= board.x + board.width);
                assert!(t.y >= board.y && t.y + t.height <= board.y + board.height);
            }
        }
    }

    #[test]
    fn tiles_do_not_overlap() {
        let geo = board_geometry(Area::new(0, 0, 100, 40), 5, 5);
        let a = geo.tile(Position::new(0, 0));
        let right = geo.tile(Position::new(1, 0));
        let below = geo.tile(Position::new(0, 1));
        assert!(a.x + a.width <= right.x);
        assert!(a.y + a.height <= below.y);
        assert!(!a.contains(right.center()));
    }

    #[test]
    fn exit_button_sits_below_board() {
        let area = Area::new(0, 0, 80, 30);
        let geo = board_geometry(area, 5, 5);
        let last = geo.tile(Position::new(4, 4));
        assert!(geo.exit_button.y >= last.y + last.height);
        assert!(geo.exit_button.width as usize >= EXIT_LABEL.len());
        assert_eq!(geo.exit_button.height, 3);
    }

    #[test]
    fn oversized_grid_does_not_overflow() {
        let geo = board_geometry(Area::new(0, 0, 80, 30), 30000, 5);
        assert_eq!(geo.columns(), 30000);
        let last = geo.tile(Position::new(29999, 4));
        assert!(!last.is_empty());
        assert_eq!(last.x, 29999);
    }

    #[test]
    fn tiny_terminal_still_yields_tiles() {
        let geo = board_geometry(Area::new(0, 0, 6, 8), 5, 5);
        assert_eq!(geo.columns(), 5);
        assert!(!geo.tile(Position::new(4, 4)).is_empty());
    }
}

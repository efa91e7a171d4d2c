pub mod dialog;
pub mod layout;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::Span,
    widgets::{Block, Borders, Paragraph, Widget},
};
use unicode_width::UnicodeWidthStr;

use crate::geometry;
use crate::view::{SessionView, TileView, FIXATION_DOT_RGB};

const FIXATION_DOT: &str = "●";
const LEGEND: &str = "(esc) quit";

fn rgb((r, g, b): (u8, u8, u8)) -> Color {
    Color::Rgb(r, g, b)
}

/// Clips a board rectangle to the drawable area.
fn to_area(r: geometry::Rect, area: Rect) -> Rect {
    Rect::new(r.x, r.y, r.width, r.height).intersection(area)
}

impl Widget for &SessionView {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let bold_style = Style::default().add_modifier(Modifier::BOLD);
        let [header, _, footer] = layout::chunks(area);

        if header.height > 0 {
            let title_row = Rect::new(header.x, header.y, header.width, 1);
            Paragraph::new(Span::styled(self.title, bold_style))
                .alignment(Alignment::Center)
                .render(title_row, buf);

            let score = self.score_text();
            Paragraph::new(Span::styled(score, bold_style)).render(title_row, buf);

            let round = format!("Round {}", self.round);
            Paragraph::new(Span::styled(round, Style::default().add_modifier(Modifier::DIM)))
                .alignment(Alignment::Right)
                .render(title_row, buf);
        }

        for tile in &self.tiles {
            render_tile(tile, area, buf);
        }

        let button = to_area(self.exit_button.bounds, area);
        if !button.is_empty() {
            let color = rgb(self.exit_button.rgb());
            let style = Style::default().bg(color).fg(Color::Black);
            let label = Paragraph::new(Span::styled(self.exit_button.label, bold_style))
                .alignment(Alignment::Center)
                .style(style);
            if button.height >= 3 {
                label
                    .block(Block::default().borders(Borders::ALL).style(style))
                    .render(button, buf);
            } else {
                label.render(button, buf);
            }
        }

        if footer.height > 0 && LEGEND.width() as u16 <= footer.width {
            let legend_row = Rect::new(footer.x, footer.y + footer.height - 1, footer.width, 1);
            Paragraph::new(Span::styled(
                LEGEND,
                Style::default().add_modifier(Modifier::ITALIC),
            ))
            .render(legend_row, buf);
        }
    }
}

fn render_tile(tile: &TileView, area: Rect, buf: &mut Buffer) {
    let bounds = to_area(tile.bounds, area);
    if bounds.is_empty() {
        return;
    }
    buf.set_style(bounds, Style::default().bg(rgb(tile.color.rgb())));

    if tile.fixation_dot {
        let centre = tile.bounds.center();
        if bounds.contains(ratatui::layout::Position::new(centre.x, centre.y)) {
            if let Some(cell) = buf.cell_mut((centre.x, centre.y)) {
                cell.set_symbol(FIXATION_DOT);
                cell.set_fg(rgb(FIXATION_DOT_RGB));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::RevealColor;
    use crate::geometry::Position;
    use crate::session::Phase;
    use crate::shape::ShapeColor;
    use crate::view::{ExitButtonView, TileColor, EXIT_LABEL, TILE_RGB, TITLE};

    fn view(tiles: Vec<TileView>) -> SessionView {
        SessionView {
            title: TITLE,
            score: 3,
            round: 2,
            phase: Phase::Playing,
            gated: false,
            tiles,
            exit_button: ExitButtonView {
                bounds: geometry::Rect::new(30, 26, 17, 3),
                hovered: false,
                label: EXIT_LABEL,
            },
        }
    }

    fn tile(column: usize, row: usize, color: TileColor, dot: bool) -> TileView {
        TileView {
            position: Position::new(column, row),
            bounds: geometry::Rect::new(10 + column as u16 * 9, 3 + row as u16 * 5, 8, 4),
            color,
            fixation_dot: dot,
        }
    }

    fn rendered(buf: &Buffer) -> String {
        buf.content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn renders_header_and_exit_button() {
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        (&view(vec![])).render(area, &mut buf);
        let text = rendered(&buf);
        assert!(text.contains("Battleship"));
        assert!(text.contains("Score: 3"));
        assert!(text.contains("Round 2"));
        assert!(text.contains("Finish Game"));
        assert!(text.contains("(esc) quit"));
    }

    #[test]
    fn tiles_are_filled_with_their_colour() {
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        let tiles = vec![
            tile(0, 0, TileColor::Unrevealed, true),
            tile(1, 0, TileColor::Revealed(RevealColor::Shape(ShapeColor::Red)), false),
        ];
        (&view(tiles)).render(area, &mut buf);

        assert_eq!(buf[(10, 3)].bg, rgb(TILE_RGB));
        assert_eq!(buf[(19, 3)].bg, Color::Rgb(255, 0, 0));
        // centre of the first tile carries the fixation dot
        assert_eq!(buf[(14, 5)].symbol(), FIXATION_DOT);
        assert_ne!(buf[(23, 5)].symbol(), FIXATION_DOT);
    }

    #[test]
    fn hovered_exit_button_changes_colour() {
        let area = Rect::new(0, 0, 80, 30);
        let mut buf = Buffer::empty(area);
        let mut v = view(vec![]);
        v.exit_button.hovered = true;
        (&v).render(area, &mut buf);
        assert_eq!(buf[(31, 27)].bg, Color::Rgb(192, 192, 192));
    }

    #[test]
    fn tiles_outside_area_are_clipped() {
        let area = Rect::new(0, 0, 12, 6);
        let mut buf = Buffer::empty(area);
        let tiles = vec![tile(4, 4, TileColor::Hover, true)];
        (&view(tiles)).render(area, &mut buf);
        assert_eq!(*buf.area(), area);
    }
}

use crate::clock::elapsed_since;
use crate::geometry::{BoardGeometry, Point, Position, Rect};
use crate::shape::{Shape, ShapeColor};
use itertools::Itertools;
use std::time::{Duration, Instant};

/// Color a tile shows once selected
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RevealColor {
    Shape(ShapeColor),
    Empty,
}

/// Per-tile dwell state machine
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DwellState {
    Idle,
    Hovering(Instant),
    Selected,
}

/// A completed dwell on one tile
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Selection {
    pub position: Position,
    pub correct: bool,
    pub dwell_start: Instant,
    pub dwell_end: Instant,
}

#[derive(Clone, Debug)]
pub struct Tile {
    pub position: Position,
    pub bounds: Rect,
    is_target: bool,
    reveal: RevealColor,
    state: DwellState,
}

impl Tile {
    pub fn new(position: Position, bounds: Rect, is_target: bool, reveal: RevealColor) -> Self {
        Self {
            position,
            bounds,
            is_target,
            reveal,
            state: DwellState::Idle,
        }
    }

    pub fn is_target(&self) -> bool {
        self.is_target
    }

    pub fn is_selected(&self) -> bool {
        self.state == DwellState::Selected
    }

    pub fn is_hovered(&self) -> bool {
        matches!(self.state, DwellState::Hovering(_))
    }

    pub fn state(&self) -> DwellState {
        self.state
    }

    pub fn reveal_color(&self) -> RevealColor {
        self.reveal
    }

    /// Advances the dwell timer for one tick. Returns the selection when the
    /// pointer has rested on this tile for `threshold`.
    fn dwell(&mut self, pointer: Option<Point>, now: Instant, threshold: Duration) -> Option<Selection> {
        let inside = pointer.is_some_and(|p| self.bounds.contains(p));
        match (self.state, inside) {
            (DwellState::Selected, _) => None,
            (DwellState::Idle, true) => {
                self.state = DwellState::Hovering(now);
                // a zero threshold is rejected at config time, so entering never selects
                None
            }
            (DwellState::Hovering(start), true) => {
                if elapsed_since(start, now) >= threshold {
                    self.state = DwellState::Selected;
                    Some(Selection {
                        position: self.position,
                        correct: self.is_target,
                        dwell_start: start,
                        dwell_end: now,
                    })
                } else {
                    None
                }
            }
            (_, false) => {
                self.state = DwellState::Idle;
                None
            }
        }
    }

    fn reveal(&mut self) {
        self.state = DwellState::Selected;
    }
}

/// Round-local arena of tiles, rebuilt for every round.
#[derive(Clone, Debug)]
pub struct Board {
    tiles: Vec<Tile>,
    dwell_threshold: Duration,
}

impl Board {
    pub fn new(shape: &Shape, geometry: &BoardGeometry, dwell_threshold: Duration) -> Self {
        let tiles = (0..geometry.columns())
            .cartesian_product(0..geometry.rows())
            .map(|(column, row)| {
                let position = Position::new(column, row);
                let is_target = shape.contains(position);
                let reveal = if is_target {
                    RevealColor::Shape(shape.color)
                } else {
                    RevealColor::Empty
                };
                Tile::new(position, geometry.tile(position), is_target, reveal)
            })
            .collect();
        Self {
            tiles,
            dwell_threshold,
        }
    }

    /// Moves tiles to new bounds without touching their state.
    pub fn relayout(&mut self, geometry: &BoardGeometry) {
        for tile in &mut self.tiles {
            tile.bounds = geometry.tile(tile.position);
        }
    }

    /// Runs every unselected tile's dwell check. Tile bounds never overlap, so
    /// at most one tile can complete per call.
    pub fn update(&mut self, pointer: Option<Point>, now: Instant) -> Option<Selection> {
        let threshold = self.dwell_threshold;
        let mut completed = None;
        for tile in self.tiles.iter_mut().filter(|t| !t.is_selected()) {
            if let Some(sel) = tile.dwell(pointer, now, threshold) {
                completed = Some(sel);
            }
        }
        completed
    }

    pub fn all_targets_revealed(&self) -> bool {
        self.tiles
            .iter()
            .filter(|t| t.is_target)
            .all(|t| t.is_selected())
    }

    /// Marks every tile selected. Idempotent and produces no selections.
    pub fn reveal_all(&mut self) {
        for tile in &mut self.tiles {
            tile.reveal();
        }
    }

    pub fn any_selected(&self) -> bool {
        self.tiles.iter().any(|t| t.is_selected())
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, pos: Position) -> Option<&Tile> {
        self.tiles.iter().find(|t| t.position == pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeSet;

    const DWELL: Duration = Duration::from_millis(1200);

    fn square() -> Shape {
        Shape {
            cells: [(0, 0), (0, 1), (1, 0), (1, 1)]
                .into_iter()
                .map(Position::from)
                .collect::<BTreeSet<_>>(),
            color: ShapeColor::Blue,
            index: 5,
        }
    }

    fn geometry() -> BoardGeometry {
        BoardGeometry::uniform(5, 5, Point::new(0, 0), (4, 2), (1, 1), Rect::new(0, 20, 8, 1))
    }

    fn center(pos: (usize, usize)) -> Option<Point> {
        Some(geometry().tile(Position::from(pos)).center())
    }

    #[test]
    fn board_marks_shape_cells_as_targets() {
        let board = Board::new(&square(), &geometry(), DWELL);
        assert_eq!(board.tiles().len(), 25);
        let targets: Vec<Position> = board
            .tiles()
            .iter()
            .filter(|t| t.is_target())
            .map(|t| t.position)
            .collect();
        assert_eq!(targets.len(), 4);
        assert!(targets.iter().all(|p| square().contains(*p)));
        assert_eq!(
            board.tile(Position::new(0, 0)).unwrap().reveal_color(),
            RevealColor::Shape(ShapeColor::Blue)
        );
        assert_eq!(
            board.tile(Position::new(4, 4)).unwrap().reveal_color(),
            RevealColor::Empty
        );
    }

    #[test]
    fn dwelling_for_threshold_selects_tile() {
        let mut board = Board::new(&square(), &geometry(), DWELL);
        let t0 = Instant::now();
        assert_eq!(board.update(center((0, 0)), t0), None);
        assert_eq!(board.update(center((0, 0)), t0 + Duration::from_millis(1199)), None);

        let sel = board
            .update(center((0, 0)), t0 + DWELL)
            .expect("selection completes at the threshold");
        assert_eq!(sel.position, Position::new(0, 0));
        assert!(sel.correct);
        assert_eq!(sel.dwell_start, t0);
        assert_eq!(sel.dwell_end, t0 + DWELL);
        assert!(board.tile(Position::new(0, 0)).unwrap().is_selected());
    }

    #[test]
    fn leaving_tile_resets_dwell_timer() {
        let mut board = Board::new(&square(), &geometry(), DWELL);
        let t0 = Instant::now();
        board.update(center((3, 3)), t0);
        board.update(center((3, 3)), t0 + Duration::from_millis(600));
        // off the grid entirely
        board.update(Some(Point::new(200, 200)), t0 + Duration::from_millis(700));
        board.update(center((3, 3)), t0 + Duration::from_millis(800));

        assert_eq!(board.update(center((3, 3)), t0 + DWELL), None);
        let sel = board
            .update(center((3, 3)), t0 + Duration::from_millis(2000))
            .unwrap();
        assert!(!sel.correct);
        assert_eq!(sel.dwell_start, t0 + Duration::from_millis(800));
    }

    #[test]
    fn moving_between_tiles_keeps_one_hovering() {
        let mut board = Board::new(&square(), &geometry(), DWELL);
        let t0 = Instant::now();
        board.update(center((0, 0)), t0);
        board.update(center((2, 2)), t0 + Duration::from_millis(100));
        let hovering: Vec<_> = board.tiles().iter().filter(|t| t.is_hovered()).collect();
        assert_eq!(hovering.len(), 1);
        assert_eq!(hovering[0].position, Position::new(2, 2));
        assert_eq!(board.tile(Position::new(0, 0)).unwrap().state(), DwellState::Idle);
    }

    #[test]
    fn no_pointer_is_no_hover() {
        let mut board = Board::new(&square(), &geometry(), DWELL);
        let t0 = Instant::now();
        assert_eq!(board.update(None, t0), None);
        assert_eq!(board.update(None, t0 + DWELL * 3), None);
        assert!(board.tiles().iter().all(|t| t.state() == DwellState::Idle));
    }

    #[test]
    fn selected_tile_stays_selected() {
        let mut board = Board::new(&square(), &geometry(), DWELL);
        let t0 = Instant::now();
        board.update(center((1, 1)), t0);
        board.update(center((1, 1)), t0 + DWELL).unwrap();
        assert_eq!(board.update(center((1, 1)), t0 + DWELL * 3), None);
        board.update(None, t0 + DWELL * 4);
        assert!(board.tile(Position::new(1, 1)).unwrap().is_selected());
    }

    #[test]
    fn all_targets_revealed_and_reveal_all() {
        let mut board = Board::new(&square(), &geometry(), DWELL);
        let mut t = Instant::now();
        for pos in [(0, 0), (0, 1), (1, 0)] {
            board.update(center(pos), t);
            t += DWELL;
            assert!(board.update(center(pos), t).is_some());
        }
        assert!(board.any_selected());
        assert!(!board.all_targets_revealed());

        board.update(center((1, 1)), t);
        board.update(center((1, 1)), t + DWELL).unwrap();
        assert!(board.all_targets_revealed());

        board.reveal_all();
        board.reveal_all();
        assert!(board.tiles().iter().all(|t| t.is_selected()));
    }

    #[test]
    fn relayout_preserves_state() {
        let mut board = Board::new(&square(), &geometry(), DWELL);
        let t0 = Instant::now();
        board.update(center((0, 0)), t0);
        board.update(center((0, 0)), t0 + DWELL).unwrap();

        let moved = BoardGeometry::uniform(5, 5, Point::new(10, 10), (6, 3), (2, 1), Rect::default());
        board.relayout(&moved);
        let tile = board.tile(Position::new(0, 0)).unwrap();
        assert_eq!(tile.bounds, Rect::new(10, 10, 6, 3));
        assert!(tile.is_selected());
    }
}

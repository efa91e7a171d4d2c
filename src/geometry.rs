use serde::{Deserialize, Serialize};
use std::fmt;

/// Grid coordinate of a tile, 0-indexed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Position {
    pub column: usize,
    pub row: usize,
}

impl Position {
    pub const fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

impl From<(usize, usize)> for Position {
    fn from(v: (usize, usize)) -> Self {
        Position::new(v.0, v.1)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.column, self.row)
    }
}

/// Pointer location in terminal cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub const fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// Cell-space rectangle. Contains the cells `x..x+width` and `y..y+height`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: u16,
    pub y: u16,
    pub width: u16,
    pub height: u16,
}

impl Rect {
    pub const fn new(x: u16, y: u16, width: u16, height: u16) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, p: Point) -> bool {
        let (px, py) = (u32::from(p.x), u32::from(p.y));
        let (x, y) = (u32::from(self.x), u32::from(self.y));
        px >= x && px < x + u32::from(self.width) && py >= y && py < y + u32::from(self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(
            self.x.saturating_add(self.width / 2),
            self.y.saturating_add(self.height / 2),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Placement of every tile and of the exit button, decided by the presenter.
///
/// Tiles are stored column-major: index `column * rows + row`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardGeometry {
    columns: usize,
    rows: usize,
    tiles: Vec<Rect>,
    pub exit_button: Rect,
}

impl BoardGeometry {
    /// Evenly spaced tiles starting at `origin`, `gap` cells apart.
    pub fn uniform(
        columns: usize,
        rows: usize,
        origin: Point,
        tile: (u16, u16),
        gap: (u16, u16),
        exit_button: Rect,
    ) -> Self {
        let mut tiles = Vec::with_capacity(columns * rows);
        for column in 0..columns {
            for row in 0..rows {
                let x = origin.x as usize + column * (tile.0 as usize + gap.0 as usize);
                let y = origin.y as usize + row * (tile.1 as usize + gap.1 as usize);
                tiles.push(Rect::new(
                    x.min(u16::MAX as usize) as u16,
                    y.min(u16::MAX as usize) as u16,
                    tile.0,
                    tile.1,
                ));
            }
        }
        Self {
            columns,
            rows,
            tiles,
            exit_button,
        }
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Bounds of the tile at `pos`; an empty rect when outside the grid.
    pub fn tile(&self, pos: Position) -> Rect {
        if pos.column >= self.columns || pos.row >= self.rows {
            return Rect::default();
        }
        self.tiles
            .get(pos.column * self.rows + pos.row)
            .copied()
            .unwrap_or_default()
    }
}

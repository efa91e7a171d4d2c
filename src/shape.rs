use crate::config::ConfigError;
use crate::geometry::Position;
use rand::Rng;
use std::collections::BTreeSet;

/// Named reveal colors a shape can be drawn in
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, strum_macros::Display)]
pub enum ShapeColor {
    Red,
    Green,
    Purple,
    SeaGreen,
    Blue,
    Orange,
    PaleVioletRed,
    Gold,
    BlueViolet,
    DarkGoldenrod1,
    LightSalmon,
}

impl ShapeColor {
    pub const ALL: [ShapeColor; 11] = [
        ShapeColor::Red,
        ShapeColor::Green,
        ShapeColor::Purple,
        ShapeColor::SeaGreen,
        ShapeColor::Blue,
        ShapeColor::Orange,
        ShapeColor::PaleVioletRed,
        ShapeColor::Gold,
        ShapeColor::BlueViolet,
        ShapeColor::DarkGoldenrod1,
        ShapeColor::LightSalmon,
    ];

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            ShapeColor::Red => (255, 0, 0),
            ShapeColor::Green => (0, 255, 0),
            ShapeColor::Purple => (160, 32, 240),
            ShapeColor::SeaGreen => (46, 139, 87),
            ShapeColor::Blue => (0, 0, 255),
            ShapeColor::Orange => (255, 165, 0),
            ShapeColor::PaleVioletRed => (219, 112, 147),
            ShapeColor::Gold => (255, 215, 0),
            ShapeColor::BlueViolet => (138, 43, 226),
            ShapeColor::DarkGoldenrod1 => (255, 185, 15),
            ShapeColor::LightSalmon => (255, 160, 122),
        }
    }
}

/// The hidden shape for one round
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Shape {
    pub cells: BTreeSet<Position>,
    pub color: ShapeColor,
    /// 1-based position in the catalog, for reporting only
    pub index: usize,
}

impl Shape {
    pub fn contains(&self, pos: Position) -> bool {
        self.cells.contains(&pos)
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

#[derive(Clone, Debug)]
pub struct ShapeCatalog {
    shapes: Vec<BTreeSet<Position>>,
    colors: Vec<ShapeColor>,
}

impl ShapeCatalog {
    pub fn new(shapes: Vec<Vec<(usize, usize)>>, colors: Vec<ShapeColor>) -> Result<Self, ConfigError> {
        if shapes.is_empty() || shapes.iter().any(|s| s.is_empty()) {
            return Err(ConfigError::EmptyCatalog);
        }
        if colors.is_empty() {
            return Err(ConfigError::NoColors);
        }
        let shapes = shapes
            .into_iter()
            .map(|cells| cells.into_iter().map(Position::from).collect())
            .collect();
        Ok(Self { shapes, colors })
    }

    /// The five polyominoes of the task on a 5x5 grid, as (column, row).
    pub fn standard() -> Self {
        let shapes: Vec<Vec<(usize, usize)>> = vec![
            vec![(3, 0), (3, 1), (4, 1), (4, 2)],
            vec![(2, 2), (3, 2), (4, 2), (2, 3), (2, 4), (3, 4), (4, 4)],
            vec![(1, 3), (1, 4), (2, 3), (3, 3)],
            vec![(0, 1), (0, 2), (1, 2), (1, 3)],
            vec![(0, 0), (0, 1), (1, 0), (1, 1)],
        ];
        Self {
            shapes: shapes
                .into_iter()
                .map(|cells| cells.into_iter().map(Position::from).collect())
                .collect(),
            colors: ShapeColor::ALL.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Fails if any catalog cell falls outside a `columns x rows` grid.
    pub fn check_fits(&self, columns: usize, rows: usize) -> Result<(), ConfigError> {
        for (i, cells) in self.shapes.iter().enumerate() {
            if let Some(p) = cells.iter().find(|p| p.column >= columns || p.row >= rows) {
                return Err(ConfigError::ShapeOutOfBounds {
                    index: i + 1,
                    position: *p,
                    columns,
                    rows,
                });
            }
        }
        Ok(())
    }

    /// Shape and color are drawn independently and uniformly.
    pub fn draw<R: Rng>(&self, rng: &mut R) -> Shape {
        let shape_idx = rng.gen_range(0..self.shapes.len());
        let color = self.colors[rng.gen_range(0..self.colors.len())];
        Shape {
            cells: self.shapes[shape_idx].clone(),
            color,
            index: shape_idx + 1,
        }
    }
}

impl Default for ShapeCatalog {
    fn default() -> Self {
        Self::standard()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn standard_catalog_shapes_fit_5x5() {
        let catalog = ShapeCatalog::standard();
        assert_eq!(catalog.len(), 5);
        assert!(catalog.check_fits(5, 5).is_ok());
        for cells in &catalog.shapes {
            assert!((4..=7).contains(&cells.len()));
        }
    }

    #[test]
    fn standard_catalog_does_not_fit_smaller_grid() {
        let catalog = ShapeCatalog::standard();
        assert_matches!(
            catalog.check_fits(4, 5),
            Err(ConfigError::ShapeOutOfBounds { index: 1, .. })
        );
    }

    #[test]
    fn draw_covers_every_shape_and_reports_one_based_index() {
        let catalog = ShapeCatalog::standard();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = HashSet::new();
        let mut colors = HashSet::new();
        for _ in 0..500 {
            let shape = catalog.draw(&mut rng);
            assert!((1..=5).contains(&shape.index));
            assert_eq!(shape.cells, catalog.shapes[shape.index - 1]);
            seen.insert(shape.index);
            colors.insert(shape.color);
        }
        assert_eq!(seen.len(), 5);
        assert_eq!(colors.len(), ShapeColor::ALL.len());
    }

    #[test]
    fn empty_catalog_is_rejected() {
        assert_matches!(
            ShapeCatalog::new(vec![], vec![ShapeColor::Red]),
            Err(ConfigError::EmptyCatalog)
        );
        assert_matches!(
            ShapeCatalog::new(vec![vec![]], vec![ShapeColor::Red]),
            Err(ConfigError::EmptyCatalog)
        );
        assert_matches!(
            ShapeCatalog::new(vec![vec![(0, 0)]], vec![]),
            Err(ConfigError::NoColors)
        );
    }

    #[test]
    fn color_names_display() {
        assert_eq!(ShapeColor::SeaGreen.to_string(), "SeaGreen");
        assert_eq!(ShapeColor::DarkGoldenrod1.to_string(), "DarkGoldenrod1");
    }
}

//! Renderer-agnostic snapshot of what the presenter should draw this frame.

use crate::board::RevealColor;
use crate::geometry::{Position, Rect};
use crate::session::Phase;

pub const TITLE: &str = "Battleship";
pub const EXIT_LABEL: &str = "Finish Game";

pub const TILE_RGB: (u8, u8, u8) = (103, 77, 255);
pub const TILE_HOVER_RGB: (u8, u8, u8) = (159, 142, 255);
pub const EMPTY_RGB: (u8, u8, u8) = (255, 255, 255);
pub const FIXATION_DOT_RGB: (u8, u8, u8) = (52, 255, 33);
pub const EXIT_RGB: (u8, u8, u8) = (255, 255, 255);
pub const EXIT_HOVER_RGB: (u8, u8, u8) = (192, 192, 192);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TileColor {
    Unrevealed,
    Hover,
    Revealed(RevealColor),
}

impl TileColor {
    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            TileColor::Unrevealed => TILE_RGB,
            TileColor::Hover => TILE_HOVER_RGB,
            TileColor::Revealed(RevealColor::Empty) => EMPTY_RGB,
            TileColor::Revealed(RevealColor::Shape(c)) => c.rgb(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TileView {
    pub position: Position,
    pub bounds: Rect,
    pub color: TileColor,
    /// Centre marker shown on unselected tiles while input is accepted
    pub fixation_dot: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExitButtonView {
    pub bounds: Rect,
    pub hovered: bool,
    pub label: &'static str,
}

impl ExitButtonView {
    pub fn rgb(&self) -> (u8, u8, u8) {
        if self.hovered {
            EXIT_HOVER_RGB
        } else {
            EXIT_RGB
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SessionView {
    pub title: &'static str,
    pub score: u32,
    pub round: u32,
    pub phase: Phase,
    pub gated: bool,
    pub tiles: Vec<TileView>,
    pub exit_button: ExitButtonView,
}

impl SessionView {
    pub fn score_text(&self) -> String {
        format!("Score: {}", self.score)
    }
}

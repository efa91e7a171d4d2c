//! Blocking modal prompts drawn over the game screen.

use ratatui::{
    backend::Backend,
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
    Terminal,
};
use unicode_width::UnicodeWidthStr;

use crate::prompt::{PromptUnavailable, Prompter, INSTRUCTIONS, WELCOME_TITLE};
use crate::runtime::{GameEvent, GameEventSource, Runner, Ticker};

const MAX_WIDTH: u16 = 64;

/// A centred, bordered message box with a key hint on its last line
#[derive(Debug, Clone, Copy)]
pub struct Dialog<'a> {
    pub title: &'a str,
    pub body: &'a str,
    pub hint: &'a str,
}

impl Dialog<'_> {
    fn size(&self, area: Rect) -> (u16, u16) {
        let longest = self
            .body
            .lines()
            .chain([self.title, self.hint])
            .map(|l| l.width())
            .max()
            .unwrap_or(0) as u16;
        let width = (longest + 4).min(MAX_WIDTH).min(area.width);
        let inner = width.saturating_sub(2).max(1);
        let body_lines: u16 = self
            .body
            .lines()
            .map(|l| (l.width() as u16).div_ceil(inner).max(1))
            .sum();
        let height = (body_lines + 4).min(area.height);
        (width, height)
    }
}

impl Widget for Dialog<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let (width, height) = self.size(area);
        let rect = Rect::new(
            area.x + area.width.saturating_sub(width) / 2,
            area.y + area.height.saturating_sub(height) / 2,
            width,
            height,
        );
        Clear.render(rect, buf);

        let block = Block::default()
            .borders(Borders::ALL)
            .title(Span::styled(
                self.title,
                Style::default().add_modifier(Modifier::BOLD),
            ))
            .title_alignment(Alignment::Center);

        let mut lines: Vec<Line> = self.body.lines().map(Line::from).collect();
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(
            self.hint,
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )));

        Paragraph::new(lines)
            .block(block)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .render(rect, buf);
    }
}

/// Prompter that blocks on terminal input while showing a dialog.
///
/// A quit key pressed while a dialog is open declines the start prompt and
/// is remembered so the host can shut down.
pub struct TuiPrompter<'a, B: Backend, E: GameEventSource, T: Ticker> {
    terminal: &'a mut Terminal<B>,
    runner: &'a Runner<E, T>,
    quit_requested: bool,
}

impl<'a, B: Backend, E: GameEventSource, T: Ticker> TuiPrompter<'a, B, E, T> {
    pub fn new(terminal: &'a mut Terminal<B>, runner: &'a Runner<E, T>) -> Self {
        Self {
            terminal,
            runner,
            quit_requested: false,
        }
    }

    pub fn quit_requested(&self) -> bool {
        self.quit_requested
    }

    /// Shows `dialog` until a confirm, dismiss or quit arrives.
    fn ask(&mut self, dialog: Dialog) -> Result<GameEvent, PromptUnavailable> {
        loop {
            self.terminal
                .draw(|f| f.render_widget(dialog, f.area()))
                .map_err(|e| PromptUnavailable(e.to_string()))?;
            match self.runner.step() {
                ev @ (GameEvent::Confirm | GameEvent::Dismiss) => return Ok(ev),
                GameEvent::Quit => {
                    self.quit_requested = true;
                    return Ok(GameEvent::Quit);
                }
                GameEvent::Pointer(_) | GameEvent::Resize(..) | GameEvent::Tick => {}
            }
        }
    }
}

impl<B: Backend, E: GameEventSource, T: Ticker> Prompter for TuiPrompter<'_, B, E, T> {
    fn confirm_start(&mut self) -> Result<bool, PromptUnavailable> {
        let answer = self.ask(Dialog {
            title: WELCOME_TITLE,
            body: "Would you like to start a new game?",
            hint: "(y)es / (n)o",
        })?;
        Ok(answer == GameEvent::Confirm)
    }

    fn show_instructions(&mut self) -> bool {
        if self.quit_requested {
            return false;
        }
        let shown = self.ask(Dialog {
            title: "Instructions",
            body: INSTRUCTIONS,
            hint: "(enter) begin",
        });
        if let Err(e) = shown {
            tracing::warn!(error = %e, "could not show instructions");
        }
        !self.quit_requested
    }
}

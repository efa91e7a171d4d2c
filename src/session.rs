use crate::board::Board;
use crate::clock::{elapsed_since, Clock, WallAnchor};
use crate::config::{ConfigError, TrialConfig};
use crate::fixation::{FixationGate, GateStatus};
use crate::geometry::{BoardGeometry, Point, Rect};
use crate::persistence::{PersistError, PersistenceSink};
use crate::prompt::Prompter;
use crate::recorder::{RoundSummary, TrialRecorder};
use crate::shape::{Shape, ShapeCatalog};
use crate::view::{ExitButtonView, SessionView, TileColor, TileView, EXIT_LABEL, TITLE};
use rand::Rng;
use std::time::Instant;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Intro,
    Playing,
    Ending,
    Finished,
}

/// Session-lifetime counters owned by the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionState {
    pub phase: Phase,
    /// Never decreases
    pub score: u32,
    /// Never decreases
    pub hits: u32,
    /// Starts at 1, +1 each time a round ends normally
    pub round: u32,
    /// Set after the first round is written; suppresses the start prompt and
    /// persisted headers
    pub previous_round_played: bool,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            phase: Phase::Intro,
            score: 0,
            hits: 0,
            round: 1,
            previous_round_played: false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EndReason {
    /// The start prompt was declined
    Declined,
    TimedOut,
    /// The exit button was held
    ExitRequested,
    Quit,
}

#[derive(Debug)]
pub struct RoundReport {
    pub summary: RoundSummary,
    pub selections: usize,
    /// First write failure, if any. The session carries on regardless.
    pub persist_error: Option<PersistError>,
}

#[derive(Debug)]
pub struct SessionReport {
    pub reason: EndReason,
    /// The round closed while ending the session, if one was in progress
    pub final_round: Option<RoundReport>,
    pub rounds_completed: u32,
    pub score: u32,
    pub hits: u32,
}

#[derive(Debug)]
pub enum TickOutcome {
    Continue,
    RoundEnded(RoundReport),
    SessionEnded(SessionReport),
}

#[derive(Debug, Default, Clone, Copy)]
struct ExitControl {
    hovered: bool,
    armed_since: Option<Instant>,
}

#[derive(Debug)]
struct Round {
    shape: Shape,
    board: Board,
    choices: u32,
    started_at: Instant,
    /// Round start or the last gate opening
    search_started_at: Instant,
    all_revealed: bool,
    exit: ExitControl,
}

/// Tick-driven state machine running a session of rounds:
/// `Intro -> Playing -> Ending -> Intro ...` until quit, timeout, exit
/// button or a declined start prompt.
pub struct SessionController<R: Rng, C: Clock> {
    config: TrialConfig,
    catalog: ShapeCatalog,
    rng: R,
    clock: C,
    player_id: u32,
    geometry: BoardGeometry,
    state: SessionState,
    round: Option<Round>,
    gate: FixationGate,
    recorder: TrialRecorder,
    session_started_at: Option<Instant>,
    /// Shape of the most recent round, for summaries written between rounds
    last_shape_index: usize,
    finish_after_round: bool,
}

impl<R: Rng, C: Clock> SessionController<R, C> {
    pub fn new(
        config: TrialConfig,
        catalog: ShapeCatalog,
        rng: R,
        clock: C,
        player_id: u32,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        if catalog.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }
        catalog.check_fits(config.columns, config.rows)?;

        let anchor = WallAnchor::capture(clock.now());
        // unit cells at the origin until the presenter supplies a layout
        let geometry = BoardGeometry::uniform(
            config.columns,
            config.rows,
            Point::new(0, 0),
            (1, 1),
            (0, 0),
            Rect::default(),
        );
        Ok(Self {
            gate: FixationGate::new(config.fixation_period),
            config,
            catalog,
            rng,
            clock,
            player_id,
            geometry,
            state: SessionState::default(),
            round: None,
            recorder: TrialRecorder::new(anchor),
            session_started_at: None,
            last_shape_index: 0,
            finish_after_round: false,
        })
    }

    /// Replaces tile and exit button placement, e.g. after a resize.
    pub fn set_geometry(&mut self, geometry: BoardGeometry) -> Result<(), ConfigError> {
        if geometry.columns() != self.config.columns || geometry.rows() != self.config.rows {
            return Err(ConfigError::GeometryMismatch {
                expected: (self.config.columns, self.config.rows),
                got: (geometry.columns(), geometry.rows()),
            });
        }
        if let Some(round) = self.round.as_mut() {
            round.board.relayout(&geometry);
        }
        self.geometry = geometry;
        Ok(())
    }

    /// Advances the session by one frame using the current pointer position.
    pub fn tick(
        &mut self,
        pointer: Option<Point>,
        prompter: &mut dyn Prompter,
        sink: &mut dyn PersistenceSink,
    ) -> TickOutcome {
        let now = self.clock.now();
        if self.state.phase == Phase::Finished {
            return TickOutcome::Continue;
        }
        if self.timed_out(now) {
            tracing::info!(limit = ?self.config.session_limit, "session time limit reached");
            return TickOutcome::SessionEnded(self.end_session(EndReason::TimedOut, now, Some(sink)));
        }

        match self.state.phase {
            Phase::Intro => self.begin_round(prompter),
            Phase::Playing => {
                self.play(pointer, now);
                if self.state.phase == Phase::Ending {
                    self.finish_round(now, sink)
                } else {
                    TickOutcome::Continue
                }
            }
            Phase::Ending => self.finish_round(now, sink),
            Phase::Finished => TickOutcome::Continue,
        }
    }

    /// Ends the session at once, flushing a round in progress best-effort.
    pub fn quit(&mut self, sink: &mut dyn PersistenceSink) -> SessionReport {
        let now = self.clock.now();
        tracing::info!(phase = ?self.state.phase, "quit requested");
        self.end_session(EndReason::Quit, now, Some(sink))
    }

    fn timed_out(&self, now: Instant) -> bool {
        self.session_started_at
            .is_some_and(|start| elapsed_since(start, now) > self.config.session_limit)
    }

    fn begin_round(&mut self, prompter: &mut dyn Prompter) -> TickOutcome {
        if !self.state.previous_round_played {
            match prompter.confirm_start() {
                Ok(false) => {
                    tracing::info!("start declined");
                    let now = self.clock.now();
                    return TickOutcome::SessionEnded(self.end_session(EndReason::Declined, now, None));
                }
                Ok(true) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "start prompt unavailable, showing instructions");
                }
            }
            if !prompter.show_instructions() {
                tracing::info!("quit from instructions");
                let now = self.clock.now();
                return TickOutcome::SessionEnded(self.end_session(EndReason::Quit, now, None));
            }
        }

        // the prompt may have blocked for a while
        let now = self.clock.now();
        if self.session_started_at.is_none() {
            self.session_started_at = Some(now);
        }

        let shape = self.catalog.draw(&mut self.rng);
        self.last_shape_index = shape.index;
        let board = Board::new(&shape, &self.geometry, self.config.dwell_threshold);
        tracing::info!(
            round = self.state.round,
            shape = shape.index,
            color = %shape.color,
            "round started"
        );
        self.gate.reset();
        self.round = Some(Round {
            shape,
            board,
            choices: 0,
            started_at: now,
            search_started_at: now,
            all_revealed: false,
            exit: ExitControl::default(),
        });
        self.state.phase = Phase::Playing;
        TickOutcome::Continue
    }

    fn play(&mut self, pointer: Option<Point>, now: Instant) {
        let Some(round) = self.round.as_mut() else {
            self.state.phase = Phase::Intro;
            return;
        };

        match self.gate.poll(now) {
            GateStatus::Gated => return,
            GateStatus::JustOpened => {
                tracing::debug!("fixation gate open");
                round.search_started_at = now;
                if round.all_revealed {
                    self.state.phase = Phase::Ending;
                    return;
                }
            }
            GateStatus::Open => {}
        }

        if let Some(selection) = round.board.update(pointer, now) {
            round.choices += 1;
            if selection.correct {
                self.state.score += 1;
                self.state.hits += 1;
            }
            self.recorder
                .record(self.state.round, round.choices, &selection, round.search_started_at);
            self.gate.enter(now);
            tracing::debug!(period = ?self.gate.period(), "fixation gate closed");
            if round.board.all_targets_revealed() {
                round.board.reveal_all();
                round.all_revealed = true;
            }
            return;
        }

        let hovering = pointer.is_some_and(|p| self.geometry.exit_button.contains(p));
        round.exit.hovered = hovering;
        if !hovering {
            round.exit.armed_since = None;
            return;
        }
        // exiting is only allowed once something has been selected this round
        if !round.board.any_selected() {
            return;
        }
        match round.exit.armed_since {
            None => round.exit.armed_since = Some(now),
            Some(since) if elapsed_since(since, now) >= self.config.exit_hold => {
                tracing::info!(round = self.state.round, "exit button held");
                round.board.reveal_all();
                round.all_revealed = true;
                self.finish_after_round = true;
                self.state.phase = Phase::Ending;
            }
            Some(_) => {}
        }
    }

    fn finish_round(&mut self, now: Instant, sink: &mut dyn PersistenceSink) -> TickOutcome {
        let Some(round) = self.round.take() else {
            self.state.phase = Phase::Intro;
            return TickOutcome::Continue;
        };
        let report = self.close_round(round, now, sink);
        self.state.round += 1;
        self.state.previous_round_played = true;
        self.gate.reset();

        if self.finish_after_round {
            self.state.phase = Phase::Finished;
            TickOutcome::SessionEnded(self.session_report(EndReason::ExitRequested, Some(report)))
        } else {
            self.state.phase = Phase::Intro;
            TickOutcome::RoundEnded(report)
        }
    }

    fn close_round(&mut self, round: Round, now: Instant, sink: &mut dyn PersistenceSink) -> RoundReport {
        let started_at = self.recorder.wall_time(round.started_at);
        let summary = RoundSummary {
            round: self.state.round,
            shape_index: round.shape.index,
            player_id: self.player_id,
            score: self.state.score,
            attempts: round.choices,
            started_at,
            ended_at: self.recorder.wall_time(now),
            date: started_at.date_naive(),
        };
        self.persist(summary, sink)
    }

    /// Summary for a session that ran out between rounds: no attempts,
    /// starting and ending `now`.
    fn idle_summary(&self, now: Instant) -> RoundSummary {
        let at = self.recorder.wall_time(now);
        RoundSummary {
            round: self.state.round,
            shape_index: self.last_shape_index,
            player_id: self.player_id,
            score: self.state.score,
            attempts: 0,
            started_at: at,
            ended_at: at,
            date: at.date_naive(),
        }
    }

    fn persist(&mut self, summary: RoundSummary, sink: &mut dyn PersistenceSink) -> RoundReport {
        let header = !self.state.previous_round_played;
        let selections = self.recorder.close_round(summary.clone());

        let mut persist_error = None;
        if let Err(e) = sink.append_summary(&summary, header) {
            tracing::warn!(round = summary.round, error = %e, "failed to persist round summary");
            persist_error = Some(e);
        }
        if let Err(e) = sink.append_selections(&selections, header) {
            tracing::warn!(round = summary.round, error = %e, "failed to persist selections");
            persist_error.get_or_insert(e);
        }

        tracing::info!(
            round = summary.round,
            attempts = summary.attempts,
            score = summary.score,
            "round closed"
        );
        RoundReport {
            summary,
            selections: selections.len(),
            persist_error,
        }
    }

    fn end_session(
        &mut self,
        reason: EndReason,
        now: Instant,
        sink: Option<&mut dyn PersistenceSink>,
    ) -> SessionReport {
        // a round only exists while Playing or Ending
        let final_round = match (self.round.take(), sink) {
            (Some(round), Some(sink)) => Some(self.close_round(round, now, sink)),
            (None, Some(sink))
                if reason == EndReason::TimedOut && self.session_started_at.is_some() =>
            {
                let summary = self.idle_summary(now);
                Some(self.persist(summary, sink))
            }
            _ => None,
        };
        if final_round.is_some() {
            self.state.previous_round_played = true;
        }
        self.state.phase = Phase::Finished;
        self.session_report(reason, final_round)
    }

    fn session_report(&self, reason: EndReason, final_round: Option<RoundReport>) -> SessionReport {
        SessionReport {
            reason,
            final_round,
            rounds_completed: self.state.round - 1,
            score: self.state.score,
            hits: self.state.hits,
        }
    }

    pub fn view(&self) -> SessionView {
        let gated = self.gate.is_gated();
        let accepting = self.state.phase == Phase::Playing && !gated;
        let tiles = self
            .round
            .as_ref()
            .map(|round| {
                round
                    .board
                    .tiles()
                    .iter()
                    .map(|tile| {
                        let color = if tile.is_selected() {
                            TileColor::Revealed(tile.reveal_color())
                        } else if tile.is_hovered() {
                            TileColor::Hover
                        } else {
                            TileColor::Unrevealed
                        };
                        TileView {
                            position: tile.position,
                            bounds: tile.bounds,
                            color,
                            fixation_dot: accepting && !tile.is_selected(),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default();

        SessionView {
            title: TITLE,
            score: self.state.score,
            round: self.state.round,
            phase: self.state.phase,
            gated,
            tiles,
            exit_button: ExitButtonView {
                bounds: self.geometry.exit_button,
                hovered: accepting && self.round.as_ref().is_some_and(|r| r.exit.hovered),
                label: EXIT_LABEL,
            },
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_finished(&self) -> bool {
        self.state.phase == Phase::Finished
    }

    pub fn is_gated(&self) -> bool {
        self.gate.is_gated()
    }

    pub fn player_id(&self) -> u32 {
        self.player_id
    }

    pub fn config(&self) -> &TrialConfig {
        &self.config
    }

    pub fn geometry(&self) -> &BoardGeometry {
        &self.geometry
    }

    pub fn board(&self) -> Option<&Board> {
        self.round.as_ref().map(|r| &r.board)
    }

    pub fn current_shape(&self) -> Option<&Shape> {
        self.round.as_ref().map(|r| &r.shape)
    }

    /// Selections made so far in the round in progress
    pub fn choices(&self) -> u32 {
        self.round.as_ref().map_or(0, |r| r.choices)
    }

    pub fn recorder(&self) -> &TrialRecorder {
        &self.recorder
    }
}

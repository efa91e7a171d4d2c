use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use dwellgrid::{
    app_dirs::{AppDirs, PlayerDirectory},
    clock::{Clock, SystemClock},
    config::{Config, ConfigStore, FileConfigStore, TrialConfig},
    logging::{self, LogArgs},
    persistence::{CsvSink, PersistenceSink},
    runtime::{CrosstermEventSource, FixedTicker, GameEvent, GameEventSource, Runner, Ticker},
    session::{EndReason, SessionController, SessionReport, TickOutcome},
    shape::ShapeCatalog,
    ui::{dialog::TuiPrompter, layout::board_geometry},
};
use rand::Rng;
use ratatui::{
    backend::{Backend, CrosstermBackend},
    layout::Rect,
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    time::Duration,
};

/// dwell-selection visual search game for the terminal
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Find the hidden shape on a grid of tiles by resting the mouse pointer on them. Every selection is timed and written to per-player CSV files."
)]
pub struct Cli {
    /// number of tile rows
    #[clap(long)]
    rows: Option<usize>,

    /// number of tile columns
    #[clap(long)]
    columns: Option<usize>,

    /// milliseconds the pointer must rest on a tile to select it
    #[clap(long)]
    dwell_ms: Option<u64>,

    /// milliseconds input is ignored after each selection
    #[clap(long)]
    fixation_ms: Option<u64>,

    /// milliseconds the exit button must be hovered to finish
    #[clap(long)]
    exit_hold_ms: Option<u64>,

    /// seconds after which the session ends on its own
    #[clap(long)]
    session_limit_secs: Option<u64>,

    /// folder holding one numbered sub-folder per player
    #[clap(long)]
    data_dir: Option<PathBuf>,

    /// write the effective settings to the config file before starting
    #[clap(long)]
    save_config: bool,

    #[command(flatten)]
    log: LogArgs,
}

impl Cli {
    /// Overlays command line flags on the stored settings
    fn apply(&self, mut cfg: Config) -> Config {
        if let Some(v) = self.rows {
            cfg.rows = v;
        }
        if let Some(v) = self.columns {
            cfg.columns = v;
        }
        if let Some(v) = self.dwell_ms {
            cfg.dwell_ms = v;
        }
        if let Some(v) = self.fixation_ms {
            cfg.fixation_ms = v;
        }
        if let Some(v) = self.exit_hold_ms {
            cfg.exit_hold_ms = v;
        }
        if let Some(v) = self.session_limit_secs {
            cfg.session_limit_secs = v;
        }
        cfg
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if let Some(path) = AppDirs::log_path() {
        if let Err(e) = logging::init(&cli.log.spec(), &path) {
            eprintln!("warning: logging disabled ({}): {e}", path.display());
        }
    }

    let store = FileConfigStore::new();
    let config = cli.apply(store.load());
    let trial = match TrialConfig::try_from(&config) {
        Ok(trial) => trial,
        Err(e) => Cli::command().error(ErrorKind::ValueValidation, e).exit(),
    };
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "saved config");
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let players = PlayerDirectory::new(
        cli.data_dir
            .clone()
            .unwrap_or_else(AppDirs::player_data_dir),
    );
    let slot = players.allocate()?;
    let mut sink = CsvSink::new(&slot.dir, slot.id);
    let controller = SessionController::new(
        trial,
        ShapeCatalog::standard(),
        rand::thread_rng(),
        SystemClock,
        slot.id,
    )?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let runner = Runner::new(
        CrosstermEventSource::new(),
        FixedTicker::new(Duration::from_millis(config.tick_ms.max(1))),
    );

    let result = start_tui(&mut terminal, controller, &runner, &mut sink);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen,
    )?;
    terminal.show_cursor()?;

    let report = result?;
    tracing::info!(reason = ?report.reason, score = report.score, "session over");
    println!("{}", summary_line(&report, slot.id));
    if report.rounds_completed > 0 {
        println!("results saved to {}", slot.dir.display());
    }

    Ok(())
}

fn start_tui<B, R, C, E, T>(
    terminal: &mut Terminal<B>,
    mut controller: SessionController<R, C>,
    runner: &Runner<E, T>,
    sink: &mut dyn PersistenceSink,
) -> io::Result<SessionReport>
where
    B: Backend,
    R: Rng,
    C: Clock,
    E: GameEventSource,
    T: Ticker,
{
    let result = run_loop(terminal, &mut controller, runner, sink);
    if let Err(e) = &result {
        // the terminal is gone, keep whatever the player has done so far
        let report = controller.quit(sink);
        tracing::error!(
            error = %e,
            saved = report.final_round.is_some(),
            "terminal failed, session ended"
        );
    }
    result
}

fn run_loop<B, R, C, E, T>(
    terminal: &mut Terminal<B>,
    controller: &mut SessionController<R, C>,
    runner: &Runner<E, T>,
    sink: &mut dyn PersistenceSink,
) -> io::Result<SessionReport>
where
    B: Backend,
    R: Rng,
    C: Clock,
    E: GameEventSource,
    T: Ticker,
{
    let (columns, rows) = (controller.config().columns, controller.config().rows);
    let relayout = |controller: &mut SessionController<R, C>, width: u16, height: u16| {
        let geometry = board_geometry(Rect::new(0, 0, width, height), columns, rows);
        if let Err(e) = controller.set_geometry(geometry) {
            tracing::error!(error = %e, "layout rejected");
        }
    };
    let size = terminal.size()?;
    relayout(controller, size.width, size.height);

    let mut pointer = None;
    loop {
        match runner.step() {
            GameEvent::Pointer(p) => pointer = Some(p),
            GameEvent::Quit => return Ok(controller.quit(sink)),
            GameEvent::Resize(width, height) => relayout(controller, width, height),
            GameEvent::Confirm | GameEvent::Dismiss | GameEvent::Tick => {}
        }

        let mut prompter = TuiPrompter::new(terminal, runner);
        let outcome = controller.tick(pointer, &mut prompter, sink);
        let quit_requested = prompter.quit_requested();

        match outcome {
            TickOutcome::SessionEnded(report) => return Ok(report),
            TickOutcome::RoundEnded(report) => {
                if let Some(e) = report.persist_error {
                    tracing::error!(round = report.summary.round, error = %e, "round not saved");
                }
            }
            TickOutcome::Continue => {}
        }
        if quit_requested {
            return Ok(controller.quit(sink));
        }

        terminal.draw(|f| f.render_widget(&controller.view(), f.area()))?;
    }
}

fn summary_line(report: &SessionReport, player_id: u32) -> String {
    let reason = match report.reason {
        EndReason::Declined => "declined",
        EndReason::TimedOut => "time limit reached",
        EndReason::ExitRequested => "finished",
        EndReason::Quit => "quit",
    };
    format!(
        "player {player_id}: {reason} after {} round(s), score {} ({} hits)",
        report.rounds_completed, report.score, report.hits
    )
}

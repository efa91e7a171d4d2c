use std::fs;
use std::time::Duration;

use dwellgrid::app_dirs::PlayerDirectory;
use dwellgrid::clock::ManualClock;
use dwellgrid::config::TrialConfig;
use dwellgrid::geometry::{BoardGeometry, Point, Position, Rect};
use dwellgrid::persistence::{CsvSink, PersistenceSink};
use dwellgrid::prompt::ScriptedPrompter;
use dwellgrid::session::{EndReason, Phase, SessionController, TickOutcome};
use dwellgrid::shape::{ShapeCatalog, ShapeColor};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tempfile::tempdir;

// Multi-round sessions on a hand-advanced clock, written through the CSV sink.

const TARGETS: [(usize, usize); 3] = [(3, 0), (3, 1), (4, 1)];
const EXIT: Point = Point::new(5, 40);

fn geometry() -> BoardGeometry {
    BoardGeometry::uniform(5, 5, Point::new(0, 0), (4, 2), (1, 1), Rect::new(0, 40, 20, 3))
}

fn centre(pos: (usize, usize)) -> Option<Point> {
    Some(geometry().tile(Position::from(pos)).center())
}

struct Session {
    ctl: SessionController<StdRng, ManualClock>,
    clock: ManualClock,
    prompter: ScriptedPrompter,
}

impl Session {
    fn new(player_id: u32) -> Self {
        let clock = ManualClock::new();
        let catalog = ShapeCatalog::new(vec![TARGETS.to_vec()], vec![ShapeColor::Orange]).unwrap();
        let mut ctl = SessionController::new(
            TrialConfig::default(),
            catalog,
            StdRng::seed_from_u64(3),
            clock.clone(),
            player_id,
        )
        .unwrap();
        ctl.set_geometry(geometry()).unwrap();
        Self {
            ctl,
            clock,
            prompter: ScriptedPrompter::accepting(),
        }
    }

    fn tick(&mut self, pointer: Option<Point>, sink: &mut dyn PersistenceSink) -> TickOutcome {
        self.ctl.tick(pointer, &mut self.prompter, sink)
    }

    /// Dwell on `pos`, then wait out the fixation period with the pointer away.
    fn select(&mut self, pos: (usize, usize), sink: &mut dyn PersistenceSink) -> TickOutcome {
        self.tick(centre(pos), sink);
        self.clock.advance_ms(1200);
        self.tick(centre(pos), sink);
        self.clock.advance_ms(1200);
        self.tick(None, sink)
    }

    /// Plays one round with a miss followed by every target.
    fn play_round(&mut self, sink: &mut dyn PersistenceSink) {
        assert!(matches!(self.tick(None, sink), TickOutcome::Continue));
        assert_eq!(self.ctl.phase(), Phase::Playing);
        self.select((0, 4), sink);
        let mut outcome = TickOutcome::Continue;
        for pos in TARGETS {
            outcome = self.select(pos, sink);
        }
        assert!(matches!(outcome, TickOutcome::RoundEnded(_)));
    }
}

#[test]
fn two_rounds_append_to_player_files() {
    let root = tempdir().unwrap();
    let slot = PlayerDirectory::new(root.path()).allocate().unwrap();
    let mut sink = CsvSink::new(&slot.dir, slot.id);
    let mut session = Session::new(slot.id);

    session.play_round(&mut sink);
    session.play_round(&mut sink);
    assert_eq!(session.ctl.state().round, 3);
    assert_eq!(session.ctl.state().score, 6);

    let summary = fs::read_to_string(slot.dir.join("1.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3, "one header and one row per round");
    assert!(lines[0].starts_with("round,shape_number,player_id,score,attempts"));
    assert!(lines[1].starts_with("1,1,1,3,4,"));
    assert!(lines[2].starts_with("2,1,1,6,4,"));

    let mut reader = csv::Reader::from_path(slot.dir.join("1_choices.csv")).unwrap();
    let rows: Vec<csv::StringRecord> = reader.records().map(|r| r.unwrap()).collect();
    assert_eq!(rows.len(), 8);
    assert_eq!(&rows[0][0], "1");
    assert_eq!(&rows[0][2], "(0,4)");
    assert_eq!(&rows[0][3], "false");
    assert_eq!(&rows[1][2], "(3,0)");
    assert_eq!(&rows[1][3], "true");
    assert_eq!(&rows[4][0], "2");
    assert_eq!(&rows[4][1], "1");
}

#[test]
fn second_player_gets_next_folder() {
    let root = tempdir().unwrap();
    let players = PlayerDirectory::new(root.path());
    let first = players.allocate().unwrap();
    let second = players.allocate().unwrap();
    assert_eq!((first.id, second.id), (1, 2));

    let mut sink = CsvSink::new(&second.dir, second.id);
    let mut session = Session::new(second.id);
    session.play_round(&mut sink);

    assert!(second.dir.join("2.csv").exists());
    assert!(second.dir.join("2_choices.csv").exists());
    assert!(!first.dir.join("1.csv").exists());
}

#[test]
fn exit_button_closes_partial_round_to_disk() {
    let root = tempdir().unwrap();
    let slot = PlayerDirectory::new(root.path()).allocate().unwrap();
    let mut sink = CsvSink::new(&slot.dir, slot.id);
    let mut session = Session::new(slot.id);

    session.play_round(&mut sink);
    session.tick(None, &mut sink);
    session.select(TARGETS[0], &mut sink);

    session.tick(Some(EXIT), &mut sink);
    session.clock.advance(Duration::from_millis(2400));
    let report = match session.tick(Some(EXIT), &mut sink) {
        TickOutcome::SessionEnded(report) => report,
        other => panic!("expected session end, got {other:?}"),
    };
    assert_eq!(report.reason, EndReason::ExitRequested);
    assert_eq!(report.rounds_completed, 2);
    assert_eq!(report.score, 4);

    let summary = fs::read_to_string(slot.dir.join("1.csv")).unwrap();
    let lines: Vec<&str> = summary.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[2].starts_with("2,1,1,4,1,"));
}

mod logging;

use cleaner_core::{
    Position,
    agent::{Agent, Flow, Observer, Quiet, RunSummary},
    room::{CellState, ROBOT_SYMBOL, Room, demo_room, load_room_from_string},
    strategy::StrategyKind,
};
use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use ratatui::{
    crossterm::{
        self,
        event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode},
        execute,
        terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
    },
    prelude::*,
    widgets::*,
};
use std::{
    io::{self, Stdout},
    path::PathBuf,
    time::{Duration, Instant},
};

use crate::logging::LogTarget;

#[derive(Parser, Debug)]
#[command(version, about = "Robot vacuum cleaner simulation", long_about = None)]
struct Args {
    /// Scenario file to load (rows of `.`, `D`, `#`, `C`)
    #[arg(short, long, value_name = "MAP_FILE", conflicts_with = "random")]
    map: Option<PathBuf>,

    /// Generate a random room of the given size instead, e.g. `12x8`
    #[arg(long, value_name = "WxH", value_parser = parse_size)]
    random: Option<(usize, usize)>,

    /// Seed for the random room
    #[arg(long, default_value_t = 0, requires = "random")]
    seed: u64,

    /// Dirty cells in the random room
    #[arg(long, default_value_t = 10, requires = "random")]
    dirt: usize,

    /// Obstacles in the random room
    #[arg(long, default_value_t = 5, requires = "random")]
    obstacles: usize,

    /// Traversal strategy
    #[arg(short, long, value_enum, default_value_t = StrategyArg::Spiral)]
    strategy: StrategyArg,

    /// Pause after each drawn step, in milliseconds
    #[arg(long, default_value_t = 200)]
    delay_ms: u64,

    /// Run without the terminal UI and print the final room
    #[arg(long)]
    headless: bool,

    /// With --headless, print the run summary as JSON instead
    #[arg(long, requires = "headless")]
    json: bool,

    /// Write diagnostics here while the terminal UI is up
    #[arg(long, value_name = "LOG_FILE")]
    log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum StrategyArg {
    Zigzag,
    Spiral,
}

impl From<StrategyArg> for StrategyKind {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Zigzag => StrategyKind::Zigzag,
            StrategyArg::Spiral => StrategyKind::Spiral,
        }
    }
}

fn parse_size(s: &str) -> Result<(usize, usize), String> {
    let (width, height) = s
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{s}'"))?;
    let width = width
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{width}': {e}"))?;
    let height = height
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{height}': {e}"))?;
    Ok((width, height))
}

/// Builds the room the run starts from: a map file, a random room, or the
/// stock demo room.
fn load_room(args: &Args) -> Result<Room> {
    if let Some(path) = &args.map {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading map file {}", path.display()))?;
        return load_room_from_string(&text)
            .with_context(|| format!("parsing map file {}", path.display()));
    }
    if let Some((width, height)) = args.random {
        return Room::scatter(width, height, args.dirt, args.obstacles, args.seed)
            .context("generating random room");
    }
    Ok(demo_room())
}

fn main() -> Result<()> {
    let args = Args::parse();

    let target = match (&args.log_file, args.headless) {
        (Some(path), _) => LogTarget::File(path),
        (None, true) => LogTarget::Stderr,
        (None, false) => LogTarget::Off,
    };
    logging::init(target)?;

    let mut room = load_room(&args)?;
    let strategy = StrategyKind::from(args.strategy);

    if args.headless {
        return run_headless(&mut room, strategy, args.json);
    }

    let delay = Duration::from_millis(args.delay_ms);
    let summary = run_tui(&mut room, strategy, delay)?;
    println!("{}", summary_line(&summary));
    Ok(())
}

fn run_headless(room: &mut Room, strategy: StrategyKind, json: bool) -> Result<()> {
    let summary = Agent::new(room, &mut Quiet, strategy.build()).start_cleaning();
    if json {
        println!("{}", summary_json(&summary)?);
        return Ok(());
    }

    println!("Vacuum cleaner robot simulation");
    println!("--------------------------------");
    println!("Legend: #=Obstacle, D=Dirt, .=Empty, R=Robot, C=Cleaned");
    print!("{}", room.render_text(Some(summary.final_position)));
    println!("{}", summary_line(&summary));
    Ok(())
}

fn summary_json(summary: &RunSummary) -> Result<String> {
    serde_json::to_string_pretty(summary).context("serializing run summary")
}

fn summary_line(summary: &RunSummary) -> String {
    format!(
        "{} run {}: {} moves, {} blocked, {} cleaned, {} dirt left, robot at ({}, {})",
        summary.strategy,
        if summary.completed { "finished" } else { "stopped" },
        summary.moves,
        summary.blocked,
        summary.cleaned,
        summary.remaining_dirt,
        summary.final_position.x,
        summary.final_position.y,
    )
}

/// Runs the simulation on screen, drawing every step.
fn run_tui(room: &mut Room, strategy: StrategyKind, delay: Duration) -> Result<RunSummary> {
    let terminal = setup_terminal()?;
    let mut screen = Screen {
        terminal,
        delay,
        strategy,
        error: None,
    };

    let summary = Agent::new(room, &mut screen, strategy.build()).start_cleaning();

    // Keep the final frame up until a key is pressed, unless the user
    // already asked to quit.
    let shown = if screen.error.is_none() && summary.completed {
        screen.show_final(room, &summary)
    } else {
        Ok(())
    };

    restore_terminal(&mut screen.terminal)?;
    if let Some(err) = screen.error {
        return Err(err);
    }
    shown?;
    Ok(summary)
}

/// Draws the room after each step and turns `q`/`Esc` into a stop request.
struct Screen {
    terminal: Terminal<CrosstermBackend<Stdout>>,
    delay: Duration,
    strategy: StrategyKind,
    /// First terminal error hit while drawing; ends the run.
    error: Option<anyhow::Error>,
}

impl Screen {
    fn step(&mut self, room: &Room, robot: Position) -> Result<Flow> {
        let status = format!(
            "Strategy: {}  Robot: ({}, {})  Dirt left: {}  Cleaned: {}",
            self.strategy,
            robot.x,
            robot.y,
            room.remaining_dirt(),
            room.count(CellState::Cleaned),
        );
        self.terminal
            .draw(|f| ui(f, room, robot, &status, "Press 'q' or 'Esc' to stop."))?;

        // Wait out the step delay while still listening for a quit key.
        let deadline = Instant::now() + self.delay;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(Flow::Continue);
            }
            if crossterm::event::poll(remaining)? {
                if let Event::Key(key) = event::read()? {
                    if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                        return Ok(Flow::Stop);
                    }
                }
            }
        }
    }

    fn show_final(&mut self, room: &Room, summary: &RunSummary) -> Result<()> {
        let status = summary_line(summary);
        self.terminal.draw(|f| {
            ui(
                f,
                room,
                summary.final_position,
                &status,
                "Done. Press any key to exit.",
            )
        })?;
        loop {
            if let Event::Key(_) = event::read()? {
                return Ok(());
            }
        }
    }
}

impl Observer for Screen {
    fn on_step(&mut self, room: &Room, robot: Position) -> Flow {
        match self.step(room, robot) {
            Ok(flow) => flow,
            Err(err) => {
                self.error = Some(err);
                Flow::Stop
            }
        }
    }
}

/// Configures the terminal for TUI interaction.
fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    enable_raw_mode()?;
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(Into::into)
}

/// Restores the terminal to its original state.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}

/// Renders the user interface.
fn ui(frame: &mut Frame, room: &Room, robot: Position, status: &str, help: &str) {
    let main_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(room_rows(room)), // Area for the room
            Constraint::Length(3),                     // Area for status
            Constraint::Length(2),                     // Area for help
        ])
        .split(frame.area());

    render_room(frame, main_layout[0], room, robot);

    let status_widget = Paragraph::new(status)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Status"));
    frame.render_widget(status_widget, main_layout[1]);

    let help_text = Paragraph::new(help)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::TOP));
    frame.render_widget(help_text, main_layout[2]);
}

/// Rows the room needs on screen, borders included.
fn room_rows(room: &Room) -> u16 {
    u16::try_from(room.height())
        .unwrap_or(u16::MAX)
        .saturating_add(2)
}

/// Renders the room with the robot drawn over its cell.
fn render_room(frame: &mut Frame, area: Rect, room: &Room, robot: Position) {
    let mut lines: Vec<Line> = Vec::with_capacity(room.height());

    for (y, row) in room.cells().rows().enumerate() {
        let mut spans: Vec<Span> = Vec::with_capacity(room.width() * 2);
        for (x, cell) in row.iter().enumerate() {
            let span = if robot == (Position { x, y }) {
                Span::styled(
                    ROBOT_SYMBOL.to_string(),
                    Style::default().fg(Color::Red).bold(),
                )
            } else {
                let style = match cell {
                    CellState::Empty => Style::default().fg(Color::DarkGray),
                    CellState::Dirt => Style::default().fg(Color::Yellow),
                    CellState::Obstacle => Style::default().fg(Color::Gray).bold(),
                    CellState::Cleaned => Style::default().fg(Color::Green),
                };
                Span::styled(cell.symbol().to_string(), style)
            };
            spans.push(span);
            spans.push(Span::raw(" "));
        }
        lines.push(Line::from(spans));
    }

    let room_paragraph = Paragraph::new(lines)
        .block(
            Block::default()
                .title("Vacuum cleaner robot simulation")
                .borders(Borders::ALL),
        )
        .alignment(Alignment::Center);

    frame.render_widget(room_paragraph, area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_room_sizes() {
        assert_eq!(parse_size("12x8"), Ok((12, 8)));
        assert_eq!(parse_size("3X4"), Ok((3, 4)));
        assert!(parse_size("12").is_err());
        assert!(parse_size("ax3").is_err());
    }

    #[test]
    fn defaults_to_the_demo_room_and_spiral() {
        let args = Args::parse_from(["cleaner_tui"]);
        assert_eq!(StrategyKind::from(args.strategy), StrategyKind::Spiral);
        assert_eq!(load_room(&args).unwrap(), demo_room());
    }

    #[test]
    fn random_room_follows_the_flags() {
        let args = Args::parse_from([
            "cleaner_tui",
            "--random",
            "5x4",
            "--seed",
            "7",
            "--dirt",
            "3",
            "--obstacles",
            "2",
        ]);
        let room = load_room(&args).unwrap();
        assert_eq!((room.width(), room.height()), (5, 4));
        assert_eq!(room.remaining_dirt(), 3);
        assert_eq!(room.count(CellState::Obstacle), 2);
    }

    #[test]
    fn bundled_demo_map_matches_the_demo_room() {
        let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../maps/demo.txt");
        let args = Args::parse_from(["cleaner_tui", "--map", path, "--strategy", "zigzag"]);
        assert_eq!(StrategyKind::from(args.strategy), StrategyKind::Zigzag);
        assert_eq!(load_room(&args).unwrap(), demo_room());
    }

    #[test]
    fn map_and_random_conflict() {
        let result = Args::try_parse_from(["cleaner_tui", "--map", "a.txt", "--random", "3x3"]);
        assert!(result.is_err());
    }

    #[test]
    fn room_rows_saturate_for_tall_rooms() {
        assert_eq!(room_rows(&demo_room()), 11);
        let tall = Room::new(1, usize::from(u16::MAX) + 5).unwrap();
        assert_eq!(room_rows(&tall), u16::MAX);
    }

    #[test]
    fn json_needs_headless() {
        assert!(Args::try_parse_from(["cleaner_tui", "--json"]).is_err());
        assert!(Args::try_parse_from(["cleaner_tui", "--headless", "--json"]).is_ok());
    }

    #[test]
    fn summary_json_carries_every_field() {
        let mut room = demo_room();
        let summary =
            Agent::new(&mut room, &mut Quiet, StrategyKind::Spiral.build()).start_cleaning();
        let json = summary_json(&summary).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["strategy"], "spiral");
        assert_eq!(value["moves"], 80);
        assert_eq!(value["blocked"], 11);
        assert_eq!(value["completed"], true);
        assert_eq!(value["final_position"]["x"], 8);
        assert_eq!(value["final_position"]["y"], 0);
    }

    #[test]
    fn summary_line_reports_the_run() {
        let summary = RunSummary {
            strategy: "zigzag".to_string(),
            moves: 81,
            blocked: 0,
            cleaned: 2,
            remaining_dirt: 0,
            completed: true,
            final_position: Position { x: 8, y: 8 },
        };
        assert_eq!(
            summary_line(&summary),
            "zigzag run finished: 81 moves, 0 blocked, 2 cleaned, 0 dirt left, robot at (8, 8)"
        );
    }
}

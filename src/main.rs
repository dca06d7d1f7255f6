use std::{
    collections::VecDeque,
    io::{self, stdout, Stdout},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Alignment, Constraint, Layout, Rect},
    style::{Color as TermColor, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use puyo_duel::config::{
    RulesConfig, DEFAULT_BONUS_MOVES_PER_CHAIN, DEFAULT_MAX_GARBAGE_DROP, DEFAULT_STARTING_MOVES,
};
use puyo_duel::game::{Command, GameEvent, GameSession, Player};
use puyo_duel::grid::{Cell, Color, COLS, ROWS};
use puyo_duel::piece::ColorPair;

// ============================================================================
// Visual Constants
// ============================================================================

const CELL_WIDTH: u16 = 2;
const BLOCK_CHAR: &str = "██";
const EMPTY_CHAR: &str = " ·";
const TRAY_MARKER: &str = "●";
const TRAY_LIMIT: u32 = 30;
const LOG_LINES: usize = 6;

// ============================================================================
// Command Line
// ============================================================================

/// Two-player falling-pair duel in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "puyo-duel",
    version,
    about = "Two-board falling-pair matching duel. Chains send nuisance to the other board.",
    long_about = "Players take turns on their own board. Each turn allows a few moves; \
        clearing a chain ends the turn early, grants the opponent bonus moves and sends \
        nuisance that drops on them unless they cancel it with a chain of their own.\n\n\
        CONTROLS:\n  Left/Right or A/D  Move    Down or S  Soft drop / lock\n  \
        X  Rotate CW   Z  Rotate CCW   R  Reset   Q / Esc  Quit"
)]
struct Args {
    /// Seed for pair colors and garbage columns. Random when omitted.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Moves a board receives when its turn starts.
    #[arg(long, default_value_t = DEFAULT_STARTING_MOVES, value_name = "N")]
    starting_moves: i32,

    /// Bonus moves the opponent receives per chain step.
    #[arg(long, default_value_t = DEFAULT_BONUS_MOVES_PER_CHAIN, value_name = "N")]
    bonus_moves: i32,

    /// Most garbage cells placed in a single exchange.
    #[arg(long, default_value_t = DEFAULT_MAX_GARBAGE_DROP, value_name = "N")]
    max_garbage_drop: u32,

    /// Pause between visible resolution passes.
    #[arg(long, default_value_t = 300, value_name = "MS",
          value_parser = clap::value_parser!(u64).range(1..=5000))]
    pass_delay_ms: u64,

    /// Input poll interval while waiting for a move.
    #[arg(long, default_value_t = 50, value_name = "MS",
          value_parser = clap::value_parser!(u64).range(1..=1000))]
    tick_rate_ms: u64,
}

impl Args {
    fn rules(&self) -> RulesConfig {
        RulesConfig {
            starting_moves: self.starting_moves,
            bonus_moves_per_chain: self.bonus_moves,
            max_garbage_drop: self.max_garbage_drop,
            seed: self.seed.unwrap_or_else(rand::random),
        }
    }
}

// ============================================================================
// Color Mapping
// ============================================================================

fn cell_color(color: Color) -> TermColor {
    match color {
        Color::Red => TermColor::Red,
        Color::Green => TermColor::Green,
        Color::Blue => TermColor::Blue,
        Color::Yellow => TermColor::Yellow,
        Color::Garbage => TermColor::Gray,
    }
}

fn player_name(player: Player) -> &'static str {
    match player {
        Player::One => "Player 1",
        Player::Two => "Player 2",
    }
}

// ============================================================================
// Event Log
// ============================================================================

fn describe(event: &GameEvent) -> Option<String> {
    let line = match event {
        GameEvent::PieceMoved(_) | GameEvent::PieceRotated(_) | GameEvent::PieceSpawned(_) => {
            return None
        }
        GameEvent::PieceLocked(player) => format!("{} locks", player_name(*player)),
        GameEvent::ChainPass {
            player,
            chain,
            score,
            nuisance,
            ..
        } => format!(
            "{}: {chain}-chain +{score} ({nuisance} nuisance)",
            player_name(*player)
        ),
        GameEvent::BonusMoves { player, moves } => {
            format!("{} earns {moves} bonus moves", player_name(*player))
        }
        GameEvent::NuisanceOffset { player, units } => {
            format!("{} cancels {units} nuisance", player_name(*player))
        }
        GameEvent::NuisanceSent { from, units } => {
            format!("{} sends {units} nuisance", player_name(*from))
        }
        GameEvent::GarbageDropped { player, count } => {
            format!("{count} garbage falls on {}", player_name(*player))
        }
        GameEvent::TurnSwitched(player) => format!("{}'s turn", player_name(*player)),
        GameEvent::GameOver { winner } => format!("{} wins!", player_name(*winner)),
        GameEvent::GameReset => "New game".to_string(),
    };
    Some(line)
}

// ============================================================================
// Rendering
// ============================================================================

fn render(frame: &mut Frame, session: &GameSession, log: &VecDeque<String>) {
    let area = frame.size();

    let grid_width = (COLS as u16 * CELL_WIDTH) + 2;
    let grid_height = ROWS as u16 + 2;
    let side_width = 16;
    let board_width = grid_width + side_width;
    let total_width = board_width * 2 + 2;
    let total_height = grid_height + LOG_LINES as u16 + 5;

    let main_area = centered_rect(total_width, total_height, area);

    let vertical = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(grid_height),
        Constraint::Length(LOG_LINES as u16 + 2),
        Constraint::Fill(1),
    ])
    .split(main_area);

    render_banner(frame, session, vertical[0]);

    let boards = Layout::horizontal([
        Constraint::Length(board_width),
        Constraint::Length(2),
        Constraint::Length(board_width),
    ])
    .split(vertical[1]);

    for (player, area) in [(Player::One, boards[0]), (Player::Two, boards[2])] {
        let columns = Layout::horizontal([
            Constraint::Length(grid_width),
            Constraint::Length(side_width),
        ])
        .split(area);
        render_grid(frame, session, player, columns[0]);
        render_side(frame, session, player, columns[1]);
    }

    render_log(frame, log, vertical[2]);

    let controls = Paragraph::new(Line::from(
        "←→/AD: Move | ↓/S: Drop | X/Z: Rotate | R: Reset | Q/ESC: Quit",
    ))
    .alignment(Alignment::Center)
    .style(Style::default().fg(TermColor::DarkGray));
    frame.render_widget(controls, vertical[3]);
}

fn render_banner(frame: &mut Frame, session: &GameSession, area: Rect) {
    let mut text = format!("Turn: {}", player_name(session.active_player()));
    if session.is_resolving() {
        text.push_str("  (resolving)");
    }
    if let Some(winner) = session.last_winner() {
        text.push_str(&format!("  | last winner: {}", player_name(winner)));
    }
    let banner = Paragraph::new(Line::from(Span::styled(
        text,
        Style::default().add_modifier(Modifier::BOLD),
    )))
    .alignment(Alignment::Center);
    frame.render_widget(banner, area);
}

fn render_grid(frame: &mut Frame, session: &GameSession, player: Player, area: Rect) {
    let active = session.active_player() == player;
    let border_style = if active {
        Style::default().fg(TermColor::Cyan)
    } else {
        Style::default().fg(TermColor::DarkGray)
    };
    let title = format!(" {} ", player_name(player));
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(border_style)
        .title(title)
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    // Settled cells plus the falling pair
    let visual = session.board(player).render_grid();

    let lines: Vec<Line> = visual
        .rows()
        .iter()
        .map(|row| {
            let spans: Vec<Span> = row
                .iter()
                .map(|cell| match cell {
                    Cell::Empty => {
                        Span::styled(EMPTY_CHAR, Style::default().fg(TermColor::DarkGray))
                    }
                    Cell::Filled(color) => {
                        Span::styled(BLOCK_CHAR, Style::default().fg(cell_color(*color)))
                    }
                })
                .collect();
            Line::from(spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(lines), inner);
}

fn pair_lines(pair: ColorPair) -> [Line<'static>; 2] {
    [
        Line::from(Span::styled(
            BLOCK_CHAR,
            Style::default().fg(cell_color(pair.sub)),
        )),
        Line::from(Span::styled(
            BLOCK_CHAR,
            Style::default().fg(cell_color(pair.main)),
        )),
    ]
}

fn render_side(frame: &mut Frame, session: &GameSession, player: Player, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Info ")
        .title_alignment(Alignment::Center);

    let inner = block.inner(area);
    frame.render_widget(block, area);

    let board = session.board(player);
    let [next, after] = board.queue.peek();
    let pending = board.ledger.pending();
    let tray: String = TRAY_MARKER.repeat(pending.min(TRAY_LIMIT) as usize);

    let mut lines = vec![Line::from(Span::styled(
        "Next",
        Style::default().fg(TermColor::Cyan),
    ))];
    lines.extend(pair_lines(next));
    lines.push(Line::from(""));
    lines.extend(pair_lines(after));
    lines.extend([
        Line::from(""),
        Line::from(Span::styled("Score", Style::default().fg(TermColor::Yellow))),
        Line::from(format!("{}", board.score)),
        Line::from(Span::styled("Moves", Style::default().fg(TermColor::Green))),
        Line::from(format!("{}", session.moves_remaining(player))),
        Line::from(Span::styled("Nuisance", Style::default().fg(TermColor::Red))),
        Line::from(tray),
    ]);

    let paragraph = Paragraph::new(lines).alignment(Alignment::Center);
    frame.render_widget(paragraph, inner);
}

fn render_log(frame: &mut Frame, log: &VecDeque<String>, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Log ")
        .title_alignment(Alignment::Center);
    let lines: Vec<Line> = log.iter().map(|entry| Line::from(entry.as_str())).collect();
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let horizontal = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width.min(area.width)),
        Constraint::Fill(1),
    ])
    .split(area);

    let vertical = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height.min(area.height)),
        Constraint::Fill(1),
    ])
    .split(horizontal[1]);

    vertical[1]
}

// ============================================================================
// Main Loop
// ============================================================================

fn command_for(code: KeyCode) -> Option<Command> {
    match code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('A') => Some(Command::MoveLeft),
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('D') => Some(Command::MoveRight),
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('S') => Some(Command::SoftDrop),
        KeyCode::Char('x') | KeyCode::Char('X') => Some(Command::RotateCw),
        KeyCode::Char('z') | KeyCode::Char('Z') => Some(Command::RotateCcw),
        _ => None,
    }
}

fn drain_events(session: &mut GameSession, log: &mut VecDeque<String>) {
    for line in session.take_events().iter().filter_map(describe) {
        if log.len() == LOG_LINES {
            log.pop_front();
        }
        log.push_back(line);
    }
}

/// Advances resolution to the next pass that changed the grid.
fn advance_visible(session: &mut GameSession) {
    while let Some(report) = session.step() {
        if report.visible() {
            break;
        }
    }
}

fn run(terminal: &mut Terminal<CrosstermBackend<Stdout>>, args: &Args) -> Result<()> {
    let mut session = GameSession::new(args.rules()).context("invalid rules")?;
    let mut log = VecDeque::with_capacity(LOG_LINES);
    let tick = Duration::from_millis(args.tick_rate_ms);
    let pass_delay = Duration::from_millis(args.pass_delay_ms);
    let mut last_pass = Instant::now();

    loop {
        drain_events(&mut session, &mut log);
        terminal.draw(|frame| render(frame, &session, &log))?;

        let timeout = if session.is_resolving() {
            pass_delay
                .checked_sub(last_pass.elapsed())
                .unwrap_or(Duration::ZERO)
        } else {
            tick
        };

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    match key.code {
                        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('Q') => break,
                        KeyCode::Char('r') | KeyCode::Char('R') => session.reset(),
                        code => {
                            if let Some(command) = command_for(code) {
                                if session.apply(command) && session.is_resolving() {
                                    last_pass = Instant::now();
                                }
                            }
                        }
                    }
                }
            }
        }

        if session.is_resolving() && last_pass.elapsed() >= pass_delay {
            advance_visible(&mut session);
            last_pass = Instant::now();
        }
    }

    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Setup terminal
    enable_raw_mode().context("failed to enable raw mode")?;
    stdout()
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout());
    let mut terminal = Terminal::new(backend)?;

    let result = run(&mut terminal, &args);

    // Restore terminal
    let restored: io::Result<()> = disable_raw_mode()
        .and_then(|()| stdout().execute(LeaveAlternateScreen).map(|_| ()));
    result?;
    restored.context("failed to restore terminal")?;

    Ok(())
}

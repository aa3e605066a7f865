// Full-screen front end: main menu, settings screen and the game board
// Input arrives through crossterm (mouse and keys), rendering goes through ratatui

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::cursor::Show;
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Span, Spans, Text};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};
use ratatui::{Frame, Terminal};
use std::error::Error;
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use unicode_width::UnicodeWidthStr;

use crate::cs_board::{Board, ClickOutcome, FlagOutcome, MinePlacer, RandomPlacer};
use crate::cs_color::{symbol_style, WTMatch};
use crate::cs_config::{Settings, COLS_RANGE, ROWS_RANGE, TIME_LIMIT_RANGE};
use crate::cs_text::{fill, TEXT};

const MENU_ITEMS: usize = 3;
const SETTINGS_ITEMS: usize = 6;
const TIME_LIMIT_STEP: i64 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Screen {
    Menu,
    Settings,
    Game,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameResult {
    Won,
    Lost { row: usize, col: usize },
    TimedOut,
}

/// One game on the board screen
struct GameSession {
    board: Board,
    cursor: (usize, usize), // (row, col)
    start: Instant,
    elapsed: Duration, // frozen once the game ends
    result: Option<GameResult>,
    message: Option<&'static str>, // feedback for a rejected flag
}

impl GameSession {
    fn elapsed(&self) -> Duration {
        if self.result.is_some() {
            self.elapsed
        } else {
            self.start.elapsed()
        }
    }

    fn finish(&mut self, result: GameResult, now: Instant) {
        self.elapsed = now.saturating_duration_since(self.start);
        self.result = Some(result);
        info!(
            ?result,
            actions = self.board.actions_so_far(),
            secs = self.elapsed.as_secs_f64(),
            "game finished"
        );
    }

    fn move_cursor(&mut self, dr: isize, dc: isize) {
        let r = (self.cursor.0 as isize + dr).clamp(0, self.board.rows() as isize - 1);
        let c = (self.cursor.1 as isize + dc).clamp(0, self.board.cols() as isize - 1);
        self.cursor = (r as usize, c as usize);
    }
}

/// Screen state plus everything needed to map mouse positions back to items
pub struct App {
    settings: Settings,
    placer: Box<dyn MinePlacer>,
    screen: Screen,
    menu_index: usize,
    settings_index: usize,
    game: Option<GameSession>,
    exit: bool,
    // rects recorded during draw for hit-testing
    menu_rects: Vec<Rect>,
    settings_rects: Vec<Rect>,
    board_inner: Option<Rect>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        App::with_placer(settings, Box::new(RandomPlacer::thread()))
    }

    pub fn with_placer(settings: Settings, placer: Box<dyn MinePlacer>) -> Self {
        App {
            settings,
            placer,
            screen: Screen::Menu,
            menu_index: 0,
            settings_index: 0,
            game: None,
            exit: false,
            menu_rects: Vec::new(),
            settings_rects: Vec::new(),
            board_inner: None,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn into_settings(self) -> Settings {
        self.settings
    }

    pub fn should_exit(&self) -> bool {
        self.exit
    }

    pub fn handle_event(&mut self, ev: Event) -> crate::cs_error::Result<()> {
        match ev {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.handle_key(key),
            Event::Mouse(me) => self.handle_mouse(me),
            _ => Ok(()),
        }
    }

    /// Periodic update; ends a time-trial game once the limit has passed
    pub fn tick(&mut self, now: Instant) {
        if !self.settings.time_trial {
            return;
        }
        let limit = Duration::from_secs(self.settings.time_limit);
        if let Some(game) = self.game.as_mut() {
            if game.result.is_none() && now.saturating_duration_since(game.start) >= limit {
                game.finish(GameResult::TimedOut, now);
            }
        }
    }

    fn handle_key(&mut self, key: KeyEvent) -> crate::cs_error::Result<()> {
        match self.screen {
            Screen::Menu => match key.code {
                KeyCode::Up => self.menu_index = (self.menu_index + MENU_ITEMS - 1) % MENU_ITEMS,
                KeyCode::Down => self.menu_index = (self.menu_index + 1) % MENU_ITEMS,
                KeyCode::Enter => self.select_menu(self.menu_index)?,
                KeyCode::Esc | KeyCode::Char('q') => self.exit = true,
                _ => {}
            },
            Screen::Settings => match key.code {
                KeyCode::Up => {
                    self.settings_index = (self.settings_index + SETTINGS_ITEMS - 1) % SETTINGS_ITEMS
                }
                KeyCode::Down => self.settings_index = (self.settings_index + 1) % SETTINGS_ITEMS,
                KeyCode::Left => self.adjust_setting(-1),
                KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => self.adjust_setting(1),
                KeyCode::Esc => self.screen = Screen::Menu,
                _ => {}
            },
            Screen::Game => self.handle_game_key(key.code)?,
        }
        Ok(())
    }

    fn handle_game_key(&mut self, code: KeyCode) -> crate::cs_error::Result<()> {
        let Some(game) = self.game.as_mut() else {
            self.screen = Screen::Menu;
            return Ok(());
        };
        if game.result.is_some() {
            self.leave_game();
            return Ok(());
        }
        let cursor = game.cursor;
        match code {
            KeyCode::Up => game.move_cursor(-1, 0),
            KeyCode::Down => game.move_cursor(1, 0),
            KeyCode::Left => game.move_cursor(0, -1),
            KeyCode::Right => game.move_cursor(0, 1),
            KeyCode::Char(' ') | KeyCode::Enter => self.reveal_at(cursor)?,
            KeyCode::Char('f') | KeyCode::Char('F') => self.flag_at(cursor)?,
            KeyCode::Esc => self.leave_game(),
            _ => {}
        }
        Ok(())
    }

    fn handle_mouse(&mut self, me: MouseEvent) -> crate::cs_error::Result<()> {
        let hit = |rects: &[Rect]| rects.iter().position(|r| contains(*r, me.column, me.row));
        match self.screen {
            Screen::Menu => {
                if let Some(i) = hit(&self.menu_rects) {
                    self.menu_index = i;
                    if me.kind == MouseEventKind::Down(MouseButton::Left) {
                        self.select_menu(i)?;
                    }
                }
            }
            Screen::Settings => {
                if let Some(i) = hit(&self.settings_rects) {
                    match me.kind {
                        MouseEventKind::Down(MouseButton::Left) => {
                            self.settings_index = i;
                            self.adjust_setting(1);
                        }
                        MouseEventKind::Down(MouseButton::Right) => {
                            self.settings_index = i;
                            self.adjust_setting(-1);
                        }
                        _ => {}
                    }
                }
            }
            Screen::Game => {
                let finished = self.game.as_ref().is_none_or(|g| g.result.is_some());
                if finished {
                    if let MouseEventKind::Down(_) = me.kind {
                        self.leave_game();
                    }
                    return Ok(());
                }
                let Some(cell) = self.cell_at(me.column, me.row) else {
                    return Ok(());
                };
                match me.kind {
                    MouseEventKind::Down(MouseButton::Left) => self.reveal_at(cell)?,
                    MouseEventKind::Down(MouseButton::Right) => self.flag_at(cell)?,
                    MouseEventKind::Moved => {
                        if let Some(game) = self.game.as_mut() {
                            game.cursor = cell;
                        }
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    }

    fn select_menu(&mut self, index: usize) -> crate::cs_error::Result<()> {
        match index {
            0 => self.start_game()?,
            1 => self.screen = Screen::Settings,
            _ => self.exit = true,
        }
        debug!(screen = ?self.screen, "menu selection");
        Ok(())
    }

    fn start_game(&mut self) -> crate::cs_error::Result<()> {
        let s = &self.settings;
        let board = Board::new(s.grid_rows, s.grid_cols, s.mine_count())?;
        info!(
            rows = s.grid_rows,
            cols = s.grid_cols,
            mines = board.mine_count(),
            difficulty = s.difficulty.name(),
            time_trial = s.time_trial,
            "game started"
        );
        self.game = Some(GameSession {
            board,
            cursor: (0, 0),
            start: Instant::now(),
            elapsed: Duration::ZERO,
            result: None,
            message: None,
        });
        self.board_inner = None;
        self.screen = Screen::Game;
        Ok(())
    }

    fn leave_game(&mut self) {
        self.game = None;
        self.board_inner = None;
        self.screen = Screen::Menu;
    }

    /// Reveal action; flagged tiles are protected from clicks on this screen
    fn reveal_at(&mut self, (row, col): (usize, usize)) -> crate::cs_error::Result<()> {
        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };
        game.cursor = (row, col);
        game.message = None;
        if game.result.is_some() || game.board.tile(row, col)?.is_flagged() {
            return Ok(());
        }
        match game.board.click_with(row, col, self.placer.as_mut())? {
            ClickOutcome::Lost { row, col } => game.finish(GameResult::Lost { row, col }, Instant::now()),
            ClickOutcome::Won => game.finish(GameResult::Won, Instant::now()),
            ClickOutcome::Continue => {}
        }
        Ok(())
    }

    fn flag_at(&mut self, (row, col): (usize, usize)) -> crate::cs_error::Result<()> {
        let Some(game) = self.game.as_mut() else {
            return Ok(());
        };
        if game.result.is_some() {
            return Ok(());
        }
        game.cursor = (row, col);
        let outcome = game.board.toggle_flag(row, col)?;
        game.message = match outcome {
            FlagOutcome::AlreadyRevealed => Some(TEXT.flag_revealed),
            FlagOutcome::NoFlagsLeft => Some(TEXT.flag_none_left),
            _ => None,
        };
        if outcome.is_change() && game.board.check_win_condition() {
            game.finish(GameResult::Won, Instant::now());
        }
        Ok(())
    }

    fn adjust_setting(&mut self, delta: i64) {
        let s = &mut self.settings;
        match self.settings_index {
            0 => s.grid_rows = step(s.grid_rows as i64, delta, ROWS_RANGE) as usize,
            1 => s.grid_cols = step(s.grid_cols as i64, delta, COLS_RANGE) as usize,
            2 => {
                s.difficulty = if delta > 0 {
                    s.difficulty.next()
                } else {
                    s.difficulty.prev()
                }
            }
            3 => s.colours = !s.colours,
            4 => s.time_trial = !s.time_trial,
            _ => {
                let range = (TIME_LIMIT_RANGE.0 as usize, TIME_LIMIT_RANGE.1 as usize);
                s.time_limit = step(s.time_limit as i64, delta * TIME_LIMIT_STEP, range) as u64
            }
        }
        debug!(settings = ?self.settings, "settings changed");
    }

    fn cell_at(&self, x: u16, y: u16) -> Option<(usize, usize)> {
        let inner = self.board_inner?;
        let game = self.game.as_ref()?;
        if !contains(inner, x, y) {
            return None;
        }
        let row = (y - inner.y) as usize;
        let col = ((x - inner.x) / 2) as usize;
        game.board.in_bounds(row, col).then_some((row, col))
    }

    fn min_size(&self) -> (u16, u16) {
        match (&self.screen, &self.game) {
            (Screen::Game, Some(game)) => (
                70u16.max(game.board.cols() as u16 * 2 + 3),
                game.board.rows() as u16 + 9,
            ),
            _ => (40, 16),
        }
    }

    pub fn draw<B: Backend>(&mut self, f: &mut Frame<B>) {
        let size = f.size();
        let (min_w, min_h) = self.min_size();
        if size.width < min_w || size.height < min_h {
            draw_too_small(f, size, min_w, min_h);
            return;
        }
        match self.screen {
            Screen::Menu => self.draw_menu(f, size),
            Screen::Settings => self.draw_settings(f, size),
            Screen::Game => self.draw_game(f, size),
        }
    }

    fn draw_menu<B: Backend>(&mut self, f: &mut Frame<B>, size: Rect) {
        let select = Style::default()
            .fg(Color::Black.wtmatch())
            .bg(Color::White.wtmatch());
        let items = [TEXT.menu_play, TEXT.menu_settings, TEXT.menu_exit];

        let mut lines: Vec<Spans> = TEXT
            .logo
            .iter()
            .map(|l| Spans::from(Span::raw(*l)))
            .collect();
        lines.push(Spans::from(Span::raw("")));
        lines.push(Spans::from(Span::raw("")));
        let items_top = lines.len() as u16;
        for (i, item) in items.iter().enumerate() {
            let style = if i == self.menu_index { select } else { Style::default() };
            lines.push(Spans::from(Span::styled(*item, style)));
        }

        f.render_widget(Block::default().borders(Borders::ALL), size);
        let height = lines.len() as u16;
        let area = center_rect(size.width.saturating_sub(2), height, size);
        f.render_widget(Paragraph::new(Text::from(lines)).alignment(Alignment::Center), area);

        // centred alignment puts each item at (width - item width) / 2
        self.menu_rects = items
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let w = item.width() as u16;
                Rect::new(area.x + (area.width.saturating_sub(w)) / 2, area.y + items_top + i as u16, w, 1)
            })
            .collect();
    }

    fn draw_settings<B: Backend>(&mut self, f: &mut Frame<B>, size: Rect) {
        let s = &self.settings;
        let on_off = |b: bool| if b { TEXT.set_on } else { TEXT.set_off };
        let rows = [
            (TEXT.set_rows, s.grid_rows.to_string()),
            (TEXT.set_cols, s.grid_cols.to_string()),
            (TEXT.set_difficulty, s.difficulty.name().to_string()),
            (TEXT.set_colours, on_off(s.colours).to_string()),
            (TEXT.set_time_trial, on_off(s.time_trial).to_string()),
            (TEXT.set_time_limit, s.time_limit.to_string()),
        ];
        let select = Style::default()
            .fg(Color::Black.wtmatch())
            .bg(Color::White.wtmatch());

        let width = TEXT.set_help.width() as u16 + 4;
        let mrect = center_rect(width, SETTINGS_ITEMS as u16 + 5, size);
        let inner = Rect::new(mrect.x + 1, mrect.y + 1, mrect.width.saturating_sub(2), mrect.height.saturating_sub(2));
        let value_w = (inner.width as usize).saturating_sub(20);

        let mut lines = vec![Spans::from(Span::raw(""))];
        for (i, (label, value)) in rows.iter().enumerate() {
            let style = if i == self.settings_index { select } else { Style::default() };
            lines.push(Spans::from(Span::styled(
                format!(" {:<18}{:>w$} ", label, value, w = value_w),
                style,
            )));
        }
        lines.push(Spans::from(Span::raw("")));
        lines.push(Spans::from(Span::raw(format!(" {}", TEXT.set_help))));

        f.render_widget(Clear, mrect);
        f.render_widget(
            Paragraph::new(Text::from(lines)).block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(TEXT.set_title)
                    .title_alignment(Alignment::Center),
            ),
            mrect,
        );
        self.settings_rects = (0..SETTINGS_ITEMS)
            .map(|i| Rect::new(inner.x, inner.y + 1 + i as u16, inner.width, 1))
            .collect();
    }

    fn draw_game<B: Backend>(&mut self, f: &mut Frame<B>, size: Rect) {
        let Some(game) = self.game.as_ref() else {
            return;
        };
        let colours = self.settings.colours;
        let board = &game.board;
        let finished = game.result.is_some();
        let secs = game.elapsed().as_secs();

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(0)
            .constraints([Constraint::Length(4), Constraint::Min(3), Constraint::Length(3)].as_ref())
            .split(size);

        // header: banner for the current state plus help or the result line
        let logo = match game.result {
            None => TEXT.game_logo,
            Some(GameResult::Won) => TEXT.won_logo,
            Some(GameResult::Lost { .. }) => TEXT.lost_logo,
            Some(GameResult::TimedOut) => TEXT.timeout_logo,
        };
        let detail = if finished {
            let elapsed = format!("{:.3}", game.elapsed().as_secs_f64());
            fill(TEXT.elapsed_fmt, &[&board.actions_so_far(), &elapsed])
        } else {
            TEXT.game_help.to_string()
        };
        let header = vec![
            Spans::from(Span::styled(logo[0], Style::default().add_modifier(Modifier::BOLD))),
            Spans::from(Span::raw(logo[1])),
            Spans::from(Span::raw("")),
            Spans::from(Span::raw(detail)),
        ];
        f.render_widget(Paragraph::new(Text::from(header)).alignment(Alignment::Center), chunks[0]);

        // board
        let board_bg = Color::DarkGray.wtmatch();
        let cursor_bg = Color::LightBlue.wtmatch();
        let unopened_fg = Color::Gray.wtmatch();
        let base = if colours { Style::default().bg(board_bg) } else { Style::default() };
        let cause = match game.result {
            Some(GameResult::Lost { row, col }) => Some((row, col)),
            _ => None,
        };

        let board_area = center_rect((board.cols() * 2) as u16 + 3, board.rows() as u16 + 2, chunks[1]);
        let mut lines = Vec::with_capacity(board.rows());
        for (row, symbols) in board.symbol_rows(finished, cause).enumerate() {
            let mut spans = Vec::with_capacity(symbols.len() + 1);
            for (col, symbol) in symbols.into_iter().enumerate() {
                let mut style = base.patch(symbol_style(symbol, colours));
                if symbol == ' ' && colours {
                    style = style.fg(unopened_fg);
                }
                if !finished && game.cursor == (row, col) {
                    style = if colours { style.bg(cursor_bg) } else { style.add_modifier(Modifier::REVERSED) };
                }
                spans.push(Span::styled(format!(" {}", glyph(symbol)), style));
            }
            // right padding so the board background is symmetric
            spans.push(Span::styled(" ", base));
            lines.push(Spans::from(spans));
        }
        let paragraph = Paragraph::new(Text::from(lines))
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title(self.settings.difficulty.name())
                    .title_alignment(Alignment::Center),
            )
            .alignment(Alignment::Left);
        f.render_widget(paragraph, board_area);
        let inner = Rect::new(board_area.x + 1, board_area.y + 1, (board.cols() * 2) as u16, board.rows() as u16);

        // status row: counters on the left, key hint on the right
        let mut left = if self.settings.time_trial && !finished {
            let left_secs = self.settings.time_limit.saturating_sub(secs);
            fill(TEXT.status_trial_fmt, &[&board.flags_remaining(), &left_secs])
        } else {
            fill(TEXT.status_fmt, &[&board.flags_remaining(), &secs])
        };
        if let Some(msg) = game.message {
            left.push_str(&format!("  {} ", msg));
        }
        let right = if finished { TEXT.return_hint } else { TEXT.menu_hint };
        let inner_w = chunks[2].width.saturating_sub(2) as usize;
        let mid = inner_w.saturating_sub(left.width() + right.width() + 1).max(1);
        let status = Paragraph::new(Spans::from(vec![
            Span::raw(left),
            Span::raw(" ".repeat(mid)),
            Span::styled(right, Style::default().fg(Color::Yellow.wtmatch()).add_modifier(Modifier::BOLD)),
        ]))
        .block(Block::default().borders(Borders::ALL));
        f.render_widget(status, chunks[2]);

        self.board_inner = Some(inner);
    }
}

/// Enter the alternate screen, run the UI until the player exits, restore the terminal.
/// Settings edited on the settings screen are written back into `settings`.
pub fn run(settings: &mut Settings, placer: Box<dyn MinePlacer>) -> Result<(), Box<dyn Error>> {
    enable_raw_mode()?;
    let mut terminal = match enter_terminal(io::stdout()) {
        Ok(terminal) => terminal,
        Err(e) => {
            // raw mode is already on, undo it before reporting
            if let Err(restore) = leave_terminal(&mut io::stdout()) {
                warn!(error = %restore, "could not restore the terminal");
            }
            return Err(e.into());
        }
    };

    let mut app = App::with_placer(settings.clone(), placer);
    let res = event_loop(&mut terminal, &mut app);

    leave_terminal(terminal.backend_mut())?;

    *settings = app.into_settings();
    res
}

fn enter_terminal<W: Write>(mut out: W) -> io::Result<Terminal<CrosstermBackend<W>>> {
    execute!(out, EnableMouseCapture, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(out))?;
    terminal.hide_cursor()?;
    Ok(terminal)
}

fn leave_terminal<W: Write>(out: &mut W) -> io::Result<()> {
    disable_raw_mode()?;
    execute!(out, DisableMouseCapture, LeaveAlternateScreen, Show)
}

fn event_loop<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let tick_rate = Duration::from_millis(200);
    let mut last_tick = Instant::now();

    while !app.should_exit() {
        terminal.draw(|f| app.draw(f))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            app.handle_event(event::read()?)?;
        }
        if last_tick.elapsed() >= tick_rate {
            app.tick(Instant::now());
            last_tick = Instant::now();
        }
    }
    Ok(())
}

fn draw_too_small<B: Backend>(f: &mut Frame<B>, size: Rect, min_w: u16, min_h: u16) {
    let warn_lines = vec![
        Spans::from(Span::raw(TEXT.tsmsg_line1)),
        Spans::from(Span::raw(fill(TEXT.tsmsg_line2_fmt, &[&min_w, &min_h]))),
    ];
    let warn = Paragraph::new(Text::from(warn_lines))
        .block(Block::default().borders(Borders::ALL).title(TEXT.tsmsg_title))
        .alignment(Alignment::Center);
    f.render_widget(Clear, size);
    let w = 40u16.min(size.width.saturating_sub(2));
    let h = 5u16.min(size.height.saturating_sub(2));
    f.render_widget(warn, center_rect(w, h, size));
}

/// On-screen glyph for a board symbol
fn glyph(symbol: char) -> String {
    match symbol {
        ' ' => "■".to_string(),
        '0' => " ".to_string(),
        'P' => "⚑".to_string(),
        '*' | '#' => "☼".to_string(),
        d => d.to_string(),
    }
}

fn step(value: i64, delta: i64, range: (usize, usize)) -> i64 {
    (value + delta).clamp(range.0 as i64, range.1 as i64)
}

fn contains(r: Rect, x: u16, y: u16) -> bool {
    x >= r.x && x < r.x + r.width && y >= r.y && y < r.y + r.height
}

fn center_rect(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cs_board::FixedPlacer;
    use crate::cs_config::Difficulty;
    use crossterm::event::KeyModifiers;
    use ratatui::backend::TestBackend;

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> Event {
        Event::Mouse(MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        })
    }

    fn small_settings(difficulty: Difficulty) -> Settings {
        Settings {
            grid_rows: 5,
            grid_cols: 5,
            difficulty,
            colours: false,
            ..Settings::default()
        }
    }

    fn screen_text(app: &mut App, w: u16, h: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(w, h)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal
            .backend()
            .buffer()
            .content
            .iter()
            .map(|c| c.symbol.as_str())
            .collect()
    }

    #[test]
    fn menu_navigation() {
        let mut app = App::new(Settings::default());
        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.screen, Screen::Settings);
        app.handle_event(key(KeyCode::Esc)).unwrap();
        assert_eq!(app.screen, Screen::Menu);
        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert!(app.should_exit());
    }

    #[test]
    fn menu_wraps_upwards_to_exit() {
        let mut app = App::new(Settings::default());
        app.handle_event(key(KeyCode::Up)).unwrap();
        assert_eq!(app.menu_index, 2);
    }

    #[test]
    fn settings_are_adjusted_and_clamped() {
        let mut app = App::new(Settings::default());
        app.screen = Screen::Settings;
        for _ in 0..100 {
            app.handle_event(key(KeyCode::Right)).unwrap();
        }
        assert_eq!(app.settings().grid_rows, ROWS_RANGE.1);

        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Right)).unwrap();
        assert_eq!(app.settings().difficulty, Difficulty::Hard);
        app.handle_event(key(KeyCode::Left)).unwrap();
        app.handle_event(key(KeyCode::Left)).unwrap();
        assert_eq!(app.settings().difficulty, Difficulty::Easy);

        app.handle_event(key(KeyCode::Down)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert!(!app.settings().colours);

        app.handle_event(key(KeyCode::Up)).unwrap();
        app.handle_event(key(KeyCode::Up)).unwrap();
        app.handle_event(key(KeyCode::Up)).unwrap();
        app.handle_event(key(KeyCode::Up)).unwrap();
        assert_eq!(app.settings_index, 5);
        app.handle_event(key(KeyCode::Left)).unwrap();
        assert_eq!(app.settings().time_limit, 90);
    }

    #[test]
    fn keyboard_game_cascades_to_a_win() {
        let placer = FixedPlacer::new(vec![(4, 3), (4, 4)]);
        let mut app = App::with_placer(small_settings(Difficulty::Easy), Box::new(placer));
        app.handle_event(key(KeyCode::Enter)).unwrap();
        assert_eq!(app.screen, Screen::Game);

        app.handle_event(key(KeyCode::Char(' '))).unwrap();
        let game = app.game.as_ref().unwrap();
        assert_eq!(game.result, Some(GameResult::Won));
        assert_eq!(game.board.revealed_count(), 23);

        assert!(screen_text(&mut app, 80, 24).contains("YOU WIN!"));

        app.handle_event(key(KeyCode::Char('x'))).unwrap();
        assert_eq!(app.screen, Screen::Menu);
        assert!(app.game.is_none());
    }

    #[test]
    fn mouse_flag_protects_tile_and_loss_is_drawn() {
        let mines = vec![(0, 1), (1, 0), (1, 1), (3, 3), (3, 4), (4, 3)];
        let mut app = App::with_placer(small_settings(Difficulty::Brutal), Box::new(FixedPlacer::new(mines)));
        app.handle_event(key(KeyCode::Enter)).unwrap();
        screen_text(&mut app, 80, 24);
        let inner = app.board_inner.unwrap();

        // right click flags (0, 0), left click on it is ignored
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Right), inner.x + 1, inner.y))
            .unwrap();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), inner.x + 1, inner.y))
            .unwrap();
        {
            let board = &app.game.as_ref().unwrap().board;
            assert!(board.tile(0, 0).unwrap().is_flagged());
            assert!(!board.mines_placed());
        }

        // unflag and reveal it: three mined neighbours, no cascade
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Right), inner.x, inner.y))
            .unwrap();
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), inner.x, inner.y))
            .unwrap();
        {
            let game = app.game.as_ref().unwrap();
            assert_eq!(game.result, None);
            assert_eq!(game.board.tile(0, 0).unwrap().adjacent_mines(), Some(3));
            assert_eq!(game.board.revealed_count(), 1);
        }

        // (0, 1) is a mine
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), inner.x + 2, inner.y))
            .unwrap();
        assert_eq!(
            app.game.as_ref().unwrap().result,
            Some(GameResult::Lost { row: 0, col: 1 })
        );
        let text = screen_text(&mut app, 80, 24);
        assert!(text.contains("YOU LOSE."));
        assert!(text.contains(TEXT.return_hint));

        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), 0, 0))
            .unwrap();
        assert_eq!(app.screen, Screen::Menu);
    }

    #[test]
    fn flagging_revealed_tile_shows_message() {
        let mines = vec![(0, 1), (1, 0), (1, 1), (3, 3), (3, 4), (4, 3)];
        let mut app = App::with_placer(small_settings(Difficulty::Brutal), Box::new(FixedPlacer::new(mines)));
        app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(key(KeyCode::Char('f'))).unwrap();
        assert_eq!(app.game.as_ref().unwrap().message, Some(TEXT.flag_revealed));
        assert!(screen_text(&mut app, 80, 24).contains(TEXT.flag_revealed));
    }

    #[test]
    fn flagging_every_mine_wins() {
        let mines = vec![(0, 1), (1, 0), (1, 1), (3, 3), (3, 4), (4, 3)];
        let mut app = App::with_placer(small_settings(Difficulty::Brutal), Box::new(FixedPlacer::new(mines.clone())));
        app.handle_event(key(KeyCode::Enter)).unwrap();
        app.handle_event(key(KeyCode::Enter)).unwrap();
        for (r, c) in mines {
            app.flag_at((r, c)).unwrap();
        }
        assert_eq!(app.game.as_ref().unwrap().result, Some(GameResult::Won));
    }

    #[test]
    fn time_trial_runs_out() {
        let mut settings = small_settings(Difficulty::Easy);
        settings.time_trial = true;
        settings.time_limit = 10;
        let mut app = App::new(settings);
        app.handle_event(key(KeyCode::Enter)).unwrap();
        let start = app.game.as_ref().unwrap().start;

        app.tick(start + Duration::from_secs(5));
        assert_eq!(app.game.as_ref().unwrap().result, None);
        app.tick(start + Duration::from_secs(11));
        let game = app.game.as_ref().unwrap();
        assert_eq!(game.result, Some(GameResult::TimedOut));
        assert_eq!(game.elapsed().as_secs(), 11);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_setup_is_reported_and_restore_leaves_alternate_screen() {
        assert!(enter_terminal(BrokenPipe).is_err());

        let mut out = Vec::new();
        leave_terminal(&mut out).unwrap();
        let written = String::from_utf8(out).unwrap();
        assert!(written.contains("\x1b[?1049l"));
        assert!(written.contains("\x1b[?25h"));
    }

    #[test]
    fn in_game_status_shows_menu_hint() {
        let mut app = App::new(small_settings(Difficulty::Easy));
        app.handle_event(key(KeyCode::Enter)).unwrap();
        let text = screen_text(&mut app, 80, 24);
        assert!(text.contains(TEXT.menu_hint));
        assert!(!text.contains(TEXT.return_hint));
    }

    #[test]
    fn small_terminal_shows_warning() {
        let mut app = App::new(Settings::default());
        assert!(screen_text(&mut app, 30, 6).contains(TEXT.tsmsg_line1));
    }

    #[test]
    fn menu_mouse_selects_settings() {
        let mut app = App::new(Settings::default());
        screen_text(&mut app, 80, 24);
        let r = app.menu_rects[1];
        app.handle_event(mouse(MouseEventKind::Down(MouseButton::Left), r.x, r.y))
            .unwrap();
        assert_eq!(app.screen, Screen::Settings);
        assert!(screen_text(&mut app, 80, 24).contains(TEXT.set_help));
    }
}

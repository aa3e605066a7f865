// Plain prompt front end
// Reads line-oriented answers from any BufRead and prints the board as text

use std::error::Error;
use std::io::{BufRead, Write};
use tracing::info;

use crate::cs_board::{Board, ClickOutcome, FlagOutcome, MinePlacer};
use crate::cs_config::Difficulty;
use crate::cs_text::{fill, TEXT};

/// Accepted square board sizes
pub const SIZE_RANGE: (usize, usize) = (10, 50);

/// What the player wants to do with the chosen coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Exit,
    Return,
    Flag,
    Click,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GameEnd {
    Won,
    Lost,
    Quit,
}

/// One prompt session: a sequence of games sharing the same input and output
pub struct PromptSession<R, W> {
    input: R,
    out: W,
}

impl<R: BufRead, W: Write> PromptSession<R, W> {
    pub fn new(input: R, out: W) -> Self {
        PromptSession { input, out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Play games until the player declines another one or input ends
    pub fn run<P: MinePlacer>(&mut self, placer: &mut P) -> Result<(), Box<dyn Error>> {
        writeln!(self.out, "{}", TEXT.banner_rule)?;
        writeln!(self.out, "{}", TEXT.banner_title)?;
        writeln!(self.out, "{}\n", TEXT.banner_rule)?;
        writeln!(self.out, "{}\n", TEXT.banner_hint)?;

        loop {
            let Some(end) = self.play_one(placer)? else {
                return Ok(());
            };
            info!(?end, "prompt game finished");

            let Some(answer) = self.read_line(TEXT.ask_again)? else {
                return Ok(());
            };
            match answer.trim().to_uppercase().as_str() {
                "Y" | "YES" => continue,
                "N" | "NO" => {
                    writeln!(self.out, "{}", TEXT.logging_off)?;
                    return Ok(());
                }
                _ => {
                    writeln!(self.out, "{}", TEXT.goodbye)?;
                    writeln!(self.out, "{}", TEXT.logging_off)?;
                    return Ok(());
                }
            }
        }
    }

    /// Returns None when input ran out mid-game
    fn play_one<P: MinePlacer>(
        &mut self,
        placer: &mut P,
    ) -> Result<Option<GameEnd>, Box<dyn Error>> {
        let size_prompt = fill(TEXT.ask_size_fmt, &[&SIZE_RANGE.0, &SIZE_RANGE.1]);
        let Some(size) = self.ask_number(&size_prompt, SIZE_RANGE.0, SIZE_RANGE.1)? else {
            return Ok(None);
        };
        let Some(difficulty) = self.ask_difficulty()? else {
            return Ok(None);
        };

        let mut board = Board::new(size, size, difficulty.mine_count(size, size))?;
        info!(size, difficulty = difficulty.name(), mines = board.mine_count(), "prompt game started");
        self.print_board(&board, false, None)?;

        loop {
            let col_prompt = fill(TEXT.ask_col_fmt, &[&board.cols()]);
            let Some(col) = self.ask_number(&col_prompt, 1, board.cols())? else {
                return Ok(None);
            };
            let row_prompt = fill(TEXT.ask_row_fmt, &[&board.rows()]);
            let Some(row) = self.ask_number(&row_prompt, 1, board.rows())? else {
                return Ok(None);
            };
            let Some(choice) = self.ask_choice()? else {
                return Ok(None);
            };
            let (row, col) = (row - 1, col - 1);

            match choice {
                Choice::Exit => return Ok(Some(GameEnd::Quit)),
                Choice::Return => {}
                Choice::Flag => match board.toggle_flag(row, col)? {
                    FlagOutcome::AlreadyRevealed => writeln!(self.out, "{}", TEXT.flag_revealed)?,
                    FlagOutcome::NoFlagsLeft => writeln!(self.out, "{}", TEXT.flag_none_left)?,
                    FlagOutcome::Placed | FlagOutcome::Removed => {}
                },
                Choice::Click => {
                    if let ClickOutcome::Lost { row, col } = board.click_with(row, col, placer)? {
                        self.print_board(&board, true, Some((row, col)))?;
                        return Ok(Some(GameEnd::Lost));
                    }
                }
            }

            // flags alone can win, so check after every move
            if board.check_win_condition() {
                writeln!(self.out, "{}\n", TEXT.win_title)?;
                writeln!(self.out, "{}", fill(TEXT.win_actions_fmt, &[&board.actions_so_far()]))?;
                self.print_board(&board, true, None)?;
                return Ok(Some(GameEnd::Won));
            }
            self.print_board(&board, false, None)?;
        }
    }

    fn read_line(&mut self, prompt: &str) -> std::io::Result<Option<String>> {
        write!(self.out, "{}", prompt)?;
        self.out.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.out)?;
            return Ok(None);
        }
        Ok(Some(line.trim_end_matches(['\r', '\n']).to_string()))
    }

    /// Ask until an integer within lo..=hi is given; stray letters are ignored
    fn ask_number(&mut self, prompt: &str, lo: usize, hi: usize) -> std::io::Result<Option<usize>> {
        loop {
            let Some(line) = self.read_line(prompt)? else {
                return Ok(None);
            };
            match parse_number(&line) {
                Some(n) if (lo..=hi).contains(&n) => return Ok(Some(n)),
                Some(_) => writeln!(self.out, "{}", TEXT.err_range)?,
                None => writeln!(self.out, "{}", TEXT.err_parse)?,
            }
        }
    }

    fn ask_difficulty(&mut self) -> std::io::Result<Option<Difficulty>> {
        let Some(line) = self.read_line(TEXT.ask_difficulty)? else {
            return Ok(None);
        };
        match Difficulty::parse(&line) {
            Some(d) => Ok(Some(d)),
            None => {
                writeln!(self.out, "{}", TEXT.difficulty_fallback)?;
                Ok(Some(Difficulty::Normal))
            }
        }
    }

    fn ask_choice(&mut self) -> std::io::Result<Option<Choice>> {
        let Some(line) = self.read_line(TEXT.ask_action)? else {
            return Ok(None);
        };
        Ok(Some(match line.trim().to_uppercase().as_str() {
            "R" | "RETURN" => Choice::Return,
            "F" | "FLAG" => Choice::Flag,
            "C" | "CLICK" => Choice::Click,
            "EXIT" | "QUIT" => Choice::Exit,
            _ => {
                writeln!(self.out, "{}", TEXT.action_unknown)?;
                Choice::Return
            }
        }))
    }

    fn print_board(
        &mut self,
        board: &Board,
        reveal_all: bool,
        cause: Option<(usize, usize)>,
    ) -> Result<(), Box<dyn Error>> {
        let face = if cause.is_some() { TEXT.grid_lost } else { TEXT.grid_playing };
        writeln!(self.out, "{}", face)?;
        write!(self.out, "{}", format_grid(board, reveal_all, cause)?)?;
        writeln!(self.out, "{}\n", fill(TEXT.flags_left_fmt, &[&board.flags_remaining()]))?;
        Ok(())
    }
}

/// Integer with surrounding ASCII letters and whitespace stripped
fn parse_number(line: &str) -> Option<usize> {
    line.trim()
        .trim_matches(|c: char| c.is_ascii_alphabetic())
        .trim()
        .parse()
        .ok()
}

/// Text grid with 1-based column labels on top and row labels on the left
pub fn format_grid(
    board: &Board,
    reveal_all: bool,
    cause: Option<(usize, usize)>,
) -> crate::cs_error::Result<String> {
    let mut s = String::from("  ");
    for y in 1..=board.cols() {
        if y < 10 {
            s.push_str(&format!(" {} ", y));
        } else {
            s.push_str(&format!(" {}", y));
        }
    }
    s.push('\n');
    for row in 0..board.rows() {
        let x = row + 1;
        if x < 10 {
            s.push_str(&format!("{} ", x));
        } else {
            s.push_str(&x.to_string());
        }
        for symbol in board.row_symbols(row, reveal_all, cause)? {
            s.push('(');
            s.push(symbol);
            s.push(')');
        }
        s.push('\n');
    }
    Ok(s)
}

// Board engine: grid state, lazy mine placement, flood-fill reveal and flag accounting
// Both front ends drive a game exclusively through the operations below

use rand::rngs::ThreadRng;
use rand::seq::index;
use rand::Rng;
use tracing::{debug, trace};

use crate::cs_error::{BoardError, Result};

/// A single tile on the board
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tile {
    mine: bool,
    revealed: bool,
    flagged: bool,
    adj: Option<u8>, // None until mines are placed
}

impl Tile {
    pub fn has_mine(&self) -> bool {
        self.mine
    }

    pub fn is_revealed(&self) -> bool {
        self.revealed
    }

    pub fn is_flagged(&self) -> bool {
        self.flagged
    }

    /// Number of mines among the (up to) 8 neighbours.
    /// Unknown before the board's mines have been placed.
    pub fn adjacent_mines(&self) -> Option<u8> {
        self.adj
    }

    fn digit(&self) -> char {
        match self.adj {
            Some(n) => char::from(b'0' + n),
            None => ' ',
        }
    }
}

/// Result of uncovering a single tile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    Fine,
    Mine,
}

/// Result of a flag toggle; only `Placed` and `Removed` change the board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlagOutcome {
    Placed,
    Removed,
    AlreadyRevealed,
    NoFlagsLeft,
}

impl FlagOutcome {
    pub fn is_change(self) -> bool {
        matches!(self, FlagOutcome::Placed | FlagOutcome::Removed)
    }
}

/// Result of one reveal action as seen by a front end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClickOutcome {
    Continue,
    Won,
    Lost { row: usize, col: usize },
}

/// Strategy for choosing mine positions.
///
/// Implementations return `count` coordinates; the board validates them
/// (in bounds, distinct, never `forbidden`) before touching any tile.
pub trait MinePlacer {
    fn choose(
        &mut self,
        rows: usize,
        cols: usize,
        count: usize,
        forbidden: (usize, usize),
    ) -> Result<Vec<(usize, usize)>>;
}

/// Uniform placement over every cell except the forbidden one
#[derive(Debug, Clone)]
pub struct RandomPlacer<R: Rng> {
    rng: R,
}

impl RandomPlacer<ThreadRng> {
    pub fn thread() -> Self {
        RandomPlacer {
            rng: rand::thread_rng(),
        }
    }
}

impl<R: Rng> RandomPlacer<R> {
    pub fn new(rng: R) -> Self {
        RandomPlacer { rng }
    }
}

impl<R: Rng> MinePlacer for RandomPlacer<R> {
    fn choose(
        &mut self,
        rows: usize,
        cols: usize,
        count: usize,
        forbidden: (usize, usize),
    ) -> Result<Vec<(usize, usize)>> {
        let free = (rows * cols).saturating_sub(1);
        if count > free {
            return Err(BoardError::NoSafeCell);
        }
        // sample from the cells with the forbidden slot removed, then shift past it
        let skip = forbidden.0 * cols + forbidden.1;
        Ok(index::sample(&mut self.rng, free, count)
            .into_iter()
            .map(|i| if i >= skip { i + 1 } else { i })
            .map(|i| (i / cols, i % cols))
            .collect())
    }
}

/// Predetermined layout, for tests and replays
#[derive(Debug, Clone, Default)]
pub struct FixedPlacer {
    mines: Vec<(usize, usize)>,
}

impl FixedPlacer {
    pub fn new(mines: impl Into<Vec<(usize, usize)>>) -> Self {
        FixedPlacer {
            mines: mines.into(),
        }
    }
}

impl MinePlacer for FixedPlacer {
    fn choose(
        &mut self,
        _rows: usize,
        _cols: usize,
        count: usize,
        _forbidden: (usize, usize),
    ) -> Result<Vec<(usize, usize)>> {
        if self.mines.len() != count {
            return Err(BoardError::InvalidLayout(format!(
                "expected {} mines, layout has {}",
                count,
                self.mines.len()
            )));
        }
        Ok(self.mines.clone())
    }
}

/// Full board state for one game
#[derive(Debug, Clone)]
pub struct Board {
    rows: usize,
    cols: usize,
    mines: usize,
    grid: Vec<Vec<Tile>>,
    flags_left: usize,
    actions: usize,
    revealed: usize,
    mines_placed: bool,
}

impl Board {
    /// Create an empty board; mines are placed on the first reveal action
    pub fn new(rows: usize, cols: usize, mines: usize) -> Result<Self> {
        let cells = rows.saturating_mul(cols);
        if mines > cells {
            return Err(BoardError::Configuration { mines, cells });
        }
        Ok(Board {
            rows,
            cols,
            mines,
            grid: vec![vec![Tile::default(); cols]; rows],
            // deliberately more flags than mines
            flags_left: mines + (rows + cols) / 4,
            actions: 0,
            revealed: 0,
            mines_placed: false,
        })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn mine_count(&self) -> usize {
        self.mines
    }

    pub fn flags_remaining(&self) -> usize {
        self.flags_left
    }

    pub fn actions_so_far(&self) -> usize {
        self.actions
    }

    pub fn revealed_count(&self) -> usize {
        self.revealed
    }

    pub fn mines_placed(&self) -> bool {
        self.mines_placed
    }

    pub fn in_bounds(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn tile(&self, row: usize, col: usize) -> Result<&Tile> {
        self.check(row, col)?;
        Ok(&self.grid[row][col])
    }

    fn check(&self, row: usize, col: usize) -> Result<()> {
        if self.in_bounds(row, col) {
            Ok(())
        } else {
            Err(BoardError::OutOfBounds {
                row,
                col,
                rows: self.rows,
                cols: self.cols,
            })
        }
    }

    /// Place mines at random, keeping (row, col) safe
    pub fn place_mines(&mut self, row: usize, col: usize) -> Result<()> {
        self.place_mines_with(row, col, &mut RandomPlacer::thread())
    }

    /// Place mines chosen by `placer`, keeping (row, col) safe.
    /// Also computes the adjacency count of every tile.
    pub fn place_mines_with<P: MinePlacer + ?Sized>(
        &mut self,
        row: usize,
        col: usize,
        placer: &mut P,
    ) -> Result<()> {
        self.check(row, col)?;
        if self.mines_placed {
            return Err(BoardError::AlreadyPlaced);
        }
        let cells = self.rows.saturating_mul(self.cols);
        if self.mines == cells {
            return Err(BoardError::NoSafeCell);
        }

        let coords = placer.choose(self.rows, self.cols, self.mines, (row, col))?;
        self.validate_layout(&coords, (row, col))?;

        for &(r, c) in &coords {
            self.grid[r][c].mine = true;
        }
        for r in 0..self.rows {
            for c in 0..self.cols {
                let adj = neighbours(self.rows, self.cols, r, c)
                    .filter(|&(nr, nc)| self.grid[nr][nc].mine)
                    .count() as u8;
                self.grid[r][c].adj = Some(adj);
            }
        }
        self.mines_placed = true;
        debug!(
            rows = self.rows,
            cols = self.cols,
            mines = self.mines,
            forbidden = ?(row, col),
            "mines placed"
        );
        Ok(())
    }

    fn validate_layout(&self, coords: &[(usize, usize)], forbidden: (usize, usize)) -> Result<()> {
        if coords.len() != self.mines {
            return Err(BoardError::InvalidLayout(format!(
                "expected {} mines, got {}",
                self.mines,
                coords.len()
            )));
        }
        let mut seen = vec![false; self.rows * self.cols];
        for &(r, c) in coords {
            if !self.in_bounds(r, c) {
                return Err(BoardError::InvalidLayout(format!("({}, {}) is off the board", r, c)));
            }
            if (r, c) == forbidden {
                return Err(BoardError::InvalidLayout(format!(
                    "({}, {}) must stay free of mines",
                    r, c
                )));
            }
            let idx = r * self.cols + c;
            if seen[idx] {
                return Err(BoardError::InvalidLayout(format!("({}, {}) listed twice", r, c)));
            }
            seen[idx] = true;
        }
        Ok(())
    }

    /// Uncover (row, col). Mines must be placed first (see [`Board::click`]).
    /// - Already revealed tiles are left alone
    /// - A mine is reported and nothing else changes
    /// - Otherwise the flag is cleared (and returned to the budget) and zero tiles
    ///   cascade to their neighbours, stopping at numbered tiles
    pub fn reveal(&mut self, row: usize, col: usize) -> Result<RevealOutcome> {
        self.check(row, col)?;
        if !self.mines_placed {
            return Err(BoardError::NotPlaced);
        }
        if self.grid[row][col].revealed {
            return Ok(RevealOutcome::Fine);
        }

        let before = self.revealed;
        let mut work = vec![(row, col)];
        while let Some((r, c)) = work.pop() {
            let tile = &mut self.grid[r][c];
            if tile.revealed {
                continue;
            }
            tile.revealed = true;
            self.revealed += 1;
            if tile.mine {
                // only the requested tile can be a mine: zero tiles have no mined neighbours
                return Ok(RevealOutcome::Mine);
            }
            if tile.flagged {
                tile.flagged = false;
                self.flags_left += 1;
            }
            if tile.adj == Some(0) {
                for (nr, nc) in neighbours(self.rows, self.cols, r, c) {
                    if !self.grid[nr][nc].revealed {
                        work.push((nr, nc));
                    }
                }
            }
        }
        trace!(row, col, uncovered = self.revealed - before, "reveal");
        Ok(RevealOutcome::Fine)
    }

    /// Flag or unflag (row, col); removing a flag is always allowed
    pub fn toggle_flag(&mut self, row: usize, col: usize) -> Result<FlagOutcome> {
        self.check(row, col)?;
        let tile = &mut self.grid[row][col];
        Ok(if tile.revealed {
            FlagOutcome::AlreadyRevealed
        } else if tile.flagged {
            tile.flagged = false;
            self.flags_left += 1;
            FlagOutcome::Removed
        } else if self.flags_left == 0 {
            FlagOutcome::NoFlagsLeft
        } else {
            tile.flagged = true;
            self.flags_left -= 1;
            FlagOutcome::Placed
        })
    }

    /// True when every safe tile is revealed or every mine is flagged.
    /// Flags on safe tiles do not count against the player.
    pub fn check_win_condition(&self) -> bool {
        if self.revealed + self.mines == self.rows * self.cols {
            return true;
        }
        if !self.mines_placed {
            return false;
        }
        let flagged_mines = self
            .grid
            .iter()
            .flatten()
            .filter(|t| t.mine && t.flagged)
            .count();
        flagged_mines == self.mines
    }

    /// One reveal action: places mines on the first action, reveals, and reports
    /// the game outcome
    pub fn click(&mut self, row: usize, col: usize) -> Result<ClickOutcome> {
        self.click_with(row, col, &mut RandomPlacer::thread())
    }

    /// Same as [`Board::click`] with an explicit placement strategy for the first action
    pub fn click_with<P: MinePlacer + ?Sized>(
        &mut self,
        row: usize,
        col: usize,
        placer: &mut P,
    ) -> Result<ClickOutcome> {
        self.check(row, col)?;
        if !self.mines_placed {
            self.place_mines_with(row, col, placer)?;
        }
        let outcome = self.reveal(row, col)?;
        self.actions += 1;
        Ok(match outcome {
            RevealOutcome::Mine => {
                debug!(row, col, actions = self.actions, "mine hit");
                ClickOutcome::Lost { row, col }
            }
            RevealOutcome::Fine if self.check_win_condition() => {
                debug!(actions = self.actions, "board cleared");
                ClickOutcome::Won
            }
            RevealOutcome::Fine => ClickOutcome::Continue,
        })
    }

    /// Display symbols for one row.
    /// - In play: adjacency digit when revealed, 'P' for a flag, blank otherwise
    /// - With `reveal_all`: '#' for the cause, '*' for mines, 'P' for flagged safe
    ///   tiles, digits for the rest
    pub fn row_symbols(
        &self,
        row: usize,
        reveal_all: bool,
        cause: Option<(usize, usize)>,
    ) -> Result<Vec<char>> {
        if row >= self.rows {
            return Err(BoardError::OutOfBounds {
                row,
                col: 0,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(self.symbols(row, reveal_all, cause))
    }

    /// Symbols for every row, top to bottom, as [`Board::row_symbols`] gives them
    pub fn symbol_rows(
        &self,
        reveal_all: bool,
        cause: Option<(usize, usize)>,
    ) -> impl Iterator<Item = Vec<char>> + '_ {
        (0..self.rows).map(move |row| self.symbols(row, reveal_all, cause))
    }

    fn symbols(&self, row: usize, reveal_all: bool, cause: Option<(usize, usize)>) -> Vec<char> {
        self.grid[row]
            .iter()
            .enumerate()
            .map(|(col, tile)| {
                if reveal_all {
                    if cause == Some((row, col)) {
                        '#'
                    } else if tile.mine {
                        '*'
                    } else if tile.flagged {
                        'P'
                    } else {
                        tile.digit()
                    }
                } else if tile.revealed {
                    tile.digit()
                } else if tile.flagged {
                    'P'
                } else {
                    ' '
                }
            })
            .collect()
    }
}

/// In-bounds cells at Chebyshev distance 1 from (row, col)
fn neighbours(
    rows: usize,
    cols: usize,
    row: usize,
    col: usize,
) -> impl Iterator<Item = (usize, usize)> {
    let r_hi = (row + 1).min(rows - 1);
    let c_lo = col.saturating_sub(1);
    let c_hi = (col + 1).min(cols - 1);
    (row.saturating_sub(1)..=r_hi)
        .flat_map(move |r| (c_lo..=c_hi).map(move |c| (r, c)))
        .filter(move |&cell| cell != (row, col))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn neighbours_are_clipped_at_edges() {
        assert_eq!(neighbours(3, 3, 0, 0).count(), 3);
        assert_eq!(neighbours(3, 3, 0, 1).count(), 5);
        assert_eq!(neighbours(3, 3, 1, 1).count(), 8);
        assert_eq!(neighbours(1, 1, 0, 0).count(), 0);
        assert!(neighbours(3, 3, 2, 2).all(|(r, c)| r >= 1 && c >= 1 && (r, c) != (2, 2)));
    }

    #[test]
    fn random_placer_never_picks_forbidden() {
        let mut placer = RandomPlacer::new(StdRng::seed_from_u64(7));
        for seed_round in 0..50 {
            let forbidden = (seed_round % 4, (seed_round / 4) % 4);
            let picks = placer.choose(4, 4, 15, forbidden).unwrap();
            assert_eq!(picks.len(), 15);
            assert!(!picks.contains(&forbidden));
        }
    }

    #[test]
    fn random_placer_rejects_full_board() {
        let mut placer = RandomPlacer::new(StdRng::seed_from_u64(1));
        assert_eq!(placer.choose(2, 2, 4, (0, 0)), Err(BoardError::NoSafeCell));
    }

    #[test]
    fn fixed_layout_is_validated_before_mutation() {
        let mut board = Board::new(3, 3, 2).unwrap();
        let err = board
            .place_mines_with(0, 0, &mut FixedPlacer::new(vec![(1, 1), (1, 1)]))
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidLayout(_)));
        assert!(!board.mines_placed());
        assert!((0..3).all(|r| (0..3).all(|c| !board.tile(r, c).unwrap().has_mine())));

        let err = board
            .place_mines_with(0, 0, &mut FixedPlacer::new(vec![(0, 0), (1, 1)]))
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidLayout(_)));

        let err = board
            .place_mines_with(0, 0, &mut FixedPlacer::new(vec![(3, 0), (1, 1)]))
            .unwrap_err();
        assert!(matches!(err, BoardError::InvalidLayout(_)));
    }

    #[test]
    fn adjacency_hidden_until_placement() {
        let mut board = Board::new(2, 2, 1).unwrap();
        assert_eq!(board.tile(0, 0).unwrap().adjacent_mines(), None);
        board
            .place_mines_with(0, 0, &mut FixedPlacer::new(vec![(1, 1)]))
            .unwrap();
        assert_eq!(board.tile(0, 0).unwrap().adjacent_mines(), Some(1));
    }

    #[test]
    fn revealing_flagged_safe_tile_refunds_the_flag() {
        let mut board = Board::new(3, 3, 1).unwrap();
        board
            .place_mines_with(0, 0, &mut FixedPlacer::new(vec![(2, 2)]))
            .unwrap();
        let budget = board.flags_remaining();
        assert_eq!(board.toggle_flag(1, 2).unwrap(), FlagOutcome::Placed);
        assert_eq!(board.flags_remaining(), budget - 1);
        board.reveal(0, 0).unwrap();
        assert!(!board.tile(1, 2).unwrap().is_flagged());
        assert!(board.tile(1, 2).unwrap().is_revealed());
        assert_eq!(board.flags_remaining(), budget);
    }
}

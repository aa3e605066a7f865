// Error types shared by the board engine and the settings layer

use thiserror::Error;

/// Failures reported by the board engine.
///
/// Rejected-but-valid moves (flagging a revealed tile, flagging with an empty
/// budget) are not errors; they come back as a [`crate::cs_board::FlagOutcome`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BoardError {
    #[error("the quantity of mines ({mines}) cannot exceed the size of the board ({cells})")]
    Configuration { mines: usize, cells: usize },
    #[error("mines have already been placed on this board")]
    AlreadyPlaced,
    #[error("mines have not been placed yet, start the board with a click")]
    NotPlaced,
    #[error("({row}, {col}) is outside the {rows}x{cols} board")]
    OutOfBounds {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
    #[error("every cell holds a mine, the first reveal cannot be kept safe")]
    NoSafeCell,
    #[error("invalid mine layout: {0}")]
    InvalidLayout(String),
}

/// Failures while writing the settings document back to disk.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("settings I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("settings could not be serialized: {0}")]
    Serialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, BoardError>;

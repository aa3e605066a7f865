// Terminal Minesweeper: board engine, plain prompt front end and full-screen UI

pub mod cs_board; // Board state, mine placement and reveal rules
pub mod cs_color; // Cross-platform color matching and board symbol styles
pub mod cs_config; // Difficulty table and persisted settings
pub mod cs_error; // Error types
pub mod cs_prompt; // Line-oriented prompt game
pub mod cs_text; // User-facing strings
pub mod cs_ui; // Full-screen rendering and event handling

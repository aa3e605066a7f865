// User-facing strings shared by both front ends
// Format strings use "{}" placeholders, filled in order by `fill`

use std::fmt::Display;

pub struct Assets {
    // Plain prompt banner
    pub banner_rule: &'static str,
    pub banner_title: &'static str,
    pub banner_hint: &'static str,

    // Plain prompt questions
    pub ask_size_fmt: &'static str, // "Give me a board size between {} and {}: "
    pub ask_difficulty: &'static str,
    pub ask_col_fmt: &'static str,
    pub ask_row_fmt: &'static str,
    pub ask_action: &'static str,
    pub ask_again: &'static str,

    // Plain prompt complaints
    pub err_range: &'static str,
    pub err_parse: &'static str,
    pub difficulty_fallback: &'static str,
    pub action_unknown: &'static str,

    // Flag results
    pub flag_revealed: &'static str,
    pub flag_none_left: &'static str,
    pub flags_left_fmt: &'static str,

    // Grid headers
    pub grid_playing: &'static str,
    pub grid_lost: &'static str,

    // Results
    pub win_title: &'static str,
    pub win_actions_fmt: &'static str,
    pub goodbye: &'static str,
    pub logging_off: &'static str,

    // Full-screen logo and menu
    pub logo: [&'static str; 4],
    pub menu_play: &'static str,
    pub menu_settings: &'static str,
    pub menu_exit: &'static str,

    // Full-screen game banners
    pub game_logo: [&'static str; 2],
    pub won_logo: [&'static str; 2],
    pub lost_logo: [&'static str; 2],
    pub timeout_logo: [&'static str; 2],
    pub status_fmt: &'static str, // " Flags left: {}   Time: {}s "
    pub status_trial_fmt: &'static str,
    pub game_help: &'static str,
    pub elapsed_fmt: &'static str,
    pub return_hint: &'static str,
    pub menu_hint: &'static str,

    // Settings screen
    pub set_title: &'static str,
    pub set_rows: &'static str,
    pub set_cols: &'static str,
    pub set_difficulty: &'static str,
    pub set_colours: &'static str,
    pub set_time_trial: &'static str,
    pub set_time_limit: &'static str,
    pub set_on: &'static str,
    pub set_off: &'static str,
    pub set_help: &'static str,

    // Terminal size messages
    pub tsmsg_title: &'static str,
    pub tsmsg_line1: &'static str,
    pub tsmsg_line2_fmt: &'static str,
}

pub const TEXT: Assets = Assets {
    banner_rule: "--------------------------------------",
    banner_title: "   WELCOME TO THE FUNNY CURSEDSWEEPER  ",
    banner_hint: "Please enter your first coordinates.",

    ask_size_fmt: "Give me a board size between {} and {}: ",
    ask_difficulty: "Easy, Normal, Hard, Brutal? (E, N, H, B): ",
    ask_col_fmt: "X co-ordinate from LEFT, as an integer from 1-{}: ",
    ask_row_fmt: "Y co-ordinate from TOP, as an integer from 1-{}: ",
    ask_action: "Toggle Flag, Return, or Click (F, R, C)?: ",
    ask_again: "Try again? y/n?: ",

    err_range: "Can you even read? Try again.",
    err_parse: "Boi. Try something that makes sense this time.",
    difficulty_fallback: "Normal it is, then.",
    action_unknown: "I'm not going to deal with this. Returning to co-ordinate selection.",

    flag_revealed: "This cell is already clicked. Boi",
    flag_none_left: "You have no flags left.",
    flags_left_fmt: "Flags left: {}",

    grid_playing: "(^-^)7",
    grid_lost: "(*-*) YOU LOST",

    win_title: "Congratulation  Y O U  W I N",
    win_actions_fmt: "Did it in {} clicks. Pretty Spicy.",
    goodbye: "You're really just impossible to reason with, you know? Bbbbbye",
    logging_off: "Logging off...",

    logo: [
        "--------------------------------",
        "WELCOME TO CURSEDSWEEPER",
        "--------------v0.2--------------",
        "(*^-^*)/",
    ],
    menu_play: "Play",
    menu_settings: "Settings",
    menu_exit: "Exit",

    game_logo: ["MINESWEEPER TIME", "(>*-*)>"],
    won_logo: ["YOU WIN!", "\\(*^-^*)/"],
    lost_logo: ["YOU LOSE.", "(/>_<)/"],
    timeout_logo: ["OUT OF TIME.", "(/>_<)/"],
    status_fmt: " Flags left: {}   Time: {}s ",
    status_trial_fmt: " Flags left: {}   Time left: {}s ",
    game_help: "L-Click/Space: reveal   R-Click/F: flag   Arrows: move   Esc: menu",
    elapsed_fmt: "Did it in {} clicks. Time elapsed: {} seconds",
    return_hint: "Press any key to return to the menu",
    menu_hint: "Esc: Menu",

    set_title: "Settings",
    set_rows: "Rows",
    set_cols: "Columns",
    set_difficulty: "Difficulty",
    set_colours: "Colours",
    set_time_trial: "Time trial",
    set_time_limit: "Time limit (s)",
    set_on: "On",
    set_off: "Off",
    set_help: "Up/Down: select   Left/Right: change   Esc: back",

    tsmsg_title: "Resize Terminal",
    tsmsg_line1: "Terminal size too small.",
    tsmsg_line2_fmt: "Minimum required: {} x {}",
};

/// Substitute each "{}" in `fmt` with the next argument
pub fn fill(fmt: &str, args: &[&dyn Display]) -> String {
    let mut out = String::with_capacity(fmt.len() + 8);
    let mut args = args.iter();
    let mut rest = fmt;
    while let Some(pos) = rest.find("{}") {
        out.push_str(&rest[..pos]);
        match args.next() {
            Some(arg) => out.push_str(&arg.to_string()),
            None => out.push_str("{}"),
        }
        rest = &rest[pos + 2..];
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_in_order() {
        assert_eq!(fill(TEXT.ask_size_fmt, &[&10, &50]), "Give me a board size between 10 and 50: ");
        assert_eq!(fill(TEXT.flags_left_fmt, &[&3]), "Flags left: 3");
    }

    #[test]
    fn fill_leaves_unmatched_placeholders() {
        assert_eq!(fill("{} and {}", &[&"a"]), "a and {}");
        assert_eq!(fill("no args", &[&1]), "no args");
    }
}

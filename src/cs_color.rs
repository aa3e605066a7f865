use ratatui::style::{Color, Modifier, Style};
use std::sync::OnceLock;
use term_color_support::ColorSupport;

/// Windows Terminal "Campbell" palette: base colour, truecolor RGB, 256-colour index
const CAMPBELL: [(Color, (u8, u8, u8), u8); 16] = [
    (Color::Black, (12, 12, 12), 232),
    (Color::Red, (197, 15, 31), 160),
    (Color::Green, (19, 161, 14), 28),
    (Color::Yellow, (193, 156, 0), 178),
    (Color::Blue, (0, 55, 218), 20),
    (Color::Magenta, (136, 23, 152), 90),
    (Color::Cyan, (58, 150, 221), 38),
    (Color::Gray, (204, 204, 204), 250),
    (Color::DarkGray, (118, 118, 118), 243),
    (Color::LightRed, (231, 72, 86), 203),
    (Color::LightGreen, (22, 198, 12), 46),
    (Color::LightYellow, (249, 241, 165), 229),
    (Color::LightBlue, (59, 120, 255), 63),
    (Color::LightMagenta, (180, 0, 158), 163),
    (Color::LightCyan, (97, 214, 214), 116),
    (Color::White, (242, 242, 242), 255),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Depth {
    TrueColor,
    Indexed,
    Basic,
}

// detected once; the board is restyled every frame
fn depth() -> Depth {
    static DEPTH: OnceLock<Depth> = OnceLock::new();
    *DEPTH.get_or_init(|| {
        let support = ColorSupport::stdout();
        if support.has_16m {
            Depth::TrueColor
        } else if support.has_256 {
            Depth::Indexed
        } else {
            Depth::Basic
        }
    })
}

fn map_color(color: Color, depth: Depth) -> Color {
    let Some(&(_, (r, g, b), index)) = CAMPBELL.iter().find(|(c, _, _)| *c == color) else {
        return color;
    };
    match depth {
        Depth::TrueColor => Color::Rgb(r, g, b),
        Depth::Indexed => Color::Indexed(index),
        Depth::Basic => color,
    }
}

/// Extends ratatui's Color so the board looks the same across terminals
pub trait WTMatch {
    /// The Campbell variant of a named colour at the terminal's colour depth.
    /// Rgb and indexed colours pass through.
    fn wtmatch(self) -> Color;
}

impl WTMatch for Color {
    fn wtmatch(self) -> Color {
        map_color(self, depth())
    }
}

/// Style for a board symbol as produced by `Board::row_symbols`.
/// With colours off every symbol uses the plain style.
pub fn symbol_style(symbol: char, colours: bool) -> Style {
    if !colours {
        return Style::default();
    }
    match symbol {
        ' ' | '0' => Style::default(),
        '1' => Style::default().fg(Color::Green.wtmatch()),
        '2' => Style::default().fg(Color::Blue.wtmatch()),
        '3' => Style::default().fg(Color::Red.wtmatch()),
        'P' => Style::default()
            .fg(Color::Yellow.wtmatch())
            .add_modifier(Modifier::BOLD),
        '*' => Style::default()
            .fg(Color::Black.wtmatch())
            .bg(Color::White.wtmatch()),
        '#' => Style::default()
            .fg(Color::Black.wtmatch())
            .bg(Color::Red.wtmatch())
            .add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::Magenta.wtmatch()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_style_without_colours() {
        for symbol in ['1', 'P', '*', '#', '7'] {
            assert_eq!(symbol_style(symbol, false), Style::default());
        }
    }

    #[test]
    fn blank_and_zero_are_uncoloured() {
        assert_eq!(symbol_style(' ', true), Style::default());
        assert_eq!(symbol_style('0', true), Style::default());
    }

    #[test]
    fn palette_follows_depth() {
        assert_eq!(map_color(Color::Red, Depth::TrueColor), Color::Rgb(197, 15, 31));
        assert_eq!(map_color(Color::Red, Depth::Indexed), Color::Indexed(160));
        assert_eq!(map_color(Color::Red, Depth::Basic), Color::Red);
        assert_eq!(map_color(Color::Rgb(1, 2, 3), Depth::Indexed), Color::Rgb(1, 2, 3));
    }

    #[test]
    fn cause_is_highlighted() {
        let style = symbol_style('#', true);
        assert!(style.bg.is_some());
        assert!(style.add_modifier.contains(Modifier::BOLD));
    }
}

//! Terminal colors
//!
//! 256-color ANSI palette shared by the debugger, tester and picker views.

pub mod colors {
    pub const GREY: u8 = 102;      // #7D7D7D - Punctuation, secondary
    pub const AQUA: u8 = 109;      // #7A9EB5 - Numbers, info
    pub const PURPLE: u8 = 134;    // #9E54D6 - Selection marker
    pub const ORANGE: u8 = 208;    // #F2913D - Warnings, running
    pub const RED: u8 = 167;       // #E34F45 - Errors, failed steps
    pub const BLUE: u8 = 68;       // #426BD1 - Names, labels
    pub const PINK: u8 = 176;      // #DE85DE - Keys
    pub const GREEN: u8 = 71;      // #63C27A - Success, strings
    pub const YELLOW: u8 = 185;    // #CCCC3D - Booleans, null
    pub const WHITE: u8 = 250;     // Primary text
}

/// ANSI escape code constants
pub const RESET: &str = "\x1b[0m";
pub const BOLD: &str = "\x1b[1m";
pub const DIM: &str = "\x1b[2m";

/// Generate foreground color escape code
#[inline]
pub fn fg(color: u8) -> String {
    format!("\x1b[38;5;{}m", color)
}

/// Generate bold foreground color escape code
#[inline]
pub fn bold_fg(color: u8) -> String {
    format!("\x1b[1;38;5;{}m", color)
}

/// Colorize text with a foreground color
#[inline]
pub fn colorize(text: &str, color: u8) -> String {
    format!("{}{}{}", fg(color), text, RESET)
}

/// Colorize text with bold foreground color
#[inline]
pub fn bold(text: &str, color: u8) -> String {
    format!("{}{}{}", bold_fg(color), text, RESET)
}

/// Color helpers that become no-ops when colors are disabled
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    /// Colors on when stdout is a terminal and NO_COLOR is unset
    pub fn detect(preferred: bool) -> Self {
        let tty = atty::is(atty::Stream::Stdout);
        Self::new(preferred && tty && std::env::var_os("NO_COLOR").is_none())
    }

    pub fn plain() -> Self {
        Self::new(false)
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    fn paint(&self, text: &str, color: u8, strong: bool) -> String {
        match (self.enabled, strong) {
            (false, _) => text.to_string(),
            (true, true) => bold(text, color),
            (true, false) => colorize(text, color),
        }
    }

    pub fn success(&self, text: &str) -> String {
        self.paint(text, colors::GREEN, true)
    }

    pub fn error(&self, text: &str) -> String {
        self.paint(text, colors::RED, true)
    }

    pub fn warning(&self, text: &str) -> String {
        self.paint(text, colors::ORANGE, true)
    }

    pub fn info(&self, text: &str) -> String {
        self.paint(text, colors::AQUA, false)
    }

    pub fn label(&self, text: &str) -> String {
        self.paint(text, colors::BLUE, false)
    }

    pub fn key(&self, text: &str) -> String {
        self.paint(text, colors::PINK, false)
    }

    pub fn string(&self, text: &str) -> String {
        self.paint(text, colors::GREEN, false)
    }

    pub fn number(&self, text: &str) -> String {
        self.paint(text, colors::AQUA, false)
    }

    pub fn literal(&self, text: &str) -> String {
        self.paint(text, colors::YELLOW, false)
    }

    pub fn selected(&self, text: &str) -> String {
        self.paint(text, colors::PURPLE, true)
    }

    pub fn muted(&self, text: &str) -> String {
        self.paint(text, colors::GREY, false)
    }

    /// HTTP status code colored by class
    pub fn http_status(&self, code: u16) -> String {
        let color = match code / 100 {
            1 => colors::AQUA,
            2 => colors::GREEN,
            3 => colors::YELLOW,
            4 => colors::ORANGE,
            5 => colors::RED,
            _ => colors::GREY,
        };
        self.paint(&code.to_string(), color, true)
    }
}

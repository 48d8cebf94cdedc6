pub const RESET: &str = "\x1b[0m";
pub const DIM: &str = "\x1b[2m";

pub const RED: &str = "\x1b[31m";
pub const GREEN: &str = "\x1b[32m";
pub const YELLOW: &str = "\x1b[33m";
pub const MAGENTA: &str = "\x1b[35m";
pub const CYAN: &str = "\x1b[36m";
pub const BRIGHT_BLUE: &str = "\x1b[94m";
pub const BRIGHT_MAGENTA: &str = "\x1b[95m";

/// Context usage at which the warning color activates.
pub const CTX_WARN_THRESHOLD: u8 = 70;
/// Context usage at which the critical color activates.
pub const CTX_CRITICAL_THRESHOLD: u8 = 85;

pub const QUOTA_WARN_THRESHOLD: u8 = 75;
pub const QUOTA_CRITICAL_THRESHOLD: u8 = 90;

pub const BAR_WIDTH: usize = 10;

pub fn colorize(text: &str, color: &str) -> String {
    format!("{color}{text}{RESET}")
}

pub fn dim(text: &str) -> String {
    colorize(text, DIM)
}

pub fn context_color(percent: u8) -> &'static str {
    if percent >= CTX_CRITICAL_THRESHOLD {
        RED
    } else if percent >= CTX_WARN_THRESHOLD {
        YELLOW
    } else {
        GREEN
    }
}

pub fn quota_color(percent: u8) -> &'static str {
    if percent >= QUOTA_CRITICAL_THRESHOLD {
        RED
    } else if percent >= QUOTA_WARN_THRESHOLD {
        BRIGHT_MAGENTA
    } else {
        BRIGHT_BLUE
    }
}

/// `(filled, empty)` cells for a bar; always sums to `width`.
pub fn bar_cells(percent: u8, width: usize) -> (usize, usize) {
    let percent = percent.min(100) as f64;
    let filled = ((percent / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    (filled, width - filled)
}

fn block_bar(percent: u8, width: usize, color: &str) -> String {
    let (filled, empty) = bar_cells(percent, width);
    format!(
        "{color}{}{DIM}{}{RESET}",
        "█".repeat(filled),
        "░".repeat(empty)
    )
}

pub fn context_bar(percent: u8) -> String {
    let percent = percent.min(100);
    block_bar(percent, BAR_WIDTH, context_color(percent))
}

pub fn quota_bar(percent: u8) -> String {
    let percent = percent.min(100);
    block_bar(percent, BAR_WIDTH, quota_color(percent))
}

/// `NN%` in the context band color.
pub fn colored_percent(percent: u8) -> String {
    format!("{}{percent}%{RESET}", context_color(percent))
}

pub fn strip_ansi(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\x1b' {
            if chars.peek() == Some(&'[') {
                chars.next();
                for next in chars.by_ref() {
                    if next.is_ascii_alphabetic() {
                        break;
                    }
                }
            }
        } else {
            result.push(ch);
        }
    }
    result
}

pub fn visible_width(s: &str) -> usize {
    strip_ansi(s).chars().count()
}

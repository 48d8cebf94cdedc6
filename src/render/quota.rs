//! Decides whether and how subscription quota shows up in the HUD.

use chrono::{DateTime, Utc};

use crate::types::UsageData;

use super::{
    color::{colored_percent, colorize, dim, quota_bar, RED, YELLOW},
    fmt::format_reset_countdown,
};

/// The seven-day window only shows once it gets this close to the cap.
pub const SEVEN_DAY_SHOW_THRESHOLD: u8 = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuotaStyle {
    /// `5h: 42% (1h 5m)`; used for its own line and the compact layout.
    Text,
    /// `██░░ 42% (1h 5m / 5h)`; folded into the identity line.
    Bar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaOptions {
    pub show_usage: bool,
    pub usage_threshold: u8,
    pub style: QuotaStyle,
}

pub struct QuotaPresenter<'a> {
    usage: Option<&'a UsageData>,
    options: QuotaOptions,
    now: DateTime<Utc>,
}

impl<'a> QuotaPresenter<'a> {
    pub fn new(usage: Option<&'a UsageData>, options: QuotaOptions, now: DateTime<Utc>) -> Self {
        Self {
            usage,
            options,
            now,
        }
    }

    /// `None` when nothing should be shown.
    pub fn render(&self) -> Option<String> {
        if !self.options.show_usage {
            return None;
        }
        let usage = self.usage?;
        usage.plan_name.as_ref()?;

        let style = self.options.style;

        if usage.api_unavailable {
            let marker = match style {
                QuotaStyle::Text => "usage: ⚠",
                QuotaStyle::Bar => "⚠",
            };
            return Some(colorize(marker, YELLOW));
        }

        if usage.is_limit_reached() {
            let reset_at = if usage.five_hour == Some(100) {
                usage.five_hour_reset_at
            } else {
                usage.seven_day_reset_at
            };
            let reset = format_reset_countdown(reset_at, self.now);
            let text = match (style, reset.is_empty()) {
                (QuotaStyle::Text, true) => "⚠ Limit reached".to_string(),
                (QuotaStyle::Text, false) => format!("⚠ Limit reached (resets {reset})"),
                (QuotaStyle::Bar, true) => "⚠ Limit".to_string(),
                (QuotaStyle::Bar, false) => format!("⚠ Limit ({reset})"),
            };
            return Some(colorize(&text, RED));
        }

        let effective = usage.five_hour.unwrap_or(0).max(usage.seven_day.unwrap_or(0));
        if effective < self.options.usage_threshold {
            return None;
        }

        let five_hour = self.window_part(
            usage.five_hour,
            usage.five_hour_reset_at,
            "5h",
            true,
        );

        match usage.seven_day {
            Some(seven_day) if seven_day >= SEVEN_DAY_SHOW_THRESHOLD => {
                let seven_day = self.window_part(
                    Some(seven_day),
                    usage.seven_day_reset_at,
                    "7d",
                    style == QuotaStyle::Bar,
                );
                Some(format!("{five_hour} | {seven_day}"))
            }
            _ => Some(five_hour),
        }
    }

    fn window_part(
        &self,
        percent: Option<u8>,
        reset_at: Option<DateTime<Utc>>,
        window: &str,
        with_reset: bool,
    ) -> String {
        let display = percent_text(percent);
        let reset = if with_reset {
            format_reset_countdown(reset_at, self.now)
        } else {
            String::new()
        };

        match self.options.style {
            QuotaStyle::Bar => {
                let bar = quota_bar(percent.unwrap_or(0));
                if reset.is_empty() {
                    format!("{bar} {display}")
                } else {
                    format!("{bar} {display} ({reset} / {window})")
                }
            }
            QuotaStyle::Text => {
                if reset.is_empty() {
                    format!("{window}: {display}")
                } else {
                    format!("{window}: {display} ({reset})")
                }
            }
        }
    }
}

fn percent_text(percent: Option<u8>) -> String {
    match percent {
        Some(percent) => colored_percent(percent),
        None => dim("--"),
    }
}

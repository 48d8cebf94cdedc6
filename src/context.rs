use crate::{config::AutocompactBuffer, diagnostics::Diagnostics, types::SessionSnapshot};

/// Percentage points added to raw usage to approximate where auto-compaction
/// fires. Not user-configurable.
// TODO: confirm with product whether this should instead be a reserved token
// count divided by the window size; larger windows would then get a smaller offset.
pub const AUTOCOMPACT_BUFFER_PERCENT: f64 = 22.5;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContextPercent {
    /// Unrounded usage, used as the base for the buffered figure.
    pub exact: f64,
    pub raw: u8,
    pub buffered: u8,
}

impl ContextPercent {
    pub fn select(&self, mode: AutocompactBuffer) -> u8 {
        match mode {
            AutocompactBuffer::Enabled => self.buffered,
            AutocompactBuffer::Disabled => self.raw,
        }
    }
}

fn clamp_percent(value: f64) -> u8 {
    if !value.is_finite() {
        return 0;
    }
    value.round().clamp(0.0, 100.0) as u8
}

/// Compute raw and buffered usage. Missing data yields 0, never an error.
pub fn context_percent(snapshot: &SessionSnapshot) -> ContextPercent {
    let Some(window) = snapshot.context_window.as_ref() else {
        return ContextPercent::default();
    };

    let exact = match window.used_percentage.filter(|p| p.is_finite()) {
        Some(native) => native.clamp(0.0, 100.0),
        None => {
            let size = window.context_window_size.unwrap_or(0);
            if size == 0 {
                return ContextPercent::default();
            }
            let tokens = window
                .current_usage
                .as_ref()
                .map(|usage| usage.total())
                .unwrap_or(0);
            (tokens as f64 * 100.0 / size as f64).clamp(0.0, 100.0)
        }
    };

    let raw = clamp_percent(exact);
    let buffered = clamp_percent(exact + AUTOCOMPACT_BUFFER_PERCENT).max(raw);

    ContextPercent {
        exact,
        raw,
        buffered,
    }
}

/// The percentage the HUD displays, honoring the autocompact toggle.
pub fn display_percent(
    snapshot: &SessionSnapshot,
    mode: AutocompactBuffer,
    diagnostics: &Diagnostics,
) -> u8 {
    let percent = context_percent(snapshot);
    if mode == AutocompactBuffer::Disabled {
        diagnostics.debug(
            "context",
            format!(
                "autocompact_buffer=disabled, showing raw {}% (buffered would be {}%)",
                percent.raw, percent.buffered
            ),
        );
    }
    percent.select(mode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContextWindow, CurrentUsage};

    fn snapshot(size: Option<u64>, input: u64, native: Option<f64>) -> SessionSnapshot {
        SessionSnapshot {
            context_window: Some(ContextWindow {
                context_window_size: size,
                current_usage: Some(CurrentUsage {
                    input_tokens: Some(input),
                    ..Default::default()
                }),
                used_percentage: native,
                remaining_percentage: None,
            }),
            ..Default::default()
        }
    }

    #[test]
    fn raw_percent_from_tokens() {
        let p = context_percent(&snapshot(Some(200_000), 10_000, None));
        assert_eq!(p.raw, 5);
        assert_eq!(p.buffered, 28);
    }

    #[test]
    fn buffered_uses_unrounded_base() {
        // 67.5% raw rounds to 68, but 67.5 + 22.5 is exactly 90.
        let p = context_percent(&snapshot(Some(200_000), 135_000, None));
        assert_eq!(p.raw, 68);
        assert_eq!(p.buffered, 90);
    }

    #[test]
    fn native_percentage_wins_and_is_clamped() {
        let p = context_percent(&snapshot(Some(200_000), 10_000, Some(42.4)));
        assert_eq!(p.raw, 42);
        let p = context_percent(&snapshot(Some(200_000), 10_000, Some(140.0)));
        assert_eq!(p.raw, 100);
        assert_eq!(p.buffered, 100);
        let p = context_percent(&snapshot(Some(200_000), 10_000, Some(-3.0)));
        assert_eq!(p.raw, 0);
    }

    #[test]
    fn zero_or_missing_size_is_zero() {
        assert_eq!(context_percent(&snapshot(Some(0), 5_000, None)).raw, 0);
        assert_eq!(context_percent(&snapshot(None, 5_000, None)).buffered, 0);
        assert_eq!(context_percent(&SessionSnapshot::default()).raw, 0);
    }

    #[test]
    fn tokens_beyond_window_clamp_to_100() {
        let p = context_percent(&snapshot(Some(1_000), 5_000, None));
        assert_eq!(p.raw, 100);
        assert_eq!(p.buffered, 100);
    }

    #[test]
    fn buffered_never_below_raw_nor_above_100() {
        for native in 0..=100 {
            let p = context_percent(&snapshot(Some(100), 0, Some(native as f64)));
            assert!(p.buffered >= p.raw, "buffered < raw at {native}");
            assert!(p.buffered <= 100, "buffered > 100 at {native}");
        }
    }

    #[test]
    fn select_honors_mode() {
        let p = context_percent(&snapshot(Some(200_000), 10_000, None));
        assert_eq!(p.select(AutocompactBuffer::Enabled), 28);
        assert_eq!(p.select(AutocompactBuffer::Disabled), 5);
    }
}

use chrono::{DateTime, Utc};

/// Token counts for the breakdown suffix: `1.2M`, `135k`, `999`.
pub fn format_tokens(n: u64) -> String {
    if n >= 1_000_000 {
        let tenths = (n as f64 / 100_000.0).round() / 10.0;
        format!("{tenths:.1}M")
    } else if n >= 1_000 {
        format!("{}k", (n as f64 / 1_000.0).round() as u64)
    } else {
        n.to_string()
    }
}

/// Time until a quota window resets, rounded up to the minute.
/// Empty when unknown or already past.
pub fn format_reset_countdown(reset_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(reset_at) = reset_at else {
        return String::new();
    };
    let diff_ms = (reset_at - now).num_milliseconds();
    if diff_ms <= 0 {
        return String::new();
    }

    let minutes = (diff_ms + 59_999) / 60_000;
    if minutes < 60 {
        return format!("{minutes}m");
    }
    let hours = minutes / 60;
    let mins = minutes % 60;
    if mins > 0 {
        format!("{hours}h {mins}m")
    } else {
        format!("{hours}h")
    }
}

/// Wall time since the first transcript entry.
pub fn format_session_duration(start: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(start) = start else {
        return String::new();
    };
    let minutes = (now - start).num_minutes();
    if minutes < 1 {
        return "<1m".to_string();
    }
    if minutes < 60 {
        return format!("{minutes}m");
    }
    format!("{}h {}m", minutes / 60, minutes % 60)
}

/// Agent run time: `<1s`, `42s`, `3m 5s`.
pub fn format_elapsed(start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    let ms = (end - start).num_milliseconds().max(0);
    if ms < 1_000 {
        return "<1s".to_string();
    }
    if ms < 60_000 {
        return format!("{}s", (ms as f64 / 1_000.0).round() as i64);
    }
    let mins = ms / 60_000;
    let secs = ((ms % 60_000) as f64 / 1_000.0).round() as i64;
    format!("{mins}m {secs}s")
}

/// Cut `text` to at most `max_chars` characters, ending in `...` when cut.
pub fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let head: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{head}...")
}

/// Shorten a tool target path to `.../file.rs`, or a cut filename when even
/// that is too long.
pub fn truncate_path(path: &str, max_len: usize) -> String {
    let normalized = path.replace('\\', "/");
    if normalized.chars().count() <= max_len {
        return normalized;
    }

    let filename = normalized
        .rsplit('/')
        .find(|part| !part.is_empty())
        .unwrap_or(&normalized);

    if filename.chars().count() >= max_len {
        return truncate(filename, max_len);
    }
    format!(".../{filename}")
}

/// Last `levels` segments of `cwd`, split on either separator. Root is `/`.
pub fn project_path(cwd: &str, levels: u8) -> String {
    let segments: Vec<&str> = cwd.split(['/', '\\']).filter(|s| !s.is_empty()).collect();
    if segments.is_empty() {
        return "/".to_string();
    }
    let keep = (levels.max(1) as usize).min(segments.len());
    segments[segments.len() - keep..].join("/")
}

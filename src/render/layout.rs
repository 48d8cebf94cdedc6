use crate::{
    config::LineLayout,
    context::display_percent,
    diagnostics::Diagnostics,
    types::RenderContext,
    vcs::VcsStatus,
};

use super::{
    activity::{agent_lines, todos_line, tools_line},
    color::{colored_percent, colorize, context_bar, dim, visible_width, CYAN, MAGENTA, RESET, YELLOW},
    fmt::{format_tokens, project_path},
    quota::{QuotaOptions, QuotaPresenter, QuotaStyle},
};

const PART_SEPARATOR: &str = " | ";
const TOKEN_BREAKDOWN_THRESHOLD: u8 = 85;
const SEPARATOR_MIN_WIDTH: usize = 20;

/// Assembles the header and activity lines for one frame.
pub struct LineComposer<'a> {
    ctx: &'a RenderContext,
    percent: u8,
}

impl<'a> LineComposer<'a> {
    pub fn new(ctx: &'a RenderContext, diagnostics: &Diagnostics) -> Self {
        let percent = display_percent(
            &ctx.snapshot,
            ctx.config.display.autocompact_buffer,
            diagnostics,
        );
        Self { ctx, percent }
    }

    /// Context percentage after the autocompact toggle.
    pub fn percent(&self) -> u8 {
        self.percent
    }

    /// All lines in output order, before the terminal pass.
    pub fn compose(&self) -> Vec<String> {
        let header = self.header_lines();
        let activity = self.activity_lines();

        let mut lines = header;
        if self.ctx.config.line_layout == LineLayout::Compact
            && self.ctx.config.show_separators
            && !activity.is_empty()
        {
            let width = lines
                .iter()
                .map(|line| visible_width(line))
                .max()
                .unwrap_or(0)
                .max(SEPARATOR_MIN_WIDTH);
            lines.push(dim(&"─".repeat(width)));
        }
        lines.extend(activity);
        lines
    }

    pub fn header_lines(&self) -> Vec<String> {
        match self.ctx.config.line_layout {
            LineLayout::Compact => vec![self.session_line()],
            LineLayout::Expanded => self.expanded_lines(),
        }
    }

    pub fn activity_lines(&self) -> Vec<String> {
        let display = &self.ctx.config.display;
        let transcript = &self.ctx.transcript;
        let mut lines = Vec::new();

        if display.show_tools {
            lines.extend(tools_line(transcript));
        }
        if display.show_agents {
            lines.extend(agent_lines(transcript, self.ctx.now));
        }
        if display.show_todos {
            lines.extend(todos_line(&transcript.todos));
        }
        lines
    }

    fn session_line(&self) -> String {
        let mut parts = vec![self.identity_segment()];
        parts.extend(self.project_segment());
        parts.extend(self.config_count_parts());
        parts.extend(self.quota(QuotaStyle::Text));
        parts.extend(self.extra_label_segment());
        parts.extend(self.duration_segment());

        let mut line = parts.join(PART_SEPARATOR);
        line.push_str(&self.token_breakdown());
        line
    }

    fn expanded_lines(&self) -> Vec<String> {
        let display = &self.ctx.config.display;
        let mut lines = Vec::new();

        let mut identity = vec![self.identity_segment()];
        if display.usage_bar_enabled {
            identity.extend(self.quota(QuotaStyle::Bar));
        }
        identity.extend(self.extra_label_segment());
        identity.extend(self.duration_segment());
        let mut identity_line = identity.join(PART_SEPARATOR);
        identity_line.push_str(&self.token_breakdown());
        lines.push(identity_line);

        lines.extend(self.project_segment());

        let counts = self.config_count_parts();
        if !counts.is_empty() {
            lines.push(counts.join(PART_SEPARATOR));
        }

        if !display.usage_bar_enabled {
            lines.extend(self.quota(QuotaStyle::Text));
        }

        lines
    }

    /// `[Model | Plan] ███░░░░░░░ 28%`
    fn identity_segment(&self) -> String {
        let display = &self.ctx.config.display;
        let mut pieces = Vec::new();

        if display.show_model {
            let model = self.ctx.snapshot.model_name();
            let plan = self
                .ctx
                .usage
                .as_ref()
                .filter(|_| display.show_usage)
                .and_then(|usage| usage.plan_name.as_deref());
            let label = match plan {
                Some(plan) => format!("[{model} | {plan}]"),
                None => format!("[{model}]"),
            };
            pieces.push(colorize(&label, CYAN));
        }
        if display.show_context_bar {
            pieces.push(context_bar(self.percent));
        }
        pieces.push(colored_percent(self.percent));

        pieces.join(" ")
    }

    fn project_segment(&self) -> Option<String> {
        let cwd = self.ctx.snapshot.cwd.as_deref()?;
        let path = colorize(&project_path(cwd, self.ctx.config.path_levels), YELLOW);

        let vcs_config = &self.ctx.config.vcs;
        let vcs_part = match self.ctx.vcs_status.as_ref() {
            Some(status) if vcs_config.enabled => self.vcs_group(status),
            _ => String::new(),
        };

        Some(format!("{path}{vcs_part}"))
    }

    /// ` git:(main* ↑2 !3 ?1)`
    fn vcs_group(&self, status: &VcsStatus) -> String {
        let vcs_config = &self.ctx.config.vcs;
        let mut content = status.branch().to_string();

        match status {
            VcsStatus::Jj(jj) => {
                for label in &jj.labels {
                    content.push(',');
                    content.push_str(label);
                }
                if jj.has_conflicts {
                    content.push('⚠');
                }
                if vcs_config.show_dirty && jj.is_dirty {
                    content.push('*');
                }
            }
            VcsStatus::Git(git) => {
                if vcs_config.show_dirty && git.is_dirty {
                    content.push('*');
                }
                if vcs_config.show_ahead_behind {
                    if git.ahead > 0 {
                        content.push_str(&format!(" ↑{}", git.ahead));
                    }
                    if git.behind > 0 {
                        content.push_str(&format!(" ↓{}", git.behind));
                    }
                }
            }
        }

        if vcs_config.show_file_stats {
            if let Some(stats) = status.file_stats() {
                let mut stat_parts = Vec::new();
                if stats.modified > 0 {
                    stat_parts.push(format!("!{}", stats.modified));
                }
                if stats.added > 0 {
                    stat_parts.push(format!("+{}", stats.added));
                }
                if stats.deleted > 0 {
                    stat_parts.push(format!("✘{}", stats.deleted));
                }
                if stats.untracked > 0 {
                    stat_parts.push(format!("?{}", stats.untracked));
                }
                if !stat_parts.is_empty() {
                    content.push(' ');
                    content.push_str(&stat_parts.join(" "));
                }
            }
        }

        format!(
            " {}{}{}",
            colorize(&format!("{}:(", status.label()), MAGENTA),
            colorize(&content, CYAN),
            colorize(")", MAGENTA)
        )
    }

    fn config_count_parts(&self) -> Vec<String> {
        let display = &self.ctx.config.display;
        let counts = &self.ctx.counts;
        let total = counts.total();

        if !display.show_config_counts
            || total == 0
            || total < u32::from(display.environment_threshold)
        {
            return Vec::new();
        }

        [
            (counts.claude_md, "CLAUDE.md"),
            (counts.rules, "rules"),
            (counts.mcps, "MCPs"),
            (counts.hooks, "hooks"),
        ]
        .into_iter()
        .filter(|(count, _)| *count > 0)
        .map(|(count, label)| dim(&format!("{count} {label}")))
        .collect()
    }

    fn quota(&self, style: QuotaStyle) -> Option<String> {
        let display = &self.ctx.config.display;
        let options = QuotaOptions {
            show_usage: display.show_usage,
            usage_threshold: display.usage_threshold,
            style,
        };
        QuotaPresenter::new(self.ctx.usage.as_ref(), options, self.ctx.now).render()
    }

    fn extra_label_segment(&self) -> Option<String> {
        self.ctx
            .extra_label
            .as_deref()
            .filter(|label| !label.is_empty())
            .map(dim)
    }

    fn duration_segment(&self) -> Option<String> {
        if !self.ctx.config.display.show_duration || self.ctx.session_duration.is_empty() {
            return None;
        }
        Some(dim(&format!("⏱️  {}", self.ctx.session_duration)))
    }

    /// ` (in: 135k, cache: 2k)` once context is nearly full.
    fn token_breakdown(&self) -> String {
        if !self.ctx.config.display.show_token_breakdown
            || self.percent < TOKEN_BREAKDOWN_THRESHOLD
        {
            return String::new();
        }
        let Some(usage) = self.ctx.snapshot.current_usage() else {
            return String::new();
        };
        dim(&format!(
            " (in: {}, cache: {})",
            format_tokens(usage.input()),
            format_tokens(usage.cache())
        ))
    }
}

/// Reset any inherited styling and keep the host from collapsing spaces.
pub fn finalize_line(line: &str) -> String {
    format!("{RESET}{}", line.replace(' ', "\u{00A0}"))
}

/// Every output line, terminal-ready.
pub fn render_lines(ctx: &RenderContext, diagnostics: &Diagnostics) -> Vec<String> {
    LineComposer::new(ctx, diagnostics)
        .compose()
        .iter()
        .map(|line| finalize_line(line))
        .collect()
}

/// Deliver lines one at a time, in order, to `sink`.
pub fn render_to<F>(ctx: &RenderContext, diagnostics: &Diagnostics, mut sink: F)
where
    F: FnMut(&str),
{
    for line in render_lines(ctx, diagnostics) {
        sink(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::HudConfig,
        render::color::strip_ansi,
        types::{ContextWindow, CurrentUsage, ModelInfo, SessionSnapshot},
    };
    use chrono::{TimeZone, Utc};

    fn ctx(layout: LineLayout) -> RenderContext {
        let snapshot = SessionSnapshot {
            model: Some(ModelInfo {
                id: None,
                display_name: Some("Opus".to_string()),
            }),
            cwd: Some("/Users/dev/my-project".to_string()),
            context_window: Some(ContextWindow {
                context_window_size: Some(200_000),
                current_usage: Some(CurrentUsage {
                    input_tokens: Some(10_000),
                    ..Default::default()
                }),
                ..Default::default()
            }),
            ..Default::default()
        };
        let mut config = HudConfig::default();
        config.line_layout = layout;
        RenderContext::new(
            snapshot,
            config,
            Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
        )
    }

    fn plain(lines: &[String]) -> Vec<String> {
        lines.iter().map(|line| strip_ansi(line)).collect()
    }

    #[test]
    fn expanded_identity_and_project_lines() {
        let context = ctx(LineLayout::Expanded);
        let lines = plain(&LineComposer::new(&context, &Diagnostics::disabled()).compose());
        assert_eq!(lines, vec!["[Opus] ███░░░░░░░ 28%", "my-project"]);
    }

    #[test]
    fn compact_is_a_single_line() {
        let context = ctx(LineLayout::Compact);
        let lines = plain(&LineComposer::new(&context, &Diagnostics::disabled()).compose());
        assert_eq!(lines, vec!["[Opus] ███░░░░░░░ 28% | my-project"]);
    }

    #[test]
    fn finalize_prefixes_reset_and_swaps_spaces() {
        assert_eq!(finalize_line("a b"), "\x1b[0ma\u{00A0}b");
    }

    #[test]
    fn render_to_delivers_lines_in_order() {
        let context = ctx(LineLayout::Expanded);
        let mut seen = Vec::new();
        render_to(&context, &Diagnostics::disabled(), |line| {
            seen.push(line.to_string())
        });
        assert_eq!(seen.len(), 2);
        assert!(seen.iter().all(|line| line.starts_with(RESET)));
        assert!(!seen[0].contains(' '));
    }
}

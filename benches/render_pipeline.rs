use criterion::{criterion_group, criterion_main, Criterion};

use cc_hud::{
    config::{HudConfig, LineLayout},
    diagnostics::Diagnostics,
    providers::TranscriptParser,
    render::render_lines,
    types::{ConfigCounts, RenderContext, SessionSnapshot, UsageData},
    vcs::{FileStats, GitStatus, VcsStatus},
};
use chrono::{Duration, Utc};

fn baseline_snapshot() -> SessionSnapshot {
    serde_json::from_value(serde_json::json!({
        "cwd": "/Users/dev/projects/cc-hud",
        "model": { "id": "claude-opus-4", "display_name": "Opus" },
        "context_window": {
            "context_window_size": 200000,
            "current_usage": {
                "input_tokens": 120000,
                "cache_creation_input_tokens": 30000,
                "cache_read_input_tokens": 40000
            }
        }
    }))
    .unwrap()
}

fn busy_context(layout: LineLayout) -> RenderContext {
    let now = Utc::now();
    let mut config = HudConfig::default();
    config.line_layout = layout;
    config.show_separators = true;
    config.vcs.show_ahead_behind = true;
    config.vcs.show_file_stats = true;

    let mut ctx = RenderContext::new(baseline_snapshot(), config, now);
    ctx.vcs_status = Some(VcsStatus::Git(GitStatus {
        branch: "feature/render".to_string(),
        is_dirty: true,
        ahead: 3,
        behind: 1,
        file_stats: Some(FileStats {
            modified: 4,
            added: 1,
            deleted: 0,
            untracked: 2,
        }),
    }));
    ctx.counts = ConfigCounts {
        claude_md: 2,
        rules: 5,
        mcps: 3,
        hooks: 2,
    };
    ctx.usage = Some(UsageData {
        plan_name: Some("Max".to_string()),
        five_hour: Some(62),
        seven_day: Some(84),
        five_hour_reset_at: Some(now + Duration::minutes(95)),
        seven_day_reset_at: Some(now + Duration::hours(40)),
        api_unavailable: false,
    });
    ctx.extra_label = Some("staging".to_string());
    ctx.session_duration = "1h 12m".to_string();
    ctx.transcript = large_transcript(now);
    ctx
}

fn large_transcript(now: chrono::DateTime<Utc>) -> cc_hud::types::TranscriptActivity {
    let tool_names = ["Read", "Write", "Edit", "Bash", "Glob", "Grep", "Task"];
    let mut parser = TranscriptParser::new(now);
    for i in 0..2500 {
        let name = tool_names[i % tool_names.len()];
        let id = format!("tool-{i}");
        parser.push_line(
            &serde_json::json!({
                "type": "assistant",
                "message": { "content": [{
                    "type": "tool_use",
                    "id": &id,
                    "name": name,
                    "input": { "file_path": format!("/src/file{i}.rs"), "subagent_type": "explore" }
                }]}
            })
            .to_string(),
        );
        if i % 10 != 0 {
            parser.push_line(
                &serde_json::json!({
                    "type": "user",
                    "message": { "content": [{ "type": "tool_result", "tool_use_id": &id }] }
                })
                .to_string(),
            );
        }
    }
    parser.finish()
}

fn bench_compact_render(c: &mut Criterion) {
    let ctx = busy_context(LineLayout::Compact);
    let diagnostics = Diagnostics::disabled();
    c.bench_function("compact_render", |b| {
        b.iter(|| render_lines(&ctx, &diagnostics))
    });
}

fn bench_expanded_render(c: &mut Criterion) {
    let ctx = busy_context(LineLayout::Expanded);
    let diagnostics = Diagnostics::disabled();
    c.bench_function("expanded_render", |b| {
        b.iter(|| render_lines(&ctx, &diagnostics))
    });
}

fn bench_transcript_parse(c: &mut Criterion) {
    c.bench_function("transcript_parse_2500_tools", |b| {
        b.iter(|| large_transcript(Utc::now()))
    });
}

criterion_group!(
    benches,
    bench_compact_render,
    bench_expanded_render,
    bench_transcript_parse
);
criterion_main!(benches);

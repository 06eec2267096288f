//! Custom panic hook for structured crash reports.
//!
//! A panic inside a module worker is caught by the stage executor and the
//! module is counted as failed; for those the hook only logs a one-line
//! error naming the stage, module and tool. Any other panic ends the run,
//! and the hook prints a full report of what the pipeline was doing.

use std::panic::PanicHookInfo;

use super::context::{get_current_context, get_progress, PipelineContext};

const VERSION: &str = env!("CARGO_PKG_VERSION");
const RULE: &str = "════════════════════════════════════════════════════════════════════════════════";

/// Install the custom panic hook. Call early in `main`.
pub fn install_panic_hook() {
    std::panic::set_hook(Box::new(|info| {
        let context = get_current_context();
        if context.module.is_some() {
            log_item_panic(info, &context);
        } else {
            print_crash_report(info, &context);
        }
    }));
}

fn log_item_panic(info: &PanicHookInfo<'_>, context: &PipelineContext) {
    log::error!(
        "panic in {} stage on {}{}: {} ({})",
        context
            .stage
            .map(|s| s.name())
            .unwrap_or("unknown"),
        context
            .module
            .as_ref()
            .map(|m| m.display().to_string())
            .unwrap_or_default(),
        context
            .tool
            .as_ref()
            .map(|t| format!(" while running {t}"))
            .unwrap_or_default(),
        extract_panic_message(info),
        location(info).unwrap_or_default()
    );
}

fn print_crash_report(info: &PanicHookInfo<'_>, context: &PipelineContext) {
    let (processed, total) = get_progress();
    let timestamp = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");

    eprintln!();
    eprintln!("{RULE}");
    eprintln!("  WAVEBENCH CRASH REPORT");
    eprintln!("{RULE}");
    eprintln!("  Version:  {VERSION}");
    eprintln!("  Platform: {}", std::env::consts::OS);
    eprintln!("  Time:     {timestamp}");
    eprintln!("  PANIC:    {}", truncate(&extract_panic_message(info), 68));
    if let Some(loc) = location(info) {
        eprintln!("  Location: {}", truncate(&loc, 68));
    }
    eprintln!("{RULE}");

    match context.stage {
        Some(stage) => eprintln!("  Stage:    {stage}"),
        None => eprintln!("  Stage:    (not set - crash occurred before the pipeline started)"),
    }
    if let Some(tool) = &context.tool {
        eprintln!("  Tool:     {tool}");
    }
    if total > 0 {
        let pct = processed * 100 / total;
        eprintln!("  Progress: {processed} / {total} modules ({pct}%)");
    }
    eprintln!("{RULE}");

    if std::env::var("RUST_BACKTRACE").is_ok() {
        eprintln!("{}", std::backtrace::Backtrace::capture());
    } else {
        eprintln!("  Run with RUST_BACKTRACE=1 for stack trace");
    }
}

fn location(info: &PanicHookInfo<'_>) -> Option<String> {
    info.location()
        .map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column()))
}

fn extract_panic_message(info: &PanicHookInfo<'_>) -> String {
    if let Some(s) = info.payload().downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = info.payload().downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("short", 10), "short");
    }

    #[test]
    fn test_truncate_long_string() {
        let result = truncate("this is a long string that needs truncation", 20);
        assert_eq!(result.chars().count(), 20);
        assert!(result.ends_with("..."));
    }

    #[test]
    fn test_truncate_multibyte() {
        assert_eq!(truncate("ääääää", 5), "ää...");
    }
}

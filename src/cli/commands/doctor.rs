//! Doctor command - verify that Vidra can process videos and answer questions.

use crate::cli::preflight::check_tool;
use crate::cli::Output;
use crate::config::Settings;
use console::style;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Level {
    Ok,
    Warning,
    Error,
}

/// Outcome of one diagnostic.
#[derive(Debug)]
struct Finding {
    name: &'static str,
    level: Level,
    detail: String,
    hint: Option<&'static str>,
}

impl Finding {
    fn ok(name: &'static str, detail: impl Into<String>) -> Self {
        Self { name, level: Level::Ok, detail: detail.into(), hint: None }
    }

    fn warn(name: &'static str, detail: impl Into<String>, hint: &'static str) -> Self {
        Self { name, level: Level::Warning, detail: detail.into(), hint: Some(hint) }
    }

    fn fail(name: &'static str, detail: impl Into<String>, hint: &'static str) -> Self {
        Self { name, level: Level::Error, detail: detail.into(), hint: Some(hint) }
    }

    fn print(&self) {
        let icon = match self.level {
            Level::Ok => style("✓").green(),
            Level::Warning => style("!").yellow(),
            Level::Error => style("✗").red(),
        };
        println!("  {} {} - {}", icon, style(self.name).bold(), self.detail);
        if let Some(hint) = self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostics, grouped by section.
pub fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("Vidra Doctor");
    println!();

    let sections = [
        ("Media tools", vec![tool("ffmpeg"), tool("ffprobe")]),
        ("OpenAI", vec![api_key(std::env::var("OPENAI_API_KEY").ok().as_deref())]),
        ("Storage", storage(settings)),
        (
            "Configuration",
            vec![config_file(&Settings::default_config_path()), loaded_settings(settings)],
        ),
    ];

    for (title, findings) in &sections {
        println!("{}", style(title).bold());
        findings.iter().for_each(Finding::print);
        println!();
    }

    let count = |level| {
        sections
            .iter()
            .flat_map(|(_, findings)| findings)
            .filter(|f| f.level == level)
            .count()
    };

    match (count(Level::Error), count(Level::Warning)) {
        (0, 0) => Output::success("Everything looks good. Vidra is ready."),
        (0, warnings) => Output::warning(&format!("Ready, with {} warning(s).", warnings)),
        (errors, _) => {
            Output::error(&format!("{} problem(s) must be fixed before using Vidra.", errors));
            std::process::exit(1);
        }
    }

    Ok(())
}

fn tool(name: &'static str) -> Finding {
    match check_tool(name) {
        Ok(banner) if banner.chars().count() > 50 => {
            Finding::ok(name, format!("{}...", banner.chars().take(50).collect::<String>()))
        }
        Ok(banner) => Finding::ok(name, banner),
        Err(e) => Finding::fail(name, e.to_string(), ffmpeg_hint()),
    }
}

fn api_key(raw: Option<&str>) -> Finding {
    const NAME: &str = "OPENAI_API_KEY";
    match raw.filter(|key| !key.is_empty()) {
        None => Finding::fail(NAME, "not set", "Set with: export OPENAI_API_KEY='sk-...'"),
        Some(key) if key.starts_with("sk-") && key.len() > 20 && key.is_ascii() => {
            Finding::ok(NAME, format!("configured ({}...{})", &key[..7], &key[key.len() - 4..]))
        }
        Some(_) => Finding::warn(
            NAME,
            "set but format looks unusual",
            "Expected an OpenAI key starting with sk-",
        ),
    }
}

fn storage(settings: &Settings) -> Vec<Finding> {
    let data_dir = settings.data_dir();
    let data = if data_dir.exists() {
        Finding::ok("Data directory", data_dir.display().to_string())
    } else {
        Finding::warn(
            "Data directory",
            format!("{} (missing)", data_dir.display()),
            "Created on first use",
        )
    };

    let transcripts_dir = settings.transcripts_dir();
    let transcripts = match count_transcripts(&transcripts_dir) {
        Some((count, bytes)) => Finding::ok(
            "Transcripts",
            format!("{} stored, {} in {}", count, format_size(bytes), transcripts_dir.display()),
        ),
        None => Finding::warn("Transcripts", "none yet", "Run: vidra process <video>"),
    };

    vec![data, transcripts]
}

fn config_file(path: &Path) -> Finding {
    if path.exists() {
        Finding::ok("Config file", path.display().to_string())
    } else {
        Finding::warn("Config file", "using defaults", "Create with: vidra config edit")
    }
}

fn loaded_settings(settings: &Settings) -> Finding {
    match settings.validate() {
        Ok(()) => Finding::ok(
            "Settings",
            format!(
                "chunks of {} chars, top {} results, answers in {}",
                settings.segmenter.max_chunk_chars,
                settings.retrieval.top_k,
                settings.generation.language
            ),
        ),
        Err(e) => Finding::fail("Settings", e.to_string(), "Fix with: vidra config edit"),
    }
}

/// Number and total size of stored transcript files.
fn count_transcripts(dir: &Path) -> Option<(usize, u64)> {
    let sizes: Vec<u64> = std::fs::read_dir(dir)
        .ok()?
        .flatten()
        .filter(|e| e.path().extension().is_some_and(|ext| ext == "txt"))
        .filter_map(|e| e.metadata().ok().map(|m| m.len()))
        .collect();
    Some((sizes.len(), sizes.iter().sum()))
}

fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}

fn ffmpeg_hint() -> &'static str {
    if cfg!(target_os = "macos") {
        "Install with: brew install ffmpeg"
    } else if cfg!(target_os = "linux") {
        "Install with: sudo apt install ffmpeg (or your package manager)"
    } else {
        "Install from: https://ffmpeg.org/download.html"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_tool_fails_with_hint() {
        let finding = tool("vidra-no-such-tool");
        assert_eq!(finding.level, Level::Error);
        assert!(finding.hint.is_some());
    }

    #[test]
    fn test_api_key_is_masked() {
        let finding = api_key(Some("sk-abcdefghijklmnopqrstuvwxyz"));
        assert_eq!(finding.level, Level::Ok);
        assert_eq!(finding.detail, "configured (sk-abcd...wxyz)");

        assert_eq!(api_key(Some("not-a-key")).level, Level::Warning);
        assert_eq!(api_key(Some("")).level, Level::Error);
        assert_eq!(api_key(None).level, Level::Error);
    }

    #[test]
    fn test_count_transcripts() {
        let dir = tempfile::tempdir().unwrap();
        assert!(count_transcripts(&dir.path().join("missing")).is_none());

        std::fs::write(dir.path().join("talk.txt"), "0123456789").unwrap();
        std::fs::write(dir.path().join("talk.wav"), "ignored").unwrap();
        assert_eq!(count_transcripts(dir.path()), Some((1, 10)));
    }

    #[test]
    fn test_config_file_and_settings() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(config_file(&dir.path().join("config.toml")).level, Level::Warning);
        assert_eq!(loaded_settings(&Settings::default()).level, Level::Ok);
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1024), "1.0 KB");
        assert_eq!(format_size(1536 * 1024), "1.5 MB");
        assert_eq!(format_size(1024 * 1024 * 1024), "1.0 GB");
    }
}

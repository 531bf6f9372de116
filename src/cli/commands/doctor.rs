//! Doctor command - verify external requirements and configuration.

use crate::audio::AudioFormat;
use crate::cli::Output;
use crate::config::Settings;
use crate::tts::{OpenAiSpeechClient, SpeechClient};
use console::style;
use std::process::Command;

/// Check result for a single item.
#[derive(Debug)]
pub struct CheckResult {
    pub name: String,
    pub status: CheckStatus,
    pub message: String,
    pub hint: Option<String>,
}

#[derive(Debug, PartialEq)]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

impl CheckResult {
    fn ok(name: &str, message: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Ok,
            message: message.to_string(),
            hint: None,
        }
    }

    fn warning(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Warning,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn error(name: &str, message: &str, hint: &str) -> Self {
        Self {
            name: name.to_string(),
            status: CheckStatus::Error,
            message: message.to_string(),
            hint: Some(hint.to_string()),
        }
    }

    fn print(&self) {
        let icon = match self.status {
            CheckStatus::Ok => style("✓").green(),
            CheckStatus::Warning => style("!").yellow(),
            CheckStatus::Error => style("✗").red(),
        };

        println!("  {} {} - {}", icon, style(&self.name).bold(), self.message);

        if let Some(hint) = &self.hint {
            println!("    {} {}", style("→").dim(), style(hint).dim());
        }
    }
}

/// Run all diagnostic checks.
pub async fn run_doctor(settings: &Settings) -> anyhow::Result<()> {
    Output::header("WikiVox Doctor");
    println!();

    let mut checks = Vec::new();

    println!("{}", style("Configuration").bold());
    let config_checks = vec![check_config_file(), check_settings(settings)];
    for check in &config_checks {
        check.print();
    }
    checks.extend(config_checks);

    println!();

    println!("{}", style("Text-to-Speech").bold());
    let tts_check = check_tts_server(settings).await;
    tts_check.print();
    checks.push(tts_check);

    println!();

    println!("{}", style("External Tools").bold());
    let needs_ffmpeg = settings.tts.audio_format().ok() == Some(AudioFormat::M4b);
    let ffmpeg_check = check_ffmpeg(needs_ffmpeg);
    ffmpeg_check.print();
    checks.push(ffmpeg_check);

    println!();

    let errors = checks.iter().filter(|c| c.status == CheckStatus::Error).count();
    let warnings = checks.iter().filter(|c| c.status == CheckStatus::Warning).count();

    if errors > 0 {
        Output::error(&format!("{} error(s) found.", errors));
        return Err(anyhow::anyhow!("{} doctor check(s) failed", errors));
    } else if warnings > 0 {
        Output::warning(&format!("All checks passed with {} warning(s).", warnings));
    } else {
        Output::success("All checks passed! WikiVox is ready to use.");
    }

    Ok(())
}

fn check_config_file() -> CheckResult {
    let config_path = Settings::default_config_path();
    if config_path.exists() {
        CheckResult::ok("Config file", &format!("{}", config_path.display()))
    } else {
        CheckResult::warning(
            "Config file",
            "using defaults",
            &format!("Create {} to override defaults", config_path.display()),
        )
    }
}

fn check_settings(settings: &Settings) -> CheckResult {
    match settings.validate() {
        Ok(()) => CheckResult::ok("Settings", "valid"),
        Err(e) => CheckResult::error("Settings", &e.to_string(), "Fix the value in your config file"),
    }
}

async fn check_tts_server(settings: &Settings) -> CheckResult {
    let client = match OpenAiSpeechClient::from_settings(settings) {
        Ok(client) => client,
        Err(e) => return CheckResult::error("TTS server", &e.to_string(), "Check [tts] server_url"),
    };
    if client.health_check().await {
        CheckResult::ok("TTS server", client.server_url())
    } else {
        CheckResult::warning(
            "TTS server",
            &format!("{} not reachable", client.server_url()),
            "Start an OpenAI-compatible TTS server (e.g. Kokoro-FastAPI) or set --tts-server",
        )
    }
}

/// ffmpeg is only an error when the configured format needs it.
fn check_ffmpeg(required: bool) -> CheckResult {
    match Command::new("ffmpeg").arg("-version").output() {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout)
                .lines()
                .next()
                .unwrap_or("installed")
                .trim()
                .chars()
                .take(50)
                .collect::<String>();
            CheckResult::ok("ffmpeg", &version)
        }
        _ if required => CheckResult::error("ffmpeg", "not found", install_hint_ffmpeg()),
        _ => CheckResult::warning("ffmpeg", "not found (needed for m4b)", install_hint_ffmpeg()),
    }
}

/// Platform-specific install hint for ffmpeg.
fn install_hint_ffmpeg() -> &'static str {
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
    fn test_check_result_error() {
        let result = CheckResult::error("test", "failed", "fix it");
        assert_eq!(result.status, CheckStatus::Error);
        assert_eq!(result.hint, Some("fix it".to_string()));
    }

    #[test]
    fn test_invalid_settings_reported() {
        let mut settings = Settings::default();
        settings.search.limit = 0;
        assert_eq!(check_settings(&settings).status, CheckStatus::Error);
        assert_eq!(check_settings(&Settings::default()).status, CheckStatus::Ok);
    }

    #[tokio::test]
    async fn test_unreachable_tts_server_is_warning() {
        let mut settings = Settings::default();
        settings.tts.server_url = "http://127.0.0.1:9/v1".to_string();
        assert_eq!(check_tts_server(&settings).await.status, CheckStatus::Warning);
    }
}

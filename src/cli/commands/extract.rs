//! Extract command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::{ExtractArgs, Output};
use crate::config::Settings;
use crate::output::OutputManager;
use crate::pipeline::Pipeline;
use crate::wiki::SectionSelection;
use anyhow::Result;

/// Run the extract command.
pub async fn run_extract(args: &ExtractArgs, mut settings: Settings) -> Result<()> {
    apply_overrides(args, &mut settings);
    settings.validate()?;

    let no_save = settings.general.no_save;
    let write_tts = settings.tts.file;
    let make_audio = settings.tts.audio;

    if make_audio && no_save {
        Output::error("--audio cannot be combined with --no-save");
        return Err(anyhow::anyhow!("--audio requires saving files"));
    }

    let selection: SectionSelection = args.sections.as_deref().unwrap_or("all").parse()?;
    let format = settings.tts.audio_format()?;

    if make_audio {
        if let Err(e) = preflight::check(Operation::Synthesize(format)) {
            Output::error(&format!("{}", e));
            Output::info("Run 'wikivox doctor' for detailed diagnostics.");
            return Err(e.into());
        }
    }

    let pipeline = Pipeline::new(settings)?;

    let spinner = Output::spinner(&format!("Fetching '{}'...", args.article));
    let extraction = pipeline.extract(&args.article, &selection).await;
    spinner.finish_and_clear();

    let extraction = match extraction {
        Ok(extraction) => extraction,
        Err(e) => {
            Output::error(&format!("{}", e));
            if let Some(candidates) = e.candidates() {
                Output::header("Candidates");
                Output::candidates(candidates);
                println!();
                Output::info("Re-run with one of the URLs above, or pass --yolo to take the first.");
            }
            return Err(e.into());
        }
    };

    let title = extraction.article.title.clone();
    let normalized = &extraction.normalized;

    if no_save {
        println!("{}", normalized.markdown_text);
        return Ok(());
    }

    let manager = OutputManager::new(pipeline.settings().output_dir(), format)?;
    let paths = manager.prepare_paths(&title, args.filename.as_deref())?;

    manager.write_text(&paths.markdown_path, &normalized.markdown_text)?;
    Output::success(&format!("Saved Markdown to {}", paths.markdown_path.display()));

    if write_tts {
        manager.write_text(&paths.tts_path, &normalized.tts_text)?;
        Output::success(&format!("Saved speech text to {}", paths.tts_path.display()));
    }

    if make_audio {
        let url = pipeline.endpoint().article_url(&title);
        let spinner = Output::spinner(&format!("Synthesizing {} audio...", format));
        let audio = pipeline.synthesize(normalized, &title, Some(url.as_str())).await;
        spinner.finish_and_clear();

        let audio = match audio {
            Ok(audio) => audio,
            Err(e) => {
                Output::error(&format!("Audio synthesis failed: {}", e));
                return Err(e.into());
            }
        };

        manager.write_bytes(&paths.audio_path, &audio.bytes)?;
        Output::success(&format!(
            "Saved audio to {} ({:.1} s)",
            paths.audio_path.display(),
            audio.duration_ms as f64 / 1000.0
        ));
        if !audio.chapters.is_empty() {
            Output::header("Chapters");
            Output::chapters(&audio.chapters);
        }
    }

    Ok(())
}

/// Fold command-line flags over the loaded settings.
pub fn apply_overrides(args: &ExtractArgs, settings: &mut Settings) {
    if let Some(dir) = &args.output_dir {
        settings.general.output_dir = dir.clone();
    }
    if let Some(timeout) = args.timeout {
        settings.general.timeout_secs = timeout;
    }
    if args.lead_only {
        settings.general.lead_only = true;
    }
    if args.no_save {
        settings.general.no_save = true;
    }
    if args.tts {
        settings.tts.file = true;
    }
    if args.audio {
        settings.tts.audio = true;
    }
    if let Some(prefix) = &args.heading_prefix {
        settings.tts.heading_prefix = prefix.clone();
    }
    if let Some(server) = &args.tts_server {
        settings.tts.server_url = server.clone();
    }
    if let Some(voice) = &args.tts_voice {
        settings.tts.voice = voice.clone();
    }
    if let Some(format) = args.tts_format {
        settings.tts.format = format.to_string();
    }
    if args.yolo {
        settings.search.auto_select = true;
    }
    if let Some(limit) = args.search_limit {
        settings.search.limit = limit;
    }
    if args.tts_normalize {
        settings.tts.normalize = true;
    }
}

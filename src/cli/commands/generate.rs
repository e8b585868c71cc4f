//! Generate Command
//!
//! Runs one generation session locally and streams the document to stdout.
//!
//! Usage:
//!   deepprd generate --theme "Login Flow" [--raw notes.md]... [--visual flow.png]...
//!                    [--tech stack.md]... [--output doc.md | --save]

use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::info;

use crate::ai::prompt::PromptAssembler;
use crate::ai::provider::create_provider;
use crate::cli::render::render_stream;
use crate::cli::ui::Output;
use crate::cli::wizard::{ProjectUpdate, WizardState};
use crate::config::ConfigLoader;
use crate::constants::render::FLUSH_INTERVAL_MS;
use crate::generation::{ContinuationController, output_channel};
use crate::templates::TemplateStore;
use crate::types::{Document, ImageAttachment, MediaType, PrdError, Result};

#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub theme: String,
    pub raw_requirements: Vec<PathBuf>,
    pub visuals: Vec<PathBuf>,
    pub tech_context: Vec<PathBuf>,
    /// Save the document to this path
    pub output: Option<PathBuf>,
    /// Save under the theme-derived file name when no output path is given
    pub save: bool,
}

pub async fn run(options: GenerateOptions) -> Result<()> {
    let out = Output::new();
    let config = ConfigLoader::load()?;
    let provider = create_provider(&config.llm)?;

    let wizard = collect_inputs(&options).await?;
    let save_path = options
        .output
        .clone()
        .or_else(|| options.save.then(|| PathBuf::from(wizard.document_file_name())));
    let request = wizard.into_request()?;

    let references = TemplateStore::new(&config.templates.dir).load().await?;
    let initial = PromptAssembler::assemble(&request, &references);

    out.info(&format!(
        "Generating with {} ({})",
        provider.name(),
        provider.model()
    ));

    let (sink, receiver) = output_channel(config.generation.sink_capacity);
    let controller = ContinuationController::new(provider)
        .with_session_timeout(config.generation.session_timeout());

    let mut stdout = tokio::io::stdout();
    let (report, rendered) = tokio::join!(
        controller.run(initial, sink),
        render_stream(
            receiver,
            &mut stdout,
            Duration::from_millis(FLUSH_INTERVAL_MS)
        )
    );
    let rendered = rendered?;
    eprintln!();

    if let Some(path) = save_path {
        tokio::fs::write(&path, &rendered.document).await?;
        if rendered.is_clean() {
            out.success(&format!("Saved to {}", path.display()));
        } else {
            out.warning(&format!("Partial output saved to {}", path.display()));
        }
    }

    info!(
        session_id = %report.session_id,
        rounds = report.rounds,
        continuations = report.continuations,
        "Session finished"
    );

    match report.error {
        Some(e) => Err(e),
        None => {
            out.success(&format!(
                "Done: {} chars, {} continuation(s)",
                report.output.chars().count(),
                report.continuations
            ));
            Ok(())
        }
    }
}

/// Walk the wizard through every step, filling it from the command line
async fn collect_inputs(options: &GenerateOptions) -> Result<WizardState> {
    let wizard = WizardState::new().update_data(ProjectUpdate {
        theme: Some(options.theme.clone()),
        ..Default::default()
    });

    let raw_requirements = read_documents(&options.raw_requirements).await?;
    let wizard = wizard.next().update_data(ProjectUpdate {
        raw_requirements: Some(raw_requirements),
        ..Default::default()
    });

    let visuals = read_images(&options.visuals).await?;
    let wizard = wizard.next().update_data(ProjectUpdate {
        visuals: Some(visuals),
        ..Default::default()
    });

    let tech_context = read_documents(&options.tech_context).await?;
    let wizard = wizard.next().update_data(ProjectUpdate {
        tech_context: Some(tech_context),
        ..Default::default()
    });

    Ok(wizard.next())
}

async fn read_documents(paths: &[PathBuf]) -> Result<Vec<Document>> {
    let mut docs = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = read_upload(path).await?;
        docs.push(Document::new(
            file_name(path),
            String::from_utf8_lossy(&bytes).into_owned(),
        ));
    }
    Ok(docs)
}

async fn read_images(paths: &[PathBuf]) -> Result<Vec<ImageAttachment>> {
    let mut images = Vec::with_capacity(paths.len());
    for path in paths {
        images.push(ImageAttachment {
            name: file_name(path),
            media_type: media_type_for(path),
            data: read_upload(path).await?,
        });
    }
    Ok(images)
}

async fn read_upload(path: &Path) -> Result<Vec<u8>> {
    tokio::fs::read(path)
        .await
        .map_err(|e| PrdError::Input(format!("cannot read {}: {}", path.display(), e)))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn media_type_for(path: &Path) -> MediaType {
    let content_type = match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => Some("image/png"),
        Some("webp") => Some("image/webp"),
        Some("gif") => Some("image/gif"),
        _ => None,
    };
    MediaType::from_content_type(content_type)
}

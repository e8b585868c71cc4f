//! Multipart form decoding for `POST /api/generate`.
//!
//! Fields: `theme` (text, required), `rawRequirements`, `visuals` and
//! `techContext` (repeatable file uploads). Upload order is preserved.

use axum::extract::Multipart;
use tracing::{debug, warn};

use crate::types::{Document, GenerationRequest, ImageAttachment, MediaType, PrdError, Result};

pub const FIELD_THEME: &str = "theme";
pub const FIELD_RAW_REQUIREMENTS: &str = "rawRequirements";
pub const FIELD_VISUALS: &str = "visuals";
pub const FIELD_TECH_CONTEXT: &str = "techContext";

pub async fn parse_generation_form(mut multipart: Multipart) -> Result<GenerationRequest> {
    let mut theme: Option<String> = None;
    let mut raw_requirements = Vec::new();
    let mut images = Vec::new();
    let mut tech_context = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| PrdError::Input(format!("malformed form data: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field
            .file_name()
            .map(str::to_string)
            .unwrap_or_else(|| name.clone());
        let content_type = field.content_type().map(str::to_string);
        let data = field
            .bytes()
            .await
            .map_err(|e| PrdError::Input(format!("unreadable upload '{}': {}", file_name, e)))?;

        match name.as_str() {
            FIELD_THEME => theme = Some(String::from_utf8_lossy(&data).into_owned()),
            FIELD_RAW_REQUIREMENTS => raw_requirements.push(Document::new(
                file_name,
                String::from_utf8_lossy(&data).into_owned(),
            )),
            FIELD_VISUALS => images.push(ImageAttachment {
                name: file_name,
                media_type: MediaType::from_content_type(content_type.as_deref()),
                data: data.to_vec(),
            }),
            FIELD_TECH_CONTEXT => tech_context.push(Document::new(
                file_name,
                String::from_utf8_lossy(&data).into_owned(),
            )),
            other => debug!("Ignoring unknown form field '{}'", other),
        }
    }

    let theme = theme.ok_or_else(|| PrdError::Input(format!("missing '{}' field", FIELD_THEME)))?;
    if theme.trim().is_empty() {
        warn!("Generation requested with a blank theme");
    }

    let mut builder = GenerationRequest::builder(theme);
    for doc in raw_requirements {
        builder = builder.raw_requirement(doc);
    }
    for image in images {
        builder = builder.image(image);
    }
    for doc in tech_context {
        builder = builder.tech_context(doc);
    }

    Ok(builder.build())
}

//! Generation request types
//!
//! A request bundles the topic with the uploaded reference material.
//! It is immutable once built.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A named text document (raw requirements or technical context)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub name: String,
    pub text: String,
}

impl Document {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
        }
    }
}

/// Image media types accepted by the providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum MediaType {
    #[default]
    #[serde(rename = "image/jpeg")]
    Jpeg,
    #[serde(rename = "image/png")]
    Png,
    #[serde(rename = "image/gif")]
    Gif,
    #[serde(rename = "image/webp")]
    Webp,
}

impl MediaType {
    /// Map a declared content type onto a supported media type.
    /// Anything unrecognised is sent as JPEG.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            Some("image/png") => MediaType::Png,
            Some("image/webp") => MediaType::Webp,
            Some("image/gif") => MediaType::Gif,
            _ => MediaType::Jpeg,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Jpeg => "image/jpeg",
            MediaType::Png => "image/png",
            MediaType::Gif => "image/gif",
            MediaType::Webp => "image/webp",
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary image attachment with its declared media type
#[derive(Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub name: String,
    pub media_type: MediaType,
    pub data: Vec<u8>,
}

impl fmt::Debug for ImageAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageAttachment")
            .field("name", &self.name)
            .field("media_type", &self.media_type)
            .field("bytes", &self.data.len())
            .finish()
    }
}

/// Everything needed to start one generation session
#[derive(Debug, Clone, Default)]
pub struct GenerationRequest {
    topic: String,
    raw_requirements: Vec<Document>,
    images: Vec<ImageAttachment>,
    tech_context: Vec<Document>,
}

impl GenerationRequest {
    pub fn builder(topic: impl Into<String>) -> GenerationRequestBuilder {
        GenerationRequestBuilder {
            request: GenerationRequest {
                topic: topic.into(),
                ..Default::default()
            },
        }
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub fn raw_requirements(&self) -> &[Document] {
        &self.raw_requirements
    }

    pub fn images(&self) -> &[ImageAttachment] {
        &self.images
    }

    pub fn tech_context(&self) -> &[Document] {
        &self.tech_context
    }
}

/// Builder for [`GenerationRequest`]; preserves insertion order
#[derive(Debug)]
pub struct GenerationRequestBuilder {
    request: GenerationRequest,
}

impl GenerationRequestBuilder {
    pub fn raw_requirement(mut self, doc: Document) -> Self {
        self.request.raw_requirements.push(doc);
        self
    }

    pub fn image(mut self, image: ImageAttachment) -> Self {
        self.request.images.push(image);
        self
    }

    pub fn tech_context(mut self, doc: Document) -> Self {
        self.request.tech_context.push(doc);
        self
    }

    pub fn build(self) -> GenerationRequest {
        self.request
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_media_type_mapping() {
        assert_eq!(MediaType::from_content_type(Some("image/png")), MediaType::Png);
        assert_eq!(MediaType::from_content_type(Some("IMAGE/WEBP")), MediaType::Webp);
        assert_eq!(MediaType::from_content_type(Some("image/gif")), MediaType::Gif);
        assert_eq!(MediaType::from_content_type(Some("image/bmp")), MediaType::Jpeg);
        assert_eq!(MediaType::from_content_type(None), MediaType::Jpeg);
    }

    #[test]
    fn test_builder_preserves_order() {
        let request = GenerationRequest::builder("Login Flow")
            .raw_requirement(Document::new("a.md", "first"))
            .raw_requirement(Document::new("b.md", "second"))
            .tech_context(Document::new("api.md", "endpoints"))
            .build();

        assert_eq!(request.topic(), "Login Flow");
        let names: Vec<_> = request.raw_requirements().iter().map(|d| &d.name).collect();
        assert_eq!(names, ["a.md", "b.md"]);
        assert_eq!(request.tech_context().len(), 1);
        assert!(request.images().is_empty());
    }
}

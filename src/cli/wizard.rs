//! Input wizard
//!
//! Explicit finite-state object over the five collection steps. Every
//! transition consumes the state and returns the next one, so callers pass
//! it around by value instead of sharing a global store.

use std::fmt;

use crate::constants::wizard::{DEFAULT_DOCUMENT_NAME, MAX_VISUALS};
use crate::types::{Document, GenerationRequest, ImageAttachment, PrdError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WizardStep {
    ProjectInfo,
    RawRequirements,
    Visuals,
    TechContext,
    Generation,
}

impl WizardStep {
    pub const ALL: [WizardStep; 5] = [
        WizardStep::ProjectInfo,
        WizardStep::RawRequirements,
        WizardStep::Visuals,
        WizardStep::TechContext,
        WizardStep::Generation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WizardStep::ProjectInfo => "project-info",
            WizardStep::RawRequirements => "raw-requirements",
            WizardStep::Visuals => "visuals",
            WizardStep::TechContext => "tech-context",
            WizardStep::Generation => "generation",
        }
    }
}

impl fmt::Display for WizardStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Collected project inputs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectData {
    pub theme: String,
    pub raw_requirements: Vec<Document>,
    pub visuals: Vec<ImageAttachment>,
    pub tech_context: Vec<Document>,
}

/// Partial update; `None` fields keep their current value
#[derive(Debug, Clone, Default)]
pub struct ProjectUpdate {
    pub theme: Option<String>,
    pub raw_requirements: Option<Vec<Document>>,
    pub visuals: Option<Vec<ImageAttachment>>,
    pub tech_context: Option<Vec<Document>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WizardState {
    current: usize,
    data: ProjectData,
}

impl WizardState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> WizardStep {
        WizardStep::ALL[self.current]
    }

    pub fn index(&self) -> usize {
        self.current
    }

    pub fn data(&self) -> &ProjectData {
        &self.data
    }

    pub fn is_first(&self) -> bool {
        self.current == 0
    }

    pub fn is_last(&self) -> bool {
        self.current == WizardStep::ALL.len() - 1
    }

    pub fn next(self) -> Self {
        let index = self.current + 1;
        self.go_to(index)
    }

    pub fn previous(self) -> Self {
        let index = self.current.saturating_sub(1);
        self.go_to(index)
    }

    /// Jump to a step index, clamped to the valid range
    pub fn go_to(mut self, index: usize) -> Self {
        self.current = index.min(WizardStep::ALL.len() - 1);
        self
    }

    pub fn update_data(mut self, update: ProjectUpdate) -> Self {
        if let Some(theme) = update.theme {
            self.data.theme = theme;
        }
        if let Some(docs) = update.raw_requirements {
            self.data.raw_requirements = docs;
        }
        if let Some(images) = update.visuals {
            self.data.visuals = images;
        }
        if let Some(docs) = update.tech_context {
            self.data.tech_context = docs;
        }
        self
    }

    pub fn reset(self) -> Self {
        Self::default()
    }

    /// File name offered for saving the generated document.
    ///
    /// Path separators and characters reserved on common file systems are
    /// replaced, so the name always stays in the current directory.
    pub fn document_file_name(&self) -> String {
        let stem: String = self
            .data
            .theme
            .trim()
            .chars()
            .map(|c| match c {
                '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '-',
                c if c.is_control() => '-',
                c => c,
            })
            .collect();
        let stem = stem.trim_matches(|c: char| c == '.' || c.is_whitespace());

        if stem.is_empty() {
            format!("{}.md", DEFAULT_DOCUMENT_NAME)
        } else {
            format!("{}.md", stem)
        }
    }

    pub fn into_request(self) -> Result<GenerationRequest> {
        if self.data.visuals.len() > MAX_VISUALS {
            return Err(PrdError::Input(format!(
                "at most {} visuals are accepted, got {}",
                MAX_VISUALS,
                self.data.visuals.len()
            )));
        }

        let ProjectData {
            theme,
            raw_requirements,
            visuals,
            tech_context,
        } = self.data;

        let mut builder = GenerationRequest::builder(theme);
        for doc in raw_requirements {
            builder = builder.raw_requirement(doc);
        }
        for image in visuals {
            builder = builder.image(image);
        }
        for doc in tech_context {
            builder = builder.tech_context(doc);
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MediaType;

    fn image(name: &str) -> ImageAttachment {
        ImageAttachment {
            name: name.to_string(),
            media_type: MediaType::Png,
            data: vec![0u8; 4],
        }
    }

    #[test]
    fn test_steps_are_clamped() {
        let wizard = WizardState::new();
        assert_eq!(wizard.step(), WizardStep::ProjectInfo);
        assert!(wizard.is_first());

        let wizard = wizard.previous();
        assert_eq!(wizard.index(), 0);

        let wizard = wizard.next().next().next().next().next().next();
        assert_eq!(wizard.step(), WizardStep::Generation);
        assert!(wizard.is_last());

        let wizard = wizard.go_to(2);
        assert_eq!(wizard.step(), WizardStep::Visuals);
        assert_eq!(wizard.go_to(99).step(), WizardStep::Generation);
    }

    #[test]
    fn test_update_is_partial_merge() {
        let wizard = WizardState::new()
            .update_data(ProjectUpdate {
                theme: Some("Login Flow".to_string()),
                raw_requirements: Some(vec![Document::new("a.md", "A")]),
                ..Default::default()
            })
            .update_data(ProjectUpdate {
                tech_context: Some(vec![Document::new("stack.md", "Rust")]),
                ..Default::default()
            });

        assert_eq!(wizard.data().theme, "Login Flow");
        assert_eq!(wizard.data().raw_requirements.len(), 1);
        assert_eq!(wizard.data().tech_context[0].name, "stack.md");
        assert!(wizard.data().visuals.is_empty());
    }

    #[test]
    fn test_reset_restores_initial_state() {
        let wizard = WizardState::new()
            .update_data(ProjectUpdate {
                theme: Some("x".to_string()),
                ..Default::default()
            })
            .go_to(3)
            .reset();
        assert_eq!(wizard, WizardState::new());
    }

    #[test]
    fn test_into_request_preserves_order() {
        let request = WizardState::new()
            .update_data(ProjectUpdate {
                theme: Some("Checkout".to_string()),
                raw_requirements: Some(vec![
                    Document::new("1.md", "one"),
                    Document::new("2.md", "two"),
                ]),
                visuals: Some(vec![image("a.png"), image("b.png")]),
                tech_context: None,
            })
            .into_request()
            .unwrap();

        assert_eq!(request.topic(), "Checkout");
        assert_eq!(request.raw_requirements()[1].name, "2.md");
        assert_eq!(request.images()[0].name, "a.png");
        assert!(request.tech_context().is_empty());
    }

    #[test]
    fn test_too_many_visuals_rejected() {
        let visuals = (0..=MAX_VISUALS).map(|i| image(&format!("{i}.png"))).collect();
        let result = WizardState::new()
            .update_data(ProjectUpdate {
                visuals: Some(visuals),
                ..Default::default()
            })
            .into_request();
        assert!(matches!(result, Err(PrdError::Input(_))));
    }

    #[test]
    fn test_document_file_name() {
        assert_eq!(WizardState::new().document_file_name(), "system-requirements.md");
        let named = WizardState::new().update_data(ProjectUpdate {
            theme: Some("Login Flow".to_string()),
            ..Default::default()
        });
        assert_eq!(named.document_file_name(), "Login Flow.md");
    }

    #[test]
    fn test_document_file_name_stays_in_current_dir() {
        let named = |theme: &str| {
            WizardState::new()
                .update_data(ProjectUpdate {
                    theme: Some(theme.to_string()),
                    ..Default::default()
                })
                .document_file_name()
        };

        assert_eq!(named("auth/login"), "auth-login.md");
        assert_eq!(named("../../etc/passwd"), "-..-etc-passwd.md");
        assert_eq!(named(r"C:\docs\spec"), "C--docs-spec.md");
        assert_eq!(named("what? <draft>"), "what- -draft-.md");
        assert_eq!(named(".."), "system-requirements.md");
        for theme in ["auth/login", "../../etc/passwd", r"a\b"] {
            let name = named(theme);
            assert!(!name.contains('/') && !name.contains('\\'), "{name}");
        }
    }
}

//! Prompt Builder System
//!
//! Markdown prompt construction for document generation, and the
//! [`PromptAssembler`] that turns a [`GenerationRequest`] into the initial
//! user turn of a session.
//!
//! Empty reference categories render a literal placeholder instead of
//! being omitted so the numbered reading list keeps its shape.

use crate::ai::conversation::{ContentPart, ConversationTurn};
use crate::templates::ReferenceTexts;
use crate::types::{Document, GenerationRequest};

/// Placeholder rendered for an empty document category
pub const EMPTY_PLACEHOLDER: &str = "无";

/// Prompt section types
#[derive(Debug, Clone)]
pub enum PromptSection {
    /// Markdown heading (`#` repeated `level` times)
    Heading { level: usize, text: String },
    /// Raw text section with optional `##` header
    Text {
        header: Option<String>,
        content: String,
    },
    /// Numbered reference item followed by its body
    Reference {
        index: usize,
        title: String,
        body: String,
    },
    /// Bulleted list, optionally under a header
    Bullets {
        header: Option<String>,
        items: Vec<String>,
    },
}

/// Prompt builder for consistent prompt construction
#[derive(Debug, Clone, Default)]
pub struct PromptBuilder {
    sections: Vec<PromptSection>,
    references: usize,
}

impl PromptBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heading(mut self, level: usize, text: &str) -> Self {
        self.sections.push(PromptSection::Heading {
            level: level.max(1),
            text: text.to_string(),
        });
        self
    }

    /// Add text section
    pub fn text(mut self, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: None,
            content: content.to_string(),
        });
        self
    }

    /// Add text section with header
    pub fn section(mut self, header: &str, content: &str) -> Self {
        self.sections.push(PromptSection::Text {
            header: Some(header.to_string()),
            content: content.to_string(),
        });
        self
    }

    /// Add the next numbered reference; numbering starts at 1
    pub fn reference(mut self, title: &str, body: &str) -> Self {
        self.references += 1;
        self.sections.push(PromptSection::Reference {
            index: self.references,
            title: title.to_string(),
            body: body.to_string(),
        });
        self
    }

    pub fn bullets(mut self, header: Option<&str>, items: Vec<&str>) -> Self {
        self.sections.push(PromptSection::Bullets {
            header: header.map(String::from),
            items: items.into_iter().map(String::from).collect(),
        });
        self
    }

    /// Build the final prompt string
    pub fn build(self) -> String {
        let mut prompt = String::new();

        for section in self.sections {
            match section {
                PromptSection::Heading { level, text } => {
                    prompt.push_str(&format!("{} {}\n\n", "#".repeat(level), text));
                }
                PromptSection::Text { header, content } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("## {}\n", h));
                    }
                    prompt.push_str(&content);
                    prompt.push_str("\n\n");
                }
                PromptSection::Reference { index, title, body } => {
                    prompt.push_str(&format!("{}. **{}**：(如下)\n", index, title));
                    prompt.push_str(&body);
                    prompt.push_str("\n\n");
                }
                PromptSection::Bullets { header, items } => {
                    if let Some(h) = header {
                        prompt.push_str(&format!("## {}\n", h));
                    }
                    for item in items {
                        prompt.push_str(&format!("- {}\n", item));
                    }
                    prompt.push('\n');
                }
            }
        }

        prompt.trim_end().to_string()
    }
}

/// Concatenate documents, each demarcated by its name.
/// Returns the placeholder when there are none.
pub fn render_documents(documents: &[Document]) -> String {
    if documents.is_empty() {
        return EMPTY_PLACEHOLDER.to_string();
    }

    documents
        .iter()
        .map(|doc| format!("\n--- Document: {} ---\n{}\n", doc.name, doc.text))
        .collect()
}

/// Builds the initial user turn of a generation session
pub struct PromptAssembler;

impl PromptAssembler {
    /// Compose the request text: topic, both reference texts, the uploaded
    /// documents and the output-format instructions.
    pub fn compose_text(request: &GenerationRequest, references: &ReferenceTexts) -> String {
        let topic = request.topic();

        PromptBuilder::new()
            .heading(1, "系统需求文档生成任务")
            .section("需求主题", topic)
            .section("目标", &format!("完成《{}-系统需求说明书》的撰写。", topic))
            .heading(2, "参考资料阅读清单")
            .heading(3, "必读文档")
            .reference("系统需求模板", &references.template)
            .reference("系统需求文档撰写要求", &references.guidelines)
            .reference(
                "原始需求/用户需求",
                &render_documents(request.raw_requirements()),
            )
            .reference("技术背景资料", &render_documents(request.tech_context()))
            .text("5. **交互设计稿**：\n(见附带的图片)")
            .heading(2, "撰写要求")
            .text(concat!(
                "请严格按照上述《系统需求文档撰写要求》和《系统需求模板》的结构，",
                "结合原始需求和交互设计稿，生成一份完整的系统需求文档。\n请确保：",
            ))
            .bullets(
                None,
                vec![
                    "控制面需求：基于交互设计稿中的 UI 和交互逻辑撰写。",
                    "运行面需求：根据控制面需求推导后台需要提供的数据、接口、处理逻辑。",
                    "输出格式为纯 Markdown。",
                    "所有流程图、状态图、时序图等图表必须使用 Mermaid 语法生成，使用 ```mermaid 代码块包裹。",
                ],
            )
            .build()
    }

    /// Images first, then the composed text block
    pub fn assemble(request: &GenerationRequest, references: &ReferenceTexts) -> ConversationTurn {
        let mut parts: Vec<ContentPart> = request
            .images()
            .iter()
            .map(|image| ContentPart::Image {
                media_type: image.media_type,
                data: image.data.clone(),
            })
            .collect();

        parts.push(ContentPart::Text(Self::compose_text(request, references)));
        ConversationTurn::user_parts(parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::conversation::{Content, Role};
    use crate::types::{ImageAttachment, MediaType};

    fn references() -> ReferenceTexts {
        ReferenceTexts {
            template: "TEMPLATE-BODY".to_string(),
            guidelines: "GUIDELINES-BODY".to_string(),
        }
    }

    #[test]
    fn test_builder_numbers_references() {
        let prompt = PromptBuilder::new()
            .reference("first", "a")
            .reference("second", "b")
            .build();

        assert!(prompt.contains("1. **first**：(如下)\na"));
        assert!(prompt.contains("2. **second**：(如下)\nb"));
    }

    #[test]
    fn test_empty_categories_render_placeholder() {
        let request = GenerationRequest::builder("Login Flow").build();
        let text = PromptAssembler::compose_text(&request, &references());

        assert!(text.contains("3. **原始需求/用户需求**：(如下)\n无"));
        assert!(text.contains("4. **技术背景资料**：(如下)\n无"));
    }

    #[test]
    fn test_compose_embeds_all_inputs() {
        let request = GenerationRequest::builder("Login Flow")
            .raw_requirement(Document::new("req.md", "users log in"))
            .tech_context(Document::new("api.md", "POST /login"))
            .build();
        let text = PromptAssembler::compose_text(&request, &references());

        assert!(text.contains("## 需求主题\nLogin Flow"));
        assert!(text.contains("《Login Flow-系统需求说明书》"));
        assert!(text.contains("TEMPLATE-BODY"));
        assert!(text.contains("GUIDELINES-BODY"));
        assert!(text.contains("--- Document: req.md ---\nusers log in"));
        assert!(text.contains("--- Document: api.md ---\nPOST /login"));
        assert!(text.contains("```mermaid"));

        let template_at = text.find("TEMPLATE-BODY").unwrap();
        let raw_at = text.find("req.md").unwrap();
        let tech_at = text.find("api.md").unwrap();
        assert!(template_at < raw_at && raw_at < tech_at);
    }

    #[test]
    fn test_assemble_puts_images_before_text() {
        let request = GenerationRequest::builder("Dashboard")
            .image(ImageAttachment {
                name: "a.png".to_string(),
                media_type: MediaType::Png,
                data: vec![0x89, 0x50],
            })
            .image(ImageAttachment {
                name: "b.jpg".to_string(),
                media_type: MediaType::Jpeg,
                data: vec![0xff, 0xd8],
            })
            .build();

        let turn = PromptAssembler::assemble(&request, &references());
        assert_eq!(turn.role, Role::User);

        let Content::Parts(parts) = &turn.content else {
            panic!("expected multi-part content");
        };
        assert_eq!(parts.len(), 3);
        assert!(matches!(
            parts[0],
            ContentPart::Image {
                media_type: MediaType::Png,
                ..
            }
        ));
        assert!(matches!(parts[1], ContentPart::Image { .. }));
        assert!(matches!(parts[2], ContentPart::Text(_)));
    }
}

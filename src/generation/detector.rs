//! Structural completion heuristic.
//!
//! The target document follows a fixed section template, so completeness is
//! approximated by textual markers instead of parsing. This is a best-effort
//! signal: the continuation ceiling remains the real backstop.

use crate::constants::markers::{APPENDIX_H1, APPENDIX_H2, CODE_FENCE, END_SENTINEL, SECTION_7};

/// Completion predicate used by the continuation controller
pub type CompletionCheck = fn(&str) -> bool;

/// Whether the accumulated text looks like a finished document.
///
/// Any of these counts as complete:
/// - a `## 8. 附录` heading
/// - a `# 附录` heading
/// - the `---END---` sentinel
/// - text ending in a closing code fence once `## 7.` has been written
pub fn is_document_complete(text: &str) -> bool {
    let trimmed = text.trim();

    trimmed.contains(APPENDIX_H2)
        || trimmed.contains(APPENDIX_H1)
        || trimmed.contains(END_SENTINEL)
        || (trimmed.ends_with(CODE_FENCE) && trimmed.contains(SECTION_7))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_markers() {
        assert!(is_document_complete("# T\n## 8. 附录\n参考"));
        assert!(is_document_complete("# T\n# 附录\n"));
        assert!(is_document_complete("body\n---END---"));
        assert!(!is_document_complete("# Title\n## 1. Overview\n"));
        assert!(!is_document_complete(""));
    }

    #[test]
    fn test_closing_fence_needs_section_seven() {
        let with_section = "## 7. 数据需求\n```mermaid\nerDiagram\n```\n  ";
        assert!(is_document_complete(with_section));

        let without_section = "## 5. 运行面需求\n```mermaid\nsequenceDiagram\n```";
        assert!(!is_document_complete(without_section));

        let open_fence_after_seven = "## 7. 数据需求\n```mermaid\nerDiagram";
        assert!(!is_document_complete(open_fence_after_seven));
    }

    proptest! {
        #[test]
        fn prop_markers_always_complete(
            prefix in ".{0,64}",
            suffix in ".{0,64}",
            marker in prop_oneof![Just(APPENDIX_H2), Just(APPENDIX_H1), Just(END_SENTINEL)],
        ) {
            let text = format!("{prefix}{marker}{suffix}");
            prop_assert!(is_document_complete(&text));
        }

        #[test]
        fn prop_fence_without_section_seven_is_incomplete(body in "[a-zA-Z0-9 \n.,]{0,128}") {
            let text = format!("{body}\n```");
            prop_assert!(!is_document_complete(&text));
        }

        #[test]
        fn prop_fence_after_section_seven_is_complete(body in "[a-zA-Z0-9 \n.,]{0,128}") {
            let text = format!("## 7. Data\n{body}\n```\n");
            prop_assert!(is_document_complete(&text));
        }
    }
}

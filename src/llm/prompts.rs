//! Prompt templates for document and general questions

use std::collections::HashMap;

/// Template for generating prompts
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    template: String,
}

impl PromptTemplate {
    /// Create a new prompt template
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Fill in the template with variables
    ///
    /// Values are substituted in a single left-to-right pass, so a value that
    /// itself contains `{{name}}` is left untouched.
    #[must_use]
    pub fn render(&self, values: &HashMap<&str, &str>) -> String {
        let mut result = String::with_capacity(self.template.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find("{{") {
            let Some(close) = rest[open + 2..].find("}}") else {
                break;
            };
            let name = &rest[open + 2..open + 2 + close];
            result.push_str(&rest[..open]);
            match values.get(name) {
                Some(value) => result.push_str(value),
                None => result.push_str(&rest[open..open + 4 + close]),
            }
            rest = &rest[open + 4 + close..];
        }

        result.push_str(rest);
        result
    }

}

/// A retrieved chunk as it appears in the prompt
#[derive(Debug, Clone, Copy)]
pub struct ContextBlock<'a> {
    pub filename: &'a str,
    pub text: &'a str,
}

/// Standard prompt templates
pub struct RagPrompts;

impl RagPrompts {
    /// Answer strictly from the supplied context
    #[must_use]
    pub fn document_qa() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a precise AI assistant that answers questions based on the provided context documents. Follow these rules:
1. Use ONLY information from the context documents provided below
2. Provide clear, natural, and well-structured answers
3. Do NOT mention relevance scores or technical metadata in your answer
4. Write in a professional and conversational tone
5. If you cite sources, mention them naturally at the end like: 'Source: [filename]'
6. If the context doesn't contain the answer, say so politely

=== CONTEXT DOCUMENTS ===
{{context}}

=== END OF CONTEXT ===

Question: {{question}}

Provide a clear, natural answer using only the information above. Do not mention relevance scores or technical details.

Answer:",
        )
    }

    /// Answer from the model's own knowledge
    #[must_use]
    pub fn general_qa() -> PromptTemplate {
        PromptTemplate::new(
            r"You are a helpful AI assistant. Answer the question clearly and accurately. Provide informative, well-structured responses.

Question: {{question}}

Answer:",
        )
    }
}

/// Join context blocks as `[Document: name]` sections separated by rules
#[must_use]
pub fn format_context(blocks: &[ContextBlock<'_>]) -> String {
    blocks
        .iter()
        .map(|b| format!("[Document: {}]\n{}", b.filename, b.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n")
}

/// Build the prompt for a question answered from retrieved chunks
#[must_use]
pub fn build_document_prompt(question: &str, blocks: &[ContextBlock<'_>]) -> String {
    let context = format_context(blocks);
    RagPrompts::document_qa().render(&HashMap::from([
        ("context", context.as_str()),
        ("question", question),
    ]))
}

/// Build the prompt for a question answered without documents
#[must_use]
pub fn build_general_prompt(question: &str) -> String {
    RagPrompts::general_qa().render(&HashMap::from([("question", question)]))
}

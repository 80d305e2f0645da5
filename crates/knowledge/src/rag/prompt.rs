//! Grounded prompt rendering.
//!
//! The generation instruction is a Handlebars template with three
//! variables: `directive`, `context` and `question`.

use handlebars::Handlebars;
use serde_json::json;
use wikiqa_core::{AppError, AppResult};

/// Fixed grounding directive placed before every question.
pub const GROUNDING_DIRECTIVE: &str = "Please answer the following question using only the supplied context. \
If the answer cannot be found in the context, say so clearly. \
Always cite which part of the context supports each claim.";

/// Built-in template.
pub const DEFAULT_TEMPLATE: &str = "{{directive}}\n\n\
Context:\n\
{{#if context}}{{context}}{{else}}(no passages were retrieved){{/if}}\n\n\
Question: {{question}}";

const TEMPLATE_NAME: &str = "grounded";

/// Compiled prompt template.
pub struct PromptTemplate {
    registry: Handlebars<'static>,
}

impl PromptTemplate {
    /// Compile a template.
    ///
    /// An invalid template is a configuration error.
    pub fn new(template: &str) -> AppResult<Self> {
        let mut registry = Handlebars::new();

        // Plain text output, never HTML
        registry.register_escape_fn(handlebars::no_escape);

        registry
            .register_template_string(TEMPLATE_NAME, template)
            .map_err(|e| AppError::Config(format!("Invalid prompt template: {}", e)))?;

        Ok(Self { registry })
    }

    /// Compile the built-in grounded template.
    pub fn grounded() -> AppResult<Self> {
        Self::new(DEFAULT_TEMPLATE)
    }

    /// Render the instruction for a question and its context block.
    pub fn render(&self, question: &str, context: &str) -> AppResult<String> {
        let data = json!({
            "directive": GROUNDING_DIRECTIVE,
            "context": context,
            "question": question,
        });

        self.registry
            .render(TEMPLATE_NAME, &data)
            .map_err(|e| AppError::Generation(format!("Failed to render prompt: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_grounded_prompt() {
        let template = PromptTemplate::grounded().unwrap();
        let prompt = template
            .render(
                "When is the election?",
                "From 'Election Day' (chunk 1):\n...federal election day...",
            )
            .unwrap();

        assert!(prompt.starts_with(GROUNDING_DIRECTIVE));
        assert!(prompt.contains("Context:\nFrom 'Election Day' (chunk 1):\n...federal election day..."));
        assert!(prompt.ends_with("Question: When is the election?"));
    }

    #[test]
    fn test_render_empty_context() {
        let template = PromptTemplate::grounded().unwrap();
        let prompt = template.render("Who won?", "").unwrap();

        assert!(prompt.contains("(no passages were retrieved)"));
        assert!(prompt.ends_with("Question: Who won?"));
    }

    #[test]
    fn test_no_html_escaping() {
        let template = PromptTemplate::grounded().unwrap();
        let prompt = template
            .render("Is 'A & B' < \"C\"?", "From 'Tom's page' (chunk 0):\nx")
            .unwrap();

        assert!(prompt.contains("Is 'A & B' < \"C\"?"));
        assert!(prompt.contains("Tom's page"));
    }

    #[test]
    fn test_question_is_not_interpreted_as_template() {
        let template = PromptTemplate::grounded().unwrap();
        let prompt = template.render("What is {{directive}}?", "ctx").unwrap();
        assert!(prompt.ends_with("Question: What is {{directive}}?"));
    }

    #[test]
    fn test_custom_template() {
        let template = PromptTemplate::new("Q={{question}} C={{context}}").unwrap();
        assert_eq!(template.render("q", "c").unwrap(), "Q=q C=c");
    }

    #[test]
    fn test_invalid_template_is_config_error() {
        let result = PromptTemplate::new("{{#if context}}x{{/each}}");
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}

use nova_config::TRANSCRIPT_PLACEHOLDER;

use crate::error::{ExtractionError, Result};

/// Prompt used when the configuration provides none
pub const DEFAULT_PROMPT_TEMPLATE: &str = r#"You are a CRM assistant for a sales team. Read the transcript of a salesperson's voice note and extract the sales details it mentions.

Return only a JSON object, with no commentary and no Markdown, using exactly this structure:
{
  "contact": {"name": "", "company": "", "email": "", "phone": "", "role": ""},
  "deal": {"stage": "", "value": null, "products": []},
  "interaction": {"summary": "", "action_items": [], "next_steps": [], "follow_up_date": "", "sentiment": ""}
}

Rules:
- Use "" for text, null for the value and [] for lists the transcript does not mention.
- "value" is the deal amount as a plain number, without currency symbols or separators.
- "stage" is one of: prospecting, qualified, proposal, negotiation, closed won, closed lost, at risk.
- "sentiment" is one of: positive, neutral, negative.
- "summary" is one or two sentences describing the interaction.
- "follow_up_date" keeps the wording of the transcript (e.g. "next Friday") when no exact date is given.

Transcript:
{transcript}"#;

/// Prompt text with a `{transcript}` placeholder
#[derive(Debug, Clone)]
pub struct PromptTemplate(String);

impl PromptTemplate {
    pub fn new(template: impl Into<String>) -> Result<Self> {
        let template = template.into();

        if !template.contains(TRANSCRIPT_PLACEHOLDER) {
            return Err(ExtractionError::ConfigError(format!(
                "prompt template must contain {TRANSCRIPT_PLACEHOLDER}"
            )));
        }

        Ok(Self(template))
    }

    /// Substitute the transcript into the template
    pub fn render(&self, transcript: &str) -> String {
        self.0.replace(TRANSCRIPT_PLACEHOLDER, transcript.trim())
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self(DEFAULT_PROMPT_TEMPLATE.to_string())
    }
}

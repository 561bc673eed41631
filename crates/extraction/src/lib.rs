#![allow(
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::module_name_repetitions
)]

//! CRM data extraction from voice-note transcripts with a generative model

mod client;
mod crm;
mod error;
mod parse;
mod prompt;

pub use client::{GenerativeClient, Generation};
pub use crm::{Contact, CrmData, Deal, Interaction};
pub use error::{ExtractionError, Result};
pub use nova_config::ParseMode;
pub use parse::parse_crm;
pub use prompt::{DEFAULT_PROMPT_TEMPLATE, PromptTemplate};

use nova_config::Config;

/// Transcript in, structured CRM data out
pub struct Extractor {
    client: GenerativeClient,
    template: PromptTemplate,
    parse_mode: ParseMode,
}

impl Extractor {
    /// Build the extractor from configuration
    pub fn from_config(config: &Config) -> Result<Self> {
        let template = match config.generative.prompt_template {
            Some(ref text) => PromptTemplate::new(text.clone())?,
            None => PromptTemplate::default(),
        };

        Ok(Self {
            client: GenerativeClient::from_config(config)?,
            template,
            parse_mode: config.generative.parse_mode,
        })
    }

    /// Render the prompt, ask the model and parse its answer
    pub async fn extract(&self, transcript: &str) -> Result<CrmData> {
        let prompt = self.template.render(transcript);
        let generation = self.client.generate(&prompt).await?;

        let data = parse_crm(&generation.text, self.parse_mode).inspect_err(|e| {
            tracing::warn!(mode = ?self.parse_mode, error = %e, "model output could not be parsed");
        })?;

        tracing::debug!(
            company = %data.contact.company,
            stage = %data.deal.stage,
            "extraction complete"
        );

        Ok(data)
    }

    /// Underlying model client, for raw prompts
    pub fn client(&self) -> &GenerativeClient {
        &self.client
    }
}

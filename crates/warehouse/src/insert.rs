use extraction::CrmData;
use serde::{Deserialize, Serialize};

/// One row of the CRM table, flattened from the extracted data
///
/// List fields map to `REPEATED STRING` columns.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrmRow {
    pub contact_name: String,
    pub company: String,
    pub email: String,
    pub phone: String,
    pub role: String,
    pub deal_stage: String,
    pub deal_value: Option<f64>,
    pub products: Vec<String>,
    pub summary: String,
    pub action_items: Vec<String>,
    pub next_steps: Vec<String>,
    pub follow_up_date: String,
    pub sentiment: String,
    pub transcript: String,
    /// RFC 3339 insertion time
    pub created_at: String,
}

impl CrmRow {
    pub fn from_extraction(transcript: &str, data: &CrmData) -> Self {
        let CrmData {
            contact,
            deal,
            interaction,
        } = data.clone();

        Self {
            contact_name: contact.name,
            company: contact.company,
            email: contact.email,
            phone: contact.phone,
            role: contact.role,
            deal_stage: deal.stage,
            deal_value: deal.value,
            products: deal.products,
            summary: interaction.summary,
            action_items: interaction.action_items,
            next_steps: interaction.next_steps,
            follow_up_date: interaction.follow_up_date,
            sentiment: interaction.sentiment,
            transcript: transcript.to_string(),
            created_at: jiff::Timestamp::now().to_string(),
        }
    }
}

// -- insertAll wire types --

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertAllRequest<'a> {
    pub skip_invalid_rows: bool,
    pub ignore_unknown_values: bool,
    pub rows: Vec<InsertRow<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertRow<'a> {
    pub insert_id: String,
    pub json: &'a CrmRow,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct InsertAllResponse {
    #[serde(default)]
    pub insert_errors: Vec<InsertErrors>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct InsertErrors {
    #[serde(default)]
    pub errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorProto {
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

impl ErrorProto {
    pub fn describe(&self) -> String {
        let message = self.message.as_deref().unwrap_or("unknown error");
        match (self.reason.as_deref(), self.location.as_deref()) {
            (Some(reason), Some(location)) if !location.is_empty() => format!("{reason} at {location}: {message}"),
            (Some(reason), _) => format!("{reason}: {message}"),
            _ => message.to_string(),
        }
    }
}

/// Flatten every per-row error into one message, `None` when the insert succeeded
pub(crate) fn rejection_message(response: &InsertAllResponse) -> Option<String> {
    let messages: Vec<String> = response
        .insert_errors
        .iter()
        .flat_map(|row| row.errors.iter().map(ErrorProto::describe))
        .collect();

    if response.insert_errors.is_empty() {
        None
    } else if messages.is_empty() {
        Some("row rejected without details".to_string())
    } else {
        Some(messages.join("; "))
    }
}

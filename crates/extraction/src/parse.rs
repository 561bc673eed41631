use std::sync::OnceLock;

use nova_config::ParseMode;
use regex::Regex;

use crate::{
    CrmData,
    error::{ExtractionError, Result},
};

/// Turn the model's text into CRM data
pub fn parse_crm(text: &str, mode: ParseMode) -> Result<CrmData> {
    match mode {
        ParseMode::Strict => parse_strict(text),
        ParseMode::Extract => parse_extract(text),
    }
}

fn parse_strict(text: &str) -> Result<CrmData> {
    serde_json::from_str(strip_code_fence(text))
        .map_err(|e| ExtractionError::MalformedResponse(format!("model output is not valid CRM JSON: {e}")))
}

fn parse_extract(text: &str) -> Result<CrmData> {
    if let Some(object) = json_object().find(text)
        && let Ok(data) = serde_json::from_str::<CrmData>(object.as_str())
    {
        return Ok(data);
    }

    let summary = salvage_summary(text)
        .ok_or_else(|| ExtractionError::MalformedResponse("no JSON object found in model output".to_string()))?;

    tracing::debug!("model output was not decodable, kept the summary only");

    let mut data = CrmData::default();
    data.interaction.summary = summary;
    Ok(data)
}

/// Drop a surrounding Markdown code fence (```` ``` ```` or ```` ```json ````)
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };

    // The info string ("json") may be followed by a newline or share the line with the body
    let body = rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()).trim_end();

    body.strip_suffix("```").unwrap_or(body).trim()
}

/// Outermost `{ ... }` span, greedy across lines
fn json_object() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("must be valid regex"))
}

/// `"summary": "<JSON string>"`
fn summary_field() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#""summary"\s*:\s*("(?:[^"\\]|\\.)*")"#).expect("must be valid regex"))
}

fn salvage_summary(text: &str) -> Option<String> {
    let literal = summary_field().captures(text)?.get(1)?.as_str();
    serde_json::from_str::<String>(literal).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CLEAN: &str = r#"{
  "contact": {"name": "Sarah", "company": "Acme Corp", "role": "VP of Sales"},
  "deal": {"stage": "qualified", "value": 50000, "products": ["Enterprise Plan"]},
  "interaction": {"summary": "Coffee meeting about the enterprise plan.", "sentiment": "positive"}
}"#;

    #[test]
    fn strict_accepts_bare_json() {
        let data = parse_crm(CLEAN, ParseMode::Strict).unwrap();
        assert_eq!(data.contact.company, "Acme Corp");
        assert_eq!(data.deal.value, Some(50_000.0));
    }

    #[test]
    fn strict_accepts_fenced_json() {
        let fenced = format!("```json\n{CLEAN}\n```");
        let data = parse_crm(&fenced, ParseMode::Strict).unwrap();
        assert_eq!(data.contact.name, "Sarah");

        let bare_fence = format!("```\n{CLEAN}\n```\n");
        assert!(parse_crm(&bare_fence, ParseMode::Strict).is_ok());
    }

    #[test]
    fn strict_accepts_single_line_fence() {
        let data = parse_crm(r#"```json {"contact": {"name": "Sarah"}} ```"#, ParseMode::Strict).unwrap();
        assert_eq!(data.contact.name, "Sarah");

        let data = parse_crm(r#"```{"deal": {"stage": "won"}}```"#, ParseMode::Strict).unwrap();
        assert_eq!(data.deal.stage, "won");
    }

    #[test]
    fn strict_rejects_prose() {
        let chatty = format!("Here is the data you asked for:\n{CLEAN}");
        assert!(matches!(
            parse_crm(&chatty, ParseMode::Strict),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn extract_finds_object_in_prose() {
        let chatty = format!("Sure! Here is the data you asked for:\n```json\n{CLEAN}\n```\nLet me know if you need more.");
        let data = parse_crm(&chatty, ParseMode::Extract).unwrap();
        assert_eq!(data.interaction.summary, "Coffee meeting about the enterprise plan.");
        assert_eq!(data.deal.products, vec!["Enterprise Plan"]);
    }

    #[test]
    fn extract_salvages_summary_from_broken_json() {
        let broken = r#"{"contact": {"name": "Sarah",}, "interaction": {"summary": "Wants a \"fast\" proposal.", "next_steps": ["#;
        let data = parse_crm(broken, ParseMode::Extract).unwrap();

        assert_eq!(data.interaction.summary, "Wants a \"fast\" proposal.");
        assert_eq!(data.contact, crate::Contact::default());
    }

    #[test]
    fn extract_rejects_text_without_json() {
        assert!(matches!(
            parse_crm("I could not find any CRM details.", ParseMode::Extract),
            Err(ExtractionError::MalformedResponse(_))
        ));
    }

    #[test]
    fn fence_stripping() {
        assert_eq!(strip_code_fence("  {}  "), "{}");
        assert_eq!(strip_code_fence("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_fence("```\n{}\n"), "{}");
        assert_eq!(strip_code_fence("```"), "");
    }
}

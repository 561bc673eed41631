use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use serde_with::{DefaultOnNull, OneOrMany, formats::PreferMany, serde_as};

/// Structured CRM data pulled out of one voice note
///
/// Every field falls back to its default when the model omits it or
/// answers `null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CrmData {
    #[serde(default, deserialize_with = "null_as_default")]
    pub contact: Contact,
    #[serde(default, deserialize_with = "null_as_default")]
    pub deal: Deal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub interaction: Interaction,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub name: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub company: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub email: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub phone: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub role: String,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deal {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub stage: String,
    /// Deal amount; numbers and amounts such as "$50,000" or "50K" are accepted
    #[serde(default, deserialize_with = "lenient_amount")]
    pub value: Option<f64>,
    #[serde_as(deserialize_as = "DefaultOnNull<OneOrMany<_, PreferMany>>")]
    #[serde(default)]
    pub products: Vec<String>,
}

#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interaction {
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub summary: String,
    #[serde_as(deserialize_as = "DefaultOnNull<OneOrMany<_, PreferMany>>")]
    #[serde(default)]
    pub action_items: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull<OneOrMany<_, PreferMany>>")]
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub follow_up_date: String,
    #[serde_as(deserialize_as = "DefaultOnNull")]
    #[serde(default)]
    pub sentiment: String,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn lenient_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Amount {
        Number(f64),
        Text(String),
    }

    let amount = Option::<Amount>::deserialize(deserializer)?;

    Ok(match amount {
        Some(Amount::Number(value)) => Some(value),
        Some(Amount::Text(text)) => parse_amount(&text),
        None => None,
    })
}

/// `$50,000`, `USD 1,250.50`, `50K` or `1.2 million`
fn amount_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)^(?:usd|eur|gbp|[$€£¥])?\s*(-?(?:\d{1,3}(?:,\d{3})+|\d+)(?:\.\d+)?)\s*(thousand|million|billion|mm|bn|k|m|b)?\s*(?:usd|eur|gbp|dollars?)?$",
        )
        .expect("must be valid regex")
    })
}

/// Parse a spoken or formatted amount into a number
///
/// Ranges and anything else that is not a single amount yield `None`.
fn parse_amount(text: &str) -> Option<f64> {
    let captures = amount_pattern().captures(text.trim())?;

    let value: f64 = captures[1].replace(',', "").parse().ok()?;

    let multiplier = match captures.get(2).map(|m| m.as_str().to_ascii_lowercase()).as_deref() {
        None => 1.0,
        Some("k" | "thousand") => 1e3,
        Some("m" | "mm" | "million") => 1e6,
        Some(_) => 1e9,
    };

    Some(value * multiplier).filter(|value| value.is_finite())
}

use std::collections::BTreeSet;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::llm_client::prompts::fill_template;
use crate::llm_client::{strip_json_fences, LlmClient, LlmError, LlmParams};
use crate::skills::prompts;

static BRACKETED_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\[(.*?)\]").expect("valid regex"));

/// Which kind of document the skills are pulled from. Anything that is not `cv` is a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextKind {
    Cv,
    Job,
}

impl TextKind {
    pub fn from_label(label: Option<&str>) -> Self {
        match label {
            Some(l) if l.trim().eq_ignore_ascii_case("cv") => TextKind::Cv,
            None => TextKind::Cv,
            _ => TextKind::Job,
        }
    }
}

/// Asks the model for the skills in `text`; returns a deduplicated, sorted list.
pub async fn extract_skills(
    llm: &LlmClient,
    params: &LlmParams,
    text: &str,
    kind: TextKind,
) -> Result<Vec<String>, LlmError> {
    let (system, user) = match kind {
        TextKind::Cv => (prompts::CV_SKILLS_SYSTEM, prompts::CV_SKILLS_USER),
        TextKind::Job => (prompts::JOB_SKILLS_SYSTEM, prompts::JOB_SKILLS_USER),
    };
    let user = fill_template(user, &[("text", text)]);

    let raw = llm.complete(params, system, &user).await?;
    Ok(parse_skill_list(&raw))
}

/// Best-effort parse of a model's skill list.
///
/// Tries, in order: a JSON array (a lone JSON value becomes a one-item list), the first
/// bracketed `[...]` span split on commas, then the whole text split on commas and newlines.
/// Items are trimmed of whitespace and quotes; one-character items are dropped.
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    let content = strip_json_fences(raw);

    let items: Vec<String> = match serde_json::from_str::<Value>(content) {
        Ok(Value::Array(values)) => values.into_iter().map(value_to_item).collect(),
        Ok(value) => vec![value_to_item(value)],
        Err(_) => match BRACKETED_RE.captures(content) {
            Some(caps) => caps[1].split(',').map(str::to_string).collect(),
            None => content
                .split(['\n', ','])
                .map(str::to_string)
                .collect(),
        },
    };

    items
        .iter()
        .map(|s| clean_item(s))
        .filter(|s| s.chars().count() > 1)
        .map(str::to_string)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

fn value_to_item(value: Value) -> String {
    match value {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn clean_item(item: &str) -> &str {
    item.trim().trim_matches(|c| c == '"' || c == '\'').trim()
}

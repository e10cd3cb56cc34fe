// Shared prompt constants and prompt-building utilities.
// Each service that needs LLM calls defines its own prompts.rs alongside it.
// This file contains cross-cutting prompt fragments.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You are a precise, structured assistant. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON payload. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Fills `{name}` placeholders in a single pass over `template`.
///
/// Inserted values are never rescanned: a job description that happens to contain
/// `{cv_text}` stays literal. Placeholders without a value are left as they are.
pub fn fill_template(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let tail = &rest[open..];
        let filled = tail[1..].find('}').and_then(|len| {
            let name = &tail[1..=len];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, len + 2))
        });
        match filled {
            Some((value, consumed)) => {
                out.push_str(value);
                rest = &tail[consumed..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// Output languages supported by the generation prompts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    French,
    English,
    Spanish,
}

impl Language {
    /// Resolves a language code (`fr`, `en`, `es`). Unknown or missing codes fall back to French.
    pub fn from_code(code: Option<&str>) -> Self {
        match code.map(|c| c.trim().to_ascii_lowercase()).as_deref() {
            Some("en") => Language::English,
            Some("es") => Language::Spanish,
            _ => Language::French,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Language::French => "fr",
            Language::English => "en",
            Language::Spanish => "es",
        }
    }

    /// The name injected into prompts ("write everything in ...").
    pub fn prompt_name(self) -> &'static str {
        match self {
            Language::French => "French (Français)",
            Language::English => "English",
            Language::Spanish => "Spanish (Español)",
        }
    }
}

//! Cover-letter generation: one chat completion in the requested language.

use serde::Serialize;
use tracing::info;

use crate::documents::extract::word_count;
use crate::letter::prompts::{language_guidelines, LETTER_SYSTEM, LETTER_USER};
use crate::llm_client::prompts::{fill_template, Language};
use crate::llm_client::{LlmClient, LlmError, LlmParams};

pub struct LetterInput<'a> {
    pub cv_text: &'a str,
    pub optimized_cv: &'a str,
    pub job_description: &'a str,
    pub target_words: u32,
    pub language: Language,
}

#[derive(Debug, Clone, Serialize)]
pub struct CoverLetter {
    pub cover_letter: String,
    pub word_count: usize,
    pub target_words: u32,
    pub model_used: String,
    pub temperature: f32,
}

/// Rounds to the nearest multiple of ten; halves go to the even multiple.
pub fn round_target_words(words: u32) -> u32 {
    ((f64::from(words) / 10.0).round_ties_even() * 10.0) as u32
}

pub async fn generate_cover_letter(
    llm: &LlmClient,
    params: &LlmParams,
    input: &LetterInput<'_>,
) -> Result<CoverLetter, LlmError> {
    let target_words = round_target_words(input.target_words);
    let language = input.language.prompt_name();

    let target = target_words.to_string();

    let system = fill_template(
        LETTER_SYSTEM,
        &[
            ("language_guidelines", language_guidelines(input.language)),
            ("language", language),
            ("target_words", target.as_str()),
        ],
    );
    let user = fill_template(
        LETTER_USER,
        &[
            ("language", language),
            ("target_words", target.as_str()),
            ("job_description", input.job_description),
            ("optimized_cv", input.optimized_cv),
            ("cv_text", input.cv_text),
        ],
    );

    let cover_letter = llm.complete(params, &system, &user).await?.trim().to_string();
    let words = word_count(&cover_letter);

    info!(
        model = %params.model,
        language = input.language.code(),
        target_words,
        word_count = words,
        "cover letter generated"
    );

    Ok(CoverLetter {
        word_count: words,
        cover_letter,
        target_words,
        model_used: params.model.clone(),
        temperature: params.temperature,
    })
}

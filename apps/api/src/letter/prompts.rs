// Prompt templates for cover-letter generation.
// Placeholders: {language}, {language_guidelines}, {target_words}, {job_description},
// {cv_text}, {optimized_cv}.

use crate::llm_client::prompts::Language;

pub const LETTER_SYSTEM: &str = "You are a professional writer helping someone write a cover letter. \
Your goal is to create a letter that sounds completely natural and human-written, NOT AI-generated.

CRITICAL: The entire cover letter must be written in {language}.

GUIDELINES TO AVOID AI DETECTION:
- Use varied sentence lengths
- Include personal touches
- Avoid overly formal or robotic language
- Use natural transitions
- Include specific details
- Vary your vocabulary
- Write in a warm, professional but authentic tone
{language_guidelines}

Target length: approximately {target_words} words.";

pub const LETTER_USER: &str = "Job Description:
{job_description}

Candidate's Original CV:
{cv_text}

Candidate's Optimized CV (for reference):
{optimized_cv}

Write a compelling, natural-sounding cover letter in {language} that:
1. Shows genuine interest in this specific role and company
2. Highlights relevant experience from the CV
3. Connects the candidate's background to the job requirements
4. Sounds completely human-written (no AI patterns)
5. Is approximately {target_words} words
6. Uses appropriate business letter conventions for {language}

Write everything in {language}.";

/// Opening and closing conventions for each letter language.
pub fn language_guidelines(language: Language) -> &'static str {
    match language {
        Language::French => {
            "- Use appropriate French business letter conventions\n\
             - Use 'Madame, Monsieur' or 'Madame, Monsieur le Directeur' for formal openings\n\
             - Use 'Cordialement' or 'Bien cordialement' for closings"
        }
        Language::English => {
            "- Use appropriate English business letter conventions\n\
             - Use 'Dear [Name]' or 'Dear Hiring Manager' for openings\n\
             - Use 'Sincerely' or 'Best regards' for closings"
        }
        Language::Spanish => {
            "- Use appropriate Spanish business letter conventions\n\
             - Use 'Estimado/a [Nombre]' or 'A quien corresponda' for openings\n\
             - Use 'Atentamente' or 'Saludos cordiales' for closings"
        }
    }
}

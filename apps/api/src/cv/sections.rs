use serde::Serialize;

use super::structure::is_heading;

const MAX_SEARCH_MATCHES: usize = 50;
const HEADING_MAX_CHARS: usize = 50;

/// Keywords recognised for the sections the assistant usually edits.
fn update_patterns(section_name: &str) -> Vec<String> {
    let lower = section_name.trim().to_lowercase();
    let known: &[&str] = match lower.as_str() {
        "experience" => &["experience", "work experience", "professional experience"],
        "education" => &["education", "academic", "qualifications"],
        "skills" => &["skills", "competencies", "technical skills"],
        "summary" => &["summary", "profile", "objective"],
        _ => return vec![lower],
    };
    known.iter().map(|p| p.to_string()).collect()
}

#[derive(Debug, Clone, Serialize)]
pub struct SectionUpdate {
    pub updated_cv: String,
    pub section_found: bool,
}

/// Replaces the body of the first heading matching `section_name` with `new_content`.
///
/// The heading is the first line shorter than 50 characters that contains one of the
/// section's keywords. Its body runs until the next heading-like line (see `is_heading`).
/// A missing section is appended at the end under an uppercase heading.
pub fn update_section(cv_text: &str, section_name: &str, new_content: &str) -> SectionUpdate {
    let patterns = update_patterns(section_name);
    let mut out: Vec<&str> = Vec::new();
    let mut in_section = false;
    let mut section_found = false;

    for line in cv_text.split('\n') {
        if in_section {
            if is_heading(line) {
                in_section = false;
            } else {
                continue;
            }
        }

        if !section_found {
            let lower = line.trim().to_lowercase();
            if line.trim().chars().count() < HEADING_MAX_CHARS
                && patterns.iter().any(|p| lower.contains(p.as_str()))
            {
                section_found = true;
                in_section = true;
                out.push(line);
                out.push(new_content);
                continue;
            }
        }

        out.push(line);
    }

    let mut updated_cv = out.join("\n");
    if !section_found {
        updated_cv.push_str("\n\n");
        updated_cv.push_str(&section_name.trim().to_uppercase());
        updated_cv.push('\n');
        updated_cv.push_str(new_content);
    }

    SectionUpdate {
        updated_cv,
        section_found,
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LineMatch {
    pub line_number: usize,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SearchResult {
    pub found: bool,
    /// First 50 matching lines.
    pub matches: Vec<LineMatch>,
    /// Total number of matching lines.
    pub count: usize,
}

/// Case-insensitive line search. Line numbers are 1-based.
pub fn search_content(cv_text: &str, term: &str) -> SearchResult {
    let needle = term.to_lowercase();
    let all: Vec<LineMatch> = cv_text
        .split('\n')
        .enumerate()
        .filter(|(_, line)| line.to_lowercase().contains(&needle))
        .map(|(i, line)| LineMatch {
            line_number: i + 1,
            content: line.trim().to_string(),
        })
        .collect();

    let count = all.len();
    SearchResult {
        found: count > 0,
        matches: all.into_iter().take(MAX_SEARCH_MATCHES).collect(),
        count,
    }
}

//! CV section detection by keyword heuristics.
//!
//! A line is a heading candidate when it is shorter than 50 characters and written in
//! all caps or title case; it is then classified by the first pattern group it contains.

use serde::{Deserialize, Serialize};

const HEADING_MAX_CHARS: usize = 50;

/// Canonical section names and the keywords that identify them, in priority order.
const SECTION_PATTERNS: &[(&str, &[&str])] = &[
    (
        "experience",
        &[
            "experience",
            "work experience",
            "professional experience",
            "employment",
            "career",
        ],
    ),
    (
        "education",
        &["education", "academic", "qualifications", "degrees"],
    ),
    (
        "skills",
        &["skills", "competencies", "technical skills", "abilities"],
    ),
    ("summary", &["summary", "profile", "objective", "about"]),
    ("projects", &["projects", "portfolio", "work samples"]),
    (
        "certifications",
        &["certifications", "certificates", "credentials"],
    ),
    ("languages", &["languages", "language skills"]),
];

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CvStructure {
    pub sections: Vec<String>,
    pub has_experience: bool,
    pub has_education: bool,
    pub has_skills: bool,
    pub section_count: usize,
}

pub fn analyze_structure(cv_text: &str) -> CvStructure {
    let mut structure = CvStructure::default();

    for line in cv_text.lines() {
        if !is_heading(line) {
            continue;
        }
        let lower = line.trim().to_lowercase();
        let Some((name, _)) = SECTION_PATTERNS
            .iter()
            .find(|(_, patterns)| patterns.iter().any(|p| lower.contains(p)))
        else {
            continue;
        };

        if !structure.sections.iter().any(|s| s == name) {
            structure.sections.push(name.to_string());
        }
        match *name {
            "experience" => structure.has_experience = true,
            "education" => structure.has_education = true,
            "skills" => structure.has_skills = true,
            _ => {}
        }
    }

    structure.section_count = structure.sections.len();
    structure
}

/// Short line in all caps or title case.
pub fn is_heading(line: &str) -> bool {
    line.trim().chars().count() < HEADING_MAX_CHARS && (is_all_caps(line) || is_title_case(line))
}

/// At least one cased character, and no lowercase ones.
pub fn is_all_caps(s: &str) -> bool {
    let mut cased = false;
    for c in s.chars() {
        if c.is_lowercase() {
            return false;
        }
        if c.is_uppercase() {
            cased = true;
        }
    }
    cased
}

/// Every run of letters starts with an uppercase letter followed only by lowercase ones,
/// and there is at least one letter.
pub fn is_title_case(s: &str) -> bool {
    let mut cased = false;
    let mut in_word = false;
    for c in s.chars() {
        if c.is_uppercase() {
            if in_word {
                return false;
            }
            in_word = true;
            cased = true;
        } else if c.is_lowercase() {
            if !in_word {
                return false;
            }
            cased = true;
        } else {
            in_word = false;
        }
    }
    cased
}

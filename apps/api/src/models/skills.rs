use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    Exact,
    Partial,
    Semantic,
    /// Job skill evidenced by the indexed CV text rather than by a listed CV skill.
    Context,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDetail {
    pub cv_skill: String,
    pub job_skill: String,
    pub match_type: MatchType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub similarity: Option<f32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillStats {
    pub total_cv: usize,
    pub total_job: usize,
    pub matched_count: usize,
    pub missing_count: usize,
    pub cv_only_count: usize,
    pub interesting_count: usize,
    pub match_percentage: f64,
    pub avg_similarity: f64,
}

/// Four-way bucketing of CV skills against job skills.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillsComparison {
    pub matched: Vec<String>,
    pub matched_details: Vec<MatchDetail>,
    pub cv_only: Vec<String>,
    pub job_only: Vec<String>,
    pub interesting: Vec<String>,
    pub stats: SkillStats,
}

impl SkillsComparison {
    /// Job skills the CV does not cover.
    pub fn missing(&self) -> &[String] {
        &self.job_only
    }
}

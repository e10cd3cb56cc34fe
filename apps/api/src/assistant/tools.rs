//! Tools the assistant model can call.
//!
//! Every tool acts on the agent's [`Workspace`]: the working copy of the CV and the
//! skills lists for the current request. The model never passes CV text in; it names
//! a section or a search term and the tool reads the working copy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use thiserror::Error;

use crate::cv::sections::{search_content, update_section};
use crate::llm_client::{LlmClient, LlmError, LlmParams, ToolCall, ToolSpec};
use crate::models::skills::SkillsComparison;
use crate::rag::store::SessionIndex;
use crate::rag::Embedder;
use crate::skills::extract::{extract_skills, TextKind};
use crate::skills::matcher::{compare_skills, MatchContext};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool '{0}'")]
    UnknownTool(String),

    #[error("invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: ToolName, reason: String },

    #[error("{0}")]
    Precondition(&'static str),

    #[error("skill extraction failed: {0}")]
    Llm(#[from] LlmError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolName {
    UpdateCvSection,
    SearchCv,
    ExtractCvSkills,
    ExtractJobSkills,
    CompareSkills,
}

impl fmt::Display for ToolName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ToolName::UpdateCvSection => "update_cv_section",
            ToolName::SearchCv => "search_cv",
            ToolName::ExtractCvSkills => "extract_cv_skills",
            ToolName::ExtractJobSkills => "extract_job_skills",
            ToolName::CompareSkills => "compare_skills",
        };
        f.write_str(name)
    }
}

impl FromStr for ToolName {
    type Err = ToolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "update_cv_section" => Ok(ToolName::UpdateCvSection),
            "search_cv" => Ok(ToolName::SearchCv),
            "extract_cv_skills" => Ok(ToolName::ExtractCvSkills),
            "extract_job_skills" => Ok(ToolName::ExtractJobSkills),
            "compare_skills" => Ok(ToolName::CompareSkills),
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }
}

/// JSON-schema descriptions sent with every assistant chat request.
pub fn tool_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::function(
            "update_cv_section",
            "Replace the content of one CV section (e.g. 'Experience', 'Skills', 'Certifications', \
             'Education'). new_content REPLACES the whole section, so include every item to keep. \
             To remove one item, call search_cv first, then send the section without that item. \
             A missing section is appended at the end of the CV.",
            json!({
                "type": "object",
                "properties": {
                    "section_name": {"type": "string", "description": "Section to replace"},
                    "new_content": {"type": "string", "description": "Complete new section body"}
                },
                "required": ["section_name", "new_content"]
            }),
        ),
        ToolSpec::function(
            "search_cv",
            "Case-insensitive search of the current CV. Returns matching lines with 1-based \
             line numbers.",
            json!({
                "type": "object",
                "properties": {
                    "search_term": {"type": "string"}
                },
                "required": ["search_term"]
            }),
        ),
        ToolSpec::function(
            "extract_cv_skills",
            "Re-extract the skills list from the current CV.",
            json!({"type": "object", "properties": {}}),
        ),
        ToolSpec::function(
            "extract_job_skills",
            "Extract the skills list from the job description.",
            json!({"type": "object", "properties": {}}),
        ),
        ToolSpec::function(
            "compare_skills",
            "Compare the current CV skills with the job skills and report matched, missing \
             and CV-only skills.",
            json!({"type": "object", "properties": {}}),
        ),
    ]
}

/// Mutable state the tools operate on during one assistant request.
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    pub cv: String,
    pub job_description: String,
    pub cv_skills: Vec<String>,
    pub job_skills: Vec<String>,
    pub comparison: Option<SkillsComparison>,
    pub cv_changed: bool,
    pub skills_changed: bool,
}

/// The skills state returned to the caller after a skills tool ran.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatedSkills {
    pub cv_skills: Vec<String>,
    pub job_skills: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<SkillsComparison>,
}

impl Workspace {
    pub fn updated_skills(&self) -> Option<UpdatedSkills> {
        self.skills_changed.then(|| UpdatedSkills {
            cv_skills: self.cv_skills.clone(),
            job_skills: self.job_skills.clone(),
            comparison: self.comparison.clone(),
        })
    }
}

/// Provider handles the skills tools need.
pub struct ToolContext<'a> {
    pub llm: &'a LlmClient,
    pub params: &'a LlmParams,
    pub embedder: Option<&'a dyn Embedder>,
    pub session: SessionIndex,
}

#[derive(Deserialize)]
struct UpdateSectionArgs {
    section_name: String,
    new_content: String,
}

#[derive(Deserialize)]
struct SearchArgs {
    search_term: String,
}

fn parse_args<T: serde::de::DeserializeOwned>(tool: ToolName, raw: &str) -> Result<T, ToolError> {
    let raw = if raw.trim().is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| ToolError::InvalidArguments {
        tool,
        reason: e.to_string(),
    })
}

/// Runs one tool call against the workspace and returns its JSON result.
pub async fn execute(
    call: &ToolCall,
    workspace: &mut Workspace,
    ctx: &ToolContext<'_>,
) -> Result<Value, ToolError> {
    let tool: ToolName = call.function.name.parse()?;
    let raw_args = call.function.arguments.as_str();

    match tool {
        ToolName::UpdateCvSection => {
            let args: UpdateSectionArgs = parse_args(tool, raw_args)?;
            if args.section_name.trim().is_empty() {
                return Err(ToolError::Precondition("section_name must not be empty"));
            }
            let update = update_section(&workspace.cv, &args.section_name, &args.new_content);
            workspace.cv = update.updated_cv;
            workspace.cv_changed = true;
            Ok(json!({
                "status": "success",
                "section": args.section_name,
                "section_found": update.section_found,
            }))
        }
        ToolName::SearchCv => {
            let args: SearchArgs = parse_args(tool, raw_args)?;
            let result = search_content(&workspace.cv, &args.search_term);
            Ok(serde_json::to_value(result).unwrap_or(Value::Null))
        }
        ToolName::ExtractCvSkills => {
            let skills = extract_skills(ctx.llm, ctx.params, &workspace.cv, TextKind::Cv).await?;
            workspace.cv_skills = skills;
            workspace.skills_changed = true;
            Ok(json!({"skills": workspace.cv_skills, "count": workspace.cv_skills.len()}))
        }
        ToolName::ExtractJobSkills => {
            if workspace.job_description.trim().is_empty() {
                return Err(ToolError::Precondition("no job description is available"));
            }
            let skills = extract_skills(
                ctx.llm,
                ctx.params,
                &workspace.job_description,
                TextKind::Job,
            )
            .await?;
            workspace.job_skills = skills;
            workspace.skills_changed = true;
            Ok(json!({"skills": workspace.job_skills, "count": workspace.job_skills.len()}))
        }
        ToolName::CompareSkills => {
            if workspace.cv_skills.is_empty() || workspace.job_skills.is_empty() {
                return Err(ToolError::Precondition(
                    "both CV skills and job skills are required; extract them first",
                ));
            }
            let match_ctx = MatchContext {
                embedder: ctx.embedder,
                cv_index: ctx.session.cv.as_deref(),
                jd_index: ctx.session.jd.as_deref(),
                probe: None,
            };
            let comparison =
                compare_skills(&workspace.cv_skills, &workspace.job_skills, &match_ctx).await;
            let summary = json!({
                "matched": comparison.matched,
                "missing": comparison.job_only,
                "cv_only": comparison.cv_only,
                "interesting": comparison.interesting,
                "match_percentage": comparison.stats.match_percentage,
            });
            workspace.comparison = Some(comparison);
            workspace.skills_changed = true;
            Ok(summary)
        }
    }
}

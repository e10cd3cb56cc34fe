//! CV optimization pipeline: a fixed linear graph of seven nodes.
//!
//! analyze_structure → index_documents → extract_cv_skills → extract_job_skills
//!   → compare_skills → retrieve_context → generate_cv
//!
//! Every node appends a `✓`/`✗` line to the agent log. Indexing, skill and retrieval nodes
//! degrade: a failure is logged and the pipeline continues with what it has. Only a failed
//! generation aborts the run.

use serde::Serialize;
use tracing::{info, warn};

use crate::cv::prompts;
use crate::cv::structure::{analyze_structure, CvStructure};
use crate::llm_client::prompts::{fill_template, Language};
use crate::llm_client::{LlmClient, LlmError, LlmParams};
use crate::models::skills::SkillsComparison;
use crate::rag::index::IndexStats;
use crate::rag::{Embedder, RagStore, RetrievedContext};
use crate::skills::extract::{extract_skills, TextKind};
use crate::skills::matcher::{compare_skills, InterestingProbe, MatchContext};

pub const NODES: [&str; 7] = [
    "analyze_structure",
    "index_documents",
    "extract_cv_skills",
    "extract_job_skills",
    "compare_skills",
    "retrieve_context",
    "generate_cv",
];

const EXTRACT_TEMPERATURE: f32 = 0.2;
const COMPARE_TEMPERATURE: f32 = 0.3;
const RETRIEVE_K_CV: usize = 5;
const RETRIEVE_K_JD: usize = 3;
/// Skills listed per bucket in the generation prompt.
const PROMPT_SKILLS: usize = 10;
const QUERY_EXCERPT_CHARS: usize = 300;

#[derive(Debug, Clone, Serialize)]
pub struct GraphEdge {
    pub source: &'static str,
    pub target: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct GraphStructure {
    pub nodes: Vec<&'static str>,
    pub edges: Vec<GraphEdge>,
}

pub fn graph_structure() -> GraphStructure {
    let mut path = vec!["__start__"];
    path.extend(NODES);
    path.push("__end__");

    GraphStructure {
        nodes: NODES.to_vec(),
        edges: path
            .windows(2)
            .map(|pair| GraphEdge {
                source: pair[0],
                target: pair[1],
            })
            .collect(),
    }
}

#[derive(Debug, Clone)]
pub struct OptimizeInput {
    pub cv_text: String,
    pub job_description: String,
    pub min_experiences: u32,
    pub max_experiences: u32,
    pub max_date_years: Option<u32>,
    pub language: Language,
    pub session_id: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Sources {
    pub cv: Vec<String>,
    pub jd: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RagDetails {
    pub cv_index: Option<IndexStats>,
    pub jd_index: Option<IndexStats>,
    pub retrieval: Option<RetrievedContext>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptimizeOutcome {
    pub optimized_cv: String,
    pub agent_logs: Vec<String>,
    pub cv_structure: CvStructure,
    pub cv_skills: Vec<String>,
    pub job_skills: Vec<String>,
    pub skills_comparison: Option<SkillsComparison>,
    pub sources: Sources,
    pub rag_details: RagDetails,
    pub graph_structure: GraphStructure,
    pub model_used: String,
    pub word_count: usize,
}

/// Dependencies of one pipeline run.
pub struct CvOptimizer<'a> {
    pub llm: &'a LlmClient,
    pub params: &'a LlmParams,
    pub rag: &'a RagStore,
    pub embedder: &'a dyn Embedder,
}

/// Intermediate results threaded through the nodes.
#[derive(Default)]
struct PipelineState {
    structure: CvStructure,
    cv_skills: Vec<String>,
    job_skills: Vec<String>,
    comparison: Option<SkillsComparison>,
    rag_details: RagDetails,
    context: Option<RetrievedContext>,
    logs: Vec<String>,
}

impl PipelineState {
    fn ok(&mut self, msg: String) {
        info!("✓ {msg}");
        self.logs.push(format!("✓ {msg}"));
    }

    fn fail(&mut self, msg: String) {
        warn!("✗ {msg}");
        self.logs.push(format!("✗ {msg}"));
    }
}

impl CvOptimizer<'_> {
    pub async fn run(&self, input: &OptimizeInput) -> Result<OptimizeOutcome, LlmError> {
        let mut state = PipelineState::default();

        self.analyze_structure(input, &mut state);
        self.index_documents(input, &mut state).await;
        self.extract_cv_skills(input, &mut state).await;
        self.extract_job_skills(input, &mut state).await;
        self.compare_skills(input, &mut state).await;
        self.retrieve_context(input, &mut state).await;
        let optimized_cv = self.generate_cv(input, &mut state).await?;

        let sources = state
            .context
            .as_ref()
            .map(|ctx| Sources {
                cv: ctx.cv_sources.clone(),
                jd: ctx.jd_sources.clone(),
            })
            .unwrap_or_default();
        state.rag_details.retrieval = state.context.take();

        Ok(OptimizeOutcome {
            word_count: optimized_cv.split_whitespace().count(),
            optimized_cv,
            agent_logs: state.logs,
            cv_structure: state.structure,
            cv_skills: state.cv_skills,
            job_skills: state.job_skills,
            skills_comparison: state.comparison,
            sources,
            rag_details: state.rag_details,
            graph_structure: graph_structure(),
            model_used: self.params.model.clone(),
        })
    }

    fn analyze_structure(&self, input: &OptimizeInput, state: &mut PipelineState) {
        state.structure = analyze_structure(&input.cv_text);
        state.ok(format!(
            "Analyzed CV structure: Found {} sections",
            state.structure.section_count
        ));
    }

    async fn index_documents(&self, input: &OptimizeInput, state: &mut PipelineState) {
        let session = &input.session_id;

        match self.rag.index_cv(session, &input.cv_text, self.embedder).await {
            Ok(stats) => {
                state.ok(format!("Indexed CV: {} chunks", stats.chunks_count));
                state.rag_details.cv_index = Some(stats);
            }
            Err(e) => state.fail(format!("Error indexing CV: {e}")),
        }
        match self
            .rag
            .index_jd(session, &input.job_description, self.embedder)
            .await
        {
            Ok(stats) => {
                state.ok(format!(
                    "Indexed job description: {} chunks",
                    stats.chunks_count
                ));
                state.rag_details.jd_index = Some(stats);
            }
            Err(e) => state.fail(format!("Error indexing job description: {e}")),
        }
    }

    fn extraction_params(&self) -> LlmParams {
        LlmParams {
            temperature: EXTRACT_TEMPERATURE,
            ..self.params.clone()
        }
    }

    async fn extract_cv_skills(&self, input: &OptimizeInput, state: &mut PipelineState) {
        let params = self.extraction_params();
        match extract_skills(self.llm, &params, &input.cv_text, TextKind::Cv).await {
            Ok(skills) => {
                state.ok(format!("Extracted {} skills from CV", skills.len()));
                state.cv_skills = skills;
            }
            Err(e) => state.fail(format!("Error extracting CV skills: {e}")),
        }
    }

    async fn extract_job_skills(&self, input: &OptimizeInput, state: &mut PipelineState) {
        let params = self.extraction_params();
        match extract_skills(self.llm, &params, &input.job_description, TextKind::Job).await {
            Ok(skills) => {
                state.ok(format!(
                    "Extracted {} skills from job description",
                    skills.len()
                ));
                state.job_skills = skills;
            }
            Err(e) => state.fail(format!("Error extracting job skills: {e}")),
        }
    }

    async fn compare_skills(&self, input: &OptimizeInput, state: &mut PipelineState) {
        if state.cv_skills.is_empty() || state.job_skills.is_empty() {
            state.fail("Skipped skills comparison: a skills list is empty".to_string());
            return;
        }

        let session = self.rag.session(&input.session_id);
        let params = LlmParams {
            temperature: COMPARE_TEMPERATURE,
            ..self.params.clone()
        };
        let ctx = MatchContext {
            embedder: Some(self.embedder),
            cv_index: session.cv.as_deref(),
            jd_index: session.jd.as_deref(),
            probe: Some(InterestingProbe {
                llm: self.llm,
                params: &params,
                cv_text: &input.cv_text,
                job_text: &input.job_description,
            }),
        };

        let comparison = compare_skills(&state.cv_skills, &state.job_skills, &ctx).await;
        state.ok(format!(
            "Compared skills: {} matches, {} missing",
            comparison.matched.len(),
            comparison.missing().len()
        ));
        state.comparison = Some(comparison);
    }

    async fn retrieve_context(&self, input: &OptimizeInput, state: &mut PipelineState) {
        let query = retrieval_query(&state.job_skills, &input.job_description);
        match self
            .rag
            .retrieve(
                &input.session_id,
                &query,
                RETRIEVE_K_CV,
                RETRIEVE_K_JD,
                self.embedder,
            )
            .await
        {
            Ok(ctx) => {
                state.ok(format!(
                    "Retrieved {} CV chunks and {} job chunks",
                    ctx.cv_sources.len(),
                    ctx.jd_sources.len()
                ));
                state.context = Some(ctx);
            }
            Err(e) => state.fail(format!("Error retrieving context: {e}")),
        }
    }

    async fn generate_cv(
        &self,
        input: &OptimizeInput,
        state: &mut PipelineState,
    ) -> Result<String, LlmError> {
        let system = build_system_prompt(input);
        let user = build_user_prompt(input, state);

        match self.llm.complete(self.params, &system, &user).await {
            Ok(cv) => {
                state.ok(format!(
                    "Generated optimized CV ({} words)",
                    cv.split_whitespace().count()
                ));
                Ok(cv)
            }
            Err(e) => {
                state.fail(format!("Error generating CV: {e}"));
                Err(e)
            }
        }
    }
}

/// Query for the retrieval node: the leading job skills, or an excerpt of the posting.
fn retrieval_query(job_skills: &[String], job_description: &str) -> String {
    if job_skills.is_empty() {
        job_description.chars().take(QUERY_EXCERPT_CHARS).collect()
    } else {
        format!(
            "Experience demonstrating: {}",
            job_skills
                .iter()
                .take(PROMPT_SKILLS)
                .cloned()
                .collect::<Vec<_>>()
                .join(", ")
        )
    }
}

fn join_or_none(items: &[String]) -> String {
    if items.is_empty() {
        "None".to_string()
    } else {
        items
            .iter()
            .take(PROMPT_SKILLS)
            .cloned()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

fn build_system_prompt(input: &OptimizeInput) -> String {
    let date_filter = input
        .max_date_years
        .filter(|&years| years > 0)
        .map(|years| {
            fill_template(
                prompts::DATE_FILTER,
                &[("years", years.to_string().as_str())],
            )
        })
        .unwrap_or_default();

    fill_template(
        prompts::OPTIMIZE_SYSTEM,
        &[
            ("language", input.language.prompt_name()),
            ("date_filter", date_filter.as_str()),
            ("min_experiences", input.min_experiences.to_string().as_str()),
            ("max_experiences", input.max_experiences.to_string().as_str()),
        ],
    )
}

fn build_user_prompt(input: &OptimizeInput, state: &PipelineState) -> String {
    let structure_info = if state.structure.sections.is_empty() {
        String::new()
    } else {
        fill_template(
            prompts::STRUCTURE_INFO,
            &[("sections", state.structure.sections.join(", ").as_str())],
        )
    };

    let skills_info = state
        .comparison
        .as_ref()
        .map(|c| {
            fill_template(
                prompts::SKILLS_INFO,
                &[
                    ("matched", join_or_none(&c.matched).as_str()),
                    ("missing", join_or_none(c.missing()).as_str()),
                ],
            )
        })
        .unwrap_or_default();

    let rag_info = state
        .context
        .as_ref()
        .filter(|ctx| !ctx.is_empty())
        .map(|ctx| {
            fill_template(
                prompts::RAG_INFO,
                &[
                    ("cv_context", ctx.cv_context.as_str()),
                    ("jd_context", ctx.jd_context.as_str()),
                ],
            )
        })
        .unwrap_or_default();

    fill_template(
        prompts::OPTIMIZE_USER,
        &[
            ("job_description", input.job_description.as_str()),
            ("cv_text", input.cv_text.as_str()),
            ("structure_info", structure_info.as_str()),
            ("skills_info", skills_info.as_str()),
            ("rag_info", rag_info.as_str()),
        ],
    )
}

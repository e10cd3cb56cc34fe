//! Skill matching: buckets CV skills against job skills.
//!
//! Passes, each working only on what the previous ones left unmatched:
//! 1. heuristic: case-insensitive equality (`exact`) or containment either way (`partial`);
//! 2. semantic: embeddings of the remaining skills, best job skill at cosine ≥ 0.7;
//! 3. context: remaining job skills searched in the session's CV index; these cover the job
//!    skill and show up in `matched_details` only;
//! 4. interesting: CV-only skills worth highlighting, chosen by the LLM when both documents
//!    are available, else by similarity to the job-description index. With neither signal
//!    every CV-only skill counts as interesting.
//!
//! Every normalized CV skill ends up in exactly one of `matched`, `cv_only`, `interesting`;
//! every normalized job skill is either covered by a match or listed in `job_only`.

use std::collections::HashSet;

use tracing::{debug, warn};

use crate::llm_client::prompts::{fill_template, JSON_ONLY_SYSTEM};
use crate::llm_client::{LlmClient, LlmParams};
use crate::models::skills::{MatchDetail, MatchType, SkillStats, SkillsComparison};
use crate::rag::index::{cosine_similarity, VectorIndex};
use crate::rag::Embedder;
use crate::skills::prompts;

pub const SIMILARITY_THRESHOLD: f32 = 0.7;

/// How many CV-only skills are considered for the interesting bucket.
const INTERESTING_CANDIDATES: usize = 20;
/// Characters of the job description shown to the model when picking interesting skills.
const JOB_EXCERPT_CHARS: usize = 1000;

/// Everything beyond the two skill lists that can sharpen the comparison.
/// Each missing piece simply disables the pass that needs it.
#[derive(Default)]
pub struct MatchContext<'a> {
    pub embedder: Option<&'a dyn Embedder>,
    pub cv_index: Option<&'a VectorIndex>,
    pub jd_index: Option<&'a VectorIndex>,
    pub probe: Option<InterestingProbe<'a>>,
}

/// LLM access plus both documents, for the interesting-skills question.
pub struct InterestingProbe<'a> {
    pub llm: &'a LlmClient,
    pub params: &'a LlmParams,
    pub cv_text: &'a str,
    pub job_text: &'a str,
}

#[derive(Debug, Clone)]
struct Skill {
    key: String,
    original: String,
}

/// Trims and lowercases for comparison. Blank entries are dropped; the first spelling of a
/// duplicate wins.
fn normalize(skills: &[String]) -> Vec<Skill> {
    let mut seen = HashSet::new();
    skills
        .iter()
        .filter_map(|s| {
            let original = s.trim();
            let key = original.to_lowercase();
            if key.is_empty() || !seen.insert(key.clone()) {
                return None;
            }
            Some(Skill {
                key,
                original: original.to_string(),
            })
        })
        .collect()
}

fn related(a: &str, b: &str) -> bool {
    a == b || a.contains(b) || b.contains(a)
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

pub async fn compare_skills(
    cv_skills: &[String],
    job_skills: &[String],
    ctx: &MatchContext<'_>,
) -> SkillsComparison {
    let cv = normalize(cv_skills);
    let job = normalize(job_skills);

    let mut details: Vec<MatchDetail> = Vec::new();
    let mut cv_matched = vec![false; cv.len()];
    let mut job_covered = vec![false; job.len()];

    // 1. Heuristic pass
    for (i, c) in cv.iter().enumerate() {
        if let Some(j) = job.iter().position(|jb| related(&c.key, &jb.key)) {
            details.push(MatchDetail {
                cv_skill: c.original.clone(),
                job_skill: job[j].original.clone(),
                match_type: if c.key == job[j].key {
                    MatchType::Exact
                } else {
                    MatchType::Partial
                },
                similarity: None,
            });
            cv_matched[i] = true;
        }
    }
    for (j, jb) in job.iter().enumerate() {
        job_covered[j] = cv.iter().any(|c| related(&c.key, &jb.key));
    }

    // 2. Semantic pass
    if let Some(embedder) = ctx.embedder {
        semantic_pass(embedder, &cv, &job, &mut cv_matched, &mut job_covered, &mut details).await;
    }

    // 3. Context pass
    if let (Some(embedder), Some(cv_index)) = (ctx.embedder, ctx.cv_index) {
        context_pass(embedder, cv_index, &job, &mut job_covered, &mut details).await;
    }

    let unmatched: Vec<&Skill> = cv
        .iter()
        .zip(&cv_matched)
        .filter(|(_, matched)| !**matched)
        .map(|(s, _)| s)
        .collect();

    // 4. Interesting
    let interesting_keys = pick_interesting(&unmatched, ctx).await;

    let matched: Vec<String> = details
        .iter()
        .filter(|d| d.match_type != MatchType::Context)
        .map(|d| d.cv_skill.clone())
        .collect();
    let (interesting, cv_only): (Vec<&Skill>, Vec<&Skill>) = unmatched
        .into_iter()
        .partition(|s| interesting_keys.contains(&s.key));
    let interesting: Vec<String> = interesting.into_iter().map(|s| s.original.clone()).collect();
    let cv_only: Vec<String> = cv_only.into_iter().map(|s| s.original.clone()).collect();
    let job_only: Vec<String> = job
        .iter()
        .zip(&job_covered)
        .filter(|(_, covered)| !**covered)
        .map(|(s, _)| s.original.clone())
        .collect();

    let covered = job.len() - job_only.len();
    let match_percentage = if job.is_empty() {
        0.0
    } else {
        round_to(covered as f64 / job.len() as f64 * 100.0, 1)
    };
    let semantic: Vec<f64> = details
        .iter()
        .filter(|d| d.match_type == MatchType::Semantic)
        .filter_map(|d| d.similarity.map(f64::from))
        .collect();
    let avg_similarity = if semantic.is_empty() {
        0.0
    } else {
        round_to(semantic.iter().sum::<f64>() / semantic.len() as f64, 3)
    };

    let stats = SkillStats {
        total_cv: cv.len(),
        total_job: job.len(),
        matched_count: matched.len(),
        missing_count: job_only.len(),
        cv_only_count: cv_only.len(),
        interesting_count: interesting.len(),
        match_percentage,
        avg_similarity,
    };

    SkillsComparison {
        matched,
        matched_details: details,
        cv_only,
        job_only,
        interesting,
        stats,
    }
}

async fn semantic_pass(
    embedder: &dyn Embedder,
    cv: &[Skill],
    job: &[Skill],
    cv_matched: &mut [bool],
    job_covered: &mut [bool],
    details: &mut Vec<MatchDetail>,
) {
    let cv_left: Vec<usize> = (0..cv.len()).filter(|&i| !cv_matched[i]).collect();
    let job_left: Vec<usize> = (0..job.len()).filter(|&j| !job_covered[j]).collect();
    if cv_left.is_empty() || job_left.is_empty() {
        return;
    }

    let inputs: Vec<String> = cv_left
        .iter()
        .map(|&i| cv[i].original.clone())
        .chain(job_left.iter().map(|&j| job[j].original.clone()))
        .collect();
    let vectors = match embedder.embed(&inputs).await {
        Ok(v) if v.len() == inputs.len() => v,
        Ok(v) => {
            warn!(
                "Semantic skill matching skipped: got {} embeddings for {} skills",
                v.len(),
                inputs.len()
            );
            return;
        }
        Err(e) => {
            warn!("Semantic skill matching skipped: {e}");
            return;
        }
    };
    let (cv_vecs, job_vecs) = vectors.split_at(cv_left.len());

    for (ci, cv_vec) in cv_left.iter().zip(cv_vecs) {
        let best = job_left
            .iter()
            .zip(job_vecs)
            .map(|(&j, job_vec)| (j, cosine_similarity(cv_vec, job_vec)))
            .fold(None::<(usize, f32)>, |best, cur| match best {
                Some(b) if b.1 >= cur.1 => Some(b),
                _ => Some(cur),
            });

        if let Some((j, similarity)) = best {
            if similarity >= SIMILARITY_THRESHOLD {
                details.push(MatchDetail {
                    cv_skill: cv[*ci].original.clone(),
                    job_skill: job[j].original.clone(),
                    match_type: MatchType::Semantic,
                    similarity: Some(round_to(similarity as f64, 3) as f32),
                });
                cv_matched[*ci] = true;
                job_covered[j] = true;
            }
        }
    }
}

async fn context_pass(
    embedder: &dyn Embedder,
    cv_index: &VectorIndex,
    job: &[Skill],
    job_covered: &mut [bool],
    details: &mut Vec<MatchDetail>,
) {
    let job_left: Vec<usize> = (0..job.len()).filter(|&j| !job_covered[j]).collect();
    if job_left.is_empty() || cv_index.is_empty() {
        return;
    }

    let inputs: Vec<String> = job_left.iter().map(|&j| job[j].original.clone()).collect();
    let vectors = match embedder.embed(&inputs).await {
        Ok(v) => v,
        Err(e) => {
            warn!("CV context matching skipped: {e}");
            return;
        }
    };

    for (&j, vec) in job_left.iter().zip(&vectors) {
        let similarity = cv_index.best_similarity(vec);
        if similarity >= SIMILARITY_THRESHOLD {
            debug!("Job skill '{}' evidenced by CV text ({similarity:.3})", job[j].original);
            details.push(MatchDetail {
                cv_skill: job[j].original.clone(),
                job_skill: job[j].original.clone(),
                match_type: MatchType::Context,
                similarity: Some(round_to(similarity as f64, 3) as f32),
            });
            job_covered[j] = true;
        }
    }
}

/// Lowercased keys of the CV-only skills worth highlighting.
async fn pick_interesting(unmatched: &[&Skill], ctx: &MatchContext<'_>) -> HashSet<String> {
    if unmatched.is_empty() {
        return HashSet::new();
    }
    let candidates = &unmatched[..unmatched.len().min(INTERESTING_CANDIDATES)];

    if let Some(probe) = ctx
        .probe
        .as_ref()
        .filter(|p| !p.cv_text.trim().is_empty() && !p.job_text.trim().is_empty())
    {
        let job_excerpt: String = probe.job_text.chars().take(JOB_EXCERPT_CHARS).collect();
        let cv_only = candidates
            .iter()
            .map(|s| s.original.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let user = fill_template(
            prompts::INTERESTING_USER,
            &[("job_excerpt", job_excerpt.as_str()), ("cv_only", cv_only.as_str())],
        );

        let system = format!("{} {}", prompts::INTERESTING_SYSTEM, JSON_ONLY_SYSTEM);

        match probe
            .llm
            .complete_json::<Vec<String>>(probe.params, &system, &user)
            .await
        {
            Ok(picked) => {
                let picked: HashSet<String> = picked
                    .into_iter()
                    .map(|s| s.trim().to_lowercase())
                    .collect();
                return candidates
                    .iter()
                    .filter(|s| picked.contains(&s.key))
                    .map(|s| s.key.clone())
                    .collect();
            }
            Err(e) => warn!("Interesting-skills selection failed: {e}"),
        }
    }

    if let (Some(embedder), Some(jd_index)) = (ctx.embedder, ctx.jd_index) {
        let inputs: Vec<String> = candidates.iter().map(|s| s.original.clone()).collect();
        return match embedder.embed(&inputs).await {
            Ok(vectors) => candidates
                .iter()
                .zip(&vectors)
                .filter(|(_, v)| jd_index.best_similarity(v) >= SIMILARITY_THRESHOLD)
                .map(|(s, _)| s.key.clone())
                .collect(),
            Err(e) => {
                warn!("Interesting-skills search in the job index failed: {e}");
                HashSet::new()
            }
        };
    }

    all_keys(unmatched)
}

fn all_keys(skills: &[&Skill]) -> HashSet<String> {
    skills.iter().map(|s| s.key.clone()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::chunker::ChunkerConfig;
    use crate::rag::embedder::testing::{FailingEmbedder, VocabularyEmbedder};
    use crate::rag::index::DocumentSource;

    fn skills(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_heuristic_exact_and_partial() {
        let cv = skills(&["Python", "SQL", "Project Management", "Cooking"]);
        let job = skills(&["python", "PostgreSQL", "Management", "Kubernetes"]);

        let result = compare_skills(&cv, &job, &MatchContext::default()).await;

        assert_eq!(result.matched, vec!["Python", "SQL", "Project Management"]);
        assert_eq!(result.matched_details[0].match_type, MatchType::Exact);
        assert_eq!(result.matched_details[1].match_type, MatchType::Partial);
        assert_eq!(result.matched_details[1].job_skill, "PostgreSQL");
        assert_eq!(result.job_only, vec!["Kubernetes"]);
        // No documents and no job index: every leftover CV skill is interesting.
        assert!(result.cv_only.is_empty());
        assert_eq!(result.interesting, vec!["Cooking"]);
        assert_eq!(result.stats.match_percentage, 75.0);
        assert_eq!(result.stats.avg_similarity, 0.0);
    }

    #[tokio::test]
    async fn test_normalization_drops_blanks_and_duplicates() {
        let cv = skills(&[" Rust ", "rust", "", "   "]);
        let job = skills(&["RUST"]);

        let result = compare_skills(&cv, &job, &MatchContext::default()).await;

        assert_eq!(result.stats.total_cv, 1);
        assert_eq!(result.matched, vec!["Rust"]);
        assert_eq!(result.stats.match_percentage, 100.0);
    }

    #[tokio::test]
    async fn test_buckets_partition_inputs() {
        let cv = skills(&["Go", "Docker", "Baking", "Sailing"]);
        let job = skills(&["Docker Compose", "Terraform"]);

        let result = compare_skills(&cv, &job, &MatchContext::default()).await;

        let cv_total = result.matched.len() + result.cv_only.len() + result.interesting.len();
        assert_eq!(cv_total, result.stats.total_cv);
        assert_eq!(result.job_only, vec!["Terraform"]);
        assert_eq!(result.stats.match_percentage, 50.0);
    }

    #[tokio::test]
    async fn test_semantic_pass_matches_synonyms() {
        // "k8s" and "kubernetes" share the "container" dimension only.
        let embedder = VocabularyEmbedder::new(&["k8s", "kubernetes", "container"]);
        let cv = skills(&["k8s container"]);
        let job = skills(&["kubernetes container", "accounting"]);
        let ctx = MatchContext {
            embedder: Some(&embedder),
            ..MatchContext::default()
        };

        let result = compare_skills(&cv, &job, &ctx).await;

        // cos([1,0,1],[0,1,1]) = 0.5, below the threshold.
        assert!(result.matched.is_empty());

        let cv = skills(&["container orchestration k8s"]);
        let job = skills(&["container platform"]);
        let result = compare_skills(&cv, &job, &ctx).await;
        // cos([1,0,1],[0,0,1]) ≈ 0.707
        assert_eq!(result.matched, vec!["container orchestration k8s"]);
        assert_eq!(result.matched_details[0].match_type, MatchType::Semantic);
        assert_eq!(result.matched_details[0].similarity, Some(0.707));
        assert_eq!(result.stats.avg_similarity, 0.707);
        assert!(result.job_only.is_empty());
    }

    #[tokio::test]
    async fn test_embedding_failure_degrades_to_heuristics() {
        let embedder = FailingEmbedder;
        let cv = skills(&["Rust", "Haskell"]);
        let job = skills(&["Rust", "Scala"]);
        let ctx = MatchContext {
            embedder: Some(&embedder),
            ..MatchContext::default()
        };

        let result = compare_skills(&cv, &job, &ctx).await;

        assert_eq!(result.matched, vec!["Rust"]);
        assert_eq!(result.job_only, vec!["Scala"]);
    }

    #[tokio::test]
    async fn test_context_pass_uses_cv_index() {
        let embedder = VocabularyEmbedder::new(&["terraform", "aws"]);
        let cv_index = VectorIndex::build(
            "Provisioned AWS infrastructure with Terraform modules.",
            DocumentSource::Cv,
            "s1",
            &ChunkerConfig::default(),
            &embedder,
        )
        .await
        .unwrap();
        let ctx = MatchContext {
            embedder: Some(&embedder),
            cv_index: Some(&cv_index),
            ..MatchContext::default()
        };

        let result = compare_skills(
            &skills(&["Python"]),
            &skills(&["Terraform", "Cobol"]),
            &ctx,
        )
        .await;

        assert!(result.matched.is_empty());
        assert_eq!(result.matched_details.len(), 1);
        assert_eq!(result.matched_details[0].match_type, MatchType::Context);
        assert_eq!(result.matched_details[0].job_skill, "Terraform");
        assert_eq!(result.job_only, vec!["Cobol"]);
        assert_eq!(result.interesting, vec!["Python"]);
        assert_eq!(result.stats.matched_count, 0);
        assert_eq!(result.stats.match_percentage, 50.0);
    }

    #[tokio::test]
    async fn test_buckets_partition_inputs_with_every_pass() {
        let embedder =
            VocabularyEmbedder::new(&["k8s", "kubernetes", "container", "terraform", "aws"]);
        let cv_index = VectorIndex::build(
            "Provisioned AWS infrastructure with Terraform modules.",
            DocumentSource::Cv,
            "s1",
            &ChunkerConfig::default(),
            &embedder,
        )
        .await
        .unwrap();
        let ctx = MatchContext {
            embedder: Some(&embedder),
            cv_index: Some(&cv_index),
            ..MatchContext::default()
        };
        let cv = skills(&["container orchestration k8s", "Python", "Rust"]);
        let job = skills(&["container platform", "Terraform", "rust", "Cobol"]);

        let result = compare_skills(&cv, &job, &ctx).await;

        let kinds: Vec<MatchType> = result.matched_details.iter().map(|d| d.match_type).collect();
        assert_eq!(kinds, vec![MatchType::Exact, MatchType::Semantic, MatchType::Context]);
        assert_eq!(result.matched, vec!["Rust", "container orchestration k8s"]);
        assert!(result.matched.iter().all(|m| cv.contains(m)));

        let cv_total = result.matched.len() + result.cv_only.len() + result.interesting.len();
        assert_eq!(cv_total, result.stats.total_cv);
        assert_eq!(result.stats.matched_count, 2);
        assert_eq!(result.job_only, vec!["Cobol"]);
        assert_eq!(result.stats.match_percentage, 75.0);
    }

    #[tokio::test]
    async fn test_interesting_from_job_index() {
        let embedder = VocabularyEmbedder::new(&["mentoring", "startup"]);
        let jd_index = VectorIndex::build(
            "Fast-growing startup looking for someone who enjoys mentoring juniors.",
            DocumentSource::Jd,
            "s1",
            &ChunkerConfig::default(),
            &embedder,
        )
        .await
        .unwrap();
        let ctx = MatchContext {
            jd_index: Some(&jd_index),
            embedder: Some(&embedder),
            ..MatchContext::default()
        };

        let result = compare_skills(
            &skills(&["Mentoring", "Origami"]),
            &skills(&["Accounting"]),
            &ctx,
        )
        .await;

        assert_eq!(result.interesting, vec!["Mentoring"]);
        assert_eq!(result.cv_only, vec!["Origami"]);
        assert_eq!(result.stats.interesting_count, 1);
    }

    #[tokio::test]
    async fn test_interesting_from_llm_is_intersected() {
        use crate::config::Config;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant",
                    "content": "[\"public speaking\", \"Underwater hockey\", \"Invented skill\"]"}}]
            })))
            .mount(&server)
            .await;

        let llm = LlmClient::new(&Config::for_tests(&server.uri())).unwrap();
        let params = llm.params(Some("sk-test"), None, 0.3).unwrap();
        let ctx = MatchContext {
            probe: Some(InterestingProbe {
                llm: &llm,
                params: &params,
                cv_text: "CV text",
                job_text: "Job text",
            }),
            ..MatchContext::default()
        };

        let result = compare_skills(
            &skills(&["Public Speaking", "Knitting"]),
            &skills(&["Sales"]),
            &ctx,
        )
        .await;

        assert_eq!(result.interesting, vec!["Public Speaking"]);
        assert_eq!(result.cv_only, vec!["Knitting"]);
        assert_eq!(result.job_only, vec!["Sales"]);
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_cv_only_skills_interesting() {
        use crate::config::Config;
        use wiremock::matchers::method;
        use wiremock::{Mock, MockServer, ResponseTemplate};

        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let llm = LlmClient::new(&Config::for_tests(&server.uri())).unwrap();
        let params = llm.params(Some("sk-test"), None, 0.3).unwrap();
        let ctx = MatchContext {
            probe: Some(InterestingProbe {
                llm: &llm,
                params: &params,
                cv_text: "CV text",
                job_text: "Job text",
            }),
            ..MatchContext::default()
        };

        let result = compare_skills(&skills(&["Chess"]), &skills(&["Sales"]), &ctx).await;

        assert_eq!(result.interesting, vec!["Chess"]);
        assert!(result.cv_only.is_empty());
        assert_eq!(result.stats.interesting_count, 1);
    }
}

// Prompts for skill extraction and interesting-skill selection.

pub const CV_SKILLS_SYSTEM: &str = r#"You are an expert at analyzing CVs. Extract the main skills, competencies, and technical abilities from the CV.

Return ONLY a JSON array of skills, nothing else. Each skill should be a short, clear term (2-4 words max).
Focus on:
- Technical skills (programming languages, tools, software)
- Soft skills (communication, leadership, etc.)
- Domain expertise (marketing, finance, etc.)
- Certifications and qualifications
- Languages

Format: ["skill1", "skill2", "skill3", ...]"#;

pub const CV_SKILLS_USER: &str = "Extract all the main skills and competencies from this CV:

{text}

Return a JSON array of skills only, no explanations.";

pub const JOB_SKILLS_SYSTEM: &str = r#"You are an expert at analyzing job descriptions. Extract the required and preferred skills, competencies, and qualifications from the job description.

Return ONLY a JSON array of skills, nothing else. Each skill should be a short, clear term (2-4 words max).
Focus on:
- Required technical skills
- Preferred technical skills
- Soft skills mentioned
- Domain expertise required
- Certifications or qualifications needed
- Language requirements

Format: ["skill1", "skill2", "skill3", ...]"#;

pub const JOB_SKILLS_USER: &str = "Extract all the required and preferred skills from this job description:

{text}

Return a JSON array of skills only, no explanations.";

pub const INTERESTING_SYSTEM: &str = "You are an expert at matching candidate skills to job requirements. \
Identify skills that would add value even if not explicitly required.";

pub const INTERESTING_USER: &str = r#"Analyze which CV skills from the list below would be valuable or interesting for this job, even though they are not explicitly mentioned in the job description.

Job Description (excerpt):
{job_excerpt}

CV Skills that are NOT in the job description:
{cv_only}

Return ONLY a JSON array of skills from the list above that would be valuable for this job. Return an empty array [] if none are relevant.

Format: ["skill1", "skill2", ...]"#;

// Prompt constants for CV tailoring.

/// System prompt for CV tailoring.
pub const TAILOR_SYSTEM: &str = "You are a professional resume writer who tailors CVs to \
    specific job postings. Focus on relevance, keywords, and clarity. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences.";

/// Tailoring prompt template. Replace every `{placeholder}` before sending.
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Rewrite the candidate's CV to best match this role.

{grounding_instruction}

JOB TITLE:
{job_title}

COMPANY:
{company}

REQUIRED SKILLS:
{required_skills}

JOB DESCRIPTION:
{job_description}

CANDIDATE SUMMARY:
{summary}

SKILLS:
{skills}

EXPERIENCE:
{experience}

FULL CV TEXT:
{raw_text}

Return a JSON object with this EXACT schema (no extra fields):
{
  "tailored_summary": "2-4 sentence summary aimed at this role",
  "tailored_skills": ["most relevant skill first", "..."],
  "tailored_experience": "experience section rewritten for this role",
  "cover_letter": "short cover letter, 3 paragraphs max",
  "full_text": "the complete tailored CV as plain text"
}"#;

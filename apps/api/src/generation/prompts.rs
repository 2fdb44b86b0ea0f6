// Prompt constants for resume tailoring.

/// Preamble that pins the generator to JSON-only output.
pub const TAILOR_SYSTEM: &str = "You are an expert resume writer and career coach. \
    You rewrite resumes so they pass applicant tracking systems and read well to a hiring manager. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT invent employers, titles, dates, degrees, or metrics that are not in the base resume.";

/// Tailoring prompt. Replace `{job_description}` and `{base_resume}` before sending.
pub const TAILOR_PROMPT_TEMPLATE: &str = r#"Tailor the base resume below to the job description.

Instructions:
1. Write a professional summary of 2-3 sentences aimed at this specific role.
2. Reorder the skill categories, and the skills inside each category, so the most relevant to the job come first. Keep every category name unchanged. You may drop skills that are irrelevant to the role.
3. Rewrite the bullets of every experience entry. Start each bullet with a strong action verb, weave in keywords from the job description where they are truthful, and preserve every number and metric from the original bullets. Keep the same number of experience entries, in the same order as the base resume.
4. Reorder the projects so the most relevant come first and rewrite their descriptions the same way.

Return a JSON object with this EXACT schema (no extra fields):
{
  "summary": "Two to three sentence professional summary.",
  "skills_reordered": [
    {"category": "Languages", "items": ["Rust", "Go", "Python"]}
  ],
  "experience_bullets": [
    ["First bullet of the first experience entry.", "Second bullet."],
    ["First bullet of the second experience entry."]
  ],
  "projects_reordered": [
    {"name": "Project name", "description": ["Bullet about the project."]}
  ]
}

JOB DESCRIPTION:
{job_description}

BASE RESUME (JSON):
{base_resume}"#;

/// Fills the tailoring template.
pub fn build_tailor_prompt(job_description: &str, base_resume: &str) -> String {
    let body = TAILOR_PROMPT_TEMPLATE
        .replace("{base_resume}", base_resume)
        .replace("{job_description}", job_description);
    format!("{TAILOR_SYSTEM}\n\n{body}")
}

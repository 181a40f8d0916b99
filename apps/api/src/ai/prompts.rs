//! Prompt builders for the AI service. Every prompt demands bare JSON
//! so the parsers in `tags` and `matching` stay simple.

use crate::ai::matching::{AvailableSections, PinnedSection, TaggedChain};
use crate::models::block::Category;

pub fn tags_prompt(content_text: &str, category: Category) -> String {
    format!(
        r#"Extract ALL important keywords/tags from this resume {category} section.

Include:
- Technical skills (languages, frameworks, tools, databases, cloud services)
- Soft skills (leadership, communication, collaboration, mentoring)
- Impact keywords (scaled, optimized, reduced, improved, built, designed, led)
- Domain terms (distributed systems, microservices, ML, etc.)
- Metrics indicators (%, numbers, scale like "1M users", "150k nodes")

Section content:
{content_text}

Return ONLY a JSON array of lowercase tags. No explanation.
Example: ["python", "aws", "leadership", "reduced latency 40%", "microservices"]

Tags:"#
    )
}

pub fn terms_prompt(text: &str) -> String {
    format!(
        r#"Extract all technical keywords, skills, tools, and technologies from this text.
Include: programming languages, frameworks, libraries, databases, cloud services,
methodologies, tools, concepts, certifications, and domain-specific terms.

Text:
{text}

Return ONLY a JSON array of lowercase keywords, nothing else. Example:
["python", "aws", "kubernetes", "machine learning"]
"#
    )
}

fn push_chains(prompt: &mut String, chains: &[TaggedChain]) {
    for chain in chains {
        for variant in &chain.variants {
            let tags: Vec<&str> = variant.tags.iter().take(15).map(String::as_str).collect();
            prompt.push_str(&format!(
                "- {}:{} [{}]\n",
                chain.identifier,
                variant.variant,
                tags.join(", ")
            ));
        }
    }
}

pub fn match_prompt(
    terms: &[String],
    available: &AvailableSections,
    pinned: &[PinnedSection],
) -> String {
    let terms: Vec<&str> = terms.iter().take(30).map(String::as_str).collect();
    let mut prompt = format!(
        "Match resume sections to job requirements.\n\nJOB REQUIREMENTS:\nTerms: {}\n\n",
        terms.join(", ")
    );

    if !pinned.is_empty() {
        prompt.push_str("MUST INCLUDE:\n");
        for pin in pinned {
            prompt.push_str(&format!("- {}:{}\n", pin.identifier, pin.variant));
        }
        prompt.push('\n');
    }

    prompt.push_str("AVAILABLE SECTIONS:\n\nExperiences:\n");
    push_chains(&mut prompt, &available.experiences);
    prompt.push_str("\nProjects:\n");
    push_chains(&mut prompt, &available.projects);
    prompt.push_str("\nSkills Variants:\n");
    for skill in &available.skills {
        let tags: Vec<&str> = skill.tags.iter().take(15).map(String::as_str).collect();
        prompt.push_str(&format!("- {} [{}]\n", skill.variant, tags.join(", ")));
    }

    prompt.push_str(
        r#"
TASK:
1. Select the best matching experiences (closest available, even if the match is weak)
2. Select the best matching projects
3. Select the best skills variant (pick one if any are available)
4. List important job terms NOT covered by the selected sections
5. For each selection, explain WHY it matches (or say "closest available" if weak)

IMPORTANT:
- Always return the closest matching sections. Never return empty arrays if sections are available.
- The "key" and "flavor" must be SEPARATE fields, exactly as shown in AVAILABLE SECTIONS above.
- Format: key is BEFORE the colon, flavor is AFTER the colon (e.g., "tesla:mechanical" means key="tesla", flavor="mechanical")

Return ONLY this JSON (no markdown, no extra text):
{
  "experiences": [
    {"key": "tesla", "flavor": "mechanical", "reason": "matches X, Y, Z"}
  ],
  "projects": [
    {"key": "battery_management", "flavor": "electrical", "reason": "matches X, Y"}
  ],
  "skills_flavor": "systems",
  "missing_keywords": ["term1", "term2"]
}

JSON:"#,
    );

    prompt
}

//! Match-selection types and policy.
//!
//! The model proposes which blocks best fit a job description; this
//! module parses that proposal defensively and then enforces the
//! selection policy: pinned chains are always included, and the result
//! is padded up to a configurable minimum with the closest available
//! chains so a weak match still yields a usable resume.

use serde::{Deserialize, Serialize};

use crate::ai::tags::strip_code_fences;
use crate::models::block::Category;

/// Tags per variant of one chain.
#[derive(Debug, Clone, Serialize)]
pub struct VariantTags {
    pub variant: String,
    pub tags: Vec<String>,
}

/// One identifier with all its tagged variants.
#[derive(Debug, Clone, Serialize)]
pub struct TaggedChain {
    pub identifier: String,
    pub variants: Vec<VariantTags>,
}

/// Everything the matcher may choose from, grouped per category.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AvailableSections {
    pub experiences: Vec<TaggedChain>,
    pub projects: Vec<TaggedChain>,
    pub skills: Vec<VariantTags>,
}

/// A chain pinned by a `priority = always` block config.
#[derive(Debug, Clone, Serialize)]
pub struct PinnedSection {
    pub category: Category,
    pub identifier: String,
    pub variant: String,
}

/// One selected (identifier, variant) pair with the model's reasoning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionPick {
    #[serde(alias = "key")]
    pub identifier: String,
    #[serde(default, alias = "flavor")]
    pub variant: String,
    #[serde(default)]
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchResult {
    pub experiences: Vec<SectionPick>,
    pub projects: Vec<SectionPick>,
    #[serde(alias = "skills_flavor")]
    pub skills_variant: Option<String>,
    pub missing_keywords: Vec<String>,
}

/// Parses the model's match proposal. Models occasionally return the
/// identifier and variant glued together ("tesla:mechanical" in the
/// identifier field); those are split apart. Unparseable output yields
/// an empty result, which the policy layer then pads.
pub fn parse_match_response(response: &str) -> MatchResult {
    let cleaned = strip_code_fences(response);
    let raw = match extract_json_object(cleaned) {
        Some(raw) => raw,
        None => return MatchResult::default(),
    };
    let mut result: MatchResult = match serde_json::from_str(raw) {
        Ok(result) => result,
        Err(_) => return MatchResult::default(),
    };
    for pick in result.experiences.iter_mut().chain(result.projects.iter_mut()) {
        normalize_pick(pick);
    }
    result
}

fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn normalize_pick(pick: &mut SectionPick) {
    let glued = pick.identifier.clone();
    if let Some((identifier, variant)) = glued.split_once(':') {
        pick.identifier = identifier.to_string();
        if pick.variant.is_empty() || pick.variant.contains(':') {
            pick.variant = variant.to_string();
        }
    }
    // Variants sometimes arrive with trailing bracketed tag noise.
    let cleaned = pick
        .variant
        .split('[')
        .next()
        .and_then(|v| v.rsplit(':').next())
        .unwrap_or_default()
        .trim()
        .to_string();
    pick.variant = cleaned;
}

fn first_variant(chain: &TaggedChain) -> Option<SectionPick> {
    chain.variants.first().map(|v| SectionPick {
        identifier: chain.identifier.clone(),
        variant: v.variant.clone(),
        reason: "closest available".to_string(),
    })
}

fn pad_category(
    picks: &mut Vec<SectionPick>,
    available: &[TaggedChain],
    pinned: &[&PinnedSection],
    minimum: usize,
) {
    // Pinned chains come first, whether or not the model chose them.
    for pin in pinned {
        let already = picks
            .iter()
            .any(|p| p.identifier == pin.identifier && p.variant == pin.variant);
        if !already {
            picks.insert(
                0,
                SectionPick {
                    identifier: pin.identifier.clone(),
                    variant: pin.variant.clone(),
                    reason: "pinned".to_string(),
                },
            );
        }
    }

    let target = minimum.min(available.len());
    if picks.len() >= target {
        return;
    }
    for chain in available {
        if picks.len() >= target {
            break;
        }
        if picks.iter().any(|p| p.identifier == chain.identifier) {
            continue;
        }
        if let Some(pick) = first_variant(chain) {
            picks.push(pick);
        }
    }
}

/// Applies the selection policy on top of the model's proposal. The
/// minimum is product policy, not an invariant, so it is configurable
/// (`MIN_MATCH_SELECTIONS`).
pub fn ensure_minimum_selections(
    result: &mut MatchResult,
    available: &AvailableSections,
    pinned: &[PinnedSection],
    minimum: usize,
) {
    let pinned_exp: Vec<&PinnedSection> = pinned
        .iter()
        .filter(|p| p.category == Category::Experience)
        .collect();
    let pinned_proj: Vec<&PinnedSection> = pinned
        .iter()
        .filter(|p| p.category == Category::Project)
        .collect();

    pad_category(
        &mut result.experiences,
        &available.experiences,
        &pinned_exp,
        minimum,
    );
    pad_category(
        &mut result.projects,
        &available.projects,
        &pinned_proj,
        minimum,
    );

    if result.skills_variant.is_none() {
        result.skills_variant = available.skills.first().map(|v| v.variant.clone());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(identifier: &str, variants: &[&str]) -> TaggedChain {
        TaggedChain {
            identifier: identifier.to_string(),
            variants: variants
                .iter()
                .map(|v| VariantTags {
                    variant: v.to_string(),
                    tags: vec![],
                })
                .collect(),
        }
    }

    #[test]
    fn test_parse_match_response_happy_path() {
        let response = r#"```json
        {
          "experiences": [{"key": "tesla", "flavor": "mechanical", "reason": "matches x"}],
          "projects": [],
          "skills_flavor": "systems",
          "missing_keywords": ["terraform"]
        }
        ```"#;
        let result = parse_match_response(response);
        assert_eq!(result.experiences[0].identifier, "tesla");
        assert_eq!(result.experiences[0].variant, "mechanical");
        assert_eq!(result.skills_variant.as_deref(), Some("systems"));
        assert_eq!(result.missing_keywords, vec!["terraform"]);
    }

    #[test]
    fn test_parse_match_response_splits_glued_identifier() {
        let response = r#"{"experiences": [{"key": "tesla:mechanical", "flavor": "", "reason": ""}]}"#;
        let result = parse_match_response(response);
        assert_eq!(result.experiences[0].identifier, "tesla");
        assert_eq!(result.experiences[0].variant, "mechanical");
    }

    #[test]
    fn test_parse_match_response_cleans_bracket_noise() {
        let response =
            r#"{"projects": [{"key": "kambaz", "flavor": "fullstack[react, node]", "reason": ""}]}"#;
        let result = parse_match_response(response);
        assert_eq!(result.projects[0].variant, "fullstack");
    }

    #[test]
    fn test_parse_match_response_garbage_yields_default() {
        let result = parse_match_response("I could not find any matches, sorry!");
        assert!(result.experiences.is_empty());
        assert!(result.skills_variant.is_none());
    }

    #[test]
    fn test_ensure_minimum_pads_from_available() {
        let available = AvailableSections {
            experiences: vec![chain("amazon", &["systems"]), chain("isro", &["systems"])],
            projects: vec![chain("kambaz", &["fullstack"])],
            skills: vec![VariantTags {
                variant: "systems".to_string(),
                tags: vec![],
            }],
        };
        let mut result = MatchResult::default();
        ensure_minimum_selections(&mut result, &available, &[], 2);

        assert_eq!(result.experiences.len(), 2);
        assert!(result
            .experiences
            .iter()
            .all(|p| p.reason == "closest available"));
        // only one project exists, so the minimum clamps to it
        assert_eq!(result.projects.len(), 1);
        assert_eq!(result.skills_variant.as_deref(), Some("systems"));
    }

    #[test]
    fn test_ensure_minimum_respects_model_picks() {
        let available = AvailableSections {
            experiences: vec![chain("amazon", &["systems"]), chain("isro", &["systems"])],
            ..Default::default()
        };
        let mut result = MatchResult {
            experiences: vec![
                SectionPick {
                    identifier: "amazon".to_string(),
                    variant: "systems".to_string(),
                    reason: "good match".to_string(),
                },
                SectionPick {
                    identifier: "isro".to_string(),
                    variant: "systems".to_string(),
                    reason: "good match".to_string(),
                },
            ],
            ..Default::default()
        };
        ensure_minimum_selections(&mut result, &available, &[], 2);
        assert_eq!(result.experiences.len(), 2);
        assert!(result.experiences.iter().all(|p| p.reason == "good match"));
    }

    #[test]
    fn test_pinned_sections_always_included_first() {
        let available = AvailableSections {
            experiences: vec![chain("amazon", &["systems"]), chain("tesla", &["mech"])],
            ..Default::default()
        };
        let pinned = vec![PinnedSection {
            category: Category::Experience,
            identifier: "tesla".to_string(),
            variant: "mech".to_string(),
        }];
        let mut result = MatchResult {
            experiences: vec![SectionPick {
                identifier: "amazon".to_string(),
                variant: "systems".to_string(),
                reason: "match".to_string(),
            }],
            ..Default::default()
        };
        ensure_minimum_selections(&mut result, &available, &pinned, 2);
        assert_eq!(result.experiences[0].identifier, "tesla");
        assert_eq!(result.experiences[0].reason, "pinned");
        assert_eq!(result.experiences.len(), 2);
    }

    #[test]
    fn test_no_available_sections_stays_empty() {
        let mut result = MatchResult::default();
        ensure_minimum_selections(&mut result, &AvailableSections::default(), &[], 2);
        assert!(result.experiences.is_empty());
        assert!(result.projects.is_empty());
        assert!(result.skills_variant.is_none());
    }
}

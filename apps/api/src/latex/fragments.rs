//! Per-category fragment assembly.
//!
//! Pure functions from resolved payloads to .tex fragment strings. Each
//! fragment overwrites the matching default file inside the skeleton's
//! `src/` directory; absent categories leave the default untouched.

use serde_json::Value;

use crate::latex::escape::{escape_latex, escape_value, format_inline};
use crate::models::block::{ExperiencePayload, HeadingPayload, ProjectPayload};

/// Skills payload keys that are bookkeeping, not skill categories.
const RESERVED_SKILL_KEYS: [&str; 5] = ["tags", "type", "key", "flavor", "version"];

/// Fixed default identity record; heading payload fields and
/// location/email overrides are layered on top.
#[derive(Debug, Clone)]
pub struct DefaultHeading {
    pub name: &'static str,
    pub location: &'static str,
    pub phone: &'static str,
    pub phone_display: &'static str,
    pub email: &'static str,
    pub linkedin: &'static str,
    pub github: &'static str,
}

pub const DEFAULT_HEADING: DefaultHeading = DefaultHeading {
    name: "Shivang Patel",
    location: "Seattle, WA",
    phone: "+18575449579",
    phone_display: "(857)-544-9579",
    email: "patelshivang.work@gmail.com",
    linkedin: "shivangmpatel",
    github: "shivang2402",
};

fn non_empty(field: Option<&str>) -> Option<&str> {
    field.filter(|s| !s.is_empty())
}

fn experience_entry(exp: &ExperiencePayload) -> String {
    let mut out = String::from("\\resumeSubheadingExp\n");
    out.push_str(&format!(
        "    {{\\textbf{{{}}} $|$ \\textbf{{\\textit{{{}}}}} $|$ \\textit{{{}}}}}{{{}}}\n",
        escape_latex(exp.display_title()),
        escape_latex(exp.company.as_deref().unwrap_or_default()),
        escape_latex(exp.location.as_deref().unwrap_or_default()),
        escape_latex(exp.dates.as_deref().unwrap_or_default()),
    ));
    out.push_str("\\resumeItemListStart\n");
    for bullet in &exp.bullets {
        out.push_str(&format!("    \\resumeItem{{{}}}\n", format_inline(bullet)));
    }
    out.push_str("\\resumeItemListEnd\n");
    out
}

/// Renders experience.tex from resolved experience payloads, in list order.
pub fn experience_tex(experiences: &[ExperiencePayload]) -> String {
    let mut content = String::from("%-----------EXPERIENCE-----------%\n");
    content.push_str("\\section{Experience}\n");
    content.push_str("\\resumeSubHeadingListStart\n\n");
    for exp in experiences {
        content.push_str(&experience_entry(exp));
        content.push('\n');
    }
    content.push_str("\\resumeSubHeadingListEnd\n");
    content
}

fn project_entry(proj: &ProjectPayload) -> String {
    let tech = proj
        .tech
        .as_ref()
        .map(escape_value)
        .unwrap_or_default();
    let mut out = String::from("\\resumeProjectHeading\n");
    out.push_str(&format!(
        "    {{\\textbf{{{}}} $|$ \\textit{{{}}}}} {{}}\n",
        escape_latex(proj.name.as_deref().unwrap_or_default()),
        tech,
    ));
    out.push_str("\\resumeItemListStart\n");
    for bullet in &proj.bullets {
        out.push_str(&format!("    \\resumeItem{{{}}}\n", format_inline(bullet)));
    }
    out.push_str("\\resumeItemListEnd\n");
    out
}

/// Renders projects.tex from resolved project payloads, in list order.
pub fn projects_tex(projects: &[ProjectPayload]) -> String {
    let mut content = String::from("%-----------PROJECTS-----------%\n");
    content.push_str("\\section{Projects}\n");
    content.push_str("\\resumeSubHeadingListStart\n\n");
    for proj in projects {
        content.push_str(&project_entry(proj));
        content.push('\n');
    }
    content.push_str("\\resumeSubHeadingListEnd\n");
    content
}

/// Renders skills.tex: one table row per skill category, items joined
/// with ", " plus a trailing period. A payload wrapped under a `skills`
/// key is unwrapped first; reserved bookkeeping keys are skipped. The
/// optional `append` row lands after all categories.
pub fn skills_tex(skills: &Value, append: Option<&str>) -> String {
    let mut content = String::from("\\section{Skills}\n");
    content.push_str("\\small\n");
    content.push_str("\\begin{tabular}{ @{} p{0.15\\textwidth} p{0.80\\textwidth} @{} }\n");

    let unwrapped = match skills.get("skills") {
        Some(inner @ Value::Object(_)) => inner,
        _ => skills,
    };

    if let Value::Object(map) = unwrapped {
        for (category, items) in map {
            if RESERVED_SKILL_KEYS.contains(&category.as_str()) {
                continue;
            }
            let items_str = match items {
                Value::Array(list) => {
                    let joined = list
                        .iter()
                        .map(|item| match item {
                            Value::String(s) => s.clone(),
                            other => other.to_string(),
                        })
                        .collect::<Vec<_>>()
                        .join(", ");
                    format!("{joined}.")
                }
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            content.push_str(&format!(
                "    \\textbf{{{}:}} & {}\\\\\n",
                escape_latex(category),
                escape_latex(&items_str),
            ));
        }
    }

    if let Some(extra) = append {
        content.push_str(&format!("    & {}\\\\\n", escape_latex(extra)));
    }

    content.push_str("\\end{tabular}\n");
    content
}

/// Renders heading.tex. Merge order: defaults, then non-empty heading
/// payload fields, then location/email overrides from their own blocks.
pub fn heading_tex(
    heading: Option<&HeadingPayload>,
    location: Option<&str>,
    email: Option<&str>,
) -> String {
    let d = &DEFAULT_HEADING;
    let h = heading.cloned().unwrap_or_default();

    let name = non_empty(h.name.as_deref()).unwrap_or(d.name);
    let loc = location
        .or(non_empty(h.location.as_deref()))
        .unwrap_or(d.location);
    let phone = non_empty(h.phone.as_deref()).unwrap_or(d.phone);
    let phone_display = non_empty(h.phone_display.as_deref())
        .or(non_empty(h.phone.as_deref()))
        .unwrap_or(d.phone_display);
    let email_addr = email
        .or(non_empty(h.email.as_deref()))
        .unwrap_or(d.email);
    let linkedin = non_empty(h.linkedin.as_deref()).unwrap_or(d.linkedin);
    let github = non_empty(h.github.as_deref()).unwrap_or(d.github);

    let mut content = String::from("%----------HEADING----------%\n");
    content.push_str("\\begin{center}\n");
    content.push_str(&format!(
        "    \\textbf{{\\huge {}}} \\\\ \\vspace{{3pt}}\n",
        escape_latex(name)
    ));
    content.push_str("    \\quad\n");
    content.push_str(&format!(
        "    {{\\seticon{{faMapMarker}} \\underline{{{}}}}}\n",
        escape_latex(loc)
    ));
    content.push_str("    \\quad\n");
    content.push_str(&format!(
        "    \\href{{tel:{}}}{{\\seticon{{faPhone}} \\underline{{{}}}}}\n",
        phone,
        escape_latex(phone_display)
    ));
    content.push_str("    \\quad\n");
    content.push_str(&format!(
        "    \\href{{mailto:{}}}{{\\seticon{{faEnvelope}} \\underline{{{}}}}}\n",
        email_addr,
        escape_latex(email_addr)
    ));
    content.push_str("    \\quad\n");
    content.push_str(&format!(
        "    \\href{{https://www.linkedin.com/in/{}}}{{\\seticon{{faLinkedin}} \\underline{{{}}}}}\n",
        linkedin,
        escape_latex(linkedin)
    ));
    content.push_str("    \\quad\n");
    content.push_str(&format!(
        "    \\href{{https://github.com/{}}}{{\\seticon{{faGithub}} \\underline{{{}}}}}\n",
        github,
        escape_latex(github)
    ));
    content.push_str("    \\quad\n");
    content.push_str("\\end{center}\n");
    content
}

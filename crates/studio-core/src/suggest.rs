//! Turn a free-text idea into a project skeleton.

use serde::Serialize;

use studio_db::models::{Material, Step};

const MEDIUMS: &[&str] = &[
    "watercolor",
    "oil",
    "acrylic",
    "pencil",
    "ink",
    "pastel",
    "charcoal",
    "mixed media",
];

const STYLES: &[&str] = &[
    "landscape",
    "portrait",
    "still life",
    "abstract",
    "botanical",
    "seascape",
    "cityscape",
];

const SUBJECTS: &[&str] = &[
    "sunflower", "flower", "mountain", "ocean", "tree", "bird", "sunset", "forest",
];

const STEPS: [&str; 5] = [
    "Gather reference images and plan composition",
    "Sketch initial composition",
    "Block in main shapes and values",
    "Add details and refine",
    "Final touches and evaluation",
];

/// What was recognised in the query.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ParsedQuery {
    pub medium: Option<String>,
    pub style: Option<String>,
    pub subject: Option<String>,
    pub budget_constraint: Option<f64>,
}

/// A project outline ready to be passed to `projects::create_project`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SuggestedProject {
    pub title: String,
    pub description: String,
    pub medium: Option<String>,
    pub style: Option<String>,
    pub subject: Option<String>,
    pub materials_list: Vec<Material>,
    pub steps: Vec<Step>,
    pub estimated_budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub suggested_project: SuggestedProject,
    pub parsed_from_query: ParsedQuery,
}

fn first_keyword(text: &str, keywords: &[&str]) -> Option<String> {
    keywords
        .iter()
        .find(|k| text.contains(*k))
        .map(|k| (*k).to_string())
}

fn title_case(s: &str) -> String {
    s.split(' ')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn materials_for(medium: Option<&str>) -> Vec<Material> {
    let items: &[(&str, &str)] = match medium {
        Some("watercolor") => &[
            ("Watercolor paper", "paper"),
            ("Round brush #6", "brush"),
            ("Flat brush 1 inch", "brush"),
            ("Primary colors set", "paint"),
        ],
        Some("oil") => &[
            ("Stretched canvas", "canvas"),
            ("Oil paint set", "paint"),
            ("Linseed oil", "medium"),
            ("Filbert brush set", "brush"),
        ],
        Some("acrylic") => &[
            ("Canvas board", "canvas"),
            ("Acrylic paint set", "paint"),
            ("Flat brush set", "brush"),
        ],
        _ => &[],
    };
    items
        .iter()
        .map(|(name, category)| Material::new(*name, Some(*category)))
        .collect()
}

fn default_steps() -> Vec<Step> {
    STEPS
        .iter()
        .zip(1..)
        .map(|(description, step)| Step {
            step,
            description: (*description).to_string(),
        })
        .collect()
}

/// Suggest a project from `query`. Pure and deterministic.
pub fn suggest_project(query: &str, budget: Option<f64>) -> Suggestion {
    let lower = query.to_lowercase();
    let medium = first_keyword(&lower, MEDIUMS);
    let style = first_keyword(&lower, STYLES);
    let subject = first_keyword(&lower, SUBJECTS);

    let mut title_parts = Vec::new();
    if let Some(subject) = &subject {
        title_parts.push(title_case(subject));
    }
    if let Some(style) = &style {
        title_parts.push(title_case(style));
    }
    if let Some(medium) = &medium {
        title_parts.push(format!("in {}", title_case(medium)));
    }
    let title = if title_parts.is_empty() {
        "New Art Project".to_string()
    } else {
        title_parts.join(" ")
    };

    Suggestion {
        suggested_project: SuggestedProject {
            title,
            description: query.to_string(),
            materials_list: materials_for(medium.as_deref()),
            steps: default_steps(),
            medium: medium.clone(),
            style: style.clone(),
            subject: subject.clone(),
            estimated_budget: budget,
        },
        parsed_from_query: ParsedQuery {
            medium,
            style,
            subject,
            budget_constraint: budget,
        },
    }
}

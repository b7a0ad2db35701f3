use crate::source::{Source, SourceCategory};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub content: &'static str,
}

pub const FINANCIAL_TEMPLATE_ID: &str = "financial-controller";
pub const TECHNICAL_TEMPLATE_ID: &str = "technical-controller";

pub static PROMPT_TEMPLATES: [PromptTemplate; 2] = [
    PromptTemplate {
        id: FINANCIAL_TEMPLATE_ID,
        name: "Financial Controller",
        description: "Specialized in M&A, investments, and precise financial data for the Space sector.",
        content: FINANCIAL_PROMPT,
    },
    PromptTemplate {
        id: TECHNICAL_TEMPLATE_ID,
        name: "Technical Officer",
        description: "Focuses on TRL, orbits, mission types, and engineering milestones.",
        content: TECHNICAL_PROMPT,
    },
];

pub const FINANCIAL_COLUMNS: &[&str] = &[
    "relevance_score",
    "published_date",
    "source",
    "title",
    "deal_type",
    "deal_status",
    "amount",
    "investors",
    "summary",
];

pub const TECHNICAL_COLUMNS: &[&str] = &[
    "relevance_score",
    "source",
    "title",
    "technology_readiness_level",
    "key_assets",
    "amount",
    "mission_type",
    "summary",
];

/// Model identifiers the backend knows how to route.
pub const AVAILABLE_MODELS: [(&str, &str); 5] = [
    ("groq/llama-3.3-70b-versatile", "Groq (Llama 3.3 - 70B Versatile)"),
    ("groq/llama-3.1-8b-instant", "Groq (Llama 3.1 - 8B Instant)"),
    ("mistral-large-latest", "Mistral API (Standard)"),
    ("mistral-small", "Mistral API (Small)"),
    ("ollama/mistral", "Ollama Local"),
];

pub const DEFAULT_MODEL: &str = "mistral-large-latest";

pub fn find_template(id: &str) -> Option<&'static PromptTemplate> {
    PROMPT_TEMPLATES.iter().find(|template| template.id == id)
}

/// What the form offers once a template is chosen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateLayout {
    pub offered_sources: Vec<Source>,
    pub default_source: Source,
    pub columns: &'static [&'static str],
}

/// Layout for a template id; unknown ids offer every source.
pub fn layout_for(template_id: &str) -> TemplateLayout {
    match template_id {
        FINANCIAL_TEMPLATE_ID => TemplateLayout {
            offered_sources: Source::in_category(SourceCategory::Financial),
            default_source: Source::SpaceNews,
            columns: FINANCIAL_COLUMNS,
        },
        TECHNICAL_TEMPLATE_ID => TemplateLayout {
            offered_sources: Source::in_category(SourceCategory::Technical),
            default_source: Source::ViaSatellite,
            columns: TECHNICAL_COLUMNS,
        },
        _ => TemplateLayout {
            offered_sources: Source::ALL.to_vec(),
            default_source: Source::SpaceNews,
            columns: FINANCIAL_COLUMNS,
        },
    }
}

const FINANCIAL_PROMPT: &str = r#"You are a specialized Financial Analyst for the Space Economy.
Your objective is to extract concrete corporate events: acquisitions, mergers, investments, IPOs, or major contracts.

You must return ONLY a valid JSON with these EXACT keys:
"source", "url", "title", "published_date", "is_relevant", "relevance_score", "deal_type", "deal_status", "acquirer", "target", "investors", "amount", "currency", "valuation", "stake_percent", "summary", "why_it_matters".

RULES:
- is_relevant: true ONLY if a real financial event is described.
- deal_type: "investment", "acquisition", "contract", "partnership", "ipo".
- amount: Extract numeric value if present (e.g. 5000000).
- investors: List of investor names.
- currency: ISO code (USD, EUR).

If technical details (orbit, TRL) are mentioned, ignore them unless they affect valuation.
Do not invent data. Use null for missing fields."#;

const TECHNICAL_PROMPT: &str = r#"You are a Chief Technology Officer (CTO) for the aerospace sector.
Your objective is to extract HARD TECHNICAL DATA and ignore financial gossip.

You must return ONLY a valid JSON with these EXACT keys:
"source", "url", "title", "published_date", "is_relevant", "relevance_score", "deal_type", "deal_status", "target", "technology_readiness_level", "orbit", "mission_type", "key_assets", "summary", "why_it_matters".

MAPPING INSTRUCTIONS (CRITICAL):
1. technology_readiness_level: Estimate TRL (1-9) based on context (e.g., "concept"=TRL2, "flight proven"=TRL9). Return a string like "9" or "6-7".
2. orbit: Extract specific orbit: "LEO", "GEO", "MEO", "SSO", "Lunar", "Deep Space".
3. mission_type: "EO" (Earth Obs), "Comms", "Launch", "Exploration", "In-Orbit Servicing".
4. key_assets: Use this for extra specs like resolution (GSD), propulsion type, bus size.
5. deal_type: Set to "tech_demo", "launch", "r_and_d" or "contract" (if manufacturing).

DEFINITION OF RELEVANCE:
- is_relevant: true ONLY if the article reveals technical specs, engineering achievements, or mission details.
- If the article is purely financial earnings, set is_relevant=false.

Do not invent data. If TRL or Orbit is not mentioned, use null."#;

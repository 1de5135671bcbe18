// file: src/retrieval/domain.rs
// description: economic development vocabulary used to reject out-of-scope queries
// reference: category term lists matched as lowercase substrings

pub const DOMAIN_TERMS: &[(&str, &[&str])] = &[
    (
        "location",
        &["city", "state", "county", "region", "metro", "area", "location", "site", "facility"],
    ),
    (
        "incentives",
        &["incentive", "tax", "credit", "abatement", "rebate", "grant", "funding", "financing"],
    ),
    (
        "workforce",
        &["jobs", "employment", "workforce", "labor", "skill", "training", "education"],
    ),
    (
        "industry",
        &["manufacturing", "biotech", "logistics", "cleantech", "aerospace", "software", "tech"],
    ),
    (
        "infrastructure",
        &["transport", "airport", "rail", "highway", "broadband", "utility", "power"],
    ),
    (
        "economic",
        &["economy", "economic", "development", "investment", "business", "company", "enterprise"],
    ),
    ("research", &["university", "research", "innovation", "r&d", "stem"]),
];

pub struct DomainGuard;

impl DomainGuard {
    pub fn new() -> Self {
        Self
    }

    /// First category whose vocabulary appears in the query.
    pub fn matched_category(&self, query: &str) -> Option<&'static str> {
        let lower = query.to_lowercase();
        DOMAIN_TERMS
            .iter()
            .find(|(_, terms)| terms.iter().any(|t| lower.contains(t)))
            .map(|(category, _)| *category)
    }

    pub fn is_in_scope(&self, query: &str) -> bool {
        self.matched_category(query).is_some()
    }
}

impl Default for DomainGuard {
    fn default() -> Self {
        Self::new()
    }
}

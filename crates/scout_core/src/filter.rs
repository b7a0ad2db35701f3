use crate::deal::Deal;

/// Category filter applied to the result table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Case-insensitive substring of `deal_type` or `mission_type`.
    Matching(String),
}

impl CategoryFilter {
    /// `"ALL"` (any case) and blank input mean no filtering.
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            CategoryFilter::All
        } else {
            CategoryFilter::Matching(trimmed.to_string())
        }
    }

    pub fn label(&self) -> &str {
        match self {
            CategoryFilter::All => "ALL",
            CategoryFilter::Matching(needle) => needle,
        }
    }

    pub fn matches(&self, deal: &Deal) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Matching(needle) => {
                let needle = needle.to_lowercase();
                ["deal_type", "mission_type"].iter().any(|field| {
                    deal.text_field(field)
                        .is_some_and(|value| value.to_lowercase().contains(&needle))
                })
            }
        }
    }

    /// Copies the matching deals, keeping their order.
    pub fn apply(&self, deals: &[Deal]) -> Vec<Deal> {
        deals.iter().filter(|deal| self.matches(deal)).cloned().collect()
    }
}

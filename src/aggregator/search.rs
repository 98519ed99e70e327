//! Technical-detail search.
//!
//! Matches a query against the `name` of every variable, parameter and
//! argument of every node. Payloads are not searched. Items without a
//! string name are skipped.

use super::document::DiagramData;

/// How the query is compared against item names.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MatchPolicy {
    #[default]
    CaseInsensitive,
    CaseSensitive,
}

struct NameMatcher {
    needle: String,
    policy: MatchPolicy,
}

impl NameMatcher {
    fn new(query: &str, policy: MatchPolicy) -> Self {
        let needle = match policy {
            MatchPolicy::CaseInsensitive => query.to_lowercase(),
            MatchPolicy::CaseSensitive => query.to_string(),
        };
        Self { needle, policy }
    }

    fn matches_name(&self, name: &str) -> bool {
        match self.policy {
            MatchPolicy::CaseInsensitive => name.to_lowercase().contains(&self.needle),
            MatchPolicy::CaseSensitive => name.contains(&self.needle),
        }
    }

    fn matches_document(&self, data: &DiagramData) -> bool {
        data.nodes()
            .iter()
            .flat_map(|node| node.details().named_items())
            .filter_map(|item| item.name())
            .any(|name| self.matches_name(name))
    }
}

/// Whether any variable/parameter/argument name in `data` contains `query`.
pub fn matches_technical_detail(data: &DiagramData, query: &str, policy: MatchPolicy) -> bool {
    NameMatcher::new(query, policy).matches_document(data)
}

/// Keep the diagrams whose technical details match `query`, preserving order.
pub fn search_by_technical_detail<I, D>(diagrams: I, query: &str, policy: MatchPolicy) -> Vec<D>
where
    I: IntoIterator<Item = D>,
    D: AsRef<DiagramData>,
{
    let matcher = NameMatcher::new(query, policy);
    diagrams
        .into_iter()
        .filter(|diagram| matcher.matches_document(diagram.as_ref()))
        .collect()
}

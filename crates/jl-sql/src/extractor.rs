//! Relation extraction and query shape inspection

use serde::Serialize;
use sqlparser::ast::{visit_relations, Query, Visit};
use std::collections::BTreeSet;
use std::ops::ControlFlow;

/// What the comparison needs to know about a parsed query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QueryShape {
    /// The outermost query declares ORDER BY
    pub ordered: bool,

    /// Relations read by the query (lowercase, sorted, CTE names excluded)
    pub relations: Vec<String>,
}

impl QueryShape {
    /// Inspect a parsed query
    pub fn of(query: &Query) -> Self {
        let cte_names: BTreeSet<String> = query
            .with
            .as_ref()
            .map(|with| {
                with.cte_tables
                    .iter()
                    .map(|cte| cte.alias.name.value.to_lowercase())
                    .collect()
            })
            .unwrap_or_default();

        let relations = collect_relations(query)
            .into_iter()
            .filter(|name| !cte_names.contains(name))
            .collect();

        Self {
            ordered: query.order_by.is_some(),
            relations,
        }
    }

    /// Whether the query reads the given relation
    pub fn reads(&self, relation: &str) -> bool {
        self.relations.iter().any(|r| r.eq_ignore_ascii_case(relation))
    }
}

/// Every relation referenced under `node`.
///
/// Walks FROM clauses, JOINs and subqueries via `visit_relations`.
/// Names are unquoted and lowercased.
fn collect_relations<V: Visit>(node: &V) -> BTreeSet<String> {
    let mut relations = BTreeSet::new();
    let _ = visit_relations(node, |relation| {
        relations.insert(relation.to_string().replace('"', "").to_lowercase());
        ControlFlow::<()>::Continue(())
    });
    relations
}

#[cfg(test)]
#[path = "extractor_test.rs"]
mod tests;

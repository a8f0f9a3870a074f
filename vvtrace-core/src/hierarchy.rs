//! PRD resolution from the requirements hierarchy
//!
//! The builder leaves every `prd` cell empty. When a PRD → SRS link list is
//! available, [`RequirementLinks::resolve`] fills the cell of each row whose
//! SRS has parents, joining several parents with `", "`.

use std::collections::HashMap;

use crate::trace::TraceRow;

/// PRD → SRS links keyed by SRS id
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementLinks {
    parents: HashMap<String, Vec<String>>,
    count:   usize,
}

impl RequirementLinks {
    /// Create an empty link list
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `srs_id` derives from `prd_id`. Repeated links are
    /// ignored.
    pub fn add(&mut self, prd_id: impl Into<String>, srs_id: impl Into<String>) {
        let prd_id = prd_id.into();
        let parents = self.parents.entry(srs_id.into()).or_default();
        if !parents.contains(&prd_id) {
            parents.push(prd_id);
            self.count += 1;
        }
    }

    /// Parents of `srs_id`, in the order they were linked
    pub fn parents_of(&self, srs_id: &str) -> &[String] {
        self.parents.get(srs_id).map(Vec::as_slice).unwrap_or_default()
    }

    /// Number of distinct links
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether no link was recorded
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Fill empty `prd` cells from the links. Cells that already hold a
    /// value are carried through unchanged.
    pub fn resolve(&self, rows: Vec<TraceRow>) -> Vec<TraceRow> {
        rows.into_iter()
            .map(|mut row| {
                if row.prd.is_none() {
                    let parents = self.parents_of(&row.srs_id);
                    if !parents.is_empty() {
                        row.prd = Some(parents.join(", "));
                    }
                }
                row
            })
            .collect()
    }
}

impl<P, S> FromIterator<(P, S)> for RequirementLinks
where
    P: Into<String>,
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (P, S)>>(iter: I) -> Self {
        let mut links = Self::new();
        for (prd_id, srs_id) in iter {
            links.add(prd_id, srs_id);
        }
        links
    }
}

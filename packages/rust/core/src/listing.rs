//! Listing helpers: page slicing and facet choices for the filter controls.

use std::collections::HashSet;

use serde::Serialize;

use expertdesk_shared::ExpertView;

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// 1-based page number actually served (after clamping).
    pub page: usize,
    pub per_page: usize,
    pub total_items: usize,
    pub total_pages: usize,
}

impl<T> Page<T> {
    pub fn has_next(&self) -> bool {
        self.page < self.total_pages
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Slice `items` into the requested 1-based page.
///
/// Out-of-range pages are clamped to the first or last page. A `per_page` of
/// zero is treated as one.
pub fn paginate<T: Clone>(items: &[T], page: usize, per_page: usize) -> Page<T> {
    let per_page = per_page.max(1);
    let total_items = items.len();
    let total_pages = total_items.div_ceil(per_page);
    let page = page.clamp(1, total_pages.max(1));

    let start = ((page - 1) * per_page).min(total_items);
    let end = (start + per_page).min(total_items);

    Page {
        items: items[start..end].to_vec(),
        page,
        per_page,
        total_items,
        total_pages,
    }
}

/// Distinct values available for the industry and location facets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Facets {
    pub industries: Vec<String>,
    pub locations: Vec<String>,
}

/// Collect facet choices from the aggregated views.
///
/// Values are deduplicated ignoring case (first spelling wins) and sorted
/// case-insensitively. Blank values are dropped. The rest are kept verbatim
/// so each choice matches its experts exactly.
pub fn facets(views: &[ExpertView]) -> Facets {
    Facets {
        industries: distinct(views.iter().map(|v| v.industry.as_str())),
        locations: distinct(views.iter().map(|v| v.country_of_residence.as_str())),
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out: Vec<String> = values
        .filter(|v| !v.trim().is_empty())
        .filter(|v| seen.insert(v.to_lowercase()))
        .map(String::from)
        .collect();
    out.sort_by_key(|v| v.to_lowercase());
    out
}

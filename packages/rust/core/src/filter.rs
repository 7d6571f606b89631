//! Filter pipeline over aggregated expert views.
//!
//! Every enabled predicate must match for a view to be kept. Disabled
//! predicates always pass, so [`FilterCriteria::default`] keeps everything.
//! Results preserve input order.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use expertdesk_shared::{ExpertDeskError, ExpertView, Result};

// ---------------------------------------------------------------------------
// Criteria types
// ---------------------------------------------------------------------------

/// Which employment status to keep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmploymentType {
    /// Experts with a current position, or no career on record.
    Current,
    /// Experts whose every position has ended.
    Former,
    #[default]
    All,
}

impl FromStr for EmploymentType {
    type Err = ExpertDeskError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "current" => Ok(Self::Current),
            "former" => Ok(Self::Former),
            "all" | "" => Ok(Self::All),
            other => Err(ExpertDeskError::validation(format!(
                "unknown employment type '{other}' (expected current, former, or all)"
            ))),
        }
    }
}

/// A single-choice facet such as industry or location.
///
/// `"all"` (any case) and the empty string both mean "no restriction".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Facet {
    #[default]
    All,
    Only(String),
}

impl Facet {
    pub fn is_all(&self) -> bool {
        matches!(self, Facet::All)
    }
}

impl From<String> for Facet {
    fn from(value: String) -> Self {
        let trimmed = value.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("all") {
            Facet::All
        } else {
            Facet::Only(value)
        }
    }
}

impl From<&str> for Facet {
    fn from(value: &str) -> Self {
        Facet::from(value.to_string())
    }
}

impl From<Facet> for String {
    fn from(facet: Facet) -> Self {
        match facet {
            Facet::All => "all".into(),
            Facet::Only(value) => value,
        }
    }
}

/// The full set of listing filters.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterCriteria {
    /// Substring of full name or email.
    pub search_query: String,
    pub employment_type: EmploymentType,
    /// Substring of any career title.
    pub expert_title: String,
    /// Substring of any career company name.
    pub companies: String,
    /// Exact industry, ignoring case.
    pub industry: Facet,
    /// Exact country of residence, ignoring case.
    pub location: Facet,
    /// Keep only experts with at least one completed call.
    pub completed_call: bool,
    /// Keep only experts attached to at least one project.
    pub published: bool,
}

/// A partial update to [`FilterCriteria`]; `None` fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CriteriaPatch {
    pub search_query: Option<String>,
    pub employment_type: Option<EmploymentType>,
    pub expert_title: Option<String>,
    pub companies: Option<String>,
    pub industry: Option<Facet>,
    pub location: Option<Facet>,
    pub completed_call: Option<bool>,
    pub published: Option<bool>,
}

impl FilterCriteria {
    /// Apply the fields present in `patch`.
    pub fn merge(&mut self, patch: CriteriaPatch) {
        if let Some(v) = patch.search_query {
            self.search_query = v;
        }
        if let Some(v) = patch.employment_type {
            self.employment_type = v;
        }
        if let Some(v) = patch.expert_title {
            self.expert_title = v;
        }
        if let Some(v) = patch.companies {
            self.companies = v;
        }
        if let Some(v) = patch.industry {
            self.industry = v;
        }
        if let Some(v) = patch.location {
            self.location = v;
        }
        if let Some(v) = patch.completed_call {
            self.completed_call = v;
        }
        if let Some(v) = patch.published {
            self.published = v;
        }
    }

    /// True when no predicate is enabled.
    pub fn is_identity(&self) -> bool {
        Matcher::new(self).enabled() == 0
    }

    /// Whether a single view passes every enabled predicate.
    pub fn matches(&self, view: &ExpertView) -> bool {
        Matcher::new(self).matches(view)
    }
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Keep the views that satisfy `criteria`, in input order.
pub fn filter<'a>(views: &'a [ExpertView], criteria: &FilterCriteria) -> Vec<&'a ExpertView> {
    let matcher = Matcher::new(criteria);
    if matcher.enabled() == 0 {
        return views.iter().collect();
    }

    let kept: Vec<&ExpertView> = views.iter().filter(|v| matcher.matches(v)).collect();
    debug!(
        total = views.len(),
        kept = kept.len(),
        predicates = matcher.enabled(),
        "filter applied"
    );
    kept
}

/// Criteria with needles lowered once, `None` meaning the predicate is off.
struct Matcher {
    search: Option<String>,
    employment: EmploymentType,
    title: Option<String>,
    company: Option<String>,
    industry: Option<String>,
    location: Option<String>,
    completed_call: bool,
    published: bool,
}

impl Matcher {
    fn new(criteria: &FilterCriteria) -> Self {
        Self {
            search: needle(&criteria.search_query),
            employment: criteria.employment_type,
            title: needle(&criteria.expert_title),
            company: needle(&criteria.companies),
            industry: facet_needle(&criteria.industry),
            location: facet_needle(&criteria.location),
            completed_call: criteria.completed_call,
            published: criteria.published,
        }
    }

    fn enabled(&self) -> usize {
        [
            self.search.is_some(),
            self.employment != EmploymentType::All,
            self.title.is_some(),
            self.company.is_some(),
            self.industry.is_some(),
            self.location.is_some(),
            self.completed_call,
            self.published,
        ]
        .iter()
        .filter(|on| **on)
        .count()
    }

    fn matches(&self, view: &ExpertView) -> bool {
        if let Some(q) = &self.search {
            if !(contains(&view.full_name, q) || contains(&view.email, q)) {
                return false;
            }
        }

        let employment_ok = match self.employment {
            EmploymentType::Current => !view.is_former,
            EmploymentType::Former => view.is_former,
            EmploymentType::All => true,
        };
        if !employment_ok {
            return false;
        }

        if let Some(q) = &self.title {
            if !view.career.iter().any(|c| contains(&c.title, q)) {
                return false;
            }
        }

        if let Some(q) = &self.company {
            if !view.career.iter().any(|c| contains(&c.company_name, q)) {
                return false;
            }
        }

        if let Some(q) = &self.industry {
            if view.industry.to_lowercase() != *q {
                return false;
            }
        }

        if let Some(q) = &self.location {
            if view.country_of_residence.to_lowercase() != *q {
                return false;
            }
        }

        // Unknown call counts pass until a source for them is wired in.
        if self.completed_call && matches!(view.completed_calls, Some(0)) {
            return false;
        }

        !(self.published && view.projects.is_empty())
    }
}

/// Whitespace-only input disables the predicate; anything else is kept verbatim.
fn needle(raw: &str) -> Option<String> {
    (!raw.trim().is_empty()).then(|| raw.to_lowercase())
}

fn facet_needle(facet: &Facet) -> Option<String> {
    match facet {
        Facet::All => None,
        Facet::Only(value) => needle(value),
    }
}

fn contains(haystack: &str, lowered_needle: &str) -> bool {
    haystack.to_lowercase().contains(lowered_needle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use expertdesk_shared::{CareerEntry, ExpertId, ProjectId, ProjectRecord};

    fn date(y: i32, m: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, 1).unwrap()
    }

    fn view(id: i64, name: &str, email: &str) -> ExpertView {
        ExpertView {
            id: ExpertId(id),
            full_name: name.into(),
            industry: "Energy".into(),
            country_of_residence: "Indonesia".into(),
            expert_cost: 100,
            email: email.into(),
            phone: None,
            linkedin: None,
            notes: None,
            is_former: false,
            career: Vec::new(),
            projects: Vec::new(),
            completed_calls: None,
        }
    }

    fn sample() -> Vec<ExpertView> {
        let mut alice = view(1, "Alice Hartono", "alice@example.com");
        alice.career = vec![CareerEntry::new("CEO", "Acme Energy", date(2019, 1), None)];
        alice.projects = vec![ProjectRecord {
            id: ProjectId(10),
            name: "P1".into(),
        }];

        let mut jane = view(2, "Jane Tan", "jt@example.com");
        jane.industry = "Healthcare".into();
        jane.country_of_residence = "Singapore".into();
        jane.is_former = true;
        jane.career = vec![CareerEntry::new(
            "Chief Medical Officer",
            "Raffles Health",
            date(2015, 5),
            Some(date(2020, 1)),
        )];

        let mut bob = view(3, "Bob", "bob.janeway@example.org");
        bob.industry = "ENERGY".into();
        bob.completed_calls = Some(0);

        vec![alice, jane, bob]
    }

    fn ids(views: &[&ExpertView]) -> Vec<i64> {
        views.iter().map(|v| v.id.0).collect()
    }

    #[test]
    fn default_criteria_is_identity() {
        let views = sample();
        let criteria = FilterCriteria::default();

        assert!(criteria.is_identity());
        let out: Vec<ExpertView> = filter(&views, &criteria).into_iter().cloned().collect();
        assert_eq!(out, views);
    }

    #[test]
    fn search_matches_name_or_email_ignoring_case() {
        let views = sample();
        let criteria = FilterCriteria {
            search_query: "JANE".into(),
            ..Default::default()
        };

        assert_eq!(ids(&filter(&views, &criteria)), vec![2, 3]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let views = sample();
        let criteria = FilterCriteria {
            search_query: "jane".into(),
            ..Default::default()
        };

        let once: Vec<ExpertView> = filter(&views, &criteria).into_iter().cloned().collect();
        let twice: Vec<ExpertView> = filter(&once, &criteria).into_iter().cloned().collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn employment_type_splits_current_and_former() {
        let views = sample();
        let current = FilterCriteria {
            employment_type: EmploymentType::Current,
            ..Default::default()
        };
        let former = FilterCriteria {
            employment_type: EmploymentType::Former,
            ..Default::default()
        };

        assert_eq!(ids(&filter(&views, &current)), vec![1, 3]);
        assert_eq!(ids(&filter(&views, &former)), vec![2]);
    }

    #[test]
    fn former_filter_excludes_current_expert() {
        let views = vec![sample().remove(0)];
        let criteria = FilterCriteria {
            employment_type: EmploymentType::Former,
            ..Default::default()
        };

        assert!(filter(&views, &criteria).is_empty());
    }

    #[test]
    fn title_and_company_match_any_career_entry() {
        let views = sample();
        let by_title = FilterCriteria {
            expert_title: "medical".into(),
            ..Default::default()
        };
        let by_company = FilterCriteria {
            companies: "acme".into(),
            ..Default::default()
        };

        assert_eq!(ids(&filter(&views, &by_title)), vec![2]);
        assert_eq!(ids(&filter(&views, &by_company)), vec![1]);
    }

    #[test]
    fn facets_are_exact_and_case_insensitive() {
        let views = sample();
        let energy = FilterCriteria {
            industry: "energy".into(),
            ..Default::default()
        };
        let partial = FilterCriteria {
            industry: "ener".into(),
            ..Default::default()
        };
        let singapore = FilterCriteria {
            location: "SINGAPORE".into(),
            ..Default::default()
        };

        assert_eq!(ids(&filter(&views, &energy)), vec![1, 3]);
        assert!(filter(&views, &partial).is_empty());
        assert_eq!(ids(&filter(&views, &singapore)), vec![2]);
    }

    #[test]
    fn non_blank_needles_keep_surrounding_whitespace() {
        let views = sample();
        let padded_search = FilterCriteria {
            search_query: "Jane ".into(),
            ..Default::default()
        };
        let blank_search = FilterCriteria {
            search_query: "   ".into(),
            ..Default::default()
        };
        let padded_industry = FilterCriteria {
            industry: "Energy ".into(),
            ..Default::default()
        };

        // "bob.janeway" has no space after "jane".
        assert_eq!(ids(&filter(&views, &padded_search)), vec![2]);
        assert!(blank_search.is_identity());
        assert_eq!(filter(&views, &blank_search).len(), views.len());
        assert!(filter(&views, &padded_industry).is_empty());
    }

    #[test]
    fn all_facet_disables_predicate() {
        assert_eq!(Facet::from("All"), Facet::All);
        assert_eq!(Facet::from("  "), Facet::All);
        assert_eq!(Facet::from("Energy"), Facet::Only("Energy".into()));

        let criteria = FilterCriteria {
            industry: "all".into(),
            location: "ALL".into(),
            ..Default::default()
        };
        assert!(criteria.is_identity());
    }

    #[test]
    fn published_requires_a_project() {
        let views = sample();
        let criteria = FilterCriteria {
            published: true,
            ..Default::default()
        };

        assert_eq!(ids(&filter(&views, &criteria)), vec![1]);
    }

    #[test]
    fn completed_call_passes_unknown_counts() {
        let mut views = sample();
        views[0].completed_calls = Some(2);
        let criteria = FilterCriteria {
            completed_call: true,
            ..Default::default()
        };

        // Bob has a known count of zero; Jane's count is unknown.
        assert_eq!(ids(&filter(&views, &criteria)), vec![1, 2]);
    }

    #[test]
    fn predicate_order_does_not_matter() {
        let views = sample();
        let search = FilterCriteria {
            search_query: "example".into(),
            ..Default::default()
        };
        let industry = FilterCriteria {
            industry: "energy".into(),
            ..Default::default()
        };
        let current = FilterCriteria {
            employment_type: EmploymentType::Current,
            ..Default::default()
        };
        let combined = FilterCriteria {
            search_query: "example".into(),
            industry: "energy".into(),
            employment_type: EmploymentType::Current,
            ..Default::default()
        };

        let chain = |order: [&FilterCriteria; 3]| -> Vec<i64> {
            let mut remaining: Vec<ExpertView> = views.clone();
            for c in order {
                remaining = filter(&remaining, c).into_iter().cloned().collect();
            }
            remaining.iter().map(|v| v.id.0).collect()
        };

        let expected = ids(&filter(&views, &combined));
        assert_eq!(expected, vec![1, 3]);
        assert_eq!(chain([&search, &industry, &current]), expected);
        assert_eq!(chain([&current, &search, &industry]), expected);
        assert_eq!(chain([&industry, &current, &search]), expected);
    }

    #[test]
    fn merge_only_touches_present_fields() {
        let mut criteria = FilterCriteria {
            search_query: "alice".into(),
            published: true,
            ..Default::default()
        };

        criteria.merge(CriteriaPatch {
            employment_type: Some(EmploymentType::Former),
            published: Some(false),
            ..Default::default()
        });

        assert_eq!(criteria.search_query, "alice");
        assert_eq!(criteria.employment_type, EmploymentType::Former);
        assert!(!criteria.published);
    }

    #[test]
    fn criteria_deserializes_with_defaults() {
        let criteria: FilterCriteria =
            serde_json::from_str(r#"{"employment_type": "former", "industry": "Energy"}"#)
                .expect("deserialize");

        assert_eq!(criteria.employment_type, EmploymentType::Former);
        assert_eq!(criteria.industry, Facet::Only("Energy".into()));
        assert!(criteria.location.is_all());
        assert!(criteria.search_query.is_empty());
    }

    #[test]
    fn employment_type_parses() {
        assert_eq!("Former".parse::<EmploymentType>().unwrap(), EmploymentType::Former);
        assert_eq!("".parse::<EmploymentType>().unwrap(), EmploymentType::All);
        assert!("retired".parse::<EmploymentType>().is_err());
    }
}

//! Core domain types: raw backend records and the denormalized expert view.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identifiers
// ---------------------------------------------------------------------------

/// Backend primary key of an expert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExpertId(pub i64);

/// Backend primary key of a project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(pub i64);

impl std::fmt::Display for ExpertId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for ExpertId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

impl std::str::FromStr for ProjectId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

// ---------------------------------------------------------------------------
// Resource
// ---------------------------------------------------------------------------

/// The five collections the console reads from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Experts,
    Careers,
    Projects,
    Pipeline,
    Published,
}

impl Resource {
    /// All collections, in the order they are requested.
    pub const ALL: [Resource; 5] = [
        Resource::Experts,
        Resource::Careers,
        Resource::Projects,
        Resource::Pipeline,
        Resource::Published,
    ];

    /// Endpoint path relative to the API base URL.
    pub fn path(self) -> &'static str {
        match self {
            Resource::Experts => "experts/",
            Resource::Careers => "expert_experiences",
            Resource::Projects => "projects",
            Resource::Pipeline => "project_pipeline",
            Resource::Published => "project_published",
        }
    }
}

impl std::fmt::Display for Resource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Resource::Experts => "experts",
            Resource::Careers => "expert experiences",
            Resource::Projects => "projects",
            Resource::Pipeline => "project pipeline",
            Resource::Published => "published projects",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Raw records (wire shape)
// ---------------------------------------------------------------------------

/// One row of the `experts/` collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertRecord {
    pub expert_id: ExpertId,
    pub full_name: String,
    #[serde(default)]
    pub industry: String,
    #[serde(default)]
    pub country_of_residence: String,
    #[serde(default)]
    pub expert_cost: u32,
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "phone_number")]
    pub phone: Option<String>,
    #[serde(default, rename = "linkedIn_profile_link")]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// One row of the `expert_experiences` collection.
///
/// Dates stay as strings on the wire; the aggregator parses them and drops
/// records it cannot use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CareerRecord {
    #[serde(default)]
    pub expert_id: Option<ExpertId>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub company_name: String,
    #[serde(default)]
    pub start_date: Option<String>,
    /// `None` means the position is current.
    #[serde(default)]
    pub end_date: Option<String>,
}

/// One row of the `projects` collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRecord {
    #[serde(rename = "project_id")]
    pub id: ProjectId,
    #[serde(rename = "project_name")]
    pub name: String,
}

/// One row of `project_pipeline` or `project_published`.
///
/// Both keys are nullable in the backend (foreign keys set to NULL on delete).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipRecord {
    #[serde(default)]
    pub expert_id: Option<ExpertId>,
    #[serde(default)]
    pub project_id: Option<ProjectId>,
}

/// A point-in-time copy of all five collections.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawSnapshot {
    pub experts: Vec<ExpertRecord>,
    pub careers: Vec<CareerRecord>,
    pub projects: Vec<ProjectRecord>,
    pub pipeline: Vec<MembershipRecord>,
    pub published: Vec<MembershipRecord>,
}

// ---------------------------------------------------------------------------
// Derived view
// ---------------------------------------------------------------------------

/// Month-year format the backend uses for experience dates.
const LABEL_FORMAT: &str = "%m-%Y";

/// A parsed, display-ready career position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareerEntry {
    pub title: String,
    pub company_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// `"01-2019 - Present"` style label, in the backend's month-year form.
    pub date_range: String,
}

impl CareerEntry {
    pub fn new(
        title: impl Into<String>,
        company_name: impl Into<String>,
        start_date: NaiveDate,
        end_date: Option<NaiveDate>,
    ) -> Self {
        let start = start_date.format(LABEL_FORMAT);
        let date_range = match end_date {
            Some(end) => format!("{start} - {}", end.format(LABEL_FORMAT)),
            None => format!("{start} - Present"),
        };
        Self {
            title: title.into(),
            company_name: company_name.into(),
            start_date,
            end_date,
            date_range,
        }
    }

    /// Whether the position has no end date.
    pub fn is_current(&self) -> bool {
        self.end_date.is_none()
    }
}

/// One expert joined with career history and project memberships.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpertView {
    pub id: ExpertId,
    pub full_name: String,
    pub industry: String,
    pub country_of_residence: String,
    pub expert_cost: u32,
    pub email: String,
    pub phone: Option<String>,
    pub linkedin: Option<String>,
    pub notes: Option<String>,
    /// True only when there is at least one position and all have ended.
    pub is_former: bool,
    /// Current positions first, then by start date, most recent first.
    pub career: Vec<CareerEntry>,
    /// Pipeline projects then published projects, unique by id.
    pub projects: Vec<ProjectRecord>,
    /// Completed call count; `None` until a source for it is wired in.
    #[serde(default)]
    pub completed_calls: Option<u32>,
}

impl ExpertView {
    /// Build a view with no career, no projects, and current employment.
    pub fn from_record(record: &ExpertRecord) -> Self {
        Self {
            id: record.expert_id,
            full_name: record.full_name.clone(),
            industry: record.industry.clone(),
            country_of_residence: record.country_of_residence.clone(),
            expert_cost: record.expert_cost,
            email: record.email.clone(),
            phone: record.phone.clone(),
            linkedin: record.linkedin.clone(),
            notes: record.notes.clone(),
            is_former: false,
            career: Vec::new(),
            projects: Vec::new(),
            completed_calls: None,
        }
    }

    /// The first career entry, i.e. the most relevant position.
    pub fn headline(&self) -> Option<&CareerEntry> {
        self.career.first()
    }
}

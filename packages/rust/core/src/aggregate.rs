//! Aggregator: joins the raw collections into one [`ExpertView`] per expert.
//!
//! The join is driven by expert identity. Every input expert yields exactly one
//! view, in input order. Career, pipeline, and published rows are grouped by
//! expert id up front; rows that cannot be joined are logged and skipped.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;
use tracing::{debug, instrument, warn};

use expertdesk_shared::{
    CareerEntry, CareerRecord, ExpertDeskError, ExpertId, ExpertRecord, ExpertView,
    MembershipRecord, ProjectId, ProjectRecord, RawSnapshot, Resource, Result,
};

/// Aggregate a fetched snapshot.
pub fn aggregate_snapshot(snapshot: &RawSnapshot) -> Vec<ExpertView> {
    aggregate(
        &snapshot.experts,
        &snapshot.careers,
        &snapshot.projects,
        &snapshot.pipeline,
        &snapshot.published,
    )
}

/// Join the five collections into expert views.
///
/// 1. Group careers by expert (source order kept within a group)
/// 2. Index projects by id
/// 3. Group pipeline and published memberships by expert
/// 4. Per expert: sort career, derive `is_former`, resolve projects
#[instrument(skip_all, fields(experts = experts.len(), careers = careers.len()))]
pub fn aggregate(
    experts: &[ExpertRecord],
    careers: &[CareerRecord],
    projects: &[ProjectRecord],
    pipeline: &[MembershipRecord],
    published: &[MembershipRecord],
) -> Vec<ExpertView> {
    let career_index = index_careers(careers);
    let project_index: HashMap<ProjectId, &ProjectRecord> =
        projects.iter().map(|p| (p.id, p)).collect();
    let pipeline_index = index_memberships(Resource::Pipeline, pipeline);
    let published_index = index_memberships(Resource::Published, published);

    let views: Vec<ExpertView> = experts
        .iter()
        .map(|record| {
            let mut view = ExpertView::from_record(record);

            let mut career = career_index
                .get(&record.expert_id)
                .cloned()
                .unwrap_or_default();
            sort_career(&mut career);
            view.is_former = is_former(&career);
            view.career = career;

            view.projects = resolve_projects(
                pipeline_index.get(&record.expert_id).map(Vec::as_slice),
                published_index.get(&record.expert_id).map(Vec::as_slice),
                &project_index,
            );

            view
        })
        .collect();

    debug!(views = views.len(), "aggregation complete");
    views
}

/// Order career entries: current positions first, then most recent start date first.
///
/// The sort is stable, so entries with equal keys keep their source order.
pub fn sort_career(entries: &mut [CareerEntry]) {
    entries.sort_by(|a, b| {
        b.is_current()
            .cmp(&a.is_current())
            .then_with(|| b.start_date.cmp(&a.start_date))
    });
}

/// An expert is former when they have positions and none of them is current.
pub fn is_former(career: &[CareerEntry]) -> bool {
    !career.is_empty() && career.iter().all(|entry| !entry.is_current())
}

// ---------------------------------------------------------------------------
// Indexes
// ---------------------------------------------------------------------------

fn index_careers(careers: &[CareerRecord]) -> HashMap<ExpertId, Vec<CareerEntry>> {
    let mut index: HashMap<ExpertId, Vec<CareerEntry>> = HashMap::new();
    let mut skipped = 0usize;

    for record in careers {
        match parse_career(record) {
            Ok((expert_id, entry)) => index.entry(expert_id).or_default().push(entry),
            Err(e) => {
                skipped += 1;
                debug!(error = %e, "skipping career record");
            }
        }
    }

    if skipped > 0 {
        warn!(skipped, "career records dropped during aggregation");
    }
    index
}

fn index_memberships(
    resource: Resource,
    memberships: &[MembershipRecord],
) -> HashMap<ExpertId, Vec<ProjectId>> {
    let mut index: HashMap<ExpertId, Vec<ProjectId>> = HashMap::new();
    let mut skipped = 0usize;

    for membership in memberships {
        match (membership.expert_id, membership.project_id) {
            (Some(expert_id), Some(project_id)) => {
                index.entry(expert_id).or_default().push(project_id)
            }
            _ => {
                skipped += 1;
                let e = ExpertDeskError::invalid_input(resource, "membership without both keys");
                debug!(error = %e, ?membership, "skipping membership record");
            }
        }
    }

    if skipped > 0 {
        warn!(%resource, skipped, "membership records dropped during aggregation");
    }
    index
}

/// Convert a raw career row into its owner and a parsed entry.
fn parse_career(record: &CareerRecord) -> Result<(ExpertId, CareerEntry)> {
    let expert_id = record
        .expert_id
        .ok_or_else(|| ExpertDeskError::invalid_input(Resource::Careers, "missing expert_id"))?;

    let start = record
        .start_date
        .as_deref()
        .ok_or_else(|| ExpertDeskError::invalid_input(Resource::Careers, "missing start_date"))?;
    let start_date = parse_date(start)?;

    let end_date = match record.end_date.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(end) if end.eq_ignore_ascii_case("present") => None,
        Some(end) => Some(parse_date(end)?),
    };

    Ok((
        expert_id,
        CareerEntry::new(&record.title, &record.company_name, start_date, end_date),
    ))
}

/// Parse an experience date in any shape the backend accepts.
///
/// The experiences serializer emits `MM-YYYY` and takes `DD-MM-YYYY`,
/// `YYYY-MM` and `YYYY-MM-DD` on input. Month-only dates land on day 1.
fn parse_date(raw: &str) -> Result<NaiveDate> {
    let parts: Vec<&str> = raw.trim().split('-').collect();
    let parsed = match parts.as_slice() {
        [year, month, day] if year.len() == 4 => ymd(year, month, day),
        [year, month] if year.len() == 4 => ymd(year, month, "1"),
        [day, month, year] if year.len() == 4 => ymd(year, month, day),
        [month, year] if year.len() == 4 => ymd(year, month, "1"),
        _ => None,
    };

    parsed.ok_or_else(|| {
        ExpertDeskError::invalid_input(Resource::Careers, format!("bad date '{raw}'"))
    })
}

fn ymd(year: &str, month: &str, day: &str) -> Option<NaiveDate> {
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    if !(digits(year) && digits(month) && digits(day)) {
        return None;
    }
    NaiveDate::from_ymd_opt(year.parse().ok()?, month.parse().ok()?, day.parse().ok()?)
}

/// Resolve pipeline then published project ids, dropping unknown projects and duplicates.
fn resolve_projects(
    pipeline: Option<&[ProjectId]>,
    published: Option<&[ProjectId]>,
    project_index: &HashMap<ProjectId, &ProjectRecord>,
) -> Vec<ProjectRecord> {
    let mut seen = HashSet::new();

    pipeline
        .unwrap_or_default()
        .iter()
        .chain(published.unwrap_or_default())
        .filter_map(|id| match project_index.get(id) {
            Some(project) => Some(*project),
            None => {
                debug!(project_id = %id, "membership references unknown project");
                None
            }
        })
        .filter(|project| seen.insert(project.id))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn expert(id: i64, name: &str, email: &str) -> ExpertRecord {
        ExpertRecord {
            expert_id: ExpertId(id),
            full_name: name.into(),
            industry: "Energy".into(),
            country_of_residence: "Indonesia".into(),
            expert_cost: 100,
            email: email.into(),
            phone: None,
            linkedin: None,
            notes: None,
        }
    }

    fn career(id: i64, title: &str, start: &str, end: Option<&str>) -> CareerRecord {
        CareerRecord {
            expert_id: Some(ExpertId(id)),
            title: title.into(),
            company_name: format!("{title} Co"),
            start_date: Some(start.into()),
            end_date: end.map(String::from),
        }
    }

    fn member(expert: i64, project: i64) -> MembershipRecord {
        MembershipRecord {
            expert_id: Some(ExpertId(expert)),
            project_id: Some(ProjectId(project)),
        }
    }

    fn project(id: i64, name: &str) -> ProjectRecord {
        ProjectRecord {
            id: ProjectId(id),
            name: name.into(),
        }
    }

    #[test]
    fn one_view_per_expert_in_input_order() {
        let experts = vec![
            expert(3, "Carol", "c@x.com"),
            expert(1, "Alice", "a@x.com"),
            expert(2, "Bob", "b@x.com"),
        ];
        let careers = vec![career(2, "CFO", "2018-01-01", None)];

        let views = aggregate(&experts, &careers, &[], &[], &[]);

        let ids: Vec<i64> = views.iter().map(|v| v.id.0).collect();
        assert_eq!(ids, vec![3, 1, 2]);
    }

    #[test]
    fn expert_without_related_rows_gets_defaults() {
        let views = aggregate(&[expert(1, "Alice", "a@x.com")], &[], &[], &[], &[]);

        assert_eq!(views.len(), 1);
        assert!(views[0].career.is_empty());
        assert!(views[0].projects.is_empty());
        assert!(!views[0].is_former);
        assert_eq!(views[0].completed_calls, None);
    }

    #[test]
    fn career_current_first_then_most_recent_start() {
        let careers = vec![
            career(1, "Analyst", "2015-01-01", Some("2020-01-01")),
            career(1, "CEO", "2021-07-01", None),
            career(1, "Director", "2020-02-01", Some("2021-06-01")),
        ];

        let views = aggregate(&[expert(1, "Alice", "a@x.com")], &careers, &[], &[], &[]);

        let titles: Vec<&str> = views[0].career.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["CEO", "Director", "Analyst"]);
        assert_eq!(views[0].career[0].date_range, "07-2021 - Present");
    }

    #[test]
    fn equal_start_dates_keep_source_order() {
        let careers = vec![
            career(1, "Advisor", "2018-01-01", Some("2019-01-01")),
            career(1, "Board Member", "2018-01-01", Some("2020-01-01")),
            career(1, "Consultant", "2018-01-01", Some("2018-06-01")),
        ];

        let views = aggregate(&[expert(1, "Alice", "a@x.com")], &careers, &[], &[], &[]);

        let titles: Vec<&str> = views[0].career.iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Advisor", "Board Member", "Consultant"]);
    }

    #[test]
    fn is_former_derivation() {
        let experts = vec![
            expert(1, "NoCareer", "n@x.com"),
            expert(2, "Current", "c@x.com"),
            expert(3, "Former", "f@x.com"),
        ];
        let careers = vec![
            career(2, "CTO", "2022-01-01", None),
            career(2, "Engineer", "2015-01-01", Some("2021-12-01")),
            career(3, "Manager", "2010-01-01", Some("2015-01-01")),
            career(3, "Lead", "2015-02-01", Some("2019-01-01")),
        ];

        let views = aggregate(&experts, &careers, &[], &[], &[]);

        assert!(!views[0].is_former);
        assert!(!views[1].is_former);
        assert!(views[2].is_former);
    }

    #[test]
    fn projects_are_pipeline_first_and_unique() {
        let projects = vec![project(10, "A"), project(11, "B")];
        let pipeline = vec![member(1, 10)];
        let published = vec![member(1, 10), member(1, 11)];

        let views = aggregate(
            &[expert(1, "Alice", "a@x.com")],
            &[],
            &projects,
            &pipeline,
            &published,
        );

        let names: Vec<&str> = views[0].projects.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn unknown_projects_and_experts_are_ignored() {
        let projects = vec![project(10, "A")];
        let pipeline = vec![member(1, 404), member(99, 10)];
        let published = vec![
            MembershipRecord {
                expert_id: None,
                project_id: Some(ProjectId(10)),
            },
            MembershipRecord {
                expert_id: Some(ExpertId(1)),
                project_id: None,
            },
            member(1, 10),
        ];

        let views = aggregate(
            &[expert(1, "Alice", "a@x.com")],
            &[],
            &projects,
            &pipeline,
            &published,
        );

        assert_eq!(views.len(), 1);
        assert_eq!(views[0].projects, vec![project(10, "A")]);
    }

    #[test]
    fn malformed_career_rows_are_skipped() {
        let careers = vec![
            CareerRecord {
                expert_id: None,
                ..career(1, "Orphan", "2010-01-01", None)
            },
            career(1, "Bad Date", "01/02/2010", None),
            CareerRecord {
                start_date: None,
                ..career(1, "No Start", "2010-01-01", None)
            },
            career(1, "Analyst", "2012-01-01", Some("2014-01-01")),
        ];

        let views = aggregate(&[expert(1, "Alice", "a@x.com")], &careers, &[], &[], &[]);

        assert_eq!(views[0].career.len(), 1);
        assert_eq!(views[0].career[0].title, "Analyst");
        // Only the surviving, ended position counts.
        assert!(views[0].is_former);
    }

    #[test]
    fn present_end_date_means_current() {
        let careers = vec![career(1, "Founder", "2020-01-01", Some("Present"))];

        let views = aggregate(&[expert(1, "Alice", "a@x.com")], &careers, &[], &[], &[]);

        assert!(views[0].career[0].is_current());
        assert!(!views[0].is_former);
    }

    #[test]
    fn single_expert_scenario() {
        let experts = vec![expert(1, "Alice", "a@x.com")];
        let careers = vec![CareerRecord {
            company_name: "Acme".into(),
            ..career(1, "CEO", "2019-01-01", None)
        }];
        let projects = vec![project(10, "P1")];
        let published = vec![member(1, 10)];

        let views = aggregate(&experts, &careers, &projects, &[], &published);

        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert!(!view.is_former);
        assert_eq!(view.career.len(), 1);
        assert_eq!(view.career[0].title, "CEO");
        assert_eq!(view.career[0].company_name, "Acme");
        assert_eq!(view.career[0].end_date, None);
        assert_eq!(view.projects, vec![project(10, "P1")]);
    }

    #[test]
    fn aggregation_is_deterministic() {
        let snapshot = RawSnapshot {
            experts: vec![expert(1, "Alice", "a@x.com"), expert(2, "Bob", "b@x.com")],
            careers: vec![
                career(1, "A", "2018-01-01", Some("2019-01-01")),
                career(1, "B", "2018-01-01", Some("2019-01-01")),
                career(2, "C", "2020-01-01", None),
            ],
            projects: vec![project(10, "P")],
            pipeline: vec![member(2, 10)],
            published: vec![member(1, 10)],
        };

        assert_eq!(aggregate_snapshot(&snapshot), aggregate_snapshot(&snapshot));
    }

    #[test]
    fn backend_month_year_dates_are_joined() {
        let rows: Vec<CareerRecord> = serde_json::from_str(
            r#"[
                {"experience_id": 1, "expert_id": 1, "company_name": "Pertamina",
                 "title": "VP Operations", "start_date": "01-2015", "end_date": "06-2020"},
                {"experience_id": 2, "expert_id": 1, "company_name": "Acme Energy",
                 "title": "CEO", "start_date": "07-2020", "end_date": null}
            ]"#,
        )
        .expect("deserialize");

        let views = aggregate(&[expert(1, "Alice", "a@x.com")], &rows, &[], &[], &[]);

        let career = &views[0].career;
        assert_eq!(career.len(), 2);
        assert_eq!(career[0].title, "CEO");
        assert_eq!(career[0].date_range, "07-2020 - Present");
        assert_eq!(career[1].date_range, "01-2015 - 06-2020");
        assert!(!views[0].is_former);
    }

    #[test]
    fn accepts_every_backend_date_shape() {
        let jan_2015 = NaiveDate::from_ymd_opt(2015, 1, 1);
        assert_eq!(parse_date("01-2015").ok(), jan_2015);
        assert_eq!(parse_date("2015-01").ok(), jan_2015);
        assert_eq!(parse_date("2015-01-01").ok(), jan_2015);
        assert_eq!(parse_date(" 01-01-2015 ").ok(), jan_2015);
        assert_eq!(
            parse_date("15-03-2018").ok(),
            NaiveDate::from_ymd_opt(2018, 3, 15)
        );

        assert!(parse_date("13-2015").is_err());
        assert!(parse_date("01/2015").is_err());
        assert!(parse_date("+1-2015").is_err());
    }

    #[test]
    fn month_year_end_dates_make_an_expert_former() {
        let careers = vec![
            career(1, "Manager", "03-2010", Some("02-2015")),
            career(1, "Lead", "03-2015", Some("12-2019")),
        ];

        let views = aggregate(&[expert(1, "Alice", "a@x.com")], &careers, &[], &[], &[]);

        assert_eq!(views[0].career.len(), 2);
        assert_eq!(views[0].career[0].title, "Lead");
        assert!(views[0].is_former);
    }
}

pub mod html;

use std::collections::HashMap;

use chrono::{Duration, NaiveDate};

use crate::hubstaff::{Activity, ProjectId, User, UserId};

/// Half open date interval `[date_from, date_to)` the report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportWindow {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

impl ReportWindow {
    pub fn for_day(date: NaiveDate) -> Self {
        Self {
            date_from: date,
            date_to: date + Duration::days(1),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSummary {
    pub id: UserId,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectSummary {
    pub id: ProjectId,
    pub name: String,
}

/// Tracked time of every user on every project. Users and projects keep the order they were first
/// seen in, which is also the column and row order of the rendered table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportData {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub users: Vec<UserSummary>,
    pub projects: Vec<ProjectSummary>,
    /// Only pairs with at least one activity are present.
    pub spent_time: HashMap<(UserId, ProjectId), u64>,
}

impl ReportData {
    /// Seconds `user` spent on `project`, zero when nothing was tracked.
    pub fn spent(&self, user: UserId, project: ProjectId) -> u64 {
        self.spent_time
            .get(&(user, project))
            .copied()
            .unwrap_or_default()
    }
}

/// Reshapes users (with their nested projects) and a flat activity list into [ReportData].
pub fn aggregate(
    users: &[User],
    activities: &[Activity],
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> ReportData {
    let mut user_summaries = Vec::<UserSummary>::new();
    let mut user_positions = HashMap::<UserId, usize>::new();
    let mut project_summaries = Vec::<ProjectSummary>::new();
    let mut project_positions = HashMap::<ProjectId, usize>::new();

    for user in users {
        upsert(
            &mut user_summaries,
            &mut user_positions,
            user.id,
            UserSummary {
                id: user.id,
                name: user.name.clone(),
            },
        );
        // the same project is listed under every member, later copies replace earlier ones
        for project in &user.projects {
            upsert(
                &mut project_summaries,
                &mut project_positions,
                project.id,
                ProjectSummary {
                    id: project.id,
                    name: project.name.clone(),
                },
            );
        }
    }

    let mut spent_time = HashMap::<(UserId, ProjectId), u64>::new();
    for activity in activities {
        let spent = spent_time
            .entry((activity.user_id, activity.project_id))
            .or_default();
        *spent = spent.saturating_add(activity.tracked);
    }

    ReportData {
        date_from,
        date_to,
        users: user_summaries,
        projects: project_summaries,
        spent_time,
    }
}

/// Inserts `value` keeping the position of the first occurrence of `id`.
fn upsert<T>(values: &mut Vec<T>, positions: &mut HashMap<u64, usize>, id: u64, value: T) {
    match positions.get(&id) {
        Some(&position) => values[position] = value,
        None => {
            positions.insert(id, values.len());
            values.push(value);
        }
    }
}

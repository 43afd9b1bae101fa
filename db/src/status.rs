use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::{enums::MilestoneStatus, milestones::Milestone, todos::Todo};

/// Display status for todos and milestones, derived from the stored row
/// and the current calendar day. Never written back to the database.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DerivedStatus {
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "in_progress")]
    InProgress,
    #[serde(rename = "due-today")]
    DueToday,
    #[serde(rename = "overdue")]
    Overdue,
    #[serde(rename = "completed")]
    Completed,
}

/// Anything with a date that drives scheduling views.
pub trait Scheduled {
    fn relevant_date(&self) -> Option<NaiveDate>;
}

impl Scheduled for Todo {
    fn relevant_date(&self) -> Option<NaiveDate> {
        self.due_date
    }
}

impl Scheduled for Milestone {
    fn relevant_date(&self) -> Option<NaiveDate> {
        Some(self.due_date)
    }
}

/// Day-granularity comparison against the due date. Time of day on either
/// side is ignored.
fn date_status(due_date: Option<NaiveDate>, today: NaiveDate) -> DerivedStatus {
    match due_date {
        Some(due) if due < today => DerivedStatus::Overdue,
        Some(due) if due == today => DerivedStatus::DueToday,
        _ => DerivedStatus::Pending,
    }
}

pub fn todo_status(todo: &Todo, today: NaiveDate) -> DerivedStatus {
    if todo.completed {
        DerivedStatus::Completed
    } else {
        date_status(todo.due_date, today)
    }
}

/// The stored status wins for completed and in-progress milestones. Any
/// other stored value falls through to the date comparison, so a pending
/// milestone whose due date has passed displays as overdue without the
/// stored field changing.
pub fn milestone_status(milestone: &Milestone, today: NaiveDate) -> DerivedStatus {
    match milestone.status {
        MilestoneStatus::Completed => DerivedStatus::Completed,
        MilestoneStatus::InProgress => DerivedStatus::InProgress,
        _ => date_status(Some(milestone.due_date), today),
    }
}

/// Items dated strictly after today and no more than `days` days out,
/// ascending by date. Undated items never qualify.
pub fn upcoming_within_days<T: Scheduled>(items: &[T], today: NaiveDate, days: i64) -> Vec<&T> {
    let end = today + Duration::days(days);

    let mut upcoming = items
        .iter()
        .filter(|item| match item.relevant_date() {
            Some(date) => date > today && date <= end,
            None => false,
        })
        .collect::<Vec<_>>();
    upcoming.sort_by_key(|item| item.relevant_date());
    upcoming
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::object_id::{MilestoneId, ProjectId, TodoId, UserId};

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    fn todo(completed: bool, due_date: Option<NaiveDate>) -> Todo {
        Todo {
            todo_id: TodoId::new(),
            project_id: ProjectId::new(),
            title: "write report".to_string(),
            description: String::new(),
            completed,
            due_date,
            created_by: UserId::new(),
            updated: Utc::now(),
            created: Utc::now(),
        }
    }

    fn milestone(status: MilestoneStatus, due_date: NaiveDate) -> Milestone {
        Milestone {
            milestone_id: MilestoneId::new(),
            project_id: ProjectId::new(),
            title: "first draft".to_string(),
            description: String::new(),
            status,
            due_date,
            target_date: None,
            actual_completion_date: None,
            order_number: 0,
            created_by: UserId::new(),
            updated: Utc::now(),
            created: Utc::now(),
        }
    }

    #[test]
    fn completed_todo_is_completed_regardless_of_date() {
        let today = day("2024-03-15");
        let t = todo(true, Some(day("2024-01-01")));
        assert_eq!(todo_status(&t, today), DerivedStatus::Completed);
    }

    #[test]
    fn todo_past_due_is_overdue() {
        let today = day("2024-03-15");
        let t = todo(false, Some(day("2024-03-14")));
        assert_eq!(todo_status(&t, today), DerivedStatus::Overdue);
    }

    #[test]
    fn todo_due_today_is_due_today() {
        let today = day("2024-03-15");
        let t = todo(false, Some(today));
        assert_eq!(todo_status(&t, today), DerivedStatus::DueToday);
    }

    #[test]
    fn todo_due_later_or_undated_is_pending() {
        let today = day("2024-03-15");
        assert_eq!(
            todo_status(&todo(false, Some(day("2024-03-16"))), today),
            DerivedStatus::Pending
        );
        assert_eq!(todo_status(&todo(false, None), today), DerivedStatus::Pending);
    }

    #[test]
    fn stored_milestone_status_wins_when_completed_or_in_progress() {
        let today = day("2024-03-15");
        let overdue_day = day("2024-03-01");
        assert_eq!(
            milestone_status(&milestone(MilestoneStatus::Completed, overdue_day), today),
            DerivedStatus::Completed
        );
        assert_eq!(
            milestone_status(&milestone(MilestoneStatus::InProgress, overdue_day), today),
            DerivedStatus::InProgress
        );
    }

    #[test]
    fn pending_milestone_past_due_displays_overdue() {
        let today = day("2024-03-15");
        let m = milestone(MilestoneStatus::Pending, day("2024-03-14"));
        assert_eq!(milestone_status(&m, today), DerivedStatus::Overdue);
        assert_eq!(m.status, MilestoneStatus::Pending, "stored status untouched");
    }

    #[test]
    fn pending_milestone_due_today_or_later() {
        let today = day("2024-03-15");
        assert_eq!(
            milestone_status(&milestone(MilestoneStatus::Pending, today), today),
            DerivedStatus::DueToday
        );
        assert_eq!(
            milestone_status(&milestone(MilestoneStatus::Pending, day("2024-04-01")), today),
            DerivedStatus::Pending
        );
    }

    #[test]
    fn statuses_serialize_to_their_wire_names() {
        assert_eq!(
            serde_json::to_string(&DerivedStatus::DueToday).unwrap(),
            "\"due-today\""
        );
        assert_eq!(
            serde_json::to_string(&DerivedStatus::InProgress).unwrap(),
            "\"in_progress\""
        );
    }

    #[test]
    fn upcoming_excludes_today_and_past_and_undated() {
        let today = day("2024-03-15");
        let items = vec![
            todo(false, Some(day("2024-03-14"))),
            todo(false, Some(today)),
            todo(false, None),
            todo(false, Some(day("2024-03-16"))),
        ];

        let upcoming = upcoming_within_days(&items, today, 14);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].due_date, Some(day("2024-03-16")));
    }

    #[test]
    fn upcoming_window_is_inclusive_at_the_far_edge() {
        let today = day("2024-03-15");
        let items = vec![
            todo(false, Some(day("2024-03-29"))),
            todo(false, Some(day("2024-03-30"))),
        ];

        let upcoming = upcoming_within_days(&items, today, 14);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].due_date, Some(day("2024-03-29")));
    }

    #[test]
    fn upcoming_sorts_ascending_by_date() {
        let today = day("2024-03-15");
        let items = vec![
            todo(false, Some(day("2024-03-20"))),
            todo(false, Some(day("2024-03-17"))),
            todo(false, Some(day("2024-03-19"))),
        ];

        let upcoming = upcoming_within_days(&items, today, 14);
        let dates = upcoming
            .iter()
            .filter_map(|t| t.due_date)
            .collect::<Vec<_>>();
        assert_eq!(
            dates,
            vec![day("2024-03-17"), day("2024-03-19"), day("2024-03-20")]
        );
    }
}

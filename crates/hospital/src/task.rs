use chrono::{Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use medward_core::{DepartmentId, DomainError, DomainResult, Entity, FieldErrors, MedicationId, TaskId};

/// One scheduled administration of one unit of a medication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub patient: String,
    pub medication_id: MedicationId,
    pub date_time_of_issue: NaiveDateTime,
    pub department_id: DepartmentId,
}

impl Task {
    /// A task still in the future gets its unit back when deleted; a due task
    /// counts as consumed.
    pub fn is_refundable_at(&self, now: NaiveDateTime) -> bool {
        self.date_time_of_issue > now
    }

    pub fn is_scheduled_on(&self, day: NaiveDate) -> bool {
        self.date_time_of_issue.date() == day
    }
}

impl Entity for Task {
    type Id = TaskId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Longest course a single batch may schedule.
pub const MAX_DAYS: u32 = 366;

/// Most administrations a single batch may schedule per day.
pub const MAX_TIMES_PER_DAY: usize = 48;

/// A request to schedule `amount_of_days * times_of_issuing.len()` tasks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTaskBatch {
    pub patient: String,
    pub medication_id: MedicationId,
    pub department_id: DepartmentId,
    pub start_day: NaiveDate,
    pub times_of_issuing: Vec<NaiveTime>,
    pub amount_of_days: u32,
}

impl NewTaskBatch {
    /// Shape checks that need no clock or store.
    pub fn validate(&self) -> DomainResult<()> {
        let mut errors = FieldErrors::new();
        if self.patient.trim().is_empty() {
            errors.add("patient", "must not be blank");
        }
        if self.amount_of_days < 1 {
            errors.add("amount_of_days", "must be at least 1");
        } else if self.amount_of_days > MAX_DAYS {
            errors.add("amount_of_days", format!("must be at most {MAX_DAYS}"));
        }
        if self.times_of_issuing.is_empty() {
            errors.add("time_of_issuing", "must not be empty");
        } else if self.times_of_issuing.len() > MAX_TIMES_PER_DAY {
            errors.add(
                "time_of_issuing",
                format!("must have at most {MAX_TIMES_PER_DAY} entries"),
            );
        }
        errors.into_result()
    }

    /// Batches are checked against their start day only, never per occurrence.
    pub fn ensure_not_outdated(&self, today: NaiveDate) -> DomainResult<()> {
        if self.start_day < today {
            return Err(DomainError::TaskOutdated);
        }
        Ok(())
    }

    /// Units reserved for the whole batch.
    pub fn total_units(&self) -> i64 {
        i64::from(self.amount_of_days) * self.times_of_issuing.len() as i64
    }

    /// Expand into tasks, day-major: every time of day for day 0, then day 1, ...
    pub fn plan(&self) -> DomainResult<Vec<Task>> {
        self.validate()?;
        let last_offset = u64::from(self.amount_of_days - 1);
        if self.start_day.checked_add_days(Days::new(last_offset)).is_none() {
            return Err(DomainError::validation("amount_of_days", "date out of range"));
        }

        let capacity = (self.amount_of_days as usize)
            .checked_mul(self.times_of_issuing.len())
            .ok_or_else(|| DomainError::validation("amount_of_days", "too many tasks"))?;
        let mut tasks = Vec::with_capacity(capacity);
        for offset in 0..self.amount_of_days {
            let day = self
                .start_day
                .checked_add_days(Days::new(u64::from(offset)))
                .ok_or_else(|| DomainError::validation("amount_of_days", "date out of range"))?;
            for time in &self.times_of_issuing {
                tasks.push(Task {
                    id: TaskId::new(),
                    patient: self.patient.trim().to_string(),
                    medication_id: self.medication_id,
                    date_time_of_issue: day.and_time(*time),
                    department_id: self.department_id,
                });
            }
        }
        Ok(tasks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn time(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn batch(days: u32, times: Vec<NaiveTime>) -> NewTaskBatch {
        NewTaskBatch {
            patient: "patient-7".into(),
            medication_id: MedicationId::new(1),
            department_id: DepartmentId::new(2),
            start_day: date(2026, 3, 30),
            times_of_issuing: times,
            amount_of_days: days,
        }
    }

    #[test]
    fn plan_is_day_major_and_crosses_month_boundary() {
        let b = batch(3, vec![time(9, 0), time(21, 0)]);
        let tasks = b.plan().unwrap();
        assert_eq!(b.total_units(), 6);
        assert_eq!(tasks.len(), 6);

        let stamps: Vec<NaiveDateTime> = tasks.iter().map(|t| t.date_time_of_issue).collect();
        assert_eq!(stamps[0], date(2026, 3, 30).and_time(time(9, 0)));
        assert_eq!(stamps[1], date(2026, 3, 30).and_time(time(21, 0)));
        assert_eq!(stamps[4], date(2026, 4, 1).and_time(time(9, 0)));
        assert!(tasks.iter().all(|t| t.department_id == DepartmentId::new(2)));
    }

    #[test]
    fn outdated_is_judged_by_start_day() {
        let b = batch(1, vec![time(0, 0)]);
        assert!(b.ensure_not_outdated(date(2026, 3, 30)).is_ok());
        assert!(b.ensure_not_outdated(date(2026, 3, 29)).is_ok());
        assert_eq!(
            b.ensure_not_outdated(date(2026, 3, 31)),
            Err(DomainError::TaskOutdated)
        );
    }

    #[test]
    fn validate_reports_each_field() {
        let mut b = batch(0, vec![]);
        b.patient = "  ".into();
        let Err(DomainError::Validation(fields)) = b.validate() else {
            panic!("expected validation error");
        };
        assert!(fields.get("patient").is_some());
        assert!(fields.get("amount_of_days").is_some());
        assert!(fields.get("time_of_issuing").is_some());
    }

    #[test]
    fn oversized_batches_are_rejected_before_planning() {
        let b = batch(u32::MAX, (0..24).map(|h| time(h, 0)).collect());
        let Err(DomainError::Validation(fields)) = b.plan() else {
            panic!("expected validation error");
        };
        assert!(fields.get("amount_of_days").is_some());

        let b = batch(1, vec![time(9, 0); MAX_TIMES_PER_DAY + 1]);
        let Err(DomainError::Validation(fields)) = b.validate() else {
            panic!("expected validation error");
        };
        assert!(fields.get("time_of_issuing").is_some());

        assert!(batch(MAX_DAYS, vec![time(9, 0)]).plan().is_ok());
    }

    #[test]
    fn batch_running_past_the_calendar_is_rejected() {
        let mut b = batch(2, vec![time(9, 0)]);
        b.start_day = NaiveDate::MAX;
        assert!(matches!(b.plan(), Err(DomainError::Validation(_))));
    }

    #[test]
    fn refund_only_before_due_instant() {
        let task = &batch(1, vec![time(9, 0)]).plan().unwrap()[0];
        let due = task.date_time_of_issue;
        assert!(task.is_refundable_at(due - chrono::Duration::minutes(1)));
        assert!(!task.is_refundable_at(due));
        assert!(task.is_scheduled_on(due.date()));
    }

    proptest! {
        #[test]
        fn plan_produces_total_units_distinct_tasks(days in 1u32..30, n in 1usize..6) {
            let times: Vec<NaiveTime> = (0..n).map(|i| time(i as u32 * 3, 0)).collect();
            let b = batch(days, times);
            let tasks = b.plan().unwrap();
            prop_assert_eq!(tasks.len() as i64, b.total_units());

            let mut ids: Vec<TaskId> = tasks.iter().map(|t| t.id).collect();
            ids.sort_by_key(|id| *id.as_uuid());
            ids.dedup();
            prop_assert_eq!(ids.len(), tasks.len());
        }
    }
}

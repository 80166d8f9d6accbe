//! Start/end window carried by timed tasks.

use super::TaskDomainError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Scheduled window of a timed task.
///
/// The start date never falls after the end date. Date changes are also
/// checked against the current instant so neither bound moves into the past.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskSchedule {
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
}

impl TaskSchedule {
    /// Creates a schedule spanning `start_date` to `end_date`.
    ///
    /// Only the ordering of the two dates is checked here; the "not in the
    /// past" rule applies to later changes.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::StartAfterEnd`] when `start_date` is after
    /// `end_date`.
    pub fn new(
        start_date: DateTime<Utc>,
        end_date: DateTime<Utc>,
    ) -> Result<Self, TaskDomainError> {
        if start_date > end_date {
            return Err(TaskDomainError::StartAfterEnd {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Returns the start of the window.
    #[must_use]
    pub const fn start_date(&self) -> DateTime<Utc> {
        self.start_date
    }

    /// Returns the end of the window.
    #[must_use]
    pub const fn end_date(&self) -> DateTime<Utc> {
        self.end_date
    }

    /// Moves the start of the window.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::StartAfterEnd`] when the new start falls
    /// after the end date, or [`TaskDomainError::StartBeforeNow`] when it is
    /// earlier than `now`.
    pub fn change_start_date(
        &mut self,
        new_start: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if new_start > self.end_date {
            return Err(TaskDomainError::StartAfterEnd {
                start: new_start,
                end: self.end_date,
            });
        }
        if new_start < now {
            return Err(TaskDomainError::StartBeforeNow(new_start));
        }
        self.start_date = new_start;
        Ok(())
    }

    /// Moves the end of the window.
    ///
    /// # Errors
    ///
    /// Returns [`TaskDomainError::EndBeforeStart`] when the new end falls
    /// before the start date, or [`TaskDomainError::EndBeforeNow`] when it is
    /// earlier than `now`.
    pub fn change_end_date(
        &mut self,
        new_end: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Result<(), TaskDomainError> {
        if new_end < self.start_date {
            return Err(TaskDomainError::EndBeforeStart {
                start: self.start_date,
                end: new_end,
            });
        }
        if new_end < now {
            return Err(TaskDomainError::EndBeforeNow(new_end));
        }
        self.end_date = new_end;
        Ok(())
    }
}

use chrono::{NaiveDate, NaiveTime, Weekday};
use serde_json::{json, Value};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Start date {start} is after end date {end}")]
    DateRange { start: NaiveDate, end: NaiveDate },

    #[error("Select at least one day of the week")]
    NoDays,

    #[error("Start time must be before end time")]
    TimeRange,

    #[error("Slot duration must be greater than zero")]
    ZeroDuration,

    #[error("A {minutes}-minute slot does not fit between the start and end time")]
    SlotTooLong { minutes: u32 },

    #[error("A doctor must be selected")]
    MissingDoctor,
}

/// Parameters for bulk slot creation.
///
/// The backend expands the range into individual slots; the client only
/// checks that the parameters make sense.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotGeneration {
    pub doctor_id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub days: Vec<Weekday>,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub slot_minutes: u32,
}

impl SlotGeneration {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.doctor_id.trim().is_empty() {
            return Err(ValidationError::MissingDoctor);
        }
        if self.start_date > self.end_date {
            return Err(ValidationError::DateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        if self.days.is_empty() {
            return Err(ValidationError::NoDays);
        }
        if self.start_time >= self.end_time {
            return Err(ValidationError::TimeRange);
        }
        if self.slot_minutes == 0 {
            return Err(ValidationError::ZeroDuration);
        }
        let window = (self.end_time - self.start_time).num_minutes();
        if i64::from(self.slot_minutes) > window {
            return Err(ValidationError::SlotTooLong {
                minutes: self.slot_minutes,
            });
        }
        Ok(())
    }

    /// Request body in the backend's wire format.
    pub fn to_payload(&self) -> Value {
        let mut days: Vec<Weekday> = self.days.clone();
        days.sort_by_key(Weekday::num_days_from_monday);
        days.dedup();

        json!({
            "doctorId": self.doctor_id,
            "startDate": self.start_date.format("%Y-%m-%d").to_string(),
            "endDate": self.end_date.format("%Y-%m-%d").to_string(),
            "days": days.iter().map(|d| weekday_code(*d)).collect::<Vec<_>>(),
            "startTime": self.start_time.format("%H:%M").to_string(),
            "endTime": self.end_time.format("%H:%M").to_string(),
            "duration": self.slot_minutes,
        })
    }
}

fn weekday_code(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// Parse a day list such as `mon,wed,fri` or `Monday, Friday`.
pub fn parse_days(input: &str) -> Result<Vec<Weekday>, String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<Weekday>().map_err(|_| format!("unknown day: {}", s)))
        .collect()
}

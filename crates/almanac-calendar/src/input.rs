//! Raw form input → checked event fields.

use almanac_core::{portable::DATE_FORMAT, Category};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

use crate::error::ValidationError;

/// Event fields exactly as the user typed them.
#[derive(Debug, Clone, Default)]
pub struct EventDraft {
    pub text: String,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
    /// Minutes before the event; `"0"` disables the reminder.
    pub lead_minutes: String,
    /// Blank means `General`.
    pub category: String,
}

/// Fields that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidEvent {
    pub text: String,
    pub datetime: NaiveDateTime,
    pub lead_minutes: u32,
    pub category: Category,
}

impl EventDraft {
    pub fn validate(
        &self,
        now: NaiveDateTime,
        categories: &[Category],
    ) -> Result<ValidEvent, ValidationError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(ValidationError::EmptyText);
        }

        let date = parse_date(&self.date)?;
        let time = NaiveTime::parse_from_str(self.time.trim(), "%H:%M")
            .map_err(|_| ValidationError::InvalidTime(self.time.clone()))?;
        let datetime = date.and_time(time);

        let lead_minutes = parse_lead(&self.lead_minutes)?;

        let category = Category::from(self.category.as_str());
        if !categories.is_empty() && !categories.contains(&category) {
            return Err(ValidationError::UnknownCategory(category.to_string()));
        }

        if datetime < now {
            return Err(ValidationError::InPast { at: datetime });
        }

        Ok(ValidEvent {
            text: text.to_string(),
            datetime,
            lead_minutes,
            category,
        })
    }
}

pub fn parse_date(raw: &str) -> Result<NaiveDate, ValidationError> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT)
        .map_err(|_| ValidationError::InvalidDate(raw.to_string()))
}

fn parse_lead(raw: &str) -> Result<u32, ValidationError> {
    let minutes: i64 = raw
        .trim()
        .parse()
        .map_err(|_| ValidationError::InvalidLead(raw.to_string()))?;
    if minutes < 0 {
        return Err(ValidationError::NegativeLead(minutes));
    }
    u32::try_from(minutes).map_err(|_| ValidationError::InvalidLead(raw.to_string()))
}

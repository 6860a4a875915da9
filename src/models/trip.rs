use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DefaultOnNull, DisplayFromStr, PickFirst};
use thiserror::Error;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// A single planned trip as it is persisted under `trips_<email>`.
///
/// Older lists may carry the budget as a numeric string or as `null`; both are
/// accepted on decode and normalised to a plain number.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripRecord {
    pub id: i64,
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde_as(as = "DefaultOnNull<PickFirst<(_, DisplayFromStr)>>")]
    #[serde(default)]
    pub budget: f64,
    #[serde(default)]
    pub notes: String,
}

impl TripRecord {
    pub fn notes_display(&self) -> &str {
        if self.notes.is_empty() {
            "—"
        } else {
            &self.notes
        }
    }

    fn to_draft(&self) -> TripDraft {
        TripDraft {
            destination: self.destination.clone(),
            start_date: self.start_date.format(DATE_FORMAT).to_string(),
            end_date: self.end_date.format(DATE_FORMAT).to_string(),
            budget: self.budget.to_string(),
            notes: self.notes.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripField {
    Destination,
    StartDate,
    EndDate,
    Budget,
}

impl TripField {
    pub fn as_str(&self) -> &'static str {
        match self {
            TripField::Destination => "destination",
            TripField::StartDate => "startDate",
            TripField::EndDate => "endDate",
            TripField::Budget => "budget",
        }
    }
}

impl fmt::Display for TripField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("destination must not be empty")]
    EmptyDestination,
    #[error("{field} is required")]
    Missing { field: TripField },
    #[error("{field} is not a valid YYYY-MM-DD date: {value:?}")]
    InvalidDate { field: TripField, value: String },
    #[error("end date {end} cannot be before start date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("budget is not a number: {0:?}")]
    InvalidBudget(String),
}

impl ValidationError {
    /// The input field the user has to fix.
    pub fn field(&self) -> TripField {
        match self {
            ValidationError::EmptyDestination => TripField::Destination,
            ValidationError::Missing { field } | ValidationError::InvalidDate { field, .. } => {
                *field
            }
            ValidationError::EndBeforeStart { .. } => TripField::EndDate,
            ValidationError::InvalidBudget(_) => TripField::Budget,
        }
    }
}

/// Raw input for a new trip, exactly as submitted by the add-trip form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripDraft {
    pub destination: String,
    pub start_date: String,
    pub end_date: String,
    pub budget: String,
    #[serde(default)]
    pub notes: String,
}

/// A draft that passed validation and only lacks an id.
#[derive(Debug, Clone, PartialEq)]
pub struct TripFields {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: f64,
    pub notes: String,
}

impl TripDraft {
    pub fn validate(&self) -> Result<TripFields, ValidationError> {
        let destination = self.destination.trim();
        if destination.is_empty() {
            return Err(ValidationError::EmptyDestination);
        }
        let start_date = parse_date(TripField::StartDate, &self.start_date)?;
        let end_date = parse_date(TripField::EndDate, &self.end_date)?;
        if end_date < start_date {
            return Err(ValidationError::EndBeforeStart {
                start: start_date,
                end: end_date,
            });
        }
        let budget = parse_budget(&self.budget)?;

        Ok(TripFields {
            destination: destination.to_string(),
            start_date,
            end_date,
            budget,
            notes: self.notes.trim().to_string(),
        })
    }
}

impl TripFields {
    pub fn into_record(self, id: i64) -> TripRecord {
        TripRecord {
            id,
            destination: self.destination,
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget,
            notes: self.notes,
        }
    }
}

/// Edit of an existing trip. `None` keeps the stored value.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TripPatch {
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<String>,
    pub notes: Option<String>,
}

impl TripPatch {
    /// Merges the patch over `record` and re-validates the whole result.
    pub fn apply(self, record: &TripRecord) -> Result<TripRecord, ValidationError> {
        let mut draft = record.to_draft();
        if let Some(destination) = self.destination {
            draft.destination = destination;
        }
        if let Some(start_date) = self.start_date {
            draft.start_date = start_date;
        }
        if let Some(end_date) = self.end_date {
            draft.end_date = end_date;
        }
        if let Some(budget) = self.budget {
            draft.budget = budget;
        }
        if let Some(notes) = self.notes {
            draft.notes = notes;
        }
        Ok(draft.validate()?.into_record(record.id))
    }
}

fn parse_date(field: TripField, raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing { field });
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

fn parse_budget(raw: &str) -> Result<f64, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::Missing {
            field: TripField::Budget,
        });
    }
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(ValidationError::InvalidBudget(raw.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(start: &str, end: &str, budget: &str) -> TripDraft {
        TripDraft {
            destination: "Goa".into(),
            start_date: start.into(),
            end_date: end.into(),
            budget: budget.into(),
            notes: String::new(),
        }
    }

    #[test]
    fn valid_draft_is_trimmed() {
        let mut input = draft("2025-01-10", "2025-01-15", " 5000 ");
        input.destination = "  Goa ".into();
        input.notes = " beach ".into();
        let fields = input.validate().unwrap();
        assert_eq!(fields.destination, "Goa");
        assert_eq!(fields.notes, "beach");
        assert_eq!(fields.budget, 5000.0);
    }

    #[test]
    fn same_day_trip_is_allowed() {
        assert!(draft("2025-01-10", "2025-01-10", "0").validate().is_ok());
    }

    #[test]
    fn rejects_each_bad_field() {
        let mut empty = draft("2025-01-10", "2025-01-15", "1");
        empty.destination = "   ".into();
        assert_eq!(
            empty.validate().unwrap_err().field(),
            TripField::Destination
        );

        let err = draft("", "2025-01-15", "1").validate().unwrap_err();
        assert_eq!(err, ValidationError::Missing { field: TripField::StartDate });

        let err = draft("2025-01-10", "15/01/2025", "1").validate().unwrap_err();
        assert_eq!(err.field(), TripField::EndDate);

        let err = draft("2025-01-15", "2025-01-10", "1").validate().unwrap_err();
        assert!(matches!(err, ValidationError::EndBeforeStart { .. }));
        assert_eq!(err.field(), TripField::EndDate);

        let err = draft("2025-01-10", "2025-01-15", "lots").validate().unwrap_err();
        assert_eq!(err, ValidationError::InvalidBudget("lots".into()));

        let err = draft("2025-01-10", "2025-01-15", "inf").validate().unwrap_err();
        assert_eq!(err.field(), TripField::Budget);
    }

    #[test]
    fn negative_budget_is_accepted() {
        let fields = draft("2025-01-10", "2025-01-15", "-20.5").validate().unwrap();
        assert_eq!(fields.budget, -20.5);
    }

    #[test]
    fn patch_keeps_untouched_fields() {
        let record = draft("2025-01-10", "2025-01-15", "5000.25")
            .validate()
            .unwrap()
            .into_record(7);
        let patched = TripPatch {
            destination: Some("Goa North".into()),
            ..TripPatch::default()
        }
        .apply(&record)
        .unwrap();
        assert_eq!(patched.id, 7);
        assert_eq!(patched.destination, "Goa North");
        assert_eq!(patched.start_date, record.start_date);
        assert_eq!(patched.budget, 5000.25);
    }

    #[test]
    fn patch_revalidates_dates() {
        let record = draft("2025-01-10", "2025-01-15", "1")
            .validate()
            .unwrap()
            .into_record(1);
        let err = TripPatch {
            end_date: Some("2025-01-01".into()),
            ..TripPatch::default()
        }
        .apply(&record)
        .unwrap_err();
        assert!(matches!(err, ValidationError::EndBeforeStart { .. }));
    }

    #[test]
    fn record_uses_browser_field_names() {
        let record = draft("2025-01-10", "2025-01-15", "5000")
            .validate()
            .unwrap()
            .into_record(1736467200000);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["startDate"], "2025-01-10");
        assert_eq!(json["endDate"], "2025-01-15");
        assert_eq!(json["budget"], 5000.0);
        assert_eq!(json["notes"], "");
    }

    #[test]
    fn lenient_budget_decoding() {
        let raw = r#"[
            {"id":1,"destination":"A","startDate":"2025-01-01","endDate":"2025-01-02","budget":"12.5"},
            {"id":2,"destination":"B","startDate":"2025-01-01","endDate":"2025-01-02","budget":null,"notes":"x"},
            {"id":3,"destination":"C","startDate":"2025-01-01","endDate":"2025-01-02"}
        ]"#;
        let trips: Vec<TripRecord> = serde_json::from_str(raw).unwrap();
        assert_eq!(trips[0].budget, 12.5);
        assert_eq!(trips[0].notes, "");
        assert_eq!(trips[1].budget, 0.0);
        assert_eq!(trips[2].budget, 0.0);
    }
}

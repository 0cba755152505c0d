//! Live form-field state for the in-progress assistance simulator.
//!
//! Fields are the one piece of run state mutated in place: script steps
//! move them through idle → focus → error/completed to model the customer
//! typing. Derived counters feed the real-time metrics panel.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldStatus {
    Idle,
    Focus,
    Error,
    Completed,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub id:            String,
    pub name:          String,
    pub value:         String,
    pub status:        FieldStatus,
    pub last_activity: DateTime<Utc>,
    pub issues:        Vec<String>,
}

impl FormField {
    fn new(id: &str, name: &str, at: DateTime<Utc>) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            value: String::new(),
            status: FieldStatus::Idle,
            last_activity: at,
            issues: Vec::new(),
        }
    }
}

/// The application form as the assistance simulator sees it.
#[derive(Debug, Default)]
pub struct FormState {
    fields:        Vec<FormField>,
    current_field: Option<String>,
}

impl FormState {
    pub fn empty() -> Self {
        Self::default()
    }

    /// The standard onboarding form. Field set matches the application's
    /// KYC detail screen.
    pub fn standard(at: DateTime<Utc>) -> Self {
        Self {
            fields: vec![
                FormField::new("pan", "PAN Number", at),
                FormField::new("aadhaar", "Aadhaar Number", at),
                FormField::new("email", "Email Address", at),
                FormField::new("income", "Monthly Income", at),
                FormField::new("address", "Address", at),
            ],
            current_field: None,
        }
    }

    pub fn fields(&self) -> &[FormField] {
        &self.fields
    }

    pub fn current_field(&self) -> Option<&str> {
        self.current_field.as_deref()
    }

    pub fn field(&self, id: &str) -> Option<&FormField> {
        self.fields.iter().find(|f| f.id == id)
    }

    /// Apply a scripted field transition. Value and issues are replaced
    /// only when supplied; a `Focus` transition also marks the field as
    /// the active one. Returns the new status, or None for an unknown id.
    pub fn apply(
        &mut self,
        id: &str,
        status: FieldStatus,
        value: Option<&str>,
        issues: &[&str],
        at: DateTime<Utc>,
    ) -> Option<FieldStatus> {
        let field = self.fields.iter_mut().find(|f| f.id == id)?;
        field.status = status;
        field.last_activity = at;
        if let Some(v) = value {
            field.value = v.to_string();
        }
        if !issues.is_empty() {
            field.issues = issues.iter().map(|s| s.to_string()).collect();
        }
        if status == FieldStatus::Focus {
            self.current_field = Some(id.to_string());
        }
        Some(status)
    }
}

/// Real-time counters derived from applied effects.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Metrics {
    pub fields_completed:    u32,
    pub errors_encountered:  u32,
    pub assists_provided:    u32,
    pub active_time_secs:    u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(ms: i64) -> DateTime<Utc> {
        Utc.timestamp_millis_opt(ms).unwrap()
    }

    #[test]
    fn focus_sets_current_field() {
        let mut form = FormState::standard(at(0));
        form.apply("email", FieldStatus::Focus, None, &[], at(100));
        assert_eq!(form.current_field(), Some("email"));
        assert_eq!(form.field("email").unwrap().status, FieldStatus::Focus);
    }

    #[test]
    fn value_and_issues_replaced_only_when_supplied() {
        let mut form = FormState::standard(at(0));
        form.apply("email", FieldStatus::Error, Some("bad"), &["Invalid email format"], at(100));
        form.apply("email", FieldStatus::Idle, None, &[], at(200));

        let field = form.field("email").unwrap();
        assert_eq!(field.value, "bad");
        assert_eq!(field.issues, ["Invalid email format"]);
        assert_eq!(field.last_activity, at(200));
    }

    #[test]
    fn unknown_field_is_a_noop() {
        let mut form = FormState::standard(at(0));
        assert!(form.apply("nope", FieldStatus::Focus, None, &[], at(1)).is_none());
    }
}

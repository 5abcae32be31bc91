//! Normalization of raw intake form posts into a [`Submission`].
//!
//! The form is posted as `application/x-www-form-urlencoded`, where each
//! checked concern repeats the `concerns` key. Handlers hand the decoded
//! pairs over unchanged and get back a complete record ready for upsert.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use tracing::debug;

use crate::error::{MindwellError, MindwellResult};
use crate::models::submission::{Concern, Location, ServiceType, Submission};

/// Form key that may repeat once per checked concern.
pub const CONCERNS_FIELD: &str = "concerns";

/// Keys the server owns. Posted values for them are discarded.
const SERVER_ASSIGNED: [&str; 3] = ["userEmail", "userId", "submittedAt"];

/// Decoded form pairs in posted order.
#[derive(Debug, Clone, Default)]
pub struct FormFields {
    pairs: Vec<(String, String)>,
}

impl FormFields {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Remove every entry named `key` and return the values in order.
    pub fn take_all(&mut self, key: &str) -> Vec<String> {
        let (taken, kept): (Vec<_>, Vec<_>) =
            std::mem::take(&mut self.pairs)
                .into_iter()
                .partition(|(k, _)| k == key);
        self.pairs = kept;
        taken.into_iter().map(|(_, v)| v).collect()
    }

    /// Collapse repeated scalar keys, the last value winning.
    fn into_scalars(self) -> HashMap<String, String> {
        self.pairs
            .into_iter()
            .filter(|(_, v)| !v.trim().is_empty())
            .collect()
    }
}

impl From<Vec<(String, String)>> for FormFields {
    fn from(pairs: Vec<(String, String)>) -> Self {
        Self::new(pairs)
    }
}

/// Build the record to store for `user_email` from a raw form post.
///
/// `concerns` becomes an ordered sequence (empty when nothing was
/// checked). `user_id`, `user_email` and `submitted_at` always come from
/// the caller. Unknown keys are dropped.
pub fn normalize_submission(
    user_id: &str,
    user_email: &str,
    mut fields: FormFields,
    submitted_at: DateTime<Utc>,
) -> MindwellResult<Submission> {
    let concerns = fields
        .take_all(CONCERNS_FIELD)
        .iter()
        .map(|raw| raw.parse::<Concern>())
        .collect::<MindwellResult<Vec<_>>>()?;

    let mut scalars = fields.into_scalars();
    let mut take = |key: &str| scalars.remove(key);

    let location = take("location").map(|v| v.parse::<Location>()).transpose()?;
    let service_type = take("serviceType").map(|v| v.parse::<ServiceType>()).transpose()?;
    let dob = take("dob").map(|v| parse_dob(&v)).transpose()?;

    let submission = Submission {
        user_email: user_email.to_string(),
        user_id: user_id.to_string(),
        client_name: take("clientName"),
        first_name: take("firstName"),
        last_name: take("lastName"),
        email: take("email"),
        phone: take("phone"),
        location,
        dob,
        service_type,
        concerns,
        comments: take("comments"),
        submitted_at,
    };

    for key in scalars.keys() {
        if SERVER_ASSIGNED.contains(&key.as_str()) {
            debug!(field = %key, "Ignoring client-supplied server field");
        } else {
            debug!(field = %key, "Dropping unknown intake field");
        }
    }

    Ok(submission)
}

fn parse_dob(raw: &str) -> MindwellResult<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|e| MindwellError::validation(format!("invalid date of birth '{raw}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(items: &[(&str, &str)]) -> FormFields {
        items
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<Vec<_>>()
            .into()
    }

    fn normalize(items: &[(&str, &str)]) -> MindwellResult<Submission> {
        normalize_submission("user-1", "jane@x.com", pairs(items), Utc::now())
    }

    #[test]
    fn no_concerns_yields_empty_sequence() {
        let s = normalize(&[("firstName", "Jane")]).unwrap();
        assert!(s.concerns.is_empty());
    }

    #[test]
    fn single_concern_yields_one_element_sequence() {
        let s = normalize(&[("concerns", "Trauma")]).unwrap();
        assert_eq!(s.concerns, vec![Concern::Trauma]);
    }

    #[test]
    fn many_concerns_keep_posted_order() {
        let s = normalize(&[
            ("concerns", "Trauma"),
            ("location", "ithaca"),
            ("concerns", "Anxiety Disorder"),
            ("concerns", "ADHD"),
        ])
        .unwrap();
        assert_eq!(
            s.concerns,
            vec![Concern::Trauma, Concern::AnxietyDisorder, Concern::Adhd]
        );
    }

    #[test]
    fn legacy_example_normalizes() {
        let before = Utc::now();
        let s = normalize(&[
            ("clientName", "Jane Doe"),
            ("concerns", "Anxiety Disorder"),
            ("concerns", "ADHD"),
            ("location", "remote"),
        ])
        .unwrap();

        assert_eq!(s.user_email, "jane@x.com");
        assert_eq!(s.user_id, "user-1");
        assert_eq!(s.client_name.as_deref(), Some("Jane Doe"));
        assert_eq!(s.location, Some(Location::Remote));
        assert_eq!(s.concerns, vec![Concern::AnxietyDisorder, Concern::Adhd]);
        assert!(s.submitted_at >= before);
    }

    #[test]
    fn server_fields_override_client_values() {
        let now = Utc::now();
        let s = normalize_submission(
            "user-1",
            "jane@x.com",
            pairs(&[
                ("userEmail", "mallory@x.com"),
                ("userId", "someone-else"),
                ("submittedAt", "1999-01-01T00:00:00Z"),
            ]),
            now,
        )
        .unwrap();

        assert_eq!(s.user_email, "jane@x.com");
        assert_eq!(s.user_id, "user-1");
        assert_eq!(s.submitted_at, now);
    }

    #[test]
    fn full_form_revision_maps_every_field() {
        let s = normalize(&[
            ("location", "ithaca"),
            ("firstName", "Jane"),
            ("lastName", "Doe"),
            ("email", "jane.doe@example.com"),
            ("phone", "607-555-0100"),
            ("dob", "1990-04-12"),
            ("serviceType", "therapy"),
            ("comments", "Trouble sleeping"),
        ])
        .unwrap();

        assert_eq!(s.first_name.as_deref(), Some("Jane"));
        assert_eq!(s.last_name.as_deref(), Some("Doe"));
        assert_eq!(s.email.as_deref(), Some("jane.doe@example.com"));
        assert_eq!(s.phone.as_deref(), Some("607-555-0100"));
        assert_eq!(s.dob, NaiveDate::from_ymd_opt(1990, 4, 12));
        assert_eq!(s.service_type, Some(ServiceType::Therapy));
        assert_eq!(s.comments.as_deref(), Some("Trouble sleeping"));
    }

    #[test]
    fn blank_values_are_absent() {
        let s = normalize(&[("location", ""), ("comments", "   ")]).unwrap();
        assert_eq!(s.location, None);
        assert_eq!(s.comments, None);
    }

    #[test]
    fn repeated_scalar_keeps_last_value() {
        let s = normalize(&[("phone", "111"), ("phone", "222")]).unwrap();
        assert_eq!(s.phone.as_deref(), Some("222"));
    }

    #[test]
    fn unknown_concern_is_rejected() {
        let err = normalize(&[("concerns", "Insomnia")]).unwrap_err();
        assert!(matches!(err, MindwellError::Validation { .. }));
    }

    #[test]
    fn bad_enum_and_date_values_are_rejected() {
        assert!(normalize(&[("location", "paris")]).is_err());
        assert!(normalize(&[("serviceType", "massage")]).is_err());
        assert!(normalize(&[("dob", "12/04/1990")]).is_err());
    }

    #[test]
    fn take_all_removes_only_matching_keys() {
        let mut fields = pairs(&[("a", "1"), ("b", "2"), ("a", "3")]);
        assert_eq!(fields.take_all("a"), vec!["1", "3"]);

        let scalars = fields.into_scalars();
        assert_eq!(scalars.len(), 1);
        assert_eq!(scalars.get("b").map(String::as_str), Some("2"));
    }
}

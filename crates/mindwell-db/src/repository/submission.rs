//! SurrealDB implementation of [`SubmissionRepository`].
//!
//! Records live in the `submission` table under the id
//! `submission:⟨user email⟩`. `UPSERT ... CONTENT` replaces the whole
//! record, which gives the last-write-wins full replacement the intake
//! form relies on.

use chrono::{DateTime, NaiveDate, Utc};
use mindwell_core::error::MindwellResult;
use mindwell_core::models::submission::{Concern, Location, ServiceType, Submission};
use mindwell_core::repository::SubmissionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::debug;

use crate::error::DbError;

const DOB_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, SurrealValue)]
struct SubmissionRow {
    user_email: String,
    user_id: String,
    client_name: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    email: Option<String>,
    phone: Option<String>,
    location: Option<String>,
    dob: Option<String>,
    service_type: Option<String>,
    concerns: Vec<String>,
    comments: Option<String>,
    submitted_at: DateTime<Utc>,
}

impl SubmissionRow {
    fn try_into_submission(self) -> Result<Submission, DbError> {
        let decode = |e: mindwell_core::error::MindwellError| DbError::Decode(e.to_string());

        let location = self
            .location
            .map(|v| v.parse::<Location>())
            .transpose()
            .map_err(decode)?;
        let service_type = self
            .service_type
            .map(|v| v.parse::<ServiceType>())
            .transpose()
            .map_err(decode)?;
        let concerns = self
            .concerns
            .iter()
            .map(|v| v.parse::<Concern>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(decode)?;
        let dob = self
            .dob
            .map(|v| NaiveDate::parse_from_str(&v, DOB_FORMAT))
            .transpose()
            .map_err(|e| DbError::Decode(format!("invalid dob: {e}")))?;

        Ok(Submission {
            user_email: self.user_email,
            user_id: self.user_id,
            client_name: self.client_name,
            first_name: self.first_name,
            last_name: self.last_name,
            email: self.email,
            phone: self.phone,
            location,
            dob,
            service_type,
            concerns,
            comments: self.comments,
            submitted_at: self.submitted_at,
        })
    }
}

/// SurrealDB implementation of the Submission repository.
#[derive(Clone)]
pub struct SurrealSubmissionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubmissionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }
}

impl<C: Connection> SubmissionRepository for SurrealSubmissionRepository<C> {
    async fn upsert(&self, user_email: &str, submission: Submission) -> MindwellResult<Submission> {
        let key = user_email.to_string();

        let result = self
            .db
            .query(
                "UPSERT type::record('submission', $key) CONTENT { \
                 user_email: $key, \
                 user_id: $user_id, \
                 client_name: $client_name, \
                 first_name: $first_name, \
                 last_name: $last_name, \
                 email: $email, \
                 phone: $phone, \
                 location: $location, \
                 dob: $dob, \
                 service_type: $service_type, \
                 concerns: $concerns, \
                 comments: $comments, \
                 submitted_at: $submitted_at \
                 }",
            )
            .bind(("key", key.clone()))
            .bind(("user_id", submission.user_id))
            .bind(("client_name", submission.client_name))
            .bind(("first_name", submission.first_name))
            .bind(("last_name", submission.last_name))
            .bind(("email", submission.email))
            .bind(("phone", submission.phone))
            .bind((
                "location",
                submission.location.map(|l| l.as_str().to_string()),
            ))
            .bind((
                "dob",
                submission.dob.map(|d| d.format(DOB_FORMAT).to_string()),
            ))
            .bind((
                "service_type",
                submission.service_type.map(|s| s.as_str().to_string()),
            ))
            .bind((
                "concerns",
                submission
                    .concerns
                    .iter()
                    .map(|c| c.as_str().to_string())
                    .collect::<Vec<_>>(),
            ))
            .bind(("comments", submission.comments))
            .bind(("submitted_at", submission.submitted_at))
            .await
            .map_err(DbError::from)?;

        let mut result = result.check().map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SubmissionRow> = result.take(0).map_err(DbError::from)?;
        let row = rows.into_iter().next().ok_or_else(|| DbError::NotFound {
            entity: "submission".into(),
            id: key.clone(),
        })?;

        debug!(user_email = %key, "Submission upserted");

        Ok(row.try_into_submission()?)
    }

    async fn get_by_key(&self, user_email: &str) -> MindwellResult<Option<Submission>> {
        let mut result = self
            .db
            .query("SELECT * FROM type::record('submission', $key)")
            .bind(("key", user_email.to_string()))
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubmissionRow> = result.take(0).map_err(DbError::from)?;
        match rows.into_iter().next() {
            Some(row) => Ok(Some(row.try_into_submission()?)),
            None => Ok(None),
        }
    }

    async fn scan_all(&self) -> MindwellResult<Vec<Submission>> {
        let mut result = self
            .db
            .query("SELECT * FROM submission")
            .await
            .map_err(DbError::from)?;

        let rows: Vec<SubmissionRow> = result.take(0).map_err(DbError::from)?;
        let submissions = rows
            .into_iter()
            .map(SubmissionRow::try_into_submission)
            .collect::<Result<Vec<_>, _>>()?;

        Ok(submissions)
    }

    async fn delete_by_key(&self, user_email: &str) -> MindwellResult<()> {
        self.db
            .query("DELETE type::record('submission', $key)")
            .bind(("key", user_email.to_string()))
            .await
            .map_err(DbError::from)?
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        debug!(user_email = %user_email, "Submission deleted");

        Ok(())
    }
}

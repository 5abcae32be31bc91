//! Intake submission domain model.
//!
//! One [`Submission`] exists per user email. Writes always replace the
//! whole record, so every field that is not part of the latest write is
//! gone afterwards.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MindwellError;

/// Clinic location the client wants to be seen at.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    Ithaca,
    Remote,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Ithaca => "ithaca",
            Location::Remote => "remote",
        }
    }
}

impl FromStr for Location {
    type Err = MindwellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ithaca" => Ok(Location::Ithaca),
            "remote" => Ok(Location::Remote),
            other => Err(MindwellError::validation(format!(
                "unknown location: {other}"
            ))),
        }
    }
}

/// Kind of service requested.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ServiceType {
    Therapy,
    Assessment,
}

impl ServiceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceType::Therapy => "therapy",
            ServiceType::Assessment => "assessment",
        }
    }
}

impl FromStr for ServiceType {
    type Err = MindwellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "therapy" => Ok(ServiceType::Therapy),
            "assessment" => Ok(ServiceType::Assessment),
            other => Err(MindwellError::validation(format!(
                "unknown service type: {other}"
            ))),
        }
    }
}

/// Primary concern a client can check on the intake form.
///
/// Serialized with the human-readable label that the form posts.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Concern {
    #[serde(rename = "Anxiety Disorder")]
    AnxietyDisorder,
    #[serde(rename = "Depression")]
    Depression,
    #[serde(rename = "ADHD")]
    Adhd,
    #[serde(rename = "Autism Spectrum Disorder")]
    AutismSpectrumDisorder,
    #[serde(rename = "Relationship Issues")]
    RelationshipIssues,
    #[serde(rename = "Trauma")]
    Trauma,
}

impl Concern {
    /// Every concern in the order the form lists them.
    pub const ALL: [Concern; 6] = [
        Concern::AnxietyDisorder,
        Concern::Depression,
        Concern::Adhd,
        Concern::AutismSpectrumDisorder,
        Concern::RelationshipIssues,
        Concern::Trauma,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Concern::AnxietyDisorder => "Anxiety Disorder",
            Concern::Depression => "Depression",
            Concern::Adhd => "ADHD",
            Concern::AutismSpectrumDisorder => "Autism Spectrum Disorder",
            Concern::RelationshipIssues => "Relationship Issues",
            Concern::Trauma => "Trauma",
        }
    }
}

impl fmt::Display for Concern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Concern {
    type Err = MindwellError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Concern::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| MindwellError::validation(format!("unknown concern: {s}")))
    }
}

/// A stored intake form submission.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    /// Primary key: the email of the account that submitted the form.
    pub user_email: String,
    /// Identifier of the account that submitted the form.
    pub user_id: String,
    /// Full name field used by the first revision of the form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    /// Contact email entered on the form (may differ from `user_email`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_type: Option<ServiceType>,
    /// Checked concerns in the order they were posted. Never absent.
    #[serde(default)]
    pub concerns: Vec<Concern>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
    /// Server-assigned write time.
    pub submitted_at: DateTime<Utc>,
}

/// Reduced projection of a submission for the public read endpoint.
///
/// Missing values are rendered as empty strings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct PublicSubmission {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
}

impl From<&Submission> for PublicSubmission {
    fn from(s: &Submission) -> Self {
        Self {
            first_name: s.first_name.clone().unwrap_or_default(),
            last_name: s.last_name.clone().unwrap_or_default(),
            email: s.email.clone().unwrap_or_default(),
            phone: s.phone.clone().unwrap_or_default(),
        }
    }
}

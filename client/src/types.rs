//! Wire types for the grievance API.
//!
//! These mirror what the backend sends; they carry no business rules.

use chrono::{DateTime, Utc};
use grievance_core::{Role, UserId};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Complaint lifecycle status as reported by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComplaintStatus {
    /// Newly filed
    New,
    /// Awaiting triage
    Open,
    /// Being reviewed before assignment
    UnderReview,
    /// Assigned and being worked on
    InProgress,
    /// Fixed, awaiting closure
    Resolved,
    /// Done
    Closed,
    /// Refused by an admin
    Rejected,
    /// A status this client does not know about
    #[serde(other)]
    Unknown,
}

impl ComplaintStatus {
    /// Wire name of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Open => "OPEN",
            Self::UnderReview => "UNDER_REVIEW",
            Self::InProgress => "IN_PROGRESS",
            Self::Resolved => "RESOLVED",
            Self::Closed => "CLOSED",
            Self::Rejected => "REJECTED",
            Self::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Complaint priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    /// Low
    Low,
    /// Medium (the backend's default)
    #[default]
    Medium,
    /// High
    High,
}

impl Priority {
    /// Wire name of the priority.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "LOW",
            Self::Medium => "MEDIUM",
            Self::High => "HIGH",
        }
    }
}

/// A complaint as listed by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    /// Complaint id
    pub id: i64,
    /// Short title
    pub title: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Category (`Hardware`, `Network`, ...)
    #[serde(default)]
    pub category: Option<String>,
    /// Current status
    pub status: ComplaintStatus,
    /// Priority
    #[serde(default)]
    pub priority: Priority,
    /// Id of the filing account
    #[serde(default)]
    pub user_id: Option<i64>,
    /// Username of the filing account
    #[serde(default)]
    pub user_name: Option<String>,
    /// Admin the complaint is assigned to
    #[serde(default)]
    pub assigned_to: Option<String>,
    /// Department handling the complaint
    #[serde(default)]
    pub department: Option<String>,
    /// Escalation level (0 when never escalated)
    #[serde(default)]
    pub escalation_level: Option<i32>,
    /// When the complaint last moved up a level
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub escalated_at: Option<DateTime<Utc>>,
    /// When the backend will escalate next if nothing happens
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub next_escalation_time: Option<DateTime<Utc>>,
    /// When the complaint was filed
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    /// Last modification
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub updated_at: Option<DateTime<Utc>>,
    /// When the complaint was resolved
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub resolved_at: Option<DateTime<Utc>>,
}

/// A complaint to file.
///
/// # Example
///
/// ```
/// use grievance_client::types::{NewComplaint, Priority};
///
/// let complaint = NewComplaint::new("VPN down", "Cannot reach the intranet")
///     .with_category("Network")
///     .with_priority(Priority::High);
/// assert_eq!(complaint.priority, Priority::High);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComplaint {
    /// Short title
    pub title: String,
    /// Free-text description
    pub description: String,
    /// Category; the backend files it under `Other` when absent
    pub category: Option<String>,
    /// Priority
    pub priority: Priority,
}

impl NewComplaint {
    /// Create a medium-priority complaint without a category.
    #[must_use]
    pub fn new(title: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: None,
            priority: Priority::default(),
        }
    }

    /// Set the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the priority.
    #[must_use]
    pub const fn with_priority(mut self, priority: Priority) -> Self {
        self.priority = priority;
        self
    }

    /// Multipart form the complaint endpoint accepts.
    pub(crate) fn into_form(self) -> reqwest::multipart::Form {
        let form = reqwest::multipart::Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("priority", self.priority.as_str());

        match self.category {
            Some(category) => form.text("category", category),
            None => form,
        }
    }
}

/// Status change made by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    /// New status
    pub status: ComplaintStatus,
    /// Admin to assign the complaint to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<String>,
}

impl StatusUpdate {
    /// Change the status without reassigning.
    #[must_use]
    pub const fn new(status: ComplaintStatus) -> Self {
        Self {
            status,
            assigned_to: None,
        }
    }

    /// Also assign the complaint.
    #[must_use]
    pub fn assigned_to(mut self, admin: impl Into<String>) -> Self {
        self.assigned_to = Some(admin.into());
        self
    }
}

/// The signed-in account as reported by `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrentUser {
    /// Account id
    pub user_id: i64,
    /// Username
    pub username: String,
    /// Email address
    pub email: String,
    /// Role
    pub role: Role,
    /// Display name
    #[serde(default)]
    pub name: Option<String>,
}

impl CurrentUser {
    /// Account id in the session manager's representation.
    #[must_use]
    pub fn id(&self) -> UserId {
        UserId::from(self.user_id)
    }
}

/// Visibility of a comment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CommentKind {
    /// Visible to the complaint's owner
    #[default]
    Public,
    /// Admin-only note
    Internal,
    /// A kind this client does not know about
    #[serde(other)]
    Unknown,
}

impl CommentKind {
    /// Wire name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Public => "PUBLIC",
            Self::Internal => "INTERNAL",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// A comment on a complaint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    /// Comment id
    pub id: i64,
    /// Text
    pub content: String,
    /// Visibility
    #[serde(default, rename = "type")]
    pub kind: CommentKind,
    /// Hidden from the complaint's owner
    #[serde(default)]
    pub is_admin_only: Option<bool>,
    /// When the comment was posted
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-side path of an attached file
    #[serde(default)]
    pub attachment_path: Option<String>,
    /// Author's account id
    #[serde(default)]
    pub author_id: Option<i64>,
    /// Author's display name
    #[serde(default)]
    pub author_name: Option<String>,
    /// Author's role
    #[serde(default)]
    pub author_role: Option<Role>,
    /// Author's email
    #[serde(default)]
    pub author_email: Option<String>,
    /// Complaint the comment belongs to
    #[serde(default)]
    pub complaint_id: Option<i64>,
}

/// A comment to post.
///
/// # Example
///
/// ```
/// use grievance_client::types::{CommentKind, NewComment};
///
/// let note = NewComment::new(7, "Escalating to networking").internal();
/// assert_eq!(note.kind, CommentKind::Internal);
/// assert!(note.admin_only);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewComment {
    /// Complaint to comment on
    pub complaint_id: i64,
    /// Text
    pub content: String,
    /// Visibility
    pub kind: CommentKind,
    /// Hide from the complaint's owner
    pub admin_only: bool,
}

impl NewComment {
    /// Public comment on `complaint_id`.
    #[must_use]
    pub fn new(complaint_id: i64, content: impl Into<String>) -> Self {
        Self {
            complaint_id,
            content: content.into(),
            kind: CommentKind::Public,
            admin_only: false,
        }
    }

    /// Make it an internal, admin-only note. The backend refuses these from
    /// non-admins.
    #[must_use]
    pub const fn internal(mut self) -> Self {
        self.kind = CommentKind::Internal;
        self.admin_only = true;
        self
    }

    /// Multipart form the comment endpoint accepts.
    pub(crate) fn into_form(self) -> reqwest::multipart::Form {
        reqwest::multipart::Form::new()
            .text("complaintId", self.complaint_id.to_string())
            .text("content", self.content)
            .text("type", self.kind.as_str())
            .text("isAdminOnly", self.admin_only.to_string())
    }
}

/// Manual escalation requested by an admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EscalationRequest {
    /// Level to move the complaint to
    pub target_level: u8,
    /// Reason recorded in the escalation history
    pub reason: String,
}

impl EscalationRequest {
    /// Escalate to `target_level` for `reason`.
    #[must_use]
    pub fn new(target_level: u8, reason: impl Into<String>) -> Self {
        Self {
            target_level,
            reason: reason.into(),
        }
    }
}

/// Where a complaint stands relative to one escalation level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineStage {
    /// Level already reached
    Completed,
    /// Level the complaint is at
    Current,
    /// Level not reached yet
    Pending,
    /// A stage this client does not know about
    #[serde(other)]
    Unknown,
}

/// One level of a complaint's escalation timeline.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
    /// Level name
    pub title: String,
    /// What happens at this level
    #[serde(default)]
    pub description: String,
    /// Display icon
    #[serde(default)]
    pub icon: Option<String>,
    /// Reached, current or pending
    pub status: TimelineStage,
    /// Hours allowed at the previous level before this one is reached
    #[serde(default)]
    pub time_limit_hours: Option<i64>,
    /// When the level was reached
    #[serde(default, deserialize_with = "timestamp::optional")]
    pub reached_at: Option<DateTime<Utc>>,
}

/// Escalation timeline of one complaint.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EscalationTimeline {
    /// Summary line from the backend
    #[serde(default)]
    pub message: Option<String>,
    /// Levels in order
    #[serde(default, rename = "timeline")]
    pub entries: Vec<TimelineEntry>,
}

impl EscalationTimeline {
    /// The level the complaint is at, if the backend marked one.
    #[must_use]
    pub fn current(&self) -> Option<&TimelineEntry> {
        self.entries
            .iter()
            .find(|entry| entry.status == TimelineStage::Current)
    }
}

/// Escalation dashboard figures. Missing fields read as zero or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EscalationStats {
    /// Every complaint in the system
    pub total_complaints: i64,
    /// Complaints escalated at least once
    pub total_escalated: i64,
    /// Escalated share, preformatted (`"12.5%"`)
    pub escalation_rate: Option<String>,
    /// Complaints per priority
    pub priority_counts: BTreeMap<String, i64>,
    /// Escalated complaints per priority
    pub escalated_priority_counts: BTreeMap<String, i64>,
    /// Complaints per escalation level
    pub level_counts: BTreeMap<u8, i64>,
    /// High-priority complaints
    pub total_high_priority: i64,
}

/// The stats endpoint has shipped the figures under both names.
#[derive(Debug, Deserialize)]
pub(crate) struct StatsBody {
    #[serde(default)]
    pub stats: Option<EscalationStats>,
    #[serde(default)]
    pub data: Option<EscalationStats>,
}

/// Response wrapper used by every backend endpoint.
#[derive(Debug, Deserialize)]
#[serde(bound = "T: Deserialize<'de>")]
pub(crate) struct Envelope<T> {
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// Timestamps arrive as epoch milliseconds or as ISO-8601 strings.
mod timestamp {
    use super::{DateTime, Deserialize, Deserializer, Utc};
    use chrono::NaiveDateTime;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Millis(i64),
        Text(String),
        /// `[year, month, day, hour, minute, second?, nanos?]`
        Parts(Vec<i64>),
    }

    pub(super) fn optional<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Option::<Raw>::deserialize(deserializer)?;
        raw.map(|raw| match raw {
            Raw::Millis(millis) => DateTime::from_timestamp_millis(millis)
                .ok_or_else(|| serde::de::Error::custom(format!("timestamp out of range: {millis}"))),
            Raw::Text(text) => parse_text(&text)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {text}"))),
            Raw::Parts(parts) => parse_parts(&parts)
                .ok_or_else(|| serde::de::Error::custom(format!("unrecognized timestamp: {parts:?}"))),
        })
        .transpose()
    }

    fn parse_parts(parts: &[i64]) -> Option<DateTime<Utc>> {
        let part = |index: usize| parts.get(index).copied().unwrap_or(0);
        let small = |index: usize| u32::try_from(part(index)).ok();

        if parts.len() < 3 {
            return None;
        }
        chrono::NaiveDate::from_ymd_opt(i32::try_from(part(0)).ok()?, small(1)?, small(2)?)?
            .and_hms_nano_opt(small(3)?, small(4)?, small(5)?, small(6)?)
            .map(|naive| naive.and_utc())
    }

    fn parse_text(text: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(text)
            .map(|dt| dt.with_timezone(&Utc))
            .ok()
            .or_else(|| {
                NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f")
                    .ok()
                    .map(|naive| naive.and_utc())
            })
    }
}

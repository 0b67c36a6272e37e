//! Task domain model.
//!
//! Tasks live in the external SQLite store and are only ever touched by the
//! agent through capabilities. This model pins down the validity sets,
//! defaults, ordering and display template the behavior contract hands to
//! the agent, so they are defined once and tested here.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::{DomainError, DomainResult};

/// Status of a task.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Not started yet
    #[default]
    Pending,
    /// Being worked on
    InProgress,
    /// Done; `completed_at` is set
    Completed,
}

impl TaskStatus {
    /// Valid values, in the order they are listed to the agent.
    pub const ALL: [Self; 3] = [Self::Pending, Self::InProgress, Self::Completed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Parse a status, falling back to the default for unknown values.
    pub fn parse_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }
}

/// Priority of a task.
///
/// Ordering follows urgency, so sorting descending lists high first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

impl TaskPriority {
    /// Valid values, in the order they are listed to the agent.
    pub const ALL: [Self; 3] = [Self::Low, Self::Medium, Self::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Parse a priority, falling back to the default for unknown values.
    pub fn parse_or_default(s: &str) -> Self {
        Self::from_str(s).unwrap_or_default()
    }

    /// Visual marker used in the display template.
    pub fn marker(&self) -> &'static str {
        match self {
            Self::High => "🔴",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::High => "High",
            Self::Medium => "Medium",
            Self::Low => "Low",
        }
    }

    /// Sort key used by the default listing order (higher sorts first).
    pub fn rank(&self) -> u8 {
        match self {
            Self::High => 3,
            Self::Medium => 2,
            Self::Low => 1,
        }
    }

    /// SQL `ORDER BY` clause for the default listing order:
    /// priority descending, then newest first.
    pub fn default_order_by() -> String {
        let mut by_rank = Self::ALL;
        by_rank.sort_by(|a, b| b.cmp(a));
        let cases = by_rank
            .iter()
            .map(|p| format!("WHEN '{}' THEN {}", p.as_str(), p.rank()))
            .collect::<Vec<_>>()
            .join(" ");
        format!("ORDER BY CASE priority {cases} ELSE 0 END DESC, created_at DESC")
    }
}

/// A task as stored by the external task store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Store-assigned identifier
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub created_at: DateTime<Utc>,
    /// Present exactly when `status` is `Completed`
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    pub fn new(id: i64, title: impl Into<String>, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            title: title.into(),
            description: None,
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            created_at,
            completed_at: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_priority(mut self, priority: TaskPriority) -> Self {
        self.priority = priority;
        self
    }

    /// Set the status; a completed task is stamped with its creation time
    /// unless it already has a completion time.
    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self.completed_at = match status {
            TaskStatus::Completed => self.completed_at.or(Some(self.created_at)),
            _ => None,
        };
        self
    }

    /// Mark the task completed, setting status and timestamp together.
    ///
    /// Completing an already completed task keeps the original timestamp.
    pub fn complete(&mut self, at: DateTime<Utc>) {
        if self.status == TaskStatus::Completed && self.completed_at.is_some() {
            return;
        }
        self.status = TaskStatus::Completed;
        self.completed_at = Some(at);
    }

    /// Check the invariants the store schema cannot express.
    pub fn validate(&self) -> DomainResult<()> {
        if self.title.trim().is_empty() {
            return Err(DomainError::InvalidTask(format!(
                "task {} has an empty title",
                self.id
            )));
        }
        let completed = self.status == TaskStatus::Completed;
        if completed != self.completed_at.is_some() {
            return Err(DomainError::InvalidTask(format!(
                "task {} completion timestamp does not match status {}",
                self.id,
                self.status.as_str()
            )));
        }
        Ok(())
    }

    /// Render the task with the display template.
    pub fn render(&self) -> String {
        let mut out = format!(
            "{} [{}] {} Priority - {}\n   Status: {}\n",
            self.priority.marker(),
            self.id,
            self.priority.label(),
            self.title,
            self.status.as_str()
        );
        if let Some(ref description) = self.description {
            out.push_str(&format!("   Description: {description}\n"));
        }
        out.push_str(&format!("   Created: {}", self.created_at.format("%Y-%m-%d")));
        out
    }

    /// Render a list of tasks under the standard heading.
    pub fn render_list(tasks: &[Task]) -> String {
        let body = tasks.iter().map(Task::render).collect::<Vec<_>>().join("\n\n");
        format!("📋 Your Tasks:\n\n{body}")
    }
}

/// Sort tasks into the default listing order.
pub fn sort_default(tasks: &mut [Task]) {
    tasks.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, d, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_defaults() {
        assert_eq!(TaskStatus::default(), TaskStatus::Pending);
        assert_eq!(TaskPriority::default(), TaskPriority::Medium);
    }

    #[test]
    fn test_invalid_values_fall_back_to_defaults() {
        assert_eq!(TaskStatus::parse_or_default("done-ish"), TaskStatus::Pending);
        assert_eq!(TaskStatus::parse_or_default("In_Progress"), TaskStatus::InProgress);
        assert_eq!(TaskPriority::parse_or_default("urgent"), TaskPriority::Medium);
        assert_eq!(TaskPriority::parse_or_default(" HIGH "), TaskPriority::High);
    }

    #[test]
    fn test_complete_sets_both_fields() {
        let mut task = Task::new(1, "Deploy website", day(15));
        assert!(task.validate().is_ok());

        task.complete(day(16));
        assert_eq!(task.status, TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(day(16)));
        assert!(task.validate().is_ok());

        task.complete(day(20));
        assert_eq!(task.completed_at, Some(day(16)));
    }

    #[test]
    fn test_validate_rejects_mismatched_completion() {
        let mut task = Task::new(2, "Write docs", day(14));
        task.status = TaskStatus::Completed;
        assert!(task.validate().is_err());

        let mut task = Task::new(3, "Review", day(13));
        task.completed_at = Some(day(14));
        assert!(task.validate().is_err());

        assert!(Task::new(4, "   ", day(13)).validate().is_err());
    }

    #[test]
    fn test_with_status_keeps_completion_invariant() {
        let task = Task::new(2, "Write docs", day(14)).with_status(TaskStatus::Completed);
        assert_eq!(task.completed_at, Some(day(14)));
        assert!(task.validate().is_ok());

        let task = task.with_status(TaskStatus::Pending);
        assert_eq!(task.completed_at, None);
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_complete_stamps_status_only_completion() {
        let mut task = Task::new(5, "Water plants", day(10));
        task.status = TaskStatus::Completed;

        task.complete(day(11));
        assert_eq!(task.completed_at, Some(day(11)));
        assert!(task.validate().is_ok());
    }

    #[test]
    fn test_sort_default_priority_then_newest() {
        let mut tasks = vec![
            Task::new(1, "low old", day(1)).with_priority(TaskPriority::Low),
            Task::new(2, "high old", day(2)).with_priority(TaskPriority::High),
            Task::new(3, "medium", day(3)),
            Task::new(4, "high new", day(4)).with_priority(TaskPriority::High),
        ];
        sort_default(&mut tasks);
        let ids: Vec<i64> = tasks.iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![4, 2, 3, 1]);
    }

    #[test]
    fn test_default_order_by_clause() {
        assert_eq!(
            TaskPriority::default_order_by(),
            "ORDER BY CASE priority WHEN 'high' THEN 3 WHEN 'medium' THEN 2 WHEN 'low' THEN 1 ELSE 0 END DESC, created_at DESC"
        );
    }

    #[test]
    fn test_render_template() {
        let task = Task::new(2, "Write documentation", day(14))
            .with_description("Update API docs for v2.0");
        assert_eq!(
            task.render(),
            "🟡 [2] Medium Priority - Write documentation\n   Status: pending\n   Description: Update API docs for v2.0\n   Created: 2024-01-14"
        );

        let task = Task::new(1, "Deploy website", day(15))
            .with_priority(TaskPriority::High)
            .with_status(TaskStatus::InProgress);
        assert_eq!(
            task.render(),
            "🔴 [1] High Priority - Deploy website\n   Status: in_progress\n   Created: 2024-01-15"
        );
    }
}

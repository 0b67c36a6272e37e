//! Behavior contract.
//!
//! The contract is the agent's operating instructions. It is kept as one
//! structured document with a section per concern and rendered to markdown
//! for the system prompt, so each rule can be tested on its own and the
//! rendered text stays stable between builds.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt::Write;

use super::capability::{Capability, CapabilityProvider, CapabilityRegistry, CapabilitySet};
use super::task::{sort_default, Task, TaskPriority, TaskStatus};

/// Name of the table the agent keeps tasks in.
pub const TODO_TABLE: &str = "todos";

/// Idempotent schema for the task table.
pub const TODO_SCHEMA: &str = "CREATE TABLE IF NOT EXISTS todos (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  title TEXT NOT NULL,
  description TEXT,
  status TEXT DEFAULT 'pending',
  priority TEXT DEFAULT 'medium',
  created_at TEXT DEFAULT CURRENT_TIMESTAMP,
  completed_at TEXT
)";

/// Concern a contract section covers, in render order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractSection {
    Role,
    Tools,
    Schema,
    Validity,
    Intents,
    Workflow,
    OutputFormat,
    Policies,
    EdgeCases,
    Examples,
}

impl ContractSection {
    pub const ALL: [Self; 10] = [
        Self::Role,
        Self::Tools,
        Self::Schema,
        Self::Validity,
        Self::Intents,
        Self::Workflow,
        Self::OutputFormat,
        Self::Policies,
        Self::EdgeCases,
        Self::Examples,
    ];

    /// Markdown heading for the section; the role has none.
    pub fn heading(&self) -> Option<&'static str> {
        match self {
            Self::Role => None,
            Self::Tools => Some("Available Tools"),
            Self::Schema => Some("Database Schema"),
            Self::Validity => Some("Valid Values"),
            Self::Intents => Some("Core Capabilities"),
            Self::Workflow => Some("Workflow"),
            Self::OutputFormat => Some("Output Format"),
            Self::Policies => Some("Best Practices"),
            Self::EdgeCases => Some("Edge Cases"),
            Self::Examples => Some("Example Interactions"),
        }
    }
}

/// A user intent the agent must recognise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Initialize,
    Add,
    List,
    Update,
    Complete,
    Delete,
    Search,
}

impl Intent {
    pub fn title(&self) -> &'static str {
        match self {
            Self::Initialize => "Initialization",
            Self::Add => "Adding Tasks",
            Self::List => "Listing Tasks",
            Self::Update => "Updating Tasks",
            Self::Complete => "Completing Tasks",
            Self::Delete => "Deleting Tasks",
            Self::Search => "Searching Tasks",
        }
    }
}

/// Ordered procedure the agent follows for one intent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Procedure {
    pub intent: Intent,
    /// One-line capability summary, omitted for initialization
    pub summary: Option<&'static str>,
    pub steps: Vec<String>,
    /// Provider operations the procedure relies on
    pub operations: Vec<&'static str>,
}

/// A conversational policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Policy {
    pub name: &'static str,
    pub rule: &'static str,
}

/// A sample exchange shown to the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExampleInteraction {
    pub user: &'static str,
    pub agent: &'static str,
}

/// The complete behavior contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BehaviorContract {
    pub role: String,
    /// Capabilities described to the agent, in registry order
    pub tools: Vec<&'static Capability>,
    pub schema: &'static str,
    pub procedures: Vec<Procedure>,
    pub policies: Vec<Policy>,
    pub edge_cases: Vec<&'static str>,
    pub examples: Vec<ExampleInteraction>,
}

impl BehaviorContract {
    /// The contract every todo agent session runs under.
    pub fn standard() -> Self {
        Self {
            role: "You are a Todo List Agent that helps users manage their tasks efficiently. \
                   You use SQLite for persistent storage and provide a simple, intuitive interface \
                   for task management."
                .to_string(),
            tools: CapabilityRegistry::all().iter().collect(),
            schema: TODO_SCHEMA,
            procedures: standard_procedures(),
            policies: vec![
                Policy {
                    name: "Always initialize",
                    rule: "Check for table existence before any operation",
                },
                Policy {
                    name: "Be conversational",
                    rule: "Understand natural language like \"mark the first task as done\" or \"add buy milk to my list\"",
                },
                Policy {
                    name: "Provide context",
                    rule: "When showing tasks, include relevant details (ID, status, priority)",
                },
                Policy {
                    name: "Handle ambiguity",
                    rule: "If more than one task matches a reference, list the matching tasks and ask the user which one they mean; never guess",
                },
                Policy {
                    name: "Confirm destructive actions",
                    rule: "Delete only on an unambiguous ID match; when a title or keyword matches several tasks, ask the user to confirm which to delete first",
                },
                Policy {
                    name: "Be proactive",
                    rule: "Suggest next actions like \"Would you like to mark any tasks as completed?\"",
                },
                Policy {
                    name: "Handle errors gracefully",
                    rule: "If a tool call fails, explain what went wrong in plain terms and suggest a fix (for example recreating a missing table); do not keep retrying the same call",
                },
            ],
            edge_cases: vec![
                "If no tasks exist, encourage the user to add their first task",
                "If a task title is ambiguous, show matching options and ask for clarification",
                "If the database is corrupted or the table is missing, offer to recreate the table",
                "Use parameterized queries where possible to avoid SQL injection",
                "If priority or status values are invalid, use 'medium' and 'pending' respectively instead of rejecting the request",
            ],
            examples: vec![
                ExampleInteraction {
                    user: "Add a task to buy groceries",
                    agent: "Creates task with title \"Buy groceries\", medium priority, pending status",
                },
                ExampleInteraction {
                    user: "Show my tasks",
                    agent: "Lists all pending and in-progress tasks",
                },
                ExampleInteraction {
                    user: "Mark task 1 as done",
                    agent: "Updates task 1 to completed status and sets completed_at",
                },
                ExampleInteraction {
                    user: "What high priority tasks do I have?",
                    agent: "Filters and shows only high priority tasks",
                },
                ExampleInteraction {
                    user: "Delete the groceries task",
                    agent: "Finds the task matching \"groceries\"; deletes it if exactly one matches, otherwise asks which one",
                },
            ],
        }
    }

    /// Narrow the contract to a capability grant.
    ///
    /// Only granted tools are listed, and procedures relying on an
    /// operation outside the grant are dropped.
    #[must_use]
    pub fn restricted_to(mut self, granted: &CapabilitySet) -> Self {
        self.tools.retain(|c| granted.contains(&c.identifier()));
        let operations: Vec<&str> = granted
            .iter()
            .filter(|c| c.provider == CapabilityProvider::Sqlite)
            .map(|c| c.operation)
            .collect();
        self.procedures
            .retain(|p| p.operations.iter().all(|op| operations.contains(op)));
        self
    }

    /// Procedure for one intent.
    pub fn procedure(&self, intent: Intent) -> Option<&Procedure> {
        self.procedures.iter().find(|p| p.intent == intent)
    }

    /// Render a single section body, including its heading.
    pub fn render_section(&self, section: ContractSection) -> String {
        let mut out = String::new();
        if let Some(heading) = section.heading() {
            let _ = writeln!(out, "## {heading}\n");
        }

        match section {
            ContractSection::Role => out.push_str(&self.role),
            ContractSection::Tools => {
                let groups = CapabilityProvider::ALL
                    .iter()
                    .filter_map(|provider| {
                        let mut tools = self.tools.iter().filter(|c| c.provider == *provider).peekable();
                        tools.peek()?;
                        let mut group = format!("### {}\n", provider.title());
                        for capability in tools {
                            let _ = write!(group, "\n- **{}**: {}", capability.operation, capability.summary);
                        }
                        Some(group)
                    })
                    .collect::<Vec<_>>();
                out.push_str(&groups.join("\n\n"));
            }
            ContractSection::Schema => {
                let _ = write!(
                    out,
                    "On first run, initialize a `{TODO_TABLE}` table with this schema. \
                     The statement is idempotent and safe to run again if the table already exists:\n\
                     ```sql\n{}\n```",
                    self.schema
                );
            }
            ContractSection::Validity => {
                let statuses = quoted(TaskStatus::ALL.iter().map(TaskStatus::as_str));
                let priorities = quoted(TaskPriority::ALL.iter().map(TaskPriority::as_str));
                let _ = write!(
                    out,
                    "Valid status values: {statuses} (default '{}')\n\
                     Valid priority values: {priorities} (default '{}')\n\
                     If a supplied value is not in these sets, store the default instead of rejecting the request.",
                    TaskStatus::default().as_str(),
                    TaskPriority::default().as_str()
                );
            }
            ContractSection::Intents => {
                let lines = self
                    .procedures
                    .iter()
                    .filter_map(|p| p.summary)
                    .enumerate()
                    .map(|(i, summary)| format!("{}. {summary}", i + 1))
                    .collect::<Vec<_>>();
                out.push_str(&lines.join("\n"));
            }
            ContractSection::Workflow => {
                let blocks = self
                    .procedures
                    .iter()
                    .map(|p| {
                        let steps = p
                            .steps
                            .iter()
                            .enumerate()
                            .map(|(i, step)| format!("{}. {step}", i + 1))
                            .collect::<Vec<_>>()
                            .join("\n");
                        format!("### {}\n{steps}", p.intent.title())
                    })
                    .collect::<Vec<_>>();
                out.push_str(&blocks.join("\n\n"));
            }
            ContractSection::OutputFormat => {
                let mut tasks = sample_tasks();
                sort_default(&mut tasks);
                let _ = write!(
                    out,
                    "When displaying tasks, use this format:\n```\n{}\n```",
                    Task::render_list(&tasks)
                );
            }
            ContractSection::Policies => {
                let lines = self
                    .policies
                    .iter()
                    .enumerate()
                    .map(|(i, p)| format!("{}. **{}**: {}", i + 1, p.name, p.rule))
                    .collect::<Vec<_>>();
                out.push_str(&lines.join("\n"));
            }
            ContractSection::EdgeCases => {
                let lines = self.edge_cases.iter().map(|e| format!("- {e}")).collect::<Vec<_>>();
                out.push_str(&lines.join("\n"));
            }
            ContractSection::Examples => {
                let lines = self
                    .examples
                    .iter()
                    .map(|e| format!("User: \"{}\"\nAgent: {}", e.user, e.agent))
                    .collect::<Vec<_>>();
                out.push_str(&lines.join("\n\n"));
                out.push_str(
                    "\n\nRemember: You're here to make task management effortless and intuitive!",
                );
            }
        }

        out
    }

    /// Render the whole contract as the agent's system prompt.
    pub fn render(&self) -> String {
        ContractSection::ALL
            .iter()
            .map(|section| self.render_section(*section))
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

impl Default for BehaviorContract {
    fn default() -> Self {
        Self::standard()
    }
}

fn quoted<'a>(values: impl Iterator<Item = &'a str>) -> String {
    values.map(|v| format!("'{v}'")).collect::<Vec<_>>().join(", ")
}

fn standard_procedures() -> Vec<Procedure> {
    vec![
        Procedure {
            intent: Intent::Initialize,
            summary: None,
            steps: vec![
                format!("Check if the `{TODO_TABLE}` table exists using `list_tables`"),
                "If not, create it using `create_table` with the schema above".to_string(),
                "Confirm initialization to the user".to_string(),
            ],
            operations: vec!["list_tables", "create_table"],
        },
        Procedure {
            intent: Intent::Add,
            summary: Some("**Add Tasks**: Insert new todos with title, optional description, and priority"),
            steps: vec![
                "Extract task title (required), description (optional), and priority (optional)".to_string(),
                "Use `write_query` to INSERT the new task".to_string(),
                "Confirm the task was added and display the task details".to_string(),
            ],
            operations: vec!["write_query"],
        },
        Procedure {
            intent: Intent::List,
            summary: Some("**List Tasks**: Show all tasks or filter by status/priority"),
            steps: vec![
                "Use `read_query` to SELECT tasks based on filters (if any)".to_string(),
                "Present tasks in a clear, organized format with ID, title, status, and priority".to_string(),
                format!(
                    "Unless the user asks for another order, sort by priority (high → low) then created_at (newest first): `{}`",
                    TaskPriority::default_order_by()
                ),
            ],
            operations: vec!["read_query"],
        },
        Procedure {
            intent: Intent::Update,
            summary: Some("**Update Tasks**: Modify task details, change status, or update priority"),
            steps: vec![
                "Identify the task by ID or title using `read_query`".to_string(),
                "Use `write_query` to UPDATE the relevant fields".to_string(),
                "Confirm the update and show the updated task".to_string(),
            ],
            operations: vec!["read_query", "write_query"],
        },
        Procedure {
            intent: Intent::Complete,
            summary: Some("**Complete Tasks**: Mark tasks as completed (updates status and completed_at timestamp)"),
            steps: vec![
                "Find the task by ID or title using `read_query`".to_string(),
                "In a single `write_query`, UPDATE status to 'completed' and set completed_at to CURRENT_TIMESTAMP: \
                 `UPDATE todos SET status = 'completed', completed_at = CURRENT_TIMESTAMP WHERE id = ?`"
                    .to_string(),
                "Congratulate the user and show the completed task".to_string(),
            ],
            operations: vec!["read_query", "write_query"],
        },
        Procedure {
            intent: Intent::Delete,
            summary: Some("**Delete Tasks**: Remove tasks by ID or title"),
            steps: vec![
                "Identify the task by ID or title using `read_query`".to_string(),
                "If a title matches more than one task, show the candidates and ask the user to confirm which one"
                    .to_string(),
                "Use `write_query` to DELETE the task".to_string(),
                "Confirm deletion".to_string(),
            ],
            operations: vec!["read_query", "write_query"],
        },
        Procedure {
            intent: Intent::Search,
            summary: Some("**Search Tasks**: Find tasks by keyword in title or description"),
            steps: vec![
                "Use `read_query` with a WHERE clause for LIKE matching on title/description".to_string(),
                "Display matching tasks".to_string(),
            ],
            operations: vec!["read_query"],
        },
    ]
}

fn sample_date(day: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(2024, 1, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .unwrap_or_default()
}

fn sample_tasks() -> Vec<Task> {
    vec![
        Task::new(1, "Deploy website", sample_date(15))
            .with_priority(TaskPriority::High)
            .with_status(TaskStatus::InProgress),
        Task::new(2, "Write documentation", sample_date(14)).with_description("Update API docs for v2.0"),
        Task::new(3, "Review pull requests", sample_date(13)).with_priority(TaskPriority::Low),
    ]
}

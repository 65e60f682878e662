//! Task tracking across a run.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::tools::{Tool, ToolError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TodoStatus {
    Pending,
    InProgress,
    Completed,
    Cancelled,
}

impl TodoStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
        }
    }

    fn marker(&self) -> &'static str {
        match self {
            Self::Pending => "⏳",
            Self::InProgress => "🔄",
            Self::Completed => "✅",
            Self::Cancelled => "❌",
        }
    }

    fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::InProgress)
    }
}

impl fmt::Display for TodoStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Todo {
    pub id: String,
    pub content: String,
    pub status: TodoStatus,
    pub notes: Option<String>,
}

/// Shared in-memory list of todos, in creation order.
#[derive(Debug, Clone, Default)]
pub struct TodoStore {
    items: Arc<Mutex<Vec<Todo>>>,
}

impl TodoStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Todo>> {
        match self.items.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn create(&self, content: &str, status: TodoStatus) -> Todo {
        let todo = Todo {
            id: format!("todo_{}", Uuid::new_v4()),
            content: content.to_string(),
            status,
            notes: None,
        };
        self.lock().push(todo.clone());
        todo
    }

    /// Update status and/or notes. False when the id is unknown.
    pub fn update(&self, id: &str, status: Option<TodoStatus>, notes: Option<String>) -> bool {
        let mut items = self.lock();
        let Some(todo) = items.iter_mut().find(|t| t.id == id) else {
            return false;
        };
        if let Some(status) = status {
            todo.status = status;
        }
        if let Some(notes) = notes {
            todo.notes = Some(notes);
        }
        true
    }

    pub fn all(&self) -> Vec<Todo> {
        self.lock().clone()
    }

    pub fn active_count(&self) -> usize {
        self.lock().iter().filter(|t| t.status.is_active()).count()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }
}

/// Create, update, and list todos for the current run.
pub struct ManageTodosTool {
    store: TodoStore,
}

impl ManageTodosTool {
    pub fn new(store: TodoStore) -> Self {
        Self { store }
    }

    fn create(&self, input: &Value) -> Result<String, ToolError> {
        // Several field names are accepted for the task text; models vary.
        let content = ["content", "description", "text", "task"]
            .iter()
            .find_map(|field| input.get(field).and_then(Value::as_str))
            .filter(|c| !c.is_empty())
            .ok_or_else(|| {
                ToolError::invalid(
                    "content is required for create action. Provide the task description in the \"content\" field.",
                )
            })?;

        let status = match input
            .get("status")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            None => TodoStatus::Pending,
            Some(raw) => match TodoStatus::parse(raw) {
                Some(status @ (TodoStatus::Pending | TodoStatus::InProgress)) => status,
                _ => {
                    return Err(ToolError::invalid(
                        "status for create must be \"pending\" or \"in_progress\"",
                    ))
                }
            },
        };

        let todo = self.store.create(content, status);
        Ok(format!(
            "TODO created: [{}] {} ({})",
            todo.id, todo.content, todo.status
        ))
    }

    fn update(&self, input: &Value) -> Result<String, ToolError> {
        let id = input
            .get("todo_id")
            .and_then(Value::as_str)
            .filter(|i| !i.is_empty())
            .ok_or_else(|| ToolError::invalid("todo_id is required for update action"))?;

        // Empty strings mean "not provided", matching how models omit fields.
        let status = match input
            .get("status")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
        {
            None => None,
            Some(raw) => Some(TodoStatus::parse(raw).ok_or_else(|| {
                ToolError::invalid(
                    "status must be one of: pending, in_progress, completed, cancelled",
                )
            })?),
        };
        let notes = input
            .get("notes")
            .and_then(Value::as_str)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        if self.store.update(id, status, notes) {
            Ok(format!("TODO updated: [{id}]"))
        } else {
            Ok(format!("Error: TODO [{id}] not found"))
        }
    }

    fn list(&self) -> String {
        let todos = self.store.all();
        if todos.is_empty() {
            return "No TODOs found.".to_string();
        }

        let entries = todos
            .iter()
            .map(|todo| {
                let mut line = format!(
                    "{} [{}] {}: {}",
                    todo.status.marker(),
                    todo.id,
                    todo.status.as_str().to_uppercase(),
                    todo.content
                );
                if let Some(notes) = &todo.notes {
                    line.push_str(&format!("\n   📝 Notes: {notes}"));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n\n");

        format!(
            "TODO List ({} total, {} active):\n\n{entries}",
            todos.len(),
            self.store.active_count()
        )
    }
}

#[async_trait]
impl Tool for ManageTodosTool {
    fn name(&self) -> &str {
        "manage_todos"
    }

    fn description(&self) -> &str {
        "Track work items across the conversation: create a TODO, update its status or notes, or list everything."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "action": {
                    "type": "string",
                    "enum": ["create", "update", "list"],
                    "description": "What to do"
                },
                "content": {
                    "type": "string",
                    "description": "Task description (create)"
                },
                "todo_id": {
                    "type": "string",
                    "description": "Id of the TODO to update"
                },
                "status": {
                    "type": "string",
                    "enum": ["pending", "in_progress", "completed", "cancelled"],
                    "description": "New status"
                },
                "notes": {
                    "type": "string",
                    "description": "Free-form notes to attach (update)"
                }
            },
            "required": ["action"],
            "additionalProperties": true
        })
    }

    async fn execute(&self, input: Value) -> Result<String, ToolError> {
        let action = input.get("action").and_then(Value::as_str).unwrap_or("");
        match action {
            "create" => self.create(&input),
            "update" => self.update(&input),
            "list" => Ok(self.list()),
            _ => Err(ToolError::invalid(
                "action must be one of: create, update, list",
            )),
        }
    }
}

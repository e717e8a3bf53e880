use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    NotInitialized,
    TaskNotFound,
    ChecklistItemNotFound,
    DependencyNotFound,
    DependencyExists,
    ValidationError,
    RemoteError,
    DatabaseError,
    ConfigError,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotInitialized => "NOT_INITIALIZED",
            Self::TaskNotFound => "TASK_NOT_FOUND",
            Self::ChecklistItemNotFound => "CHECKLIST_ITEM_NOT_FOUND",
            Self::DependencyNotFound => "DEPENDENCY_NOT_FOUND",
            Self::DependencyExists => "DEPENDENCY_EXISTS",
            Self::ValidationError => "VALIDATION_ERROR",
            Self::RemoteError => "REMOTE_ERROR",
            Self::DatabaseError => "DATABASE_ERROR",
            Self::ConfigError => "CONFIG_ERROR",
        }
    }

    /// Not-found errors mean the caller's view is stale and should be refreshed.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Self::TaskNotFound | Self::ChecklistItemNotFound | Self::DependencyNotFound
        )
    }
}

#[derive(Debug, Error)]
#[error("{message}")]
pub struct WorktaskError {
    pub code: ErrorCode,
    pub message: String,
}

pub type Result<T, E = WorktaskError> = std::result::Result<T, E>;

impl WorktaskError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    pub fn not_initialized(path: &str) -> Self {
        Self::new(
            ErrorCode::NotInitialized,
            format!("No database at {path}. Run `worktask init` first."),
        )
    }

    pub fn task_not_found(id: i64) -> Self {
        Self::new(ErrorCode::TaskNotFound, format!("Task not found: {id}"))
    }

    pub fn checklist_item_not_found(id: i64) -> Self {
        Self::new(
            ErrorCode::ChecklistItemNotFound,
            format!("Checklist item not found: {id}"),
        )
    }

    pub fn dependency_not_found(id: i64) -> Self {
        Self::new(
            ErrorCode::DependencyNotFound,
            format!("Dependency not found: {id}"),
        )
    }

    pub fn dependency_exists(task_id: i64, depends_on_id: i64) -> Self {
        Self::new(
            ErrorCode::DependencyExists,
            format!("Task {task_id} already depends on task {depends_on_id}"),
        )
    }

    pub fn self_dependency(task_id: i64) -> Self {
        Self::validation(format!("Task {task_id} cannot depend on itself"))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ValidationError, message)
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::RemoteError, message)
    }

    pub fn database(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::DatabaseError, message)
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }
}

impl From<rusqlite::Error> for WorktaskError {
    fn from(e: rusqlite::Error) -> Self {
        Self::database(e.to_string())
    }
}

impl From<ureq::Error> for WorktaskError {
    fn from(e: ureq::Error) -> Self {
        match e {
            ureq::Error::Status(code, resp) => {
                let message = error_message(resp.into_string().unwrap_or_default());
                match code {
                    400 | 422 => Self::validation(message),
                    404 => Self::new(ErrorCode::TaskNotFound, format!("Not found: {message}")),
                    409 => Self::new(ErrorCode::DependencyExists, message),
                    _ => Self::remote(format!("HTTP {code}: {message}")),
                }
            }
            ureq::Error::Transport(t) => Self::remote(t.to_string()),
        }
    }
}

/// The server reports failures as `{"error": "..."}`; other bodies pass through.
fn error_message(body: String) -> String {
    serde_json::from_str::<serde_json::Value>(&body)
        .ok()
        .and_then(|v| v["error"].as_str().map(str::to_string))
        .unwrap_or(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_screaming_snake() {
        assert_eq!(ErrorCode::TaskNotFound.as_str(), "TASK_NOT_FOUND");
        assert_eq!(ErrorCode::ChecklistItemNotFound.as_str(), "CHECKLIST_ITEM_NOT_FOUND");
        assert_eq!(ErrorCode::RemoteError.as_str(), "REMOTE_ERROR");
    }

    #[test]
    fn test_not_found_family() {
        assert!(WorktaskError::task_not_found(1).code.is_not_found());
        assert!(WorktaskError::dependency_not_found(1).code.is_not_found());
        assert!(!WorktaskError::validation("x").code.is_not_found());
    }

    #[test]
    fn test_message_is_display() {
        let e = WorktaskError::self_dependency(7);
        assert_eq!(e.to_string(), "Task 7 cannot depend on itself");
        assert_eq!(e.code, ErrorCode::ValidationError);
    }

    #[test]
    fn test_error_field_is_extracted() {
        assert_eq!(
            error_message(r#"{"error": "Title is required"}"#.into()),
            "Title is required"
        );
        assert_eq!(error_message(r#"{"message": "x"}"#.into()), r#"{"message": "x"}"#);
        assert_eq!(error_message("Bad Gateway".into()), "Bad Gateway");
    }
}

use serde::{Deserialize, Serialize};

use super::{TaskId, TaskStatus};

pub type DependencyId = i64;

/// A directed edge: `task_id` must wait for `depends_on_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub id: DependencyId,
    pub task_id: TaskId,
    pub depends_on_id: TaskId,
}

/// A prerequisite as listed on a task detail record.
///
/// The REST server lists prerequisites as `{id, title, status}` where `id`
/// is the prerequisite task and the edge id is not reported. The local
/// backend sends the full shape, edge id included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireDependencyRef")]
pub struct DependencyRef {
    /// Edge id for `DELETE /dependencies/{id}`, when known.
    pub id: Option<DependencyId>,
    pub depends_on_id: TaskId,
    pub title: String,
    pub status: TaskStatus,
}

#[derive(Deserialize)]
struct WireDependencyRef {
    id: Option<i64>,
    #[serde(default)]
    depends_on_id: Option<TaskId>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    status: TaskStatus,
}

impl From<WireDependencyRef> for DependencyRef {
    fn from(w: WireDependencyRef) -> Self {
        match w.depends_on_id {
            Some(depends_on_id) => Self {
                id: w.id,
                depends_on_id,
                title: w.title,
                status: w.status,
            },
            None => Self {
                id: None,
                depends_on_id: w.id.unwrap_or_default(),
                title: w.title,
                status: w.status,
            },
        }
    }
}

use chrono::{DateTime, Utc};
use serde::Deserialize;

/// One monitor task as reported by `GET /monitor-tasks`
///
/// `status` is `"running"` or `"stopped"`; only running tasks have a live
/// frame stream worth opening.
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorTask {
    pub id: i64,
    pub task_id: i64,
    pub status: String,
    pub task_name: String,
    pub created_at: Option<DateTime<Utc>>,
}

impl MonitorTask {
    pub fn is_running(&self) -> bool {
        self.status == "running"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_list_payload() {
        let payload = r#"[
            {
                "id": 3,
                "task_id": 11,
                "status": "running",
                "task_name": "loading dock cam",
                "created_at": "2025-11-02T08:30:00Z"
            },
            {
                "id": 4,
                "task_id": 12,
                "status": "stopped",
                "task_name": "gate cam",
                "created_at": null
            }
        ]"#;

        let tasks: Vec<MonitorTask> = serde_json::from_str(payload).unwrap();
        assert_eq!(tasks.len(), 2);
        assert!(tasks[0].is_running());
        assert_eq!(tasks[0].task_name, "loading dock cam");
        assert!(!tasks[1].is_running());
        assert!(tasks[1].created_at.is_none());
    }
}

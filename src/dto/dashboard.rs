use crate::domain;
use crate::dto::{Flash, list, task};
use serde::Serialize;
use utoipa::ToSchema;

/// Aggregate counts displayed on the dashboard
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(serde::Deserialize, PartialEq, Eq, Debug))]
pub struct DashboardStats {
    #[schema(example = 3)]
    pub total_lists: i64,
    #[schema(example = 12)]
    pub total_tasks: i64,
    #[schema(example = 5)]
    pub completed_tasks: i64,
    #[schema(example = 7)]
    pub pending_tasks: i64,
}

impl From<domain::dashboard::DashboardStats> for DashboardStats {
    fn from(value: domain::dashboard::DashboardStats) -> Self {
        DashboardStats {
            total_lists: value.total_lists,
            total_tasks: value.task_totals.total(),
            completed_tasks: value.task_totals.completed,
            pending_tasks: value.task_totals.pending,
        }
    }
}

/// Page payload for the dashboard screen
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(serde::Deserialize, Debug))]
pub struct DashboardPage {
    pub stats: DashboardStats,
    #[serde(rename = "recentActivities")]
    pub recent_activities: Vec<task::Task>,
    pub lists: Vec<list::TaskList>,
    pub tasks: Vec<task::Task>,
    pub flash: Option<Flash>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dashboard::TaskTotals;
    use serde_json::json;

    #[test]
    fn stats_sum_and_serialize_in_camel_case() {
        let stats = DashboardStats::from(domain::dashboard::DashboardStats {
            total_lists: 3,
            task_totals: TaskTotals {
                completed: 5,
                pending: 7,
            },
        });

        let serialized = serde_json::to_value(&stats).expect("stats should serialize");
        assert_eq!(
            json!({
                "totalLists": 3,
                "totalTasks": 12,
                "completedTasks": 5,
                "pendingTasks": 7,
            }),
            serialized
        );
    }
}

//! Planned actions and run reports

use crate::orchestrator::Stage;
use crate::resource::ResourceKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type of action performed (or planned) on a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    /// Create a new resource
    Create,
    /// Overwrite configuration of an existing resource
    Update,
    /// Resource already exists, reuse it
    NoOp,
}

impl std::fmt::Display for ActionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActionType::Create => write!(f, "create"),
            ActionType::Update => write!(f, "update"),
            ActionType::NoOp => write!(f, "no-op"),
        }
    }
}

/// A single action on a remote resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Action {
    /// Unique identifier for the action
    pub id: String,

    pub action_type: ActionType,

    pub resource_type: ResourceKind,

    /// Resource name
    pub resource_id: String,

    /// Stage the action belongs to
    pub stage: Stage,

    /// Description of the action
    pub description: String,
}

impl Action {
    pub fn new(
        stage: Stage,
        action_type: ActionType,
        resource_type: ResourceKind,
        resource_id: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        let resource_id = resource_id.into();
        let description = description.into();
        Self {
            id: format!("{}:{}", stage, description.replace(' ', "-")),
            action_type,
            resource_type,
            resource_id,
            stage,
            description,
        }
    }
}

/// Counts of actions per type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionSummary {
    pub create: usize,
    pub update: usize,
    pub no_change: usize,
}

impl ActionSummary {
    fn count<'a>(actions: impl Iterator<Item = &'a Action>) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action.action_type {
                ActionType::Create => summary.create += 1,
                ActionType::Update => summary.update += 1,
                ActionType::NoOp => summary.no_change += 1,
            }
        }
        summary
    }
}

impl std::fmt::Display for ActionSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} to create, {} to update, {} unchanged",
            self.create, self.update, self.no_change
        )
    }
}

/// Outcome counts of a finished run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub created: usize,
    pub reused: usize,
    pub applied: usize,
}

impl std::fmt::Display for RunSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} reused, {} applied",
            self.created, self.reused, self.applied
        )
    }
}

/// Dry-run result: what a provisioning run would do
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plan {
    /// Actions in execution order
    pub actions: Vec<Action>,

    /// Whether any resource would be created
    pub has_creations: bool,
}

impl Plan {
    pub fn new(actions: Vec<Action>) -> Self {
        let has_creations = actions.iter().any(|a| a.action_type == ActionType::Create);
        Self {
            actions,
            has_creations,
        }
    }

    /// Get actions by type
    pub fn actions_by_type(&self, action_type: ActionType) -> Vec<&Action> {
        self.actions
            .iter()
            .filter(|a| a.action_type == action_type)
            .collect()
    }

    pub fn summary(&self) -> ActionSummary {
        ActionSummary::count(self.actions.iter())
    }
}

/// Record of a completed provisioning run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Actions performed, in execution order
    pub actions: Vec<Action>,

    /// Last stage reached
    pub final_stage: Stage,

    pub started_at: DateTime<Utc>,

    /// Total execution time in milliseconds
    pub duration_ms: u64,
}

impl RunReport {
    pub fn new() -> Self {
        Self {
            actions: Vec::new(),
            final_stage: Stage::Start,
            started_at: Utc::now(),
            duration_ms: 0,
        }
    }

    pub fn record(&mut self, action: Action) {
        self.actions.push(action);
    }

    pub fn is_complete(&self) -> bool {
        self.final_stage == Stage::Done
    }

    /// Number of resources of `kind` created by this run
    pub fn created(&self, kind: ResourceKind) -> usize {
        self.actions
            .iter()
            .filter(|a| a.action_type == ActionType::Create && a.resource_type == kind)
            .count()
    }

    pub fn summary(&self) -> RunSummary {
        let counts = ActionSummary::count(self.actions.iter());
        RunSummary {
            created: counts.create,
            reused: counts.no_change,
            applied: counts.update,
        }
    }
}

impl Default for RunReport {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_summary() {
        let plan = Plan::new(vec![
            Action::new(
                Stage::SourceContainerReady,
                ActionType::Create,
                ResourceKind::Bucket,
                "media-primary",
                "bucket",
            ),
            Action::new(
                Stage::SourceContainerReady,
                ActionType::Update,
                ResourceKind::Bucket,
                "media-primary",
                "versioning",
            ),
            Action::new(
                Stage::RoleReady,
                ActionType::NoOp,
                ResourceKind::Role,
                "replicator",
                "role",
            ),
        ]);

        assert!(plan.has_creations);
        assert_eq!(plan.actions_by_type(ActionType::Update).len(), 1);
        assert_eq!(
            plan.summary().to_string(),
            "1 to create, 1 to update, 1 unchanged"
        );
    }

    #[test]
    fn test_action_ids_are_readable() {
        let action = Action::new(
            Stage::ReplicationApplied,
            ActionType::Update,
            ResourceKind::Bucket,
            "media-primary",
            "replication rules",
        );
        assert_eq!(action.id, "replication-applied:replication-rules");
    }

    #[test]
    fn test_report_counts_creations_per_kind() {
        let mut report = RunReport::new();
        report.record(Action::new(
            Stage::SourceContainerReady,
            ActionType::Create,
            ResourceKind::Bucket,
            "a",
            "bucket",
        ));
        report.record(Action::new(
            Stage::DestinationContainerReady,
            ActionType::NoOp,
            ResourceKind::Bucket,
            "b",
            "bucket",
        ));

        report.record(Action::new(
            Stage::DestinationContainerReady,
            ActionType::Update,
            ResourceKind::Bucket,
            "b",
            "versioning",
        ));

        assert_eq!(report.created(ResourceKind::Bucket), 1);
        assert_eq!(report.created(ResourceKind::Role), 0);
        assert!(!report.is_complete());
        assert_eq!(
            report.summary().to_string(),
            "1 created, 1 reused, 1 applied"
        );
    }
}

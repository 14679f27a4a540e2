//! Writes confirmed chat actions to the store.

use async_trait::async_trait;
use tracing::info;

use steward_core::{ActionCommitter, CommittedAction, ProposedAction, Result};

use crate::Database;

#[async_trait]
impl ActionCommitter for Database {
    async fn commit(&self, owner: &str, action: ProposedAction) -> Result<CommittedAction> {
        let committed = match action {
            ProposedAction::CreateTask { task } => {
                CommittedAction::Task(self.tasks.insert(task.into_new_task(owner)).await?)
            }
            ProposedAction::CreateMeeting { meeting } => {
                CommittedAction::Meeting(self.meetings.insert(meeting.into_new_meeting(owner)).await?)
            }
        };

        info!(
            subsystem = "db",
            component = "committer",
            op = "commit",
            identity = owner,
            action_kind = match &committed {
                CommittedAction::Task(_) => "create_task",
                CommittedAction::Meeting(_) => "create_meeting",
            },
            "Confirmed action stored"
        );
        Ok(committed)
    }
}

//! Completion Monitor (§4.7): a detached task per submitted workflow that
//! awaits terminal completion and reconciles the Task Store. No retries —
//! the workflow engine itself provides durability; if this process
//! restarts mid-flight, the monitor is simply lost and the workflow's own
//! state remains the source of truth.

use crate::domain::TaskState;
use crate::logging::OpTimer;
use crate::AppState;

/// Spawn the monitor for `task_id`. Fire-and-forget: the caller does not
/// await this task.
pub fn spawn(state: AppState, task_id: String) {
    tokio::spawn(async move {
        run(state, task_id).await;
    });
}

async fn run(state: AppState, task_id: String) {
    let timer = OpTimer::new("completion_monitor", "await_completion");

    let outcome = state.workflow_client.await_completion(&task_id).await;
    timer.finish_with_result(outcome.as_ref());

    let update = match outcome {
        Ok(result) => {
            state
                .store
                .update_status(&task_id, TaskState::Completed, result, None)
                .await
        }
        Err(e) => {
            state
                .store
                .update_status(&task_id, TaskState::Failed, None, Some(e.to_string()))
                .await
        }
    };

    if let Err(e) = update {
        tracing::error!(task_id = %task_id, error = %e, "completion monitor failed to reconcile task store");
    }
}

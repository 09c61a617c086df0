//! The Task Store: a Redis-backed, materialized projection of task state.
//!
//! The workflow engine owns authoritative task state; this store exists
//! for fast lookup, indexing, and cross-request query (§3 "Ownership and
//! lifecycle"). On divergence, the workflow engine wins — this store is
//! reconciled by the Completion Monitor and the Streaming Bridge, both of
//! which call [`TaskStore::update_status`].

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use serde_json::Value;

use crate::domain::{now_iso8601_millis, Task, TaskState, TaskStatus};
use crate::logging::OpTimer;

/// Terminal tasks get a 24 hour TTL; non-terminal tasks 7 days (§3
/// invariant 8).
const TERMINAL_TTL_SECS: i64 = 24 * 60 * 60;
const NON_TERMINAL_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Tasks older than this, still present in `tasks:by_created`, are
/// force-deleted by the sweep regardless of TTL bookkeeping drift (§4.2).
const SWEEP_MAX_AGE_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(String),
    #[error("redis connection error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("stored task record is malformed: {0}")]
    Malformed(String),
}

/// Abstracts task persistence so the Task Lifecycle Manager, Completion
/// Monitor, and Streaming Bridge never talk to Redis directly.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn put(&self, task: &Task) -> Result<(), StoreError>;
    async fn get(&self, id: &str) -> Result<Task, StoreError>;
    async fn update_status(
        &self,
        id: &str,
        new_state: TaskState,
        artifacts: Option<Value>,
        error: Option<String>,
    ) -> Result<(), StoreError>;
    async fn find_by_metadata(&self, key: &str, value: &str, limit: Option<usize>) -> Result<Vec<Task>, StoreError>;
    async fn sweep(&self) -> Result<SweepReport, StoreError>;
}

/// Outcome of one [`TaskStore::sweep`] pass, logged by the caller.
#[derive(Debug, Default, Clone, Copy)]
pub struct SweepReport {
    pub reconciled_indices: usize,
    pub force_deleted: usize,
}

fn task_key(id: &str) -> String {
    format!("task:{id}")
}

fn by_status_key(state: TaskState) -> String {
    format!("tasks:by_status:{}", state.as_str())
}

fn by_agent_key(agent_id: &str) -> String {
    format!("tasks:by_agent:{agent_id}")
}

fn by_metadata_key(key: &str, value: &str) -> String {
    format!("tasks:by_metadata:{key}:{value}")
}

const BY_CREATED_KEY: &str = "tasks:by_created";

fn unix_seconds(iso8601: &str) -> i64 {
    chrono::DateTime::parse_from_rfc3339(iso8601)
        .map(|dt| dt.timestamp())
        .unwrap_or(0)
}

fn ttl_for(state: TaskState) -> i64 {
    if state.is_terminal() {
        TERMINAL_TTL_SECS
    } else {
        NON_TERMINAL_TTL_SECS
    }
}

/// Flatten `task.metadata` into `(key, value)` pairs for the
/// `tasks:by_metadata:{k}:{v}` indices. Non-scalar values are serialized
/// to their JSON string form so every metadata entry indexes.
fn metadata_pairs(metadata: &HashMap<String, Value>) -> Vec<(String, String)> {
    metadata
        .iter()
        .map(|(k, v)| {
            let value_str = match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (k.clone(), value_str)
        })
        .collect()
}

/// Redis-backed [`TaskStore`].
pub struct RedisTaskStore {
    redis: ConnectionManager,
}

impl RedisTaskStore {
    #[must_use]
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    fn hash_fields(task: &Task) -> Result<Vec<(&'static str, String)>, StoreError> {
        let mut fields = vec![
            ("id", task.id.clone()),
            ("contextId", task.context_id.clone()),
            ("kind", task.kind.clone()),
            ("agentId", task.agent_id.clone()),
            ("state", task.status.state.as_str().to_string()),
            ("timestamp", task.status.timestamp.clone()),
            ("input", task.input.to_string()),
            ("metadata", serde_json::to_string(&task.metadata).map_err(|e| StoreError::Malformed(e.to_string()))?),
            ("createdAt", task.created_at.clone()),
            ("workflowId", task.workflow_id.clone()),
        ];
        if let Some(artifacts) = &task.artifacts {
            fields.push(("artifacts", artifacts.to_string()));
        }
        if let Some(error) = &task.error {
            fields.push(("error", error.clone()));
        }
        Ok(fields)
    }

    fn task_from_hash(id: &str, hash: &HashMap<String, String>) -> Result<Task, StoreError> {
        if hash.is_empty() {
            return Err(StoreError::NotFound(id.to_string()));
        }

        let field = |name: &str| -> Result<String, StoreError> {
            hash.get(name)
                .cloned()
                .ok_or_else(|| StoreError::Malformed(format!("missing field '{name}'")))
        };

        let state = match field("state")?.as_str() {
            "submitted" => TaskState::Submitted,
            "working" => TaskState::Working,
            "completed" => TaskState::Completed,
            "canceled" => TaskState::Canceled,
            "failed" => TaskState::Failed,
            other => return Err(StoreError::Malformed(format!("unknown state '{other}'"))),
        };

        let input = serde_json::from_str(&field("input")?).map_err(|e| StoreError::Malformed(e.to_string()))?;
        let metadata = serde_json::from_str(&field("metadata")?).map_err(|e| StoreError::Malformed(e.to_string()))?;
        let artifacts = hash
            .get("artifacts")
            .map(|s| serde_json::from_str(s))
            .transpose()
            .map_err(|e: serde_json::Error| StoreError::Malformed(e.to_string()))?;

        Ok(Task {
            id: field("id")?,
            context_id: field("contextId")?,
            kind: field("kind")?,
            agent_id: field("agentId")?,
            status: TaskStatus {
                state,
                timestamp: field("timestamp")?,
                message: None,
            },
            input,
            artifacts,
            error: hash.get("error").cloned(),
            metadata,
            created_at: field("createdAt")?,
            workflow_id: field("workflowId")?,
        })
    }
}

#[async_trait]
impl TaskStore for RedisTaskStore {
    async fn put(&self, task: &Task) -> Result<(), StoreError> {
        let timer = OpTimer::new("task_store", "put");
        let mut conn = self.redis.clone();
        let key = task_key(&task.id);
        let ttl = ttl_for(task.status.state);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset_multiple(&key, &Self::hash_fields(task)?);
        pipe.expire(&key, ttl);
        pipe.zadd(BY_CREATED_KEY, &task.id, unix_seconds(&task.created_at));
        pipe.sadd(by_status_key(task.status.state), &task.id);
        pipe.sadd(by_agent_key(&task.agent_id), &task.id);
        for (k, v) in metadata_pairs(&task.metadata) {
            pipe.sadd(by_metadata_key(&k, &v), &task.id);
        }

        let result: Result<(), redis::RedisError> = pipe.query_async(&mut conn).await;
        timer.finish_with_result(result.as_ref());
        result.map_err(StoreError::from)
    }

    async fn get(&self, id: &str) -> Result<Task, StoreError> {
        let mut conn = self.redis.clone();
        let hash: HashMap<String, String> = conn.hgetall(task_key(id)).await?;
        Self::task_from_hash(id, &hash)
    }

    async fn update_status(
        &self,
        id: &str,
        new_state: TaskState,
        artifacts: Option<Value>,
        error: Option<String>,
    ) -> Result<(), StoreError> {
        let timer = OpTimer::new("task_store", "update_status");
        let mut conn = self.redis.clone();

        let mut task = self.get(id).await?;
        let previous_state = task.status.state;

        // Set-once: a task already terminal tolerates a further
        // "already terminal" write as a no-op (§5 monitor-vs-bridge race).
        if previous_state.is_terminal() {
            timer.finish();
            return Ok(());
        }

        task.transition(new_state, artifacts, error);

        let key = task_key(id);
        let ttl = ttl_for(new_state);

        let mut pipe = redis::pipe();
        pipe.atomic();
        pipe.hset_multiple(&key, &Self::hash_fields(&task)?);
        pipe.expire(&key, ttl);
        if previous_state != new_state {
            pipe.srem(by_status_key(previous_state), id);
            pipe.sadd(by_status_key(new_state), id);
        }

        let result: Result<(), redis::RedisError> = pipe.query_async(&mut conn).await;
        timer.finish_with_result(result.as_ref());
        result.map_err(StoreError::from)
    }

    async fn find_by_metadata(&self, key: &str, value: &str, limit: Option<usize>) -> Result<Vec<Task>, StoreError> {
        let mut conn = self.redis.clone();
        let ids: Vec<String> = conn.smembers(by_metadata_key(key, value)).await?;

        let mut tasks = Vec::with_capacity(ids.len());
        for id in ids {
            match self.get(&id).await {
                Ok(task) => tasks.push(task),
                Err(StoreError::NotFound(_)) => continue,
                Err(e) => return Err(e),
            }
            if let Some(limit) = limit {
                if tasks.len() >= limit {
                    break;
                }
            }
        }
        Ok(tasks)
    }

    async fn sweep(&self) -> Result<SweepReport, StoreError> {
        let timer = OpTimer::new("task_store", "sweep");
        let mut conn = self.redis.clone();
        let mut report = SweepReport::default();

        let all_ids: Vec<String> = conn.zrange(BY_CREATED_KEY, 0, -1).await?;
        let now = now_iso8601_millis();
        let now_secs = unix_seconds(&now);

        for id in all_ids {
            let exists: bool = conn.exists(task_key(&id)).await?;
            if !exists {
                self.remove_from_all_indices(&mut conn, &id).await?;
                report.reconciled_indices += 1;
                continue;
            }

            let created_score: Option<f64> = conn.zscore(BY_CREATED_KEY, &id).await?;
            let age_secs = created_score.map(|s| now_secs - s as i64).unwrap_or(0);
            if age_secs > SWEEP_MAX_AGE_SECS {
                if let Ok(task) = self.get(&id).await {
                    if task.status.state.is_terminal() {
                        let _: () = conn.del(task_key(&id)).await?;
                        self.remove_from_all_indices(&mut conn, &id).await?;
                        report.force_deleted += 1;
                    }
                }
            }
        }

        timer.finish();
        Ok(report)
    }
}

impl RedisTaskStore {
    /// Remove `id` from every index it might appear in. Used by the sweep
    /// when the primary hash no longer exists (or is force-deleted).
    async fn remove_from_all_indices(&self, conn: &mut ConnectionManager, id: &str) -> Result<(), StoreError> {
        let _: () = conn.zrem(BY_CREATED_KEY, id).await?;
        for state in [
            TaskState::Submitted,
            TaskState::Working,
            TaskState::Completed,
            TaskState::Canceled,
            TaskState::Failed,
        ] {
            let _: () = conn.srem(by_status_key(state), id).await?;
        }
        // Agent and metadata indices are not enumerable without a scan;
        // they self-heal because `find_by_metadata`/lookups skip missing
        // ids rather than erroring (§4.2).
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn hash_fields_roundtrip_through_task_from_hash() {
        let task = Task::new("t-1".into(), "echo-agent".into(), json!({"text": "hi"}), HashMap::new());
        let fields = RedisTaskStore::hash_fields(&task).unwrap();
        let hash: HashMap<String, String> = fields.into_iter().map(|(k, v)| (k.to_string(), v)).collect();

        let restored = RedisTaskStore::task_from_hash("t-1", &hash).unwrap();
        assert_eq!(restored.id, task.id);
        assert_eq!(restored.agent_id, task.agent_id);
        assert_eq!(restored.status.state, TaskState::Submitted);
    }

    #[test]
    fn empty_hash_is_not_found() {
        let err = RedisTaskStore::task_from_hash("missing", &HashMap::new()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn metadata_pairs_flattens_non_string_values() {
        let mut metadata = HashMap::new();
        metadata.insert("project".to_string(), json!("mx"));
        metadata.insert("retries".to_string(), json!(3));
        let pairs: HashMap<_, _> = metadata_pairs(&metadata).into_iter().collect();
        assert_eq!(pairs.get("project").unwrap(), "mx");
        assert_eq!(pairs.get("retries").unwrap(), "3");
    }

    #[test]
    fn ttl_differs_between_terminal_and_non_terminal() {
        assert_eq!(ttl_for(TaskState::Completed), TERMINAL_TTL_SECS);
        assert_eq!(ttl_for(TaskState::Working), NON_TERMINAL_TTL_SECS);
    }
}

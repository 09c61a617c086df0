//! The Workflow Client: an abstract interface over the external, durable
//! workflow engine this gateway drives (§4.4). The engine itself, and the
//! agent worker processes that implement workflows, are out of scope —
//! this module only talks to them.

pub mod client;

pub use client::{GrpcWorkflowClient, WorkflowClient, WorkflowClientError};

//! The report status state machine.
//!
//! Every status write goes through [`authorize`], which knows the complete
//! set of legal edges, who may take each one, and which operation must be
//! used. Anything not listed in [`EDGES`] is rejected.
//!
//! ```text
//! submitted ──► under_review ──► assigned ──► in_progress ──► resolved ──► closed
//!     │              │                                                    ▲
//!     └──────────────┴──────────────► rejected ───────────────────────────┘
//! ```

use thiserror::Error;

use crate::features::auth::model::Role;
use crate::features::reports::models::ReportStatus;

/// Who is asking for a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Authority,
    Worker,
}

impl From<Role> for Actor {
    fn from(role: Role) -> Self {
        match role {
            Role::Authority => Actor::Authority,
            Role::Worker => Actor::Worker,
        }
    }
}

impl std::fmt::Display for Actor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Actor::Authority => write!(f, "authority"),
            Actor::Worker => write!(f, "worker"),
        }
    }
}

/// The API operation carrying a status change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    /// `PATCH /api/reports/{id}/status`
    StatusUpdate,
    /// `POST /api/reports/{id}/assign`, which also records the worker
    Assign,
    /// `POST /api/reports/{id}/resolve`, which requires verified proof
    Resolve,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operation::StatusUpdate => write!(f, "status update"),
            Operation::Assign => write!(f, "assign"),
            Operation::Resolve => write!(f, "resolve"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Cannot move a report from {from} to {to}")]
    IllegalTransition { from: ReportStatus, to: ReportStatus },

    #[error("A {actor} may not move a report to {to}")]
    ActorNotPermitted { actor: Actor, to: ReportStatus },

    #[error("Moving a report to {to} requires the {operation} operation")]
    RequiresDedicatedOperation {
        to: ReportStatus,
        operation: Operation,
    },

    #[error("A reason is required to reject a report")]
    ReasonRequired,
}

struct Edge {
    from: ReportStatus,
    to: ReportStatus,
    actor: Actor,
    via: Operation,
}

const fn edge(from: ReportStatus, to: ReportStatus, actor: Actor, via: Operation) -> Edge {
    Edge {
        from,
        to,
        actor,
        via,
    }
}

/// The complete set of legal status changes
const EDGES: [Edge; 8] = [
    edge(
        ReportStatus::Submitted,
        ReportStatus::UnderReview,
        Actor::Authority,
        Operation::StatusUpdate,
    ),
    edge(
        ReportStatus::Submitted,
        ReportStatus::Rejected,
        Actor::Authority,
        Operation::StatusUpdate,
    ),
    edge(
        ReportStatus::UnderReview,
        ReportStatus::Assigned,
        Actor::Authority,
        Operation::Assign,
    ),
    edge(
        ReportStatus::UnderReview,
        ReportStatus::Rejected,
        Actor::Authority,
        Operation::StatusUpdate,
    ),
    edge(
        ReportStatus::Assigned,
        ReportStatus::InProgress,
        Actor::Worker,
        Operation::StatusUpdate,
    ),
    edge(
        ReportStatus::InProgress,
        ReportStatus::Resolved,
        Actor::Worker,
        Operation::Resolve,
    ),
    edge(
        ReportStatus::Resolved,
        ReportStatus::Closed,
        Actor::Authority,
        Operation::StatusUpdate,
    ),
    edge(
        ReportStatus::Rejected,
        ReportStatus::Closed,
        Actor::Authority,
        Operation::StatusUpdate,
    ),
];

/// Check that `actor` may move a report from `from` to `to` using `via`
///
/// Checks run in order: the edge must exist, the actor must own it, and the
/// operation must be the one the edge requires.
pub fn authorize(
    from: ReportStatus,
    to: ReportStatus,
    actor: Actor,
    via: Operation,
) -> Result<(), TransitionError> {
    let edge = EDGES
        .iter()
        .find(|e| e.from == from && e.to == to)
        .ok_or(TransitionError::IllegalTransition { from, to })?;

    if edge.actor != actor {
        return Err(TransitionError::ActorNotPermitted { actor, to });
    }

    if edge.via != via {
        return Err(TransitionError::RequiresDedicatedOperation {
            to,
            operation: edge.via,
        });
    }

    Ok(())
}

/// Rejections must carry a non-blank reason for the citizen
pub fn require_reason(to: ReportStatus, reason: Option<&str>) -> Result<(), TransitionError> {
    let has_reason = reason.is_some_and(|r| !r.trim().is_empty());
    if to == ReportStatus::Rejected && !has_reason {
        return Err(TransitionError::ReasonRequired);
    }
    Ok(())
}

/// Statuses `actor` can reach from `from` with a plain status update
pub fn next_statuses(from: ReportStatus, actor: Actor) -> Vec<ReportStatus> {
    EDGES
        .iter()
        .filter(|e| e.from == from && e.actor == actor && e.via == Operation::StatusUpdate)
        .map(|e| e.to)
        .collect()
}

//! Placement Audit Channel
//!
//! Committed placement changes are published to a bounded mpsc channel and
//! drained by a background task into the `audit` tracing target. Publishing
//! never blocks and never fails the request that produced the event.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use super::types::{Actor, PromotionRecord, StudentId, TransferRecord};

// ============================================================================
// Audit Events
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    Transfer {
        student_id: StudentId,
        record: TransferRecord,
    },
    Promotion {
        student_id: StudentId,
        record: PromotionRecord,
    },
    Graduation {
        student_id: StudentId,
        graduation_year: i32,
        clearance_status: String,
        performed_by: Actor,
        timestamp: DateTime<Utc>,
    },
    Withdrawal {
        student_id: StudentId,
        reason: String,
        performed_by: Actor,
        timestamp: DateTime<Utc>,
    },
}

impl AuditEvent {
    pub fn student_id(&self) -> &StudentId {
        match self {
            AuditEvent::Transfer { student_id, .. }
            | AuditEvent::Promotion { student_id, .. }
            | AuditEvent::Graduation { student_id, .. }
            | AuditEvent::Withdrawal { student_id, .. } => student_id,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            AuditEvent::Transfer { .. } => "transfer",
            AuditEvent::Promotion { .. } => "promotion",
            AuditEvent::Graduation { .. } => "graduation",
            AuditEvent::Withdrawal { .. } => "withdrawal",
        }
    }
}

// ============================================================================
// Audit Channel
// ============================================================================

/// Sender side, held by the placement service
#[derive(Clone)]
pub struct AuditSender {
    tx: mpsc::Sender<AuditEvent>,
}

impl AuditSender {
    /// Fire-and-forget publish. A full or closed channel is logged and dropped.
    pub fn publish(&self, event: AuditEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(
                    student_id = %event.student_id(),
                    kind = event.kind(),
                    "Audit queue full, event dropped"
                );
            }
            Err(TrySendError::Closed(event)) => {
                warn!(
                    student_id = %event.student_id(),
                    kind = event.kind(),
                    "Audit channel closed, event dropped"
                );
            }
        }
    }
}

/// Receiver side, drained by [`spawn_audit_logger`]
pub struct AuditReceiver {
    rx: mpsc::Receiver<AuditEvent>,
}

impl AuditReceiver {
    /// Try to receive an event (non-blocking)
    pub fn try_recv(&mut self) -> Option<AuditEvent> {
        self.rx.try_recv().ok()
    }

    /// Receive an event (waits until available or all senders are gone)
    pub async fn recv(&mut self) -> Option<AuditEvent> {
        self.rx.recv().await
    }
}

/// Create a new audit channel pair
pub fn audit_channel(buffer: usize) -> (AuditSender, AuditReceiver) {
    let (tx, rx) = mpsc::channel(buffer.max(1));
    (AuditSender { tx }, AuditReceiver { rx })
}

/// Drain the channel into the `audit` log target until every sender is dropped.
/// Resolves to the number of events written.
pub fn spawn_audit_logger(mut receiver: AuditReceiver) -> JoinHandle<usize> {
    tokio::spawn(async move {
        let mut written = 0usize;
        while let Some(event) = receiver.recv().await {
            match serde_json::to_string(&event) {
                Ok(json) => {
                    info!(
                        target: "audit",
                        student_id = %event.student_id(),
                        kind = event.kind(),
                        "{}",
                        json
                    );
                    written += 1;
                }
                Err(e) => {
                    error!(student_id = %event.student_id(), error = %e, "Failed to encode audit event");
                }
            }
        }
        info!(written, "Audit logger stopped");
        written
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn withdrawal(id: &str) -> AuditEvent {
        AuditEvent::Withdrawal {
            student_id: StudentId::new(id).unwrap(),
            reason: "relocation".into(),
            performed_by: Actor::new("admin-1"),
            timestamp: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_publish_and_receive() {
        let (sender, mut receiver) = audit_channel(4);
        sender.publish(withdrawal("STU-1"));

        let event = receiver.recv().await.unwrap();
        assert_eq!(event.student_id().as_str(), "STU-1");
        assert_eq!(event.kind(), "withdrawal");
    }

    #[tokio::test]
    async fn test_full_queue_drops_without_blocking() {
        let (sender, mut receiver) = audit_channel(1);
        sender.publish(withdrawal("STU-1"));
        sender.publish(withdrawal("STU-2"));

        assert_eq!(receiver.try_recv().unwrap().student_id().as_str(), "STU-1");
        assert!(receiver.try_recv().is_none());
    }

    #[tokio::test]
    async fn test_closed_channel_is_not_an_error() {
        let (sender, receiver) = audit_channel(1);
        drop(receiver);
        sender.publish(withdrawal("STU-1"));
    }

    #[tokio::test]
    async fn test_logger_counts_events() {
        let (sender, receiver) = audit_channel(8);
        let handle = spawn_audit_logger(receiver);
        sender.publish(withdrawal("STU-1"));
        sender.publish(withdrawal("STU-2"));
        drop(sender);

        assert_eq!(handle.await.unwrap(), 2);
    }

    #[test]
    fn test_event_json_is_tagged() {
        let json = serde_json::to_value(withdrawal("STU-1")).unwrap();
        assert_eq!(json["event"], "withdrawal");
        assert_eq!(json["student_id"], "STU-1");
    }
}

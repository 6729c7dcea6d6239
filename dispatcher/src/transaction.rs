use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use secs2::Message;
use tokio::sync::oneshot;

use crate::error::DispatchError;

/// Owned exclusively by the dispatcher task (§4.8, §5 "the transaction table is owned by the
/// dispatcher"): maps outstanding `system_bytes` to the oneshot that will carry the matching
/// reply. `await_reply` races the oneshot against a `T3` deadline.
#[derive(Default)]
pub struct TransactionTable {
    pending: Mutex<HashMap<u32, oneshot::Sender<Message>>>,
}

impl TransactionTable {
    pub fn new() -> TransactionTable {
        TransactionTable::default()
    }

    /// Registers a W=1 primary just sent with `system_bytes`, returning a future that resolves
    /// to the reply or a `T3Timeout`/`ConnectionLost`.
    pub async fn await_reply(&self, system_bytes: u32, t3: Duration) -> Result<Message, DispatchError> {
        let (tx, rx) = oneshot::channel();
        self.pending.lock().unwrap().insert(system_bytes, tx);
        let outcome = tokio::time::timeout(t3, rx).await;
        self.pending.lock().unwrap().remove(&system_bytes);
        match outcome {
            Ok(Ok(reply)) => Ok(reply),
            Ok(Err(_)) => Err(DispatchError::ConnectionLost),
            Err(_) => Err(DispatchError::T3Timeout),
        }
    }

    /// A reply frame arrived; routes it to the waiter registered under its `system_bytes`.
    /// Returns `true` if a waiter was found (per §4.8 "correlate responses to waiters").
    pub fn complete(&self, system_bytes: u32, reply: Message) -> bool {
        if let Some(tx) = self.pending.lock().unwrap().remove(&system_bytes) {
            tx.send(reply).is_ok()
        } else {
            false
        }
    }

    /// All pending entries fail with `ConnectionLost` (§4.8, §7, §8 scenario 6), by simply
    /// dropping their senders: each waiter's `rx.await` resolves to `Err`, mapped above.
    pub fn fail_all_connection_lost(&self) {
        self.pending.lock().unwrap().clear();
    }

    pub fn outstanding_count(&self) -> usize {
        self.pending.lock().unwrap().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secs2::Message;

    #[tokio::test]
    async fn reply_within_t3_resolves() {
        let table = TransactionTable::new();
        let table = std::sync::Arc::new(table);
        let t2 = table.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            assert!(t2.complete(42, Message::new(1, 2, 1, 42)));
        });
        let reply = table.await_reply(42, Duration::from_millis(200)).await.unwrap();
        assert_eq!(reply.system_bytes, 42);
    }

    #[tokio::test]
    async fn no_reply_times_out() {
        let table = TransactionTable::new();
        let err = table.await_reply(7, Duration::from_millis(20)).await.unwrap_err();
        assert!(matches!(err, DispatchError::T3Timeout));
        assert_eq!(table.outstanding_count(), 0);
    }

    #[tokio::test]
    async fn connection_lost_fails_outstanding() {
        let table = std::sync::Arc::new(TransactionTable::new());
        let t2 = table.clone();
        let waiter = tokio::spawn(async move { t2.await_reply(1, Duration::from_secs(5)).await });
        tokio::time::sleep(Duration::from_millis(10)).await;
        table.fail_all_connection_lost();
        let err = waiter.await.unwrap().unwrap_err();
        assert!(matches!(err, DispatchError::ConnectionLost));
    }
}

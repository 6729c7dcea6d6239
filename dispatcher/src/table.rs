use std::collections::HashMap;
use std::time::Duration;

use log::{debug, warn};
use secs2::{Item, Message};

use crate::catalog::{handler_table, HandlerFn};
use crate::context::DeviceContext;
use crate::events::{s5f1_item, s6f11_item};
use crate::transaction::TransactionTable;

/// S9F5 Unrecognized Function body: echoes the offending header bytes, the conventional SECS-II
/// shape for this reject family.
fn unrecognized_function(msg: &Message) -> Message {
    Message::new(9, 5, msg.device_id, msg.system_bytes).with_item(Item::Binary(vec![msg.stream, msg.function]))
}

/// The inbound pipeline of §4.8: `framer → gate → dispatcher`. Owns the handler table and the
/// transaction table; the `equipment` binary owns the actual socket and feeds decoded primaries
/// in here and routes `dispatch_primary`'s `Some(reply)` back out to the writer task.
pub struct Dispatcher {
    pub context: DeviceContext,
    pub transactions: TransactionTable,
    handlers: HashMap<(u8, u8), HandlerFn>,
}

impl Dispatcher {
    pub fn new(context: DeviceContext) -> Dispatcher {
        Dispatcher {
            context,
            transactions: TransactionTable::new(),
            handlers: handler_table(),
        }
    }

    /// Routes one decoded inbound primary. Returns the reply to send, if any: either the
    /// handler's documented reply, or `S9F5` for a phase violation or missing handler (the
    /// chosen resolution of §9 design note (a) — see DESIGN.md).
    pub fn dispatch_primary(&self, msg: &Message) -> Option<Message> {
        let permitted = self.context.phase.lock().unwrap().permitted(msg.stream, msg.function);
        if !permitted {
            warn!(
                "S{}F{} rejected: below required GEM phase (current {:?})",
                msg.stream,
                msg.function,
                self.context.phase.lock().unwrap().phase()
            );
            return msg.w.then(|| unrecognized_function(msg));
        }
        let Some(handler) = self.handlers.get(&(msg.stream, msg.function)) else {
            warn!("S{}F{} has no registered handler", msg.stream, msg.function);
            return msg.w.then(|| unrecognized_function(msg));
        };
        debug!("dispatching S{}F{}", msg.stream, msg.function);
        let reply_item = handler(msg, &self.context);
        msg.w.then(|| msg.reply(Some(reply_item)))
    }

    /// A reply frame arrived off the wire; routes it to the waiter registered for its
    /// `system_bytes`. Returns `true` if a waiter claimed it.
    pub fn on_reply(&self, msg: Message) -> bool {
        self.transactions.complete(msg.system_bytes, msg)
    }

    /// An equipment-initiated primary (S1F13, S5F1, S6F11, …) with `W=1`: allocates fresh
    /// system-bytes, registers the transaction, and hands the fully-built message back to the
    /// caller to actually put on the wire, then awaits the reply against `T3`.
    pub fn prepare_outbound(&self, stream: u8, function: u8, item: Option<Item>) -> Message {
        let system_bytes = self.context.next_system_bytes();
        let mut msg = Message::new(stream, function, self.context.device_id, system_bytes).with_reply_expected(true);
        if let Some(item) = item {
            msg = msg.with_item(item);
        }
        msg
    }

    pub async fn await_reply(&self, system_bytes: u32, t3: Duration) -> Result<Message, crate::error::DispatchError> {
        self.transactions.await_reply(system_bytes, t3).await
    }

    /// Drains the spontaneous primaries (`S6F11`s from control-state transitions, …) a handler
    /// queued on `self.context` during the last `dispatch_primary` call. The caller is
    /// responsible for putting these on the wire and tracking their own replies.
    pub fn drain_pending_events(&self) -> Vec<Message> {
        self.context.drain_events()
    }

    /// A collection event fired (PLC-driven or internal): materializes its linked reports and
    /// builds the outbound `S6F11`, if the CEID is enabled and linked to anything (§4.7, §8
    /// scenario 2). Returns `None` when there is nothing to send — not every event has a report.
    pub fn trigger_event(&self, ceid: u32) -> Option<Message> {
        let (dataid, reports) = self.context.reports.trigger(&self.context.registry, ceid)?;
        let item = s6f11_item(dataid, ceid, &reports);
        Some(self.prepare_outbound(6, 11, Some(item)))
    }

    /// Sets an alarm active, building the outbound `S5F1` only on the inactive→active edge
    /// (§4.9, §8 scenario 5).
    pub fn set_alarm(&self, alid: u32, text: Option<String>, now: u64) -> Result<Option<Message>, crate::error::DispatchError> {
        let report = equipment_model::AlarmEngine::set_alarm(&self.context.registry, alid, text, now)?;
        Ok(report.map(|r| self.prepare_outbound(5, 1, Some(s5f1_item(&r)))))
    }

    /// Clears an alarm, building the outbound `S5F1` only on the active→inactive edge.
    pub fn clear_alarm(&self, alid: u32) -> Result<Option<Message>, crate::error::DispatchError> {
        let report = equipment_model::AlarmEngine::clear_alarm(&self.context.registry, alid)?;
        Ok(report.map(|r| self.prepare_outbound(5, 1, Some(s5f1_item(&r)))))
    }

    /// Connection lost: cascades through the GEM state machines and fails every outstanding
    /// transaction (§4.4, §4.8, §7, §8 scenario 6).
    pub fn on_connection_lost(&self) {
        self.context.on_connection_lost();
        self.transactions.fail_all_connection_lost();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dispatcher_online() -> Dispatcher {
        let ctx = DeviceContext::new(1, "AIMFAB", "V01R01");
        ctx.phase.lock().unwrap().on_hsms_connected().unwrap();
        ctx.phase.lock().unwrap().on_hsms_selected().unwrap();
        Dispatcher::new(ctx)
    }

    #[test]
    fn s1f1_dispatches_and_replies() {
        let d = dispatcher_online();
        let msg = Message::new(1, 1, 1, 1).with_reply_expected(true);
        let reply = d.dispatch_primary(&msg).unwrap();
        assert_eq!(reply.function, 2);
        assert_eq!(reply.system_bytes, 1);
    }

    #[test]
    fn phase_violation_yields_s9f5() {
        let d = dispatcher_online();
        let msg = Message::new(2, 33, 1, 9).with_reply_expected(true);
        let reply = d.dispatch_primary(&msg).unwrap();
        assert_eq!((reply.stream, reply.function), (9, 5));
    }

    #[test]
    fn phase_violation_without_w_produces_no_reply() {
        let d = dispatcher_online();
        let msg = Message::new(2, 33, 1, 9);
        assert!(d.dispatch_primary(&msg).is_none());
    }

    #[test]
    fn unknown_handler_yields_s9f5() {
        let d = dispatcher_online();
        d.context.phase.lock().unwrap().on_comm_established(0).unwrap();
        d.context.phase.lock().unwrap().on_online_ack(0).unwrap();
        let msg = Message::new(3, 1, 1, 1).with_reply_expected(true);
        let reply = d.dispatch_primary(&msg).unwrap();
        assert_eq!((reply.stream, reply.function), (9, 5));
    }

    #[tokio::test]
    async fn connection_lost_fails_outstanding_transactions() {
        let d = dispatcher_online();
        let outbound = d.prepare_outbound(1, 13, None);
        let wait = d.await_reply(outbound.system_bytes, Duration::from_secs(5));
        tokio::pin!(wait);
        tokio::select! {
            _ = &mut wait => panic!("should not resolve yet"),
            _ = tokio::time::sleep(Duration::from_millis(10)) => {}
        }
        d.on_connection_lost();
        let err = wait.await.unwrap_err();
        assert!(matches!(err, crate::error::DispatchError::ConnectionLost));
    }
}

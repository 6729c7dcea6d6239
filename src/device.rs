//! Per-device actor wiring (SPEC_FULL.md §5.1): one `TcpStream`, a reader task, a writer task, a
//! timer task, and the dispatcher — tied together with bounded channels, matching §5's
//! "Scheduling model".

use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use log::{debug, error, info, warn};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, oneshot};

use dispatcher::{DeviceContext, Dispatcher};
use equipment_model::{AlidEntry, CeidEntry, EcidEntry, SvidEntry};
use hsms::{ConnectionEvent, ConnectionMachine, ControlMessage, ControlType, Frame, FramerConfig, TimerConfig};
use secs2::Message;

use crate::adapters::{MappingStore, PlcLink};
use crate::config::{DefaultControlState, DeviceConfig, Role};

const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Tracks the one outstanding Linktest.req at a time: its system bytes, and the channel its
/// matching Linktest.rsp (seen in `handle_control_message`) wakes up, per §5 "Timer discipline"
/// T6 enforcement on the linktest round trip.
type LinktestWaiter = Arc<Mutex<Option<(u32, oneshot::Sender<()>)>>>;

/// Builds the `DeviceContext` (registries + GEM machines) from the device's TOML bootstrap
/// tables, per §4.6 "bootstraps from the configured ... tables at device start", and applies
/// persisted ECID values if `persist_ecids` is set (§9 design note (b)).
fn build_context(cfg: &DeviceConfig, store: &dyn MappingStore) -> DeviceContext {
    let ctx = DeviceContext::new(cfg.device_id, cfg.model_name.clone(), cfg.software_revision.clone())
        .with_default_control_state(cfg.default_control_state.into());

    ctx.registry.bootstrap_svids(
        cfg.svids
            .iter()
            .map(|s| SvidEntry::new(s.svid, s.name.clone(), s.default.clone().into_item(), s.read_only))
            .collect(),
    );
    ctx.registry.bootstrap_ecids(
        cfg.ecids
            .iter()
            .map(|e| EcidEntry::new(e.ecid, e.name.clone(), e.default.clone().into_item(), e.min, e.max))
            .collect(),
    );
    ctx.registry.bootstrap_alids(
        cfg.alids
            .iter()
            .map(|a| AlidEntry::new(a.alid, a.name.clone(), a.category.clone(), a.priority))
            .collect(),
    );
    ctx.registry.bootstrap_ceids(
        cfg.ceids
            .iter()
            .map(|c| CeidEntry::new(c.ceid, c.name.clone(), c.enabled))
            .collect(),
    );

    if cfg.persist_ecids {
        match store.load(cfg.device_id) {
            Ok(persisted) => {
                for (ecid, value) in persisted.ecid_values {
                    if let Err(e) = ctx.registry.write_ecid(ecid, value) {
                        warn!("device {}: failed to restore persisted ECID {ecid}: {e}", cfg.device_id);
                    }
                }
                for ceid in persisted.enabled_ceids {
                    let _ = ctx.registry.set_ceid_enabled(ceid, true);
                }
                for (rptid, vids) in &persisted.reports {
                    ctx.reports.define_report(&ctx.registry, *rptid, vids.clone());
                }
                for (ceid, rptids) in &persisted.linkages {
                    ctx.reports.link_event_report(&ctx.registry, *ceid, rptids.clone());
                }
            }
            Err(e) => warn!("device {}: could not load persisted state: {e}", cfg.device_id),
        }
    }

    ctx
}

/// Runs one equipment instance to completion (it only returns on an unrecoverable I/O error;
/// a dropped host connection just resets back to listening/reconnecting).
pub async fn run_device(cfg: DeviceConfig, store: Arc<dyn MappingStore>, _plc: Arc<dyn PlcLink>) -> Result<()> {
    let dispatcher = Arc::new(Dispatcher::new(build_context(&cfg, store.as_ref())));
    let timers = TimerConfig {
        t3: Duration::from_millis(cfg.t3_ms),
        t5: Duration::from_millis(cfg.t5_ms),
        t6: Duration::from_millis(cfg.t6_ms),
        t7: Duration::from_millis(cfg.t7_ms),
        t8: Duration::from_millis(cfg.t8_ms),
        linktest_interval: Duration::from_millis(cfg.linktest_interval_ms),
    };

    loop {
        let stream = match cfg.role {
            Role::Passive => accept_one(&cfg.bind_or_connect).await?,
            Role::Active => connect_with_throttle(&cfg.bind_or_connect, timers.t5).await?,
        };
        info!("device {}: TCP link established ({})", cfg.device_id, cfg.bind_or_connect);
        if let Err(e) = run_session(&cfg, &dispatcher, &timers, stream).await {
            warn!("device {}: session ended: {e}", cfg.device_id);
        }
        dispatcher.on_connection_lost();
    }
}

async fn accept_one(bind_addr: &str) -> Result<TcpStream> {
    let listener = TcpListener::bind(bind_addr).await.with_context(|| format!("binding {bind_addr}"))?;
    let (stream, peer) = listener.accept().await.context("accepting host connection")?;
    debug!("accepted connection from {peer}");
    Ok(stream)
}

async fn connect_with_throttle(addr: &str, t5: Duration) -> Result<TcpStream> {
    loop {
        match TcpStream::connect(addr).await {
            Ok(stream) => return Ok(stream),
            Err(e) => {
                warn!("connect to {addr} failed ({e}), retrying after T5");
                tokio::time::sleep(t5).await;
            }
        }
    }
}

/// Drives one TCP session end to end: reader, writer, and timer tasks, until the link drops.
async fn run_session(
    cfg: &DeviceConfig,
    dispatcher: &Arc<Dispatcher>,
    timers: &TimerConfig,
    stream: TcpStream,
) -> Result<()> {
    let (mut read_half, mut write_half) = stream.into_split();
    let (outbound_tx, outbound_rx) = mpsc::channel::<Frame>(OUTBOUND_QUEUE_CAPACITY);
    let connection = Arc::new(std::sync::Mutex::new(ConnectionMachine::new()));
    let linktest_waiter: LinktestWaiter = Arc::new(Mutex::new(None));
    connection.lock().unwrap().on_tcp_up();
    dispatcher.context.phase.lock().unwrap().on_hsms_connected().ok();

    if cfg.role == Role::Active {
        select_active(&mut read_half, &mut write_half, &connection, dispatcher, timers, cfg).await?;
    }

    let writer = tokio::spawn(writer_task(write_half, outbound_rx));
    let reader = reader_task(
        read_half,
        dispatcher.clone(),
        connection.clone(),
        outbound_tx.clone(),
        linktest_waiter.clone(),
        timers.clone(),
        cfg.auto_online,
        cfg.default_control_state,
    );
    let linktest = linktest_task(
        connection.clone(),
        outbound_tx.clone(),
        linktest_waiter,
        timers.linktest_interval,
        timers.t6,
        cfg.device_id,
    );

    tokio::select! {
        result = reader => result?,
        result = writer => result.context("writer task panicked")??,
        result = linktest => result?,
    }
    Ok(())
}

/// Per SEMI E37, the active role must initiate Select; the passive role only ever receives a
/// Select.req (handled in `handle_control_message`). Runs before the reader/writer tasks spawn
/// so the handshake can use the raw split halves directly rather than threading through the
/// outbound queue, and enforces T6 on the Select.rsp wait per §5 "Timer discipline".
async fn select_active<R, W>(
    read_half: &mut R,
    write_half: &mut W,
    connection: &Arc<std::sync::Mutex<ConnectionMachine>>,
    dispatcher: &Dispatcher,
    timers: &TimerConfig,
    cfg: &DeviceConfig,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let system_bytes = dispatcher.context.next_system_bytes();
    let req = ControlMessage {
        session_id: cfg.device_id,
        system_bytes,
        ctrl: ControlType::SelectReq,
        byte3: 0,
    };
    hsms::write_frame(write_half, &Frame::Control(req)).await.context("writing active-role Select.req")?;

    let framer_cfg = FramerConfig {
        t8: timers.t8,
        ..FramerConfig::default()
    };
    let frame = hsms::with_deadline(
        timers.t6,
        hsms::read_frame(read_half, &framer_cfg),
        hsms::HsmsError::T6Expired,
    )
    .await
    .context("awaiting Select.rsp")?
    .context("reading Select.rsp frame")?;

    match frame {
        Frame::Control(ControlMessage {
            ctrl: ControlType::SelectRsp,
            byte3,
            ..
        }) => {
            if connection.lock().unwrap().on_select_rsp(byte3) == Some(ConnectionEvent::Selected) {
                dispatcher.context.phase.lock().unwrap().on_hsms_selected().ok();
                if cfg.auto_online {
                    apply_auto_online(dispatcher, cfg.default_control_state);
                }
                Ok(())
            } else {
                Err(anyhow::anyhow!("active-role Select.req rejected (status {byte3})"))
            }
        }
        other => Err(anyhow::anyhow!("expected Select.rsp after active-role Select.req, got {other:?}")),
    }
}

async fn writer_task<W: AsyncWrite + Unpin>(mut write_half: W, mut outbound_rx: mpsc::Receiver<Frame>) -> Result<()> {
    while let Some(frame) = outbound_rx.recv().await {
        hsms::write_frame(&mut write_half, &frame).await.context("writing HSMS frame")?;
    }
    Ok(())
}

/// Sends Linktest.req on `interval` while Selected and idle, and enforces T6 on the matching
/// Linktest.rsp (§5 "Timer discipline", §4.3): a response that doesn't arrive in time closes the
/// link, same as any other T6 expiry.
async fn linktest_task(
    connection: Arc<std::sync::Mutex<ConnectionMachine>>,
    outbound_tx: mpsc::Sender<Frame>,
    waiter: LinktestWaiter,
    interval: Duration,
    t6: Duration,
    device_id: u16,
) -> Result<()> {
    let mut ticker = tokio::time::interval(interval);
    let mut next_system_bytes: u32 = 1;
    loop {
        ticker.tick().await;
        if !connection.lock().unwrap().is_selected() {
            continue;
        }
        let system_bytes = next_system_bytes;
        next_system_bytes = next_system_bytes.wrapping_add(1);
        let (tx, rx) = oneshot::channel();
        *waiter.lock().unwrap() = Some((system_bytes, tx));

        let linktest = ControlMessage {
            session_id: device_id,
            system_bytes,
            ctrl: ControlType::LinktestReq,
            byte3: 0,
        };
        if outbound_tx.send(Frame::Control(linktest)).await.is_err() {
            return Ok(());
        }

        match hsms::with_deadline(t6, rx, hsms::HsmsError::T6Expired).await {
            Ok(Ok(())) => {}
            _ => {
                warn!("device {device_id}: Linktest.rsp not received within T6, closing link");
                waiter.lock().unwrap().take();
                connection.lock().unwrap().on_disconnect();
                return Err(hsms::HsmsError::T6Expired.into());
            }
        }
    }
}

async fn reader_task<R: AsyncRead + Unpin>(
    mut read_half: R,
    dispatcher: Arc<Dispatcher>,
    connection: Arc<std::sync::Mutex<ConnectionMachine>>,
    outbound_tx: mpsc::Sender<Frame>,
    linktest_waiter: LinktestWaiter,
    timers: TimerConfig,
    auto_online: bool,
    default_control_state: DefaultControlState,
) -> Result<()> {
    let framer_cfg = FramerConfig {
        t8: timers.t8,
        ..FramerConfig::default()
    };
    loop {
        // Before Select, a read that doesn't arrive within T7 of TCP-up is a protocol violation
        // (§4.3, §5): close the socket and fall back to `NotConnected`. Once Selected, messages
        // may legitimately be silent for longer than T7, so no deadline applies there.
        let pre_select = !connection.lock().unwrap().is_selected();
        let read = hsms::read_frame(&mut read_half, &framer_cfg);
        let result = if pre_select {
            hsms::with_deadline(timers.t7, read, hsms::HsmsError::T7Expired)
                .await
                .and_then(|inner| inner)
        } else {
            read.await
        };
        let frame = match result {
            Ok(frame) => frame,
            Err(e) => {
                info!("device link read loop ending: {e}");
                connection.lock().unwrap().on_disconnect();
                return Ok(());
            }
        };
        match frame {
            Frame::Data(msg) => handle_data_message(&dispatcher, &outbound_tx, msg, timers.t3).await,
            Frame::Control(ctrl) => {
                handle_control_message(
                    &connection,
                    &outbound_tx,
                    &linktest_waiter,
                    ctrl,
                    dispatcher.as_ref(),
                    auto_online,
                    default_control_state,
                )
                .await
            }
        }
    }
}

/// Applies the device's configured local control posture once it's Selected, per §4.5 and
/// SPEC_FULL.md §3.1's `auto_online`/`default_control_state`: equipment that doesn't wait on a
/// remote Request-Online puts itself online locally or remotely on its own.
fn apply_auto_online(dispatcher: &Dispatcher, default_control_state: DefaultControlState) {
    let mut control = dispatcher.context.control.lock().unwrap();
    if control.request_online().is_err() {
        return;
    }
    let _ = control.on_online_ack(0);
    if default_control_state == DefaultControlState::OnlineRemote {
        let _ = control.switch_local_remote(true);
    }
}

async fn handle_data_message(dispatcher: &Arc<Dispatcher>, outbound_tx: &mpsc::Sender<Frame>, msg: Message, t3: Duration) {
    if dispatcher.on_reply(msg.clone()) {
        return;
    }
    if let Some(reply) = dispatcher.dispatch_primary(&msg) {
        if outbound_tx.send(Frame::Data(reply)).await.is_err() {
            error!("outbound queue closed while replying to S{}F{}", msg.stream, msg.function);
        }
    }
    for event in dispatcher.drain_pending_events() {
        send_and_await_t3(dispatcher, outbound_tx, event, t3).await;
    }
}

/// Puts an equipment-initiated `W=1` primary on the wire and awaits its reply against `T3` in
/// the background (§5 "Suspension points", §8 scenario 3), logging but not retrying on timeout
/// or connection loss — the dispatcher's handler that fired the event owns no retry policy.
async fn send_and_await_t3(dispatcher: &Arc<Dispatcher>, outbound_tx: &mpsc::Sender<Frame>, msg: Message, t3: Duration) {
    let system_bytes = msg.system_bytes;
    let stream = msg.stream;
    let function = msg.function;
    if outbound_tx.send(Frame::Data(msg)).await.is_err() {
        error!("outbound queue closed while sending a spontaneous S{stream}F{function}");
        return;
    }
    let dispatcher = dispatcher.clone();
    tokio::spawn(async move {
        match dispatcher.await_reply(system_bytes, t3).await {
            Ok(_) => debug!("S{stream}F{function} acknowledged"),
            Err(e) => warn!("S{stream}F{function} ({system_bytes}) unacknowledged: {e}"),
        }
    });
}

async fn handle_control_message(
    connection: &Arc<std::sync::Mutex<ConnectionMachine>>,
    outbound_tx: &mpsc::Sender<Frame>,
    linktest_waiter: &LinktestWaiter,
    ctrl: ControlMessage,
    dispatcher: &Dispatcher,
    auto_online: bool,
    default_control_state: DefaultControlState,
) {
    match ctrl.ctrl {
        ControlType::SelectReq => {
            let outcome = connection.lock().unwrap().on_select_req(false);
            let reply = ControlMessage {
                session_id: ctrl.session_id,
                system_bytes: ctrl.system_bytes,
                ctrl: ControlType::SelectRsp,
                byte3: outcome.status,
            };
            if outcome.event == Some(ConnectionEvent::Selected) {
                dispatcher.context.phase.lock().unwrap().on_hsms_selected().ok();
                if auto_online {
                    apply_auto_online(dispatcher, default_control_state);
                }
            }
            let _ = outbound_tx.send(Frame::Control(reply)).await;
        }
        ControlType::DeselectReq => {
            let has_outstanding = dispatcher.transactions.outstanding_count() > 0;
            let outcome = connection.lock().unwrap().on_deselect_req(has_outstanding);
            let reply = ControlMessage {
                session_id: ctrl.session_id,
                system_bytes: ctrl.system_bytes,
                ctrl: ControlType::DeselectRsp,
                byte3: outcome.status,
            };
            let _ = outbound_tx.send(Frame::Control(reply)).await;
        }
        ControlType::LinktestReq => {
            let reply = ControlMessage {
                session_id: ctrl.session_id,
                system_bytes: ctrl.system_bytes,
                ctrl: ControlType::LinktestRsp,
                byte3: 0,
            };
            let _ = outbound_tx.send(Frame::Control(reply)).await;
        }
        ControlType::SeparateReq => {
            connection.lock().unwrap().on_disconnect();
        }
        ControlType::LinktestRsp => {
            let mut waiter = linktest_waiter.lock().unwrap();
            match waiter.take() {
                Some((system_bytes, tx)) if system_bytes == ctrl.system_bytes => {
                    let _ = tx.send(());
                }
                Some(pending) => {
                    debug!(
                        "Linktest.rsp system bytes mismatch: expected {}, got {}",
                        pending.0, ctrl.system_bytes
                    );
                    *waiter = Some(pending);
                }
                None => debug!("unsolicited Linktest.rsp ({})", ctrl.system_bytes),
            }
        }
        other => {
            debug!("ignoring unsolicited control message {other:?}");
        }
    }
}

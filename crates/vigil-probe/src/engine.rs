use crate::config::ProbeConfig;
use crate::error::{Error, IcmpFamily, Result};
use crate::packet::{self, Echo, MAX_PAYLOAD_SIZE};
use crate::socket::{EchoSocket, RawSocket};
use crossbeam::channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::io::ErrorKind;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;
use tracing::{debug, instrument, trace, warn};
use vigil_core::{IntervalMetrics, Prober, TargetId};

const RECV_BUFFER_SIZE: usize = 65_536;

/// An `ICMP` echo probing engine.
///
/// Each target is sent an echo request every `ping_interval`.  A request is
/// counted once it resolves, either by a matching reply arriving within
/// `ping_timeout` or by the timeout expiring, in which case it is also
/// counted as lost.
pub struct IcmpEngine<S = RawSocket> {
    shared: Arc<Shared<S>>,
    stop_tx: Mutex<Option<Sender<()>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

impl IcmpEngine<RawSocket> {
    /// Open the raw sockets used for probing.
    ///
    /// Failure to open the `IPv4` socket, or a permission failure for the
    /// `IPv6` socket, is fatal.  Any other `IPv6` failure leaves the engine
    /// able to probe `IPv4` targets only.
    #[instrument(level = "debug")]
    pub fn bind(config: ProbeConfig) -> Result<Self> {
        validate_payload_size(config.payload_size)?;
        let v4 = RawSocket::bind(IcmpFamily::V4, config.read_timeout)?;
        let v6 = match RawSocket::bind(IcmpFamily::V6, config.read_timeout) {
            Ok(socket) => Some(socket),
            Err(Error::Bind { source, .. }) if source.kind() != ErrorKind::PermissionDenied => {
                warn!(%source, "IPv6 probing unavailable");
                None
            }
            Err(err) => return Err(err),
        };
        Ok(Self::with_sockets(config, Some(v4), v6))
    }
}

impl<S: EchoSocket + 'static> IcmpEngine<S> {
    /// Create an engine over the given sockets.
    #[must_use]
    pub fn with_sockets(config: ProbeConfig, v4: Option<S>, v6: Option<S>) -> Self {
        Self {
            shared: Arc::new(Shared {
                config,
                identifier: (std::process::id() & 0xffff) as u16,
                v4,
                v6,
                running: AtomicBool::new(false),
                state: Mutex::new(State::default()),
            }),
            stop_tx: Mutex::new(None),
            workers: Mutex::new(vec![]),
        }
    }

    /// Begin probing `targets`.
    ///
    /// The first probe of the target at position `n` is delayed by
    /// `n * target_stagger`.
    #[instrument(skip_all, fields(targets = targets.len()), level = "debug")]
    pub fn start(&self, targets: &[(TargetId, IpAddr)]) -> Result<()> {
        validate_payload_size(self.shared.config.payload_size)?;
        if let Some((_, addr)) = targets
            .iter()
            .find(|(_, addr)| self.shared.socket(IcmpFamily::of(*addr)).is_none())
        {
            return Err(Error::FamilyUnavailable(*addr));
        }
        if self.shared.running.swap(true, Ordering::SeqCst) {
            return Err(Error::AlreadyStarted);
        }
        self.shared.state.lock().counters = targets
            .iter()
            .map(|(id, _)| (*id, IntervalMetrics::default()))
            .collect();
        let (stop_tx, stop_rx) = bounded::<()>(0);
        let mut workers = self.workers.lock();
        let shared = Arc::clone(&self.shared);
        let addrs = targets.iter().map(|(_, addr)| *addr).collect::<Vec<_>>();
        workers.push(
            thread::Builder::new()
                .name(String::from("probe-send"))
                .spawn(move || shared.send_loop(&addrs, &stop_rx))?,
        );
        for family in [IcmpFamily::V4, IcmpFamily::V6] {
            if self.shared.socket(family).is_some() {
                let shared = Arc::clone(&self.shared);
                workers.push(
                    thread::Builder::new()
                        .name(format!("probe-recv-{family}"))
                        .spawn(move || shared.recv_loop(family))?,
                );
            }
        }
        *self.stop_tx.lock() = Some(stop_tx);
        debug!(identifier = self.shared.identifier, "probing started");
        Ok(())
    }
}

impl<S: EchoSocket + 'static> Prober for IcmpEngine<S> {
    fn export_and_clear(&self) -> Vec<(TargetId, IntervalMetrics)> {
        self.shared.export_and_clear(Instant::now())
    }

    fn stop(&self) {
        self.shared.running.store(false, Ordering::SeqCst);
        drop(self.stop_tx.lock().take());
        for worker in self.workers.lock().drain(..) {
            if worker.join().is_err() {
                warn!("probe worker panicked");
            }
        }
    }
}

impl<S> Drop for IcmpEngine<S> {
    fn drop(&mut self) {
        self.shared.running.store(false, Ordering::SeqCst);
        drop(self.stop_tx.get_mut().take());
        for worker in self.workers.get_mut().drain(..) {
            let _ = worker.join();
        }
    }
}

fn validate_payload_size(payload_size: usize) -> Result<()> {
    if payload_size > MAX_PAYLOAD_SIZE {
        Err(Error::InvalidPayloadSize(payload_size))
    } else {
        Ok(())
    }
}

struct Shared<S> {
    config: ProbeConfig,
    identifier: u16,
    v4: Option<S>,
    v6: Option<S>,
    running: AtomicBool,
    state: Mutex<State>,
}

#[derive(Default)]
struct State {
    /// Per-target counters, indexed by the target's position at start.
    counters: Vec<(TargetId, IntervalMetrics)>,
    in_flight: HashMap<u16, InFlight>,
    next_sequence: u16,
}

impl State {
    fn resolve(&mut self, slot: usize, lost: bool) {
        if let Some((_, metrics)) = self.counters.get_mut(slot) {
            metrics.sent += 1;
            if lost {
                metrics.lost += 1;
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    slot: usize,
    family: IcmpFamily,
    deadline: Instant,
}

impl<S: EchoSocket> Shared<S> {
    fn socket(&self, family: IcmpFamily) -> Option<&S> {
        match family {
            IcmpFamily::V4 => self.v4.as_ref(),
            IcmpFamily::V6 => self.v6.as_ref(),
        }
    }

    fn send_loop(&self, addrs: &[IpAddr], stop_rx: &Receiver<()>) {
        let start = Instant::now();
        let mut schedule = (0..addrs.len())
            .map(|slot| start + self.config.target_stagger * slot as u32)
            .collect::<Vec<_>>();
        loop {
            let Some((slot, due)) = schedule
                .iter()
                .copied()
                .enumerate()
                .min_by_key(|(_, due)| *due)
            else {
                // nothing to probe, wait for shutdown
                let _ = stop_rx.recv();
                break;
            };
            match stop_rx.recv_deadline(due) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
            let now = Instant::now();
            self.probe(slot, addrs[slot], now);
            schedule[slot] = (due + self.config.ping_interval).max(now);
            self.expire(now);
        }
        debug!("sender stopped");
    }

    fn recv_loop(&self, family: IcmpFamily) {
        let Some(socket) = self.socket(family) else {
            return;
        };
        let mut buf = vec![0_u8; RECV_BUFFER_SIZE];
        while self.running.load(Ordering::SeqCst) {
            match socket.recv(&mut buf) {
                Ok(Some(bytes_read)) => match packet::parse_echo_reply(family, &buf[..bytes_read]) {
                    Ok(Some(echo)) => self.on_reply(family, echo, Instant::now()),
                    Ok(None) => {}
                    Err(err) => trace!(%err, "discarding datagram"),
                },
                Ok(None) => {}
                Err(err) => {
                    warn!(%err, %family, "receive failed");
                    thread::sleep(self.config.read_timeout);
                }
            }
            self.expire(Instant::now());
        }
        debug!(%family, "receiver stopped");
    }

    /// Send an echo request for the target in `slot`.
    ///
    /// A request which cannot be sent is counted as lost.
    fn probe(&self, slot: usize, addr: IpAddr, now: Instant) {
        let family = IcmpFamily::of(addr);
        let mut state = self.state.lock();
        let sequence = state.next_sequence;
        state.next_sequence = sequence.wrapping_add(1);
        if let Some(stale) = state.in_flight.remove(&sequence) {
            state.resolve(stale.slot, true);
        }
        let echo = Echo {
            identifier: self.identifier,
            sequence,
        };
        let sent = packet::echo_request(family, echo, self.config.payload_size).and_then(|buf| {
            self.socket(family)
                .ok_or(Error::FamilyUnavailable(addr))?
                .send_to(&buf, addr)
                .map_err(Error::from)
        });
        match sent {
            Ok(()) => {
                trace!(%addr, sequence, "echo request sent");
                state.in_flight.insert(
                    sequence,
                    InFlight {
                        slot,
                        family,
                        deadline: now + self.config.ping_timeout,
                    },
                );
            }
            Err(err) => {
                debug!(%addr, %err, "echo request failed");
                state.resolve(slot, true);
            }
        }
    }

    fn on_reply(&self, family: IcmpFamily, echo: Echo, now: Instant) {
        if echo.identifier != self.identifier {
            return;
        }
        let mut state = self.state.lock();
        match state.in_flight.get(&echo.sequence).copied() {
            Some(probe) if probe.family == family => {
                state.in_flight.remove(&echo.sequence);
                state.resolve(probe.slot, now > probe.deadline);
            }
            _ => trace!(sequence = echo.sequence, "unmatched echo reply"),
        }
    }

    /// Count every in flight request whose deadline has passed as lost.
    fn expire(&self, now: Instant) {
        let mut state = self.state.lock();
        let expired = state
            .in_flight
            .iter()
            .filter(|(_, probe)| probe.deadline < now)
            .map(|(sequence, probe)| (*sequence, probe.slot))
            .collect::<Vec<_>>();
        for (sequence, slot) in expired {
            state.in_flight.remove(&sequence);
            state.resolve(slot, true);
        }
    }

    /// Targets with no resolved request in the interval are omitted.
    fn export_and_clear(&self, now: Instant) -> Vec<(TargetId, IntervalMetrics)> {
        self.expire(now);
        let mut state = self.state.lock();
        state
            .counters
            .iter_mut()
            .filter(|(_, metrics)| metrics.sent > 0)
            .map(|(id, metrics)| (*id, std::mem::take(metrics)))
            .collect()
    }
}

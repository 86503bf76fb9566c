/*!
The `host` module is the binding to the JACK audio graph: client setup, port registration, port
latency bookkeeping, transport queries, and the notification handler both tools share. Everything
realtime lives in the binaries' process handlers; this module only hands them the pieces.
!*/

use crate::error::{self, Result};
use crate::ring::Waker;
use crate::transport::{TransportMode, TransportSnapshot};
use log::{info, warn};
use snafu::ResultExt;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

/// Opens a client on the running JACK server. We never auto-start a server; a missing server is
/// the user's business.
pub fn open_client(name: &str) -> Result<jack::Client> {
    let (client, status) = jack::Client::new(name, jack::ClientOptions::NO_START_SERVER).context(
        error::HostConnectSnafu {
            site: site!(),
            name,
        },
    )?;
    if status.contains(jack::ClientStatus::NAME_NOT_UNIQUE) {
        info!("jack client name: '{}'", client.name());
    }
    Ok(client)
}

pub fn register_midi_in(client: &jack::Client, port: &str) -> Result<jack::Port<jack::MidiIn>> {
    Ok(client
        .register_port(port, jack::MidiIn::default())
        .context(error::PortRegisterSnafu {
            site: site!(),
            port,
        })?)
}

pub fn register_midi_out(client: &jack::Client, port: &str) -> Result<jack::Port<jack::MidiOut>> {
    Ok(client
        .register_port(port, jack::MidiOut::default())
        .context(error::PortRegisterSnafu {
            site: site!(),
            port,
        })?)
}

pub fn register_audio_in(client: &jack::Client, port: &str) -> Result<jack::Port<jack::AudioIn>> {
    Ok(client
        .register_port(port, jack::AudioIn::default())
        .context(error::PortRegisterSnafu {
            site: site!(),
            port,
        })?)
}

/// Activates the client with the given handlers.
pub fn activate<N, P>(
    client: jack::Client,
    notifications: N,
    process: P,
) -> Result<jack::AsyncClient<N, P>>
where
    N: jack::NotificationHandler + Send + Sync + 'static,
    P: jack::ProcessHandler + 'static,
{
    Ok(client
        .activate_async(notifications, process)
        .context(error::ActivateSnafu { site: site!() })?)
}

/// Connects two ports by name. Connection failures are not fatal; the tool keeps running
/// unconnected, like any other JACK client.
pub fn connect(client: &jack::Client, from: &str, to: &str) {
    if let Err(e) = client.connect_ports_by_name(from, to) {
        warn!("cannot connect port {} to {}: {}", from, to, e);
    }
}

/// A port latency figure written by the graph-order callback and read by the process callback.
/// Relaxed ordering is enough; nothing orders against it and staleness of one cycle is harmless.
#[derive(Clone, Default)]
pub struct LatencyCell(Arc<AtomicU32>);

impl LatencyCell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }

    pub fn set(&self, value: u32) {
        self.0.store(value, Ordering::Relaxed);
    }
}

/// One port whose latency the notification handler keeps fresh.
pub struct LatencyWatch {
    port: jack::Port<jack::Unowned>,
    mode: jack::LatencyType,
    label: &'static str,
    cell: LatencyCell,
}

impl LatencyWatch {
    pub fn capture<PS: jack::PortSpec>(
        port: &jack::Port<PS>,
        label: &'static str,
        cell: LatencyCell,
    ) -> Self {
        Self {
            port: port.clone_unowned(),
            mode: jack::LatencyType::Capture,
            label,
            cell,
        }
    }

    pub fn playback<PS: jack::PortSpec>(
        port: &jack::Port<PS>,
        label: &'static str,
        cell: LatencyCell,
    ) -> Self {
        Self {
            port: port.clone_unowned(),
            mode: jack::LatencyType::Playback,
            label,
            cell,
        }
    }

    fn refresh(&self) {
        let (_min, max) = self.port.get_latency_range(self.mode);
        self.cell.set(max);
        info!("# {} port latency: {}", self.label, max);
    }
}

/// Tracks whether the JACK client (and the program) should keep running. Cleared by the host
/// shutdown notification and by SIGINT; both wake the printing thread so it can exit.
#[derive(Clone)]
pub struct Alive {
    flag: Arc<AtomicBool>,
    waker: Waker,
}

impl Alive {
    pub fn new(waker: Waker) -> Self {
        Self {
            flag: Arc::new(AtomicBool::new(true)),
            waker,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.flag.load(Ordering::Relaxed)
    }

    pub fn shut_down(&self) {
        self.flag.store(false, Ordering::Relaxed);
        self.waker.signal();
    }
}

/// The notification handler both tools install: refreshes port latencies on every graph change
/// and wakes the printing thread when the server goes away.
pub struct Notifications {
    alive: Alive,
    watches: Vec<LatencyWatch>,
}

impl Notifications {
    pub fn new(alive: Alive, watches: Vec<LatencyWatch>) -> Self {
        Self { alive, watches }
    }
}

impl jack::NotificationHandler for Notifications {
    unsafe fn shutdown(&mut self, _status: jack::ClientStatus, reason: &str) {
        warn!("jack server shutdown: {}", reason);
        self.alive.shut_down();
    }

    fn graph_reorder(&mut self, _: &jack::Client) -> jack::Control {
        for watch in &self.watches {
            watch.refresh();
        }
        jack::Control::Continue
    }
}

/// Queries the transport. The Rust JACK binding does not surface the video fields of
/// `jack_position_t`, so those stay `None` and the rate follower simply never fires on this host;
/// a failed query reads as a stopped transport at zero.
pub fn transport_snapshot(client: &jack::Client) -> TransportSnapshot {
    let mut snapshot = TransportSnapshot {
        mode: TransportMode::Stopped,
        sample_pos: 0,
        video_offset: None,
        audio_frames_per_video_frame: None,
    };
    if let Ok(position) = client.transport().query() {
        snapshot.sample_pos = position.pos.frame();
        snapshot.mode = match position.state {
            jack::TransportState::Rolling => TransportMode::Rolling,
            jack::TransportState::Starting => TransportMode::Locating,
            _ => TransportMode::Stopped,
        };
    }
    snapshot
}

/// Best-effort lock of the address space into RAM so the process callback cannot page-fault.
pub fn lock_memory() {
    #[cfg(unix)]
    {
        if unsafe { libc::mlockall(libc::MCL_CURRENT | libc::MCL_FUTURE) } != 0 {
            warn!("can not lock memory");
        }
    }
}

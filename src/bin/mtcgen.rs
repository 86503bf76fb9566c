/*!
`mtcgen` generates MIDI Time Code from the JACK transport and sends it on a JACK MIDI port.
While the transport rolls it emits the quarter-frame stream, scheduled ahead of the transport by
enough frames to absorb the output port latency; when the transport is stopped or locating it
emits a Full-Frame SysEx locate instead.

Note that MTC only supports four framerates: 24, 25, 29.97df and 30 fps.
!*/

use clap::Parser;
use log::warn;
use midi_timecode::core::{TimecodeRate, TimecodeTime, FPS_25};
use midi_timecode::host::{self, Alive, LatencyCell, LatencyWatch, Notifications};
use midi_timecode::mtc::{decode_ahead, EmitMode, Emitter};
use midi_timecode::ring::{log_ring, LogDrain, RtLog, Waker};
use midi_timecode::transport::{RateFollower, TransportMode};
use std::io::Write;

/// Generate MIDI Time Code from the JACK transport.
#[derive(Parser)]
#[command(
    name = "mtcgen",
    version,
    about = "JACK transport MTC generator",
    after_help = "MTC only supports four framerates: 24, 25, 30df and 30 fps. \
                  30df == 30000/1001 fps."
)]
struct Args {
    /// Log realtime scheduling details
    #[arg(short, long)]
    debug: bool,

    /// The MTC framerate (default 25/1)
    #[arg(short = 'f', long = "fps", value_name = "NUM[/DEN]")]
    fps: Option<String>,

    /// Use jack-transport's FPS setting if available
    #[arg(short = 'F', long = "jackvideo")]
    jackvideo: bool,

    /// JACK ports to connect the MTC output to
    #[arg(value_name = "JACK-port")]
    ports: Vec<String>,
}

struct GenProcess {
    mtc_out: jack::Port<jack::MidiOut>,
    emitter: Emitter,
    follower: RateFollower,
    log: RtLog,
    sample_rate: u32,
    mfcnt: i64,
    latency: LatencyCell,
}

impl jack::ProcessHandler for GenProcess {
    fn process(&mut self, client: &jack::Client, ps: &jack::ProcessScope) -> jack::Control {
        let nframes = ps.n_frames();
        let snapshot = host::transport_snapshot(client);

        self.follower
            .observe(&snapshot, self.sample_rate, &mut self.log);
        let rate = *self.follower.rate();

        let t = TimecodeTime::from_sample(
            &rate,
            self.sample_rate,
            i64::from(snapshot.effective_sample_pos()),
        );

        let latency = self.latency.get();
        let decodeahead = decode_ahead(latency, rate.frames_per_timecode_frame(self.sample_rate));

        let mode = match snapshot.mode {
            TransportMode::Stopped => EmitMode::Stopped,
            TransportMode::Locating => EmitMode::Locating,
            TransportMode::Rolling => EmitMode::Rolling,
        };
        self.emitter.generate(
            &t,
            self.mfcnt,
            mode,
            &rate,
            self.sample_rate,
            decodeahead,
            &mut self.log,
        );

        let mut writer = self.mtc_out.writer(ps);
        self.emitter
            .drain(self.mfcnt, nframes, latency, &mut self.log, |time, bytes| {
                let _ = writer.write(&jack::RawMidi { time, bytes });
            });

        self.mfcnt += i64::from(nframes);
        jack::Control::Continue
    }
}

fn main() {
    env_logger::init();
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> midi_timecode::Result<()> {
    let mut rate = match &args.fps {
        Some(value) => TimecodeRate::parse(value)?,
        None => FPS_25,
    };

    let client = host::open_client("mtcgen")?;
    let sample_rate = client.sample_rate() as u32;
    rate.set_sample_subframes(sample_rate);

    let mtc_out = host::register_midi_out(&client, "mtc_out")?;
    let out_name = mtc_out.name().unwrap_or_default();

    let waker = Waker::new();
    let alive = Alive::new(waker.clone());
    let (log, drain) = log_ring(&waker, args.debug);

    let latency = LatencyCell::new();
    let notifications = Notifications::new(
        alive.clone(),
        vec![LatencyWatch::playback(&mtc_out, "MTC", latency.clone())],
    );

    let process = GenProcess {
        mtc_out,
        emitter: Emitter::new(),
        follower: RateFollower::new(rate, args.jackvideo),
        log,
        sample_rate,
        mfcnt: 0,
        latency,
    };

    host::lock_memory();
    let active = host::activate(client, notifications, process)?;

    for sink in &args.ports {
        host::connect(active.as_client(), &out_name, sink);
    }

    let sigint = alive.clone();
    if let Err(e) = ctrlc::set_handler(move || sigint.shut_down()) {
        warn!("cannot install signal handler: {}", e);
    }

    print_log(&waker, &alive, drain);

    let _ = active.deactivate();
    Ok(())
}

/// The printing loop for the realtime log ring.
fn print_log(waker: &Waker, alive: &Alive, mut drain: LogDrain) {
    let stdout = std::io::stdout();
    let mut guard = waker.lock();
    while alive.is_alive() {
        let mut out = stdout.lock();
        let _ = drain.drain_to(&mut out);
        let _ = out.flush();
        drop(out);
        waker.wait(&mut guard);
    }
}

/*!
`mtcdump` subscribes to a JACK MIDI port and up to two JACK audio ports and prints every timecode
it can decode from them: MTC quarter-frame sequences from the MIDI port, LTC from the audio
ports. Each line carries the host monotonic sample at which the timecode is deemed to have
occurred, so the streams can be compared against each other and against the transport.
!*/

use clap::Parser;
use log::warn;
use midi_timecode::host::{self, Alive, LatencyCell, LatencyWatch, Notifications};
use midi_timecode::ltc::LtcIngest;
use midi_timecode::mtc::{arrival_compensation, Assembler};
use midi_timecode::record::{DecodedRecord, SOURCE_MTC};
use midi_timecode::ring::{channel, Receiver, Sender, Waker};
use midi_timecode::RECORD_QUEUE_LEN;
use std::io::Write;

/// Print MIDI Time Code and Linear Time Code received on JACK ports.
#[derive(Parser)]
#[command(
    name = "mtcdump",
    version,
    about = "JACK MIDI/LTC timecode monitor",
    after_help = "The first JACK-port argument is connected to the MTC input, \
                  the next two to the LTC inputs."
)]
struct Args {
    /// Print a newline after each timecode instead of overwriting the line
    #[arg(short, long)]
    newline: bool,

    /// JACK ports to connect
    #[arg(value_name = "JACK-port")]
    ports: Vec<String>,
}

/// The fallback LTC frame rate used to back-date decoded frames before the decoder has measured
/// the incoming rate.
const LTC_FALLBACK_FPS: f64 = 25.0;

struct DumpProcess {
    mtc_in: jack::Port<jack::MidiIn>,
    ltc_in1: jack::Port<jack::AudioIn>,
    ltc_in2: jack::Port<jack::AudioIn>,
    assembler: Assembler,
    ingest1: LtcIngest,
    ingest2: LtcIngest,
    records: Sender<DecodedRecord>,
    sample_rate: u32,
    mfcnt: i64,
    latency_mtc: LatencyCell,
    latency_ltc1: LatencyCell,
    latency_ltc2: LatencyCell,
}

impl jack::ProcessHandler for DumpProcess {
    fn process(&mut self, _: &jack::Client, ps: &jack::ProcessScope) -> jack::Control {
        // LTC ports first, in fixed order, then the MIDI events in arrival order; the printed
        // interleaving reflects this.
        let block = self.ltc_in1.as_slice(ps);
        self.ingest1.ingest(
            block,
            self.mfcnt - i64::from(self.latency_ltc1.get()),
            &mut self.records,
        );
        let block = self.ltc_in2.as_slice(ps);
        self.ingest2.ingest(
            block,
            self.mfcnt - i64::from(self.latency_ltc2.get()),
            &mut self.records,
        );

        for event in self.mtc_in.iter(ps) {
            if let Some(tc) = self.assembler.feed_message(event.bytes) {
                // the final quarter-frame arrives almost two frames after the time it encodes
                let arrival =
                    self.mfcnt + i64::from(event.time) - i64::from(self.latency_mtc.get());
                self.records.send(DecodedRecord {
                    source: SOURCE_MTC,
                    hour: tc.hour,
                    minute: tc.minute,
                    second: tc.second,
                    frame: tc.frame,
                    rate: Some(tc.rate),
                    sample: arrival - arrival_compensation(tc.rate, self.sample_rate),
                });
            }
        }

        self.mfcnt += i64::from(ps.n_frames());
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
    let newline = if args.newline { '\n' } else { '\r' };

    let client = host::open_client("mtcdump")?;
    let sample_rate = client.sample_rate() as u32;

    let mtc_in = host::register_midi_in(&client, "mtc_in")?;
    let ltc_in1 = host::register_audio_in(&client, "ltc_in")?;
    let ltc_in2 = host::register_audio_in(&client, "ltc_in2")?;
    let mtc_name = mtc_in.name().unwrap_or_default();
    let ltc1_name = ltc_in1.name().unwrap_or_default();
    let ltc2_name = ltc_in2.name().unwrap_or_default();

    let waker = Waker::new();
    let alive = Alive::new(waker.clone());
    let (records_tx, records_rx) = channel(RECORD_QUEUE_LEN, &waker);

    let latency_mtc = LatencyCell::new();
    let latency_ltc1 = LatencyCell::new();
    let latency_ltc2 = LatencyCell::new();
    let notifications = Notifications::new(
        alive.clone(),
        vec![
            LatencyWatch::capture(&mtc_in, "MTC", latency_mtc.clone()),
            LatencyWatch::capture(&ltc_in1, "LTC1", latency_ltc1.clone()),
            LatencyWatch::capture(&ltc_in2, "LTC2", latency_ltc2.clone()),
        ],
    );

    let process = DumpProcess {
        mtc_in,
        ltc_in1,
        ltc_in2,
        assembler: Assembler::new(),
        ingest1: LtcIngest::new(1, sample_rate, LTC_FALLBACK_FPS),
        ingest2: LtcIngest::new(2, sample_rate, LTC_FALLBACK_FPS),
        records: records_tx,
        sample_rate,
        mfcnt: 0,
        latency_mtc,
        latency_ltc1,
        latency_ltc2,
    };

    host::lock_memory();
    let active = host::activate(client, notifications, process)?;

    let mut sources = args.ports.iter();
    if let Some(source) = sources.next() {
        host::connect(active.as_client(), source, &mtc_name);
    }
    if let Some(source) = sources.next() {
        host::connect(active.as_client(), source, &ltc1_name);
    }
    if let Some(source) = sources.next() {
        host::connect(active.as_client(), source, &ltc2_name);
    }

    let sigint = alive.clone();
    if let Err(e) = ctrlc::set_handler(move || sigint.shut_down()) {
        warn!("cannot install signal handler: {}", e);
    }

    print_records(&waker, &alive, records_rx, newline);

    let _ = active.deactivate();
    Ok(())
}

/// The printing loop: owns stdout, drains the record ring, sleeps on the condvar until the
/// realtime thread or a shutdown signals it.
fn print_records(waker: &Waker, alive: &Alive, mut records: Receiver<DecodedRecord>, newline: char) {
    let stdout = std::io::stdout();
    let mut guard = waker.lock();
    while alive.is_alive() {
        let mut out = stdout.lock();
        while let Some(record) = records.try_recv() {
            let _ = out.write_all(record.print_line(newline).as_bytes());
        }
        let _ = out.flush();
        drop(out);
        waker.wait(&mut guard);
    }
}

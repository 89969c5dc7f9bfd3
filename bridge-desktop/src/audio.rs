//! Audio output using cpal.
//!
//! One output stream per sink, owned by a dedicated audio thread
//! (`cpal::Stream` is not `Send`). The stream callback renders the current
//! sound unit — at most one — into the device buffer and drives the sink's
//! monotonic frame clock. Narration buffers are 24 kHz mono while devices
//! typically run 44.1/48 kHz stereo, so samples are linearly interpolated to
//! the device rate and duplicated across output channels.

use bridge_traits::audio::{AudioSink, PcmBuffer, SoundUnit, UnitId};
use bridge_traits::error::{BridgeError, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::JoinHandle;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// How long `resume()` waits for the audio thread to acknowledge.
const COMMAND_TIMEOUT: Duration = Duration::from_secs(2);

enum SinkCommand {
    Resume(mpsc::Sender<Result<()>>),
    Shutdown,
}

/// The unit currently rendered by the stream callback.
struct VoiceState {
    id: UnitId,
    buffer: Arc<PcmBuffer>,
    /// Fractional read position in buffer frames.
    src_pos: f64,
    /// Device frame at which the voice becomes audible.
    start_at_frame: u64,
    stopped: Arc<AtomicBool>,
}

struct SinkShared {
    current: Mutex<Option<VoiceState>>,
    /// Device frames rendered since the sink was created; the audio clock.
    frames_rendered: AtomicU64,
    device_rate: AtomicU32,
    next_id: AtomicU64,
    gain: f32,
    completions: broadcast::Sender<UnitId>,
}

/// cpal-backed [`AudioSink`].
pub struct CpalAudioSink {
    shared: Arc<SinkShared>,
    commands: mpsc::Sender<SinkCommand>,
    thread: Option<JoinHandle<()>>,
}

impl CpalAudioSink {
    /// Open the default output device and start the render thread.
    ///
    /// `gain` is applied to every narration sample.
    pub fn new(gain: f32) -> Result<Self> {
        let (completions, _) = broadcast::channel(32);
        let shared = Arc::new(SinkShared {
            current: Mutex::new(None),
            frames_rendered: AtomicU64::new(0),
            device_rate: AtomicU32::new(0),
            next_id: AtomicU64::new(0),
            gain,
            completions,
        });

        let (commands, command_rx) = mpsc::channel();
        let (ready_tx, ready_rx) = mpsc::channel();
        let thread_shared = Arc::clone(&shared);
        let thread = std::thread::Builder::new()
            .name("audio-sink".to_string())
            .spawn(move || audio_thread(thread_shared, command_rx, ready_tx))
            .map_err(|e| BridgeError::AudioDevice(format!("spawn audio thread: {}", e)))?;

        match ready_rx.recv_timeout(Duration::from_secs(5)) {
            Ok(Ok(())) => Ok(Self {
                shared,
                commands,
                thread: Some(thread),
            }),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(BridgeError::AudioDevice(
                "audio thread did not come up".to_string(),
            )),
        }
    }
}

impl AudioSink for CpalAudioSink {
    fn resume(&self) -> Result<()> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.commands
            .send(SinkCommand::Resume(reply_tx))
            .map_err(|_| BridgeError::AudioDevice("audio thread gone".to_string()))?;
        reply_rx
            .recv_timeout(COMMAND_TIMEOUT)
            .map_err(|_| BridgeError::AudioDevice("audio thread unresponsive".to_string()))?
    }

    fn clock_seconds(&self) -> f64 {
        let rate = self.shared.device_rate.load(Ordering::Relaxed);
        if rate == 0 {
            return 0.0;
        }
        self.shared.frames_rendered.load(Ordering::Relaxed) as f64 / f64::from(rate)
    }

    fn start_unit(
        &self,
        buffer: Arc<PcmBuffer>,
        start_at: f64,
        offset_secs: f64,
    ) -> Result<Box<dyn SoundUnit>> {
        let device_rate = f64::from(self.shared.device_rate.load(Ordering::Relaxed));
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed) + 1;
        let stopped = Arc::new(AtomicBool::new(false));

        let voice = VoiceState {
            id,
            src_pos: offset_secs * f64::from(buffer.sample_rate()),
            start_at_frame: (start_at * device_rate).round() as u64,
            buffer,
            stopped: Arc::clone(&stopped),
        };

        debug!(unit = id, start_at, offset = offset_secs, "voice scheduled");
        // A displaced voice will never render again; report it finished so
        // every unit completes exactly once.
        if let Some(old) = self.shared.current.lock().replace(voice) {
            let _ = self.shared.completions.send(old.id);
        }

        Ok(Box::new(CpalSoundUnit { id, stopped }))
    }

    fn completions(&self) -> broadcast::Receiver<UnitId> {
        self.shared.completions.subscribe()
    }
}

impl Drop for CpalAudioSink {
    fn drop(&mut self) {
        let _ = self.commands.send(SinkCommand::Shutdown);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Handle to one scheduled voice.
struct CpalSoundUnit {
    id: UnitId,
    stopped: Arc<AtomicBool>,
}

impl SoundUnit for CpalSoundUnit {
    fn id(&self) -> UnitId {
        self.id
    }

    fn stop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

impl Drop for CpalSoundUnit {
    fn drop(&mut self) {
        self.stopped.store(true, Ordering::Relaxed);
    }
}

fn audio_thread(
    shared: Arc<SinkShared>,
    commands: mpsc::Receiver<SinkCommand>,
    ready: mpsc::Sender<Result<()>>,
) {
    let stream = match build_stream(&shared) {
        Ok(stream) => {
            let _ = ready.send(Ok(()));
            stream
        }
        Err(e) => {
            let _ = ready.send(Err(e));
            return;
        }
    };

    loop {
        match commands.recv() {
            Ok(SinkCommand::Resume(reply)) => {
                let result = stream
                    .play()
                    .map_err(|e| BridgeError::AudioDevice(format!("resume refused: {}", e)));
                let _ = reply.send(result);
            }
            Ok(SinkCommand::Shutdown) | Err(_) => break,
        }
    }
}

fn build_stream(shared: &Arc<SinkShared>) -> Result<cpal::Stream> {
    let host = cpal::default_host();
    let device = host
        .default_output_device()
        .ok_or_else(|| BridgeError::AudioDevice("no output device".to_string()))?;

    let default_config = device
        .default_output_config()
        .map_err(|e| BridgeError::AudioDevice(format!("default output config: {}", e)))?;
    let sample_rate = default_config.sample_rate().0;
    let channels = default_config.channels() as usize;
    let config = StreamConfig::from(default_config);

    shared.device_rate.store(sample_rate, Ordering::Relaxed);
    debug!(sample_rate, channels, "output stream opening");

    let render_shared = Arc::clone(shared);
    let stream = device
        .build_output_stream(
            &config,
            move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                render(&render_shared, data, channels);
            },
            |err| warn!("audio stream error: {}", err),
            None,
        )
        .map_err(|e| BridgeError::AudioDevice(format!("build output stream: {}", e)))?;

    stream
        .play()
        .map_err(|e| BridgeError::AudioDevice(format!("start output stream: {}", e)))?;

    Ok(stream)
}

/// Render callback: advances the clock one device frame at a time and mixes
/// the current voice, if audible, into every output channel.
fn render(shared: &SinkShared, data: &mut [f32], channels: usize) {
    let device_rate = f64::from(shared.device_rate.load(Ordering::Relaxed));
    let mut slot = shared.current.lock();

    for out_frame in data.chunks_mut(channels) {
        let clock_frame = shared.frames_rendered.fetch_add(1, Ordering::Relaxed);
        out_frame.fill(0.0);

        let mut finished: Option<UnitId> = None;
        if let Some(voice) = slot.as_mut() {
            if voice.stopped.load(Ordering::Relaxed) {
                finished = Some(voice.id);
            } else if clock_frame >= voice.start_at_frame {
                let frames = voice.buffer.frames();
                if voice.src_pos as usize >= frames {
                    finished = Some(voice.id);
                } else {
                    let buffer_channels = voice.buffer.channels().max(1);
                    for (ch, out) in out_frame.iter_mut().enumerate() {
                        let plane = voice
                            .buffer
                            .plane((ch as u16).min(buffer_channels - 1));
                        *out = interpolate(plane, voice.src_pos) * shared.gain;
                    }
                    voice.src_pos +=
                        f64::from(voice.buffer.sample_rate()) / device_rate;
                }
            }
        }

        if let Some(id) = finished {
            *slot = None;
            let _ = shared.completions.send(id);
        }
    }
}

/// Linear interpolation at a fractional frame position.
fn interpolate(plane: &[f32], pos: f64) -> f32 {
    let base = pos as usize;
    if base + 1 >= plane.len() {
        return plane.last().copied().unwrap_or(0.0);
    }
    let frac = (pos - base as f64) as f32;
    plane[base] + (plane[base + 1] - plane[base]) * frac
}

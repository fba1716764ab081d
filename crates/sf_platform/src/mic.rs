//! Microphone capture feeding the loudness slot.
//!
//! cpal delivers audio on its own callback thread in blocks of whatever size the
//! backend picks. The callback only forwards each block over a bounded channel,
//! dropping blocks while the channel is full; a dedicated `loudness-sampler`
//! thread owns the stream, reassembles fixed `CHUNK_SIZE` mono buffers and runs
//! [`run_sampler`]. The stream is created on that thread because cpal streams
//! are not `Send` on every backend.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{BufferSize, SampleFormat, SampleRate, Stream, StreamConfig};
use thiserror::Error;

use sf_core::loudness::{
    run_sampler, LoudnessSlot, SampleSource, CHUNK_SIZE, SAMPLER_PAUSE, SAMPLE_RATE,
};

/// Device blocks buffered between the callback and the sampler thread.
const BLOCK_QUEUE: usize = 8;

#[derive(Debug, Error)]
pub enum MicError {
    #[error("no audio input device available")]
    NoInputDevice,
    #[error("failed to query the input device config: {0}")]
    DefaultConfig(#[source] cpal::DefaultStreamConfigError),
    #[error("input device uses unsupported sample format {0}")]
    UnsupportedFormat(SampleFormat),
    #[error("failed to open input stream: {0}")]
    BuildStream(#[source] cpal::BuildStreamError),
    #[error("failed to start input stream: {0}")]
    PlayStream(#[source] cpal::PlayStreamError),
    #[error("failed to spawn sampler thread: {0}")]
    SpawnThread(#[source] std::io::Error),
    #[error("sampler thread exited before reporting device status")]
    WorkerExited,
}

/// Opens the default microphone on a background thread that publishes into `slot`.
///
/// Blocks until the device is open (or failed to open). The thread is detached
/// and lives until the process exits.
pub fn spawn_loudness_sampler(slot: LoudnessSlot) -> Result<(), MicError> {
    let (status_tx, status_rx) = mpsc::sync_channel::<Result<(), MicError>>(1);

    thread::Builder::new()
        .name("loudness-sampler".to_string())
        .spawn(move || {
            let mut source = match CpalSource::open() {
                Ok(source) => {
                    let _ = status_tx.send(Ok(()));
                    source
                }
                Err(err) => {
                    let _ = status_tx.send(Err(err));
                    return;
                }
            };
            let err = run_sampler(&mut source, &slot, SAMPLER_PAUSE);
            log::error!(
                "Microphone sampling stopped: {err}. Loudness frozen at {:.1}",
                slot.load()
            );
        })
        .map_err(MicError::SpawnThread)?;

    status_rx.recv().map_err(|_| MicError::WorkerExited)?
}

struct CpalSource {
    _stream: Stream,
    chunks: ChunkAssembler,
}

impl CpalSource {
    fn open() -> Result<Self, MicError> {
        let host = cpal::default_host();
        let device = host.default_input_device().ok_or(MicError::NoInputDevice)?;
        log::info!(
            "Microphone: {}",
            device.name().unwrap_or_else(|_| "<unnamed>".to_string())
        );

        let (tx, blocks) = mpsc::sync_channel(BLOCK_QUEUE);
        let requested = StreamConfig {
            channels: 1,
            sample_rate: SampleRate(SAMPLE_RATE),
            buffer_size: BufferSize::Fixed(CHUNK_SIZE as u32),
        };

        let (stream, channels) = match build_stream(&device, &requested, tx.clone()) {
            Ok(stream) => (stream, 1),
            Err(err) => {
                log::warn!("Mono {SAMPLE_RATE} Hz capture rejected ({err}), using device default");
                let supported = device
                    .default_input_config()
                    .map_err(MicError::DefaultConfig)?;
                if supported.sample_format() != SampleFormat::F32 {
                    return Err(MicError::UnsupportedFormat(supported.sample_format()));
                }
                let config = supported.config();
                log::info!(
                    "Microphone config: {} ch @ {} Hz",
                    config.channels,
                    config.sample_rate.0
                );
                let channels = usize::from(config.channels.max(1));
                (build_stream(&device, &config, tx)?, channels)
            }
        };
        stream.play().map_err(MicError::PlayStream)?;

        Ok(Self {
            _stream: stream,
            chunks: ChunkAssembler::new(blocks, channels),
        })
    }
}

impl SampleSource for CpalSource {
    fn read_chunk(&mut self, buf: &mut [f32]) -> Result<(), String> {
        self.chunks.read_chunk(buf)
    }
}

/// Turns variable-size interleaved device blocks into fixed mono chunks.
struct ChunkAssembler {
    blocks: Receiver<Vec<f32>>,
    channels: usize,
    pending: Vec<f32>,
}

impl ChunkAssembler {
    fn new(blocks: Receiver<Vec<f32>>, channels: usize) -> Self {
        Self {
            blocks,
            channels,
            pending: Vec::with_capacity(CHUNK_SIZE * 2),
        }
    }
}

impl SampleSource for ChunkAssembler {
    fn read_chunk(&mut self, buf: &mut [f32]) -> Result<(), String> {
        while self.pending.len() < buf.len() {
            let block = self
                .blocks
                .recv()
                .map_err(|_| "microphone stream closed".to_string())?;
            downmix_into(&block, self.channels, &mut self.pending);
        }
        buf.copy_from_slice(&self.pending[..buf.len()]);
        self.pending.drain(..buf.len());
        Ok(())
    }
}

fn build_stream(
    device: &cpal::Device,
    config: &StreamConfig,
    tx: SyncSender<Vec<f32>>,
) -> Result<Stream, MicError> {
    device
        .build_input_stream(
            config,
            move |data: &[f32], _: &cpal::InputCallbackInfo| {
                forward_block(&tx, data);
            },
            |err| log::error!("Microphone stream error: {err}"),
            None,
        )
        .map_err(MicError::BuildStream)
}

/// Queues a copy of `data` unless the sampler is behind. Returns whether it was queued.
fn forward_block(tx: &SyncSender<Vec<f32>>, data: &[f32]) -> bool {
    // A full queue means the sampler is behind; the block is skipped.
    tx.try_send(data.to_vec()).is_ok()
}

/// Appends the per-frame average of interleaved `block` to `out`.
fn downmix_into(block: &[f32], channels: usize, out: &mut Vec<f32>) {
    if channels <= 1 {
        out.extend_from_slice(block);
        return;
    }
    out.extend(
        block
            .chunks_exact(channels)
            .map(|frame| frame.iter().sum::<f32>() / channels as f32),
    );
}

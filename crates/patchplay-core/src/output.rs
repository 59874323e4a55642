//! CPAL audio output.

use std::sync::atomic::{AtomicU32, Ordering};

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use tracing::{debug, warn};

use crate::device::{AudioDevice, AudioHost, DeviceId, DeviceSpec, RenderCallback, SampleFormat};
use crate::{Error, Result};

static NEXT_DEVICE_ID: AtomicU32 = AtomicU32::new(1);

/// Platform audio layer backed by CPAL. Drivers are CPAL hosts.
#[derive(Default)]
pub struct CpalHost {
    host: Option<cpal::Host>,
    last_error: Option<String>,
}

impl CpalHost {
    pub fn new() -> Self {
        Self::default()
    }

    fn host(&self) -> Result<&cpal::Host> {
        self.host.as_ref().ok_or(Error::InvalidState {
            operation: "use audio host",
            state: "no driver initialised",
        })
    }

    fn open_stream(&self, desired: &DeviceSpec, callback: RenderCallback) -> Result<CpalDevice> {
        let device = self
            .host()?
            .default_output_device()
            .ok_or_else(|| Error::InvalidDevice("No output device available".into()))?;
        debug!(device = %device.name().unwrap_or_default(), "opening output device");

        let Negotiated {
            config,
            format,
            spec,
            max_frames,
        } = negotiate(&device, desired)?;
        let capacity = scratch_len(&config, max_frames);
        let stream = match format {
            cpal::SampleFormat::F32 => build_stream::<f32>(&device, &config, capacity, callback)?,
            cpal::SampleFormat::I16 => build_stream::<i16>(&device, &config, capacity, callback)?,
            cpal::SampleFormat::U16 => build_stream::<u16>(&device, &config, capacity, callback)?,
            format => {
                return Err(Error::InvalidConfig(format!(
                    "Unsupported sample format: {format:?}"
                )));
            }
        };

        // Some backends start streams as soon as they are built.
        hold_paused(&stream)?;

        Ok(CpalDevice {
            id: DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed)),
            spec,
            stream,
        })
    }
}

impl AudioHost for CpalHost {
    type Device = CpalDevice;

    fn drivers(&self) -> Vec<String> {
        cpal::available_hosts()
            .into_iter()
            .map(|id| id.name().to_string())
            .collect()
    }

    fn init_driver(&mut self, name: &str) -> Result<()> {
        let id = cpal::available_hosts()
            .into_iter()
            .find(|id| id.name() == name)
            .ok_or_else(|| Error::DriverInit(format!("Unknown audio driver '{name}'")))?;

        match cpal::host_from_id(id) {
            Ok(host) => {
                self.host = Some(host);
                Ok(())
            }
            Err(e) => {
                self.last_error = Some(e.to_string());
                Err(e.into())
            }
        }
    }

    fn current_driver(&self) -> Option<String> {
        self.host.as_ref().map(|h| h.id().name().to_string())
    }

    fn output_devices(&self) -> Result<Vec<String>> {
        self.host()?
            .output_devices()?
            .map(|device| Ok(device.name()?))
            .collect()
    }

    fn open(&mut self, desired: &DeviceSpec, callback: RenderCallback) -> Result<CpalDevice> {
        let result = self.open_stream(desired, callback);
        if let Err(e) = &result {
            self.last_error = Some(e.to_string());
        }
        result
    }

    fn last_error(&self) -> Option<String> {
        self.last_error.clone()
    }
}

/// An open CPAL output stream.
///
/// `cpal::Stream` is `!Send`, so the device stays on the thread that opened it.
pub struct CpalDevice {
    id: DeviceId,
    spec: DeviceSpec,
    stream: cpal::Stream,
}

impl AudioDevice for CpalDevice {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn spec(&self) -> &DeviceSpec {
        &self.spec
    }

    fn set_paused(&mut self, paused: bool) -> Result<()> {
        if paused {
            self.stream.pause()?;
        } else {
            self.stream.play()?;
        }
        Ok(())
    }

    fn close(self) {
        drop(self.stream);
    }
}

/// Frames assumed for the largest callback when the device does not report
/// a buffer range.
const FALLBACK_MAX_FRAMES: u32 = 8192;

/// Upper bound for reported ranges; some backends report absurd maximums.
const MAX_SCRATCH_FRAMES: u32 = 16384;

struct Negotiated {
    config: cpal::StreamConfig,
    format: cpal::SampleFormat,
    spec: DeviceSpec,
    /// Largest callback the device may ask for, in frames.
    max_frames: u32,
}

fn max_frames(range: &cpal::SupportedBufferSize) -> u32 {
    match range {
        cpal::SupportedBufferSize::Range { max, .. } => (*max).min(MAX_SCRATCH_FRAMES),
        cpal::SupportedBufferSize::Unknown => FALLBACK_MAX_FRAMES,
    }
}

/// Pick a stream config for `desired`.
///
/// Uses the requested layout when the device supports it, with a fixed
/// buffer if the requested size is in range. Otherwise falls back to the
/// device's default rate and format.
fn negotiate(device: &cpal::Device, desired: &DeviceSpec) -> Result<Negotiated> {
    let rate = cpal::SampleRate(desired.sample_rate);

    if let Ok(ranges) = device.supported_output_configs() {
        for range in ranges {
            if range.sample_format() != cpal::SampleFormat::F32
                || range.channels() != desired.channels
                || rate < range.min_sample_rate()
                || rate > range.max_sample_rate()
            {
                continue;
            }

            let buffer_frames = match (desired.buffer_frames, range.buffer_size()) {
                (Some(frames), cpal::SupportedBufferSize::Range { min, max })
                    if (*min..=*max).contains(&frames) =>
                {
                    Some(frames)
                }
                _ => None,
            };

            let config = cpal::StreamConfig {
                channels: desired.channels,
                sample_rate: rate,
                buffer_size: buffer_frames
                    .map(cpal::BufferSize::Fixed)
                    .unwrap_or(cpal::BufferSize::Default),
            };
            return Ok(Negotiated {
                config,
                format: cpal::SampleFormat::F32,
                spec: DeviceSpec {
                    buffer_frames,
                    ..*desired
                },
                max_frames: max_frames(range.buffer_size()),
            });
        }
    }

    let default_config = device.default_output_config()?;
    let format = default_config.sample_format();
    let config = cpal::StreamConfig {
        channels: desired.channels,
        sample_rate: default_config.sample_rate(),
        buffer_size: cpal::BufferSize::Default,
    };
    Ok(Negotiated {
        config,
        format,
        spec: DeviceSpec {
            sample_rate: default_config.sample_rate().0,
            format: sample_format(format),
            channels: desired.channels,
            buffer_frames: None,
        },
        max_frames: max_frames(default_config.buffer_size()),
    })
}

fn sample_format(format: cpal::SampleFormat) -> SampleFormat {
    match format {
        cpal::SampleFormat::F32 => SampleFormat::F32,
        cpal::SampleFormat::I16 => SampleFormat::I16,
        cpal::SampleFormat::U16 => SampleFormat::U16,
        _ => SampleFormat::Other,
    }
}

/// Samples the conversion buffer must hold for `config`.
fn scratch_len(config: &cpal::StreamConfig, max_frames: u32) -> usize {
    let frames = match config.buffer_size {
        cpal::BufferSize::Fixed(frames) => frames,
        cpal::BufferSize::Default => max_frames,
    };
    frames as usize * config.channels as usize
}

/// Pause a freshly built stream. The device must not call back before start.
fn hold_paused<S: StreamTrait>(stream: &S) -> Result<()> {
    stream.pause().map_err(|e| {
        warn!("stream could not be paused after build: {e}");
        Error::from(e)
    })
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    capacity: usize,
    mut callback: RenderCallback,
) -> Result<cpal::Stream>
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    // Sized here; the audio thread never grows it.
    let mut scratch = vec![0.0f32; capacity];

    let stream = device.build_output_stream(
        config,
        move |data: &mut [T], _: &cpal::OutputCallbackInfo| {
            let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
                render_into(data, &mut scratch, &mut callback);
            }));

            if result.is_err() {
                output_silence(data);
            }
        },
        |err| warn!("audio stream error: {err}"),
        None,
    )?;

    Ok(stream)
}

/// Render through `scratch` and convert into `data`. Samples beyond the
/// scratch capacity are silenced.
#[inline]
fn render_into<T>(data: &mut [T], scratch: &mut [f32], callback: &mut RenderCallback)
where
    T: cpal::SizedSample + cpal::FromSample<f32>,
{
    let len = data.len().min(scratch.len());
    let (rendered, overflow) = data.split_at_mut(len);
    let buffer = &mut scratch[..len];
    callback(buffer);
    for (sample, &value) in rendered.iter_mut().zip(buffer.iter()) {
        *sample = T::from_sample(value);
    }
    output_silence(overflow);
}

/// Output silence (panic recovery).
#[inline]
fn output_silence<T: cpal::SizedSample + cpal::FromSample<f32>>(data: &mut [T]) {
    for sample in data.iter_mut() {
        *sample = T::from_sample(0.0f32);
    }
}

//! Platform audio output seam and the adapter state machine.

use core::fmt;

use tracing::{error, info, warn};

use crate::config::RenderConfig;
use crate::{Error, Result};

/// Invoked on the platform's audio thread whenever the device needs samples.
/// The slice is interleaved `f32`, sized by the negotiated buffer.
pub type RenderCallback = Box<dyn FnMut(&mut [f32]) + Send + 'static>;

/// Identifier of an opened output device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(pub u32);

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SampleFormat {
    #[default]
    F32,
    I16,
    U16,
    Other,
}

impl SampleFormat {
    pub fn is_float(self) -> bool {
        matches!(self, SampleFormat::F32)
    }

    pub fn is_signed(self) -> bool {
        matches!(self, SampleFormat::F32 | SampleFormat::I16)
    }

    pub fn bits(self) -> u32 {
        match self {
            SampleFormat::F32 => 32,
            SampleFormat::I16 | SampleFormat::U16 => 16,
            SampleFormat::Other => 0,
        }
    }
}

/// Requested or obtained output specification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceSpec {
    pub sample_rate: u32,
    pub format: SampleFormat,
    pub channels: u16,
    /// `None` when the platform picks the buffer size.
    pub buffer_frames: Option<u32>,
}

impl DeviceSpec {
    /// The request derived from the render configuration: 32-bit float,
    /// one channel per engine output, preferred buffer size.
    pub fn desired(render: &RenderConfig) -> Self {
        Self {
            sample_rate: render.sample_rate,
            format: SampleFormat::F32,
            channels: render.output_channels as u16,
            buffer_frames: Some(render.buffer_frames),
        }
    }
}

impl fmt::Display for DeviceSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frequency: {} format: f {} s {} sz {} channels: {} samples: ",
            self.sample_rate,
            self.format.is_float() as u8,
            self.format.is_signed() as u8,
            self.format.bits(),
            self.channels,
        )?;
        match self.buffer_frames {
            Some(frames) => write!(f, "{frames}"),
            None => f.write_str("default"),
        }
    }
}

/// Platform audio subsystem: driver selection and device opening.
pub trait AudioHost {
    type Device: AudioDevice;

    /// Names of the drivers compiled into the platform layer, in preference order.
    fn drivers(&self) -> Vec<String>;

    fn init_driver(&mut self, name: &str) -> Result<()>;

    fn current_driver(&self) -> Option<String>;

    /// Names of the playback devices visible through the current driver.
    fn output_devices(&self) -> Result<Vec<String>>;

    /// Open the default output device, paused.
    ///
    /// The platform may grant a different spec than `desired`; the device
    /// reports what it actually got through [`AudioDevice::spec`].
    fn open(&mut self, desired: &DeviceSpec, callback: RenderCallback) -> Result<Self::Device>;

    /// Last error reported by the platform layer, if any.
    fn last_error(&self) -> Option<String>;
}

/// An opened output device. Starts paused.
pub trait AudioDevice {
    fn id(&self) -> DeviceId;

    /// The obtained specification.
    fn spec(&self) -> &DeviceSpec;

    fn set_paused(&mut self, paused: bool) -> Result<()>;

    /// Release the device. No callback fires after this returns.
    fn close(self);
}

/// Try every driver in order and keep the first one that initialises.
pub fn init_first_driver<H: AudioHost>(host: &mut H) -> Result<String> {
    let drivers = host.drivers();
    info!(
        "{} audio backends compiled in: {}",
        drivers.len(),
        drivers.join(", ")
    );

    let mut last_error = None;
    for driver in &drivers {
        match host.init_driver(driver) {
            Ok(()) => {
                let current = host.current_driver().unwrap_or_else(|| driver.clone());
                info!("Audio driver: {current}");
                return Ok(current);
            }
            Err(e) => last_error = Some(e.to_string()),
        }
    }

    let reason = host
        .last_error()
        .or(last_error)
        .unwrap_or_else(|| "no audio drivers available".into());
    error!("Failed to init audio: {reason}");
    Err(Error::DriverInit(reason))
}

/// True when the device granted a rate, channel count or sample format the
/// engine does not render. A different buffer size alone is fine.
pub fn differs_in_layout(desired: &DeviceSpec, obtained: &DeviceSpec) -> bool {
    obtained.sample_rate != desired.sample_rate
        || obtained.channels != desired.channels
        || obtained.format != desired.format
}

/// Lifecycle of the output device. `Closed` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AdapterState {
    #[default]
    Uninitialized,
    Opened,
    Started,
    Closed,
}

impl AdapterState {
    pub fn name(self) -> &'static str {
        match self {
            AdapterState::Uninitialized => "uninitialized",
            AdapterState::Opened => "opened",
            AdapterState::Started => "started",
            AdapterState::Closed => "closed",
        }
    }
}

/// Owns the output device and enforces its lifecycle.
pub struct AudioAdapter<D: AudioDevice> {
    device: Option<D>,
    state: AdapterState,
}

impl<D: AudioDevice> Default for AudioAdapter<D> {
    fn default() -> Self {
        Self::new()
    }
}

impl<D: AudioDevice> AudioAdapter<D> {
    pub fn new() -> Self {
        Self {
            device: None,
            state: AdapterState::Uninitialized,
        }
    }

    /// Open the device, accepting whatever spec the platform grants.
    pub fn open<H>(&mut self, host: &mut H, desired: &DeviceSpec, callback: RenderCallback) -> Result<()>
    where
        H: AudioHost<Device = D>,
    {
        if self.state != AdapterState::Uninitialized {
            return Err(self.invalid("open"));
        }

        match host.output_devices() {
            Ok(devices) => {
                info!("{} audio devices:", devices.len());
                for name in &devices {
                    info!(" '{name}'");
                }
            }
            Err(e) => warn!("Could not list audio devices: {e}"),
        }

        info!("Desired - {desired}");
        let device = host.open(desired, callback).map_err(|e| {
            let reason = host.last_error().unwrap_or_else(|| e.to_string());
            error!("Failed to open audio device: {reason}");
            Error::DeviceOpen(reason)
        })?;

        let obtained = *device.spec();
        info!("Obtained - {obtained}");
        if differs_in_layout(desired, &obtained) {
            warn!(
                desired = %desired,
                obtained = %obtained,
                "device granted a different rate or layout than the engine renders"
            );
        }

        self.device = Some(device);
        self.state = AdapterState::Opened;
        Ok(())
    }

    /// Unpause; the platform starts invoking the render callback.
    pub fn start(&mut self) -> Result<()> {
        if self.state != AdapterState::Opened {
            return Err(self.invalid("start"));
        }
        if let Some(device) = self.device.as_mut() {
            device.set_paused(false)?;
        }
        self.state = AdapterState::Started;
        Ok(())
    }

    /// Pause, then release the device. Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        match self.state {
            AdapterState::Closed => return Ok(()),
            AdapterState::Uninitialized => return Err(self.invalid("close")),
            AdapterState::Opened | AdapterState::Started => {}
        }

        let Some(mut device) = self.device.take() else {
            return Err(self.invalid("close"));
        };
        let paused = device.set_paused(true);
        device.close();
        self.state = AdapterState::Closed;
        paused
    }

    pub fn state(&self) -> AdapterState {
        self.state
    }

    pub fn id(&self) -> Option<DeviceId> {
        self.device.as_ref().map(|d| d.id())
    }

    /// Obtained spec, while a device is open.
    pub fn spec(&self) -> Option<&DeviceSpec> {
        self.device.as_ref().map(|d| d.spec())
    }

    fn invalid(&self, operation: &'static str) -> Error {
        Error::InvalidState {
            operation,
            state: self.state.name(),
        }
    }
}

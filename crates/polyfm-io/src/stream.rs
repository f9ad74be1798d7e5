//! Real-time audio output via cpal.

use crate::{Error, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Host, Stream};

/// Extract device name via `description()` (cpal 0.17+).
pub(crate) fn device_name(device: &Device) -> std::result::Result<String, cpal::DeviceNameError> {
    device.description().map(|d| d.name().to_string())
}

/// Output device information.
#[derive(Debug, Clone)]
pub struct AudioDevice {
    /// Position in the host's output device list, usable as `--device`.
    pub index: usize,
    /// Human-readable device name.
    pub name: String,
    /// Default sample rate in Hz.
    pub default_sample_rate: u32,
    /// Whether this is the host's default output.
    pub is_default: bool,
}

/// List output devices on the default host.
pub fn list_output_devices() -> Result<Vec<AudioDevice>> {
    let host = cpal::default_host();
    let default_name = host
        .default_output_device()
        .and_then(|d| device_name(&d).ok());

    let devices = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .enumerate()
        .filter_map(|(index, device)| {
            let name = device_name(&device).ok()?;
            let default_sample_rate = device
                .default_output_config()
                .map(|c| c.sample_rate())
                .unwrap_or(48000);
            Some(AudioDevice {
                index,
                is_default: default_name.as_deref() == Some(name.as_str()),
                name,
                default_sample_rate,
            })
        })
        .collect();

    Ok(devices)
}

/// Output stream configuration.
#[derive(Debug, Clone)]
pub struct OutputConfig {
    /// Sample rate in Hz. Must match the rate the engine was built for.
    pub sample_rate: u32,
    /// Buffer size in frames (host default if `None`).
    pub buffer_size: Option<u32>,
    /// Output device index or name (uses default if `None`).
    pub device: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            sample_rate: 48000,
            buffer_size: None,
            device: None,
        }
    }
}

/// A running cpal output stream.
///
/// The stream plays until this value is dropped.
pub struct OutputStream {
    _stream: Stream,
    device_name: String,
    sample_rate: u32,
    channels: u16,
}

impl OutputStream {
    /// Open an output device and start calling `render` for every buffer.
    ///
    /// `render` receives the interleaved output buffer and its channel count.
    /// It runs on the audio thread and must not block.
    pub fn open<F>(config: &OutputConfig, mut render: F) -> Result<Self>
    where
        F: FnMut(&mut [f32], usize) + Send + 'static,
    {
        let host = cpal::default_host();
        let device = match config.device.as_deref() {
            Some(query) => find_output_device(&host, query)?,
            None => host.default_output_device().ok_or(Error::NoDevice)?,
        };
        let name = device_name(&device).unwrap_or_else(|_| "unknown".to_string());

        let channels = device
            .default_output_config()
            .map_err(|e| Error::Stream(e.to_string()))?
            .channels();

        let stream_config = cpal::StreamConfig {
            channels,
            sample_rate: config.sample_rate,
            buffer_size: config
                .buffer_size
                .map_or(cpal::BufferSize::Default, cpal::BufferSize::Fixed),
        };

        let channel_count = usize::from(channels);
        let stream = device
            .build_output_stream(
                &stream_config,
                move |data: &mut [f32], _: &cpal::OutputCallbackInfo| {
                    render(data, channel_count);
                },
                |err| tracing::error!(%err, "output stream error"),
                None,
            )
            .map_err(|e| Error::Stream(e.to_string()))?;

        stream.play().map_err(|e| Error::Stream(e.to_string()))?;
        tracing::info!(
            device = %name,
            channels,
            sample_rate = config.sample_rate,
            "output stream started"
        );

        Ok(Self {
            _stream: stream,
            device_name: name,
            sample_rate: config.sample_rate,
            channels,
        })
    }

    /// Name of the device being played.
    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// Stream sample rate in Hz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of interleaved output channels.
    pub fn channels(&self) -> u16 {
        self.channels
    }
}

impl Drop for OutputStream {
    fn drop(&mut self) {
        tracing::info!(device = %self.device_name, "output stream stopped");
    }
}

impl std::fmt::Debug for OutputStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputStream")
            .field("device_name", &self.device_name)
            .field("sample_rate", &self.sample_rate)
            .field("channels", &self.channels)
            .finish_non_exhaustive()
    }
}

/// Find an output device by index, exact name, or partial name.
fn find_output_device(host: &Host, name_or_index: &str) -> Result<Device> {
    let mut devices: Vec<Device> = host
        .output_devices()
        .map_err(|e| Error::Stream(e.to_string()))?
        .collect();
    let names: Vec<Option<String>> = devices.iter().map(|d| device_name(d).ok()).collect();

    let index = match_device(&names, name_or_index)?;
    Ok(devices.swap_remove(index))
}

/// Resolve a device query against a list of names.
///
/// The query is tried as a numeric index, then as an exact name, then as a
/// case-insensitive substring. Unnamed devices only match by index.
fn match_device(names: &[Option<String>], query: &str) -> Result<usize> {
    if let Ok(index) = query.parse::<usize>() {
        return if index < names.len() {
            Ok(index)
        } else {
            Err(Error::DeviceNotFound(format!(
                "output device index {} (only {} devices available)",
                index,
                names.len()
            )))
        };
    }

    if let Some(index) = names.iter().position(|n| n.as_deref() == Some(query)) {
        return Ok(index);
    }

    let query_lower = query.to_lowercase();
    let matches: Vec<(usize, &str)> = names
        .iter()
        .enumerate()
        .filter_map(|(i, n)| n.as_deref().map(|n| (i, n)))
        .filter(|(_, n)| n.to_lowercase().contains(&query_lower))
        .collect();

    match matches.as_slice() {
        [] => Err(Error::DeviceNotFound(format!(
            "no output device matching '{}'",
            query
        ))),
        [(index, _)] => Ok(*index),
        [(index, first), ..] => {
            let all: Vec<&str> = matches.iter().map(|(_, n)| *n).collect();
            tracing::warn!(query, ?all, using = first, "device query matches several outputs");
            Ok(*index)
        }
    }
}

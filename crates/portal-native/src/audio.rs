//! Microphone energy on the desktop: a cpal input stream feeding a shared
//! sample ring, reduced per frame with an FFT magnitude spectrum.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use portal_core::{energy_from_magnitudes, EnergySource};
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

const FFT_SIZE: usize = 1024;

/// Holds the capture stream for its whole lifetime; dropping it stops the
/// input callback, mirroring the web path releasing its tracks.
pub struct MicSpectrum {
    _stream: cpal::Stream,
    ring: Arc<Mutex<VecDeque<f32>>>,
    fft: Arc<dyn Fft<f32>>,
    buffer: Vec<Complex<f32>>,
    magnitudes: Vec<f32>,
}

impl MicSpectrum {
    pub fn open() -> Option<Self> {
        let host = cpal::default_host();
        let device = host.default_input_device()?;
        let config = device.default_input_config().ok()?;
        if config.sample_format() != cpal::SampleFormat::F32 {
            log::info!("input device is not f32, energy stays at zero");
            return None;
        }
        let channels = config.channels() as usize;

        let ring: Arc<Mutex<VecDeque<f32>>> =
            Arc::new(Mutex::new(VecDeque::with_capacity(FFT_SIZE)));
        let ring_writer = ring.clone();
        let stream = device
            .build_input_stream(
                &config.into(),
                move |data: &[f32], _: &cpal::InputCallbackInfo| {
                    let mut ring = match ring_writer.lock() {
                        Ok(guard) => guard,
                        Err(_) => return,
                    };
                    // Mono mixdown of whatever channel count the device has.
                    for frame in data.chunks(channels) {
                        let sample = frame.iter().sum::<f32>() / channels as f32;
                        if ring.len() == FFT_SIZE {
                            ring.pop_front();
                        }
                        ring.push_back(sample);
                    }
                },
                |err| log::error!("input stream error: {err}"),
                None,
            )
            .ok()?;
        stream.play().ok()?;
        log::info!("microphone input stream active");

        Some(Self {
            _stream: stream,
            ring,
            fft: FftPlanner::new().plan_fft_forward(FFT_SIZE),
            buffer: vec![Complex::default(); FFT_SIZE],
            magnitudes: vec![0.0; FFT_SIZE / 2],
        })
    }
}

impl EnergySource for MicSpectrum {
    fn energy_level(&mut self) -> f32 {
        {
            let ring = match self.ring.lock() {
                Ok(guard) => guard,
                Err(_) => return 0.0,
            };
            if ring.len() < FFT_SIZE {
                return 0.0;
            }
            for (slot, &sample) in self.buffer.iter_mut().zip(ring.iter()) {
                *slot = Complex::new(sample, 0.0);
            }
        }
        self.fft.process(&mut self.buffer);
        // Normalize each bin to roughly [0, 1] for full-scale input.
        let scale = 2.0 / FFT_SIZE as f32;
        for (mag, bin) in self
            .magnitudes
            .iter_mut()
            .zip(self.buffer[..FFT_SIZE / 2].iter())
        {
            *mag = bin.norm() * scale;
        }
        energy_from_magnitudes(&self.magnitudes)
    }
}

/// Probes the default input device once, degrading to silence on any failure.
pub fn init_energy_source() -> Box<dyn EnergySource> {
    match MicSpectrum::open() {
        Some(mic) => Box::new(mic),
        None => {
            log::info!("no usable input device, energy stays at zero");
            Box::new(portal_core::SilentEnergy)
        }
    }
}

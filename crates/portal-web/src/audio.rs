//! Microphone capture through WebAudio.
//!
//! Acquisition is attempted once at startup. Denial or missing capability
//! leaves the session permanently on [`SilentEnergy`]; there is no retry.

use portal_core::{energy_from_byte_spectrum, EnergySource, PortalError, SilentEnergy};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys as web;

const FFT_SIZE: u32 = 1024;
const SMOOTHING: f64 = 0.85;

/// Live microphone analyser. Holds the capture stream and audio context for
/// its whole lifetime and releases both exactly once on drop.
pub struct MicEnergy {
    audio_ctx: web::AudioContext,
    stream: web::MediaStream,
    analyser: web::AnalyserNode,
    bins: Vec<u8>,
}

impl EnergySource for MicEnergy {
    fn energy_level(&mut self) -> f32 {
        self.analyser.get_byte_frequency_data(&mut self.bins);
        energy_from_byte_spectrum(&self.bins)
    }
}

impl Drop for MicEnergy {
    fn drop(&mut self) {
        for track in self.stream.get_tracks().iter() {
            if let Ok(track) = track.dyn_into::<web::MediaStreamTrack>() {
                track.stop();
            }
        }
        let _ = self.audio_ctx.close();
        log::info!("microphone capture released");
    }
}

async fn acquire_microphone() -> Result<MicEnergy, PortalError> {
    let window = web::window().ok_or(PortalError::PermissionDenied)?;
    let media = window
        .navigator()
        .media_devices()
        .map_err(|_| PortalError::PermissionDenied)?;
    let constraints = web::MediaStreamConstraints::new();
    constraints.set_audio(&JsValue::TRUE);
    let promise = media
        .get_user_media_with_constraints(&constraints)
        .map_err(|_| PortalError::PermissionDenied)?;
    let stream: web::MediaStream = JsFuture::from(promise)
        .await
        .map_err(|_| PortalError::PermissionDenied)?
        .dyn_into()
        .map_err(|_| PortalError::PermissionDenied)?;

    let audio_ctx =
        web::AudioContext::new().map_err(|_| PortalError::PermissionDenied)?;
    let source = audio_ctx
        .create_media_stream_source(&stream)
        .map_err(|_| PortalError::PermissionDenied)?;
    let analyser = audio_ctx
        .create_analyser()
        .map_err(|_| PortalError::PermissionDenied)?;
    analyser.set_fft_size(FFT_SIZE);
    analyser.set_smoothing_time_constant(SMOOTHING);
    let _ = source.connect_with_audio_node(&analyser);

    let bins = vec![0u8; analyser.frequency_bin_count() as usize];
    Ok(MicEnergy {
        audio_ctx,
        stream,
        analyser,
        bins,
    })
}

/// Probes the microphone once, degrading to the silent source on any failure.
pub async fn init_energy_source() -> Box<dyn EnergySource> {
    match acquire_microphone().await {
        Ok(mic) => {
            log::info!("microphone analyser active");
            Box::new(mic)
        }
        Err(e) => {
            log::info!("microphone unavailable, energy stays at zero: {e}");
            Box::new(SilentEnergy)
        }
    }
}

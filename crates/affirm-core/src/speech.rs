//! Speech playback capability.
//!
//! The actual synthesizer is an external collaborator behind [`SpeechEngine`].
//! [`VoiceService`] owns the current utterance and exposes the small surface
//! the practice screen needs: speak, cancel, and setters for rate, voice and
//! text.

use serde::{Deserialize, Serialize};

use crate::error::SpeechError;
use crate::settings::{clamp_voice_speed, AffirmationSettings};

/// What to say and how.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub rate: f64,
    /// Resolved engine voice; `None` means the engine default.
    pub voice: Option<String>,
}

/// A speech synthesizer.
pub trait SpeechEngine: Send {
    /// Names of the voices the engine can speak with.
    fn voices(&self) -> Vec<String>;

    /// Start speaking. Implementations may return before playback ends.
    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError>;

    /// Stop any active playback.
    fn cancel(&mut self);

    fn is_speaking(&self) -> bool;
}

/// Partial configuration; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct VoiceConfig {
    pub text: Option<String>,
    pub rate: Option<f64>,
    /// `Some(None)` selects the engine default voice.
    pub voice: Option<Option<String>>,
}

impl VoiceConfig {
    pub fn from_settings(settings: &AffirmationSettings) -> Self {
        let voice = if settings.voice_name.is_empty() {
            None
        } else {
            Some(settings.voice_name.clone())
        };
        Self {
            text: Some(settings.affirmation_text.clone()),
            rate: Some(settings.voice_speed),
            voice: Some(voice),
        }
    }
}

/// Stateful wrapper around a [`SpeechEngine`].
///
/// Speaking while a previous utterance is still playing cancels it first;
/// utterances are replaced, never queued.
pub struct VoiceService<E: SpeechEngine> {
    engine: E,
    utterance: Option<Utterance>,
}

impl<E: SpeechEngine> VoiceService<E> {
    pub fn new(engine: E, config: VoiceConfig) -> Self {
        let mut service = Self {
            engine,
            utterance: None,
        };
        service.update_config(config);
        service
    }

    /// Service configured for a settings record.
    pub fn for_settings(engine: E, settings: &AffirmationSettings) -> Self {
        Self::new(engine, VoiceConfig::from_settings(settings))
    }

    /// Apply the provided fields. The utterance is created on the first
    /// config that carries text; until then setters have nothing to change.
    pub fn update_config(&mut self, config: VoiceConfig) {
        if self.utterance.is_none() {
            if let Some(text) = &config.text {
                self.utterance = Some(Utterance {
                    text: text.clone(),
                    rate: clamp_voice_speed(config.rate.unwrap_or(1.0)),
                    voice: None,
                });
            }
        }
        if let Some(text) = config.text {
            self.set_text(text);
        }
        if let Some(rate) = config.rate {
            self.set_rate(rate);
        }
        if let Some(voice) = config.voice {
            self.set_voice(voice.as_deref());
        }
    }

    /// Speak the current utterance, replacing any active one.
    pub fn speak(&mut self) -> Result<(), SpeechError> {
        let utterance = self.utterance.as_ref().ok_or(SpeechError::NoUtterance)?;
        if self.engine.is_speaking() {
            tracing::debug!("cancelling active utterance before speaking");
            self.engine.cancel();
        }
        self.engine.speak(utterance)
    }

    pub fn cancel(&mut self) {
        self.engine.cancel();
    }

    /// Set the playback rate, clamped to the supported range.
    pub fn set_rate(&mut self, rate: f64) {
        if let Some(u) = self.utterance.as_mut() {
            u.rate = clamp_voice_speed(rate);
        }
    }

    /// Select a voice by name. Names the engine does not offer fall back to
    /// the engine default.
    pub fn set_voice(&mut self, name: Option<&str>) {
        let resolved = name.and_then(|wanted| {
            let found = self.engine.voices().into_iter().find(|v| v == wanted);
            if found.is_none() {
                tracing::debug!(voice = wanted, "voice not offered by engine; using default");
            }
            found
        });
        if let Some(u) = self.utterance.as_mut() {
            u.voice = resolved;
        }
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        if let Some(u) = self.utterance.as_mut() {
            u.text = text.into();
        }
    }

    pub fn utterance(&self) -> Option<&Utterance> {
        self.utterance.as_ref()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }
}

//! Terminal stand-in for a speech synthesizer: utterances are printed.

use affirm_core::{SpeechEngine, SpeechError, Utterance};

pub struct TerminalSpeech {
    voices: Vec<String>,
    default_voice: String,
}

impl TerminalSpeech {
    /// Engine offering `voices`; `default_voice` is shown when an utterance
    /// has no voice of its own.
    pub fn new(voices: Vec<String>, default_voice: impl Into<String>) -> Self {
        Self {
            voices,
            default_voice: default_voice.into(),
        }
    }
}

impl SpeechEngine for TerminalSpeech {
    fn voices(&self) -> Vec<String> {
        self.voices.clone()
    }

    fn speak(&mut self, utterance: &Utterance) -> Result<(), SpeechError> {
        let voice = utterance.voice.as_deref().unwrap_or(&self.default_voice);
        println!("[{voice} @ {}x] {}", utterance.rate, utterance.text);
        Ok(())
    }

    // Printing is instantaneous; there is never anything to stop.
    fn cancel(&mut self) {}

    fn is_speaking(&self) -> bool {
        false
    }
}

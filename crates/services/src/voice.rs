//! Audio output and speech-to-text plumbing.

use std::env;

use async_trait::async_trait;

use crate::ai::SpeechClip;

const STT_PLACEHOLDER_KEY: &str = "your_assemblyai_api_key_here";
const STT_MIN_KEY_LEN: usize = 11;

/// Plays synthesized speech. `play` resolves once playback has ended.
#[async_trait]
pub trait AudioSink: Send + Sync {
    async fn play(&self, clip: &SpeechClip);
}

/// Discards audio; used for headless runs and tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullAudioSink;

#[async_trait]
impl AudioSink for NullAudioSink {
    async fn play(&self, _clip: &SpeechClip) {}
}

/// Credentials for streaming transcription.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptionConfig {
    pub api_key: String,
}

impl TranscriptionConfig {
    /// `None` disables voice input: the key is missing, still the
    /// placeholder, or too short to be real.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        Self::from_key(&env::var("INTERVIEW_STT_API_KEY").ok()?)
    }

    #[must_use]
    pub fn from_key(raw: &str) -> Option<Self> {
        let key = raw.trim();
        if key == STT_PLACEHOLDER_KEY || key.len() < STT_MIN_KEY_LEN {
            return None;
        }
        Some(Self {
            api_key: key.to_string(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TranscriptEvent {
    /// Interim hypothesis for the utterance in progress.
    Partial(String),
    /// Settled text for one utterance.
    Final(String),
}

/// Merges transcript events into the answer draft.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptBuffer {
    settled: String,
    pending: String,
}

impl TranscriptBuffer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(&mut self, event: TranscriptEvent) {
        match event {
            TranscriptEvent::Partial(text) => self.pending = text.trim().to_string(),
            TranscriptEvent::Final(text) => {
                let text = text.trim();
                if !text.is_empty() {
                    if !self.settled.is_empty() {
                        self.settled.push(' ');
                    }
                    self.settled.push_str(text);
                }
                self.pending.clear();
            }
        }
    }

    /// Settled text followed by the current partial, if any.
    #[must_use]
    pub fn draft(&self) -> String {
        match (self.settled.is_empty(), self.pending.is_empty()) {
            (_, true) => self.settled.clone(),
            (true, false) => self.pending.clone(),
            (false, false) => format!("{} {}", self.settled, self.pending),
        }
    }

    pub fn clear(&mut self) {
        self.settled.clear();
        self.pending.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn placeholder_and_short_keys_disable_voice() {
        assert!(TranscriptionConfig::from_key(STT_PLACEHOLDER_KEY).is_none());
        assert!(TranscriptionConfig::from_key("short").is_none());
        assert!(TranscriptionConfig::from_key("0123456789").is_none());
        assert_eq!(
            TranscriptionConfig::from_key(" 0123456789a ").map(|c| c.api_key),
            Some("0123456789a".to_string())
        );
    }

    #[test]
    fn partials_are_replaced_and_finals_accumulate() {
        let mut buf = TranscriptBuffer::new();
        buf.apply(TranscriptEvent::Partial("the event".into()));
        buf.apply(TranscriptEvent::Partial("the event loop".into()));
        assert_eq!(buf.draft(), "the event loop");

        buf.apply(TranscriptEvent::Final("The event loop".into()));
        buf.apply(TranscriptEvent::Partial("polls".into()));
        assert_eq!(buf.draft(), "The event loop polls");

        buf.apply(TranscriptEvent::Final("polls the queue.".into()));
        assert_eq!(buf.draft(), "The event loop polls the queue.");

        buf.clear();
        assert_eq!(buf.draft(), "");
    }
}

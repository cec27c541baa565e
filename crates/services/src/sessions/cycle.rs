use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, warn};

use crate::ai::ResilientAi;
use crate::voice::{AudioSink, NullAudioSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleTimings {
    /// Upper bound on synthesis plus playback.
    pub playback_timeout: Duration,
    /// Reading time granted when speech could not be synthesized.
    pub synthesis_fallback_delay: Duration,
    pub tick: Duration,
    /// Period of background saves while the app waits on the candidate.
    pub autosave: Duration,
}

impl Default for CycleTimings {
    fn default() -> Self {
        Self {
            playback_timeout: Duration::from_secs(30),
            synthesis_fallback_delay: Duration::from_secs(5),
            tick: Duration::from_secs(1),
            autosave: Duration::from_secs(5),
        }
    }
}

/// How the countdown gate was released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    /// No audio was requested.
    Silent,
    Played,
    PlaybackTimedOut,
    FallbackDelay,
}

/// Speaks a question before its countdown may start.
#[derive(Clone)]
pub struct CycleController {
    ai: ResilientAi,
    audio: Arc<dyn AudioSink>,
    timings: CycleTimings,
}

impl CycleController {
    #[must_use]
    pub fn new(ai: ResilientAi, audio: Arc<dyn AudioSink>, timings: CycleTimings) -> Self {
        Self { ai, audio, timings }
    }

    /// No audio output and zero delays.
    #[must_use]
    pub fn headless(ai: ResilientAi) -> Self {
        Self::new(
            ai,
            Arc::new(NullAudioSink),
            CycleTimings {
                playback_timeout: Duration::from_secs(30),
                synthesis_fallback_delay: Duration::ZERO,
                ..CycleTimings::default()
            },
        )
    }

    #[must_use]
    pub fn timings(&self) -> CycleTimings {
        self.timings
    }

    /// Resolves when the countdown for `text` may begin.
    pub async fn gate(&self, text: &str, play_audio: bool) -> GateOutcome {
        if !play_audio {
            return GateOutcome::Silent;
        }
        let spoken = tokio::time::timeout(self.timings.playback_timeout, async {
            match self.ai.speech(text).await {
                Some(clip) => {
                    self.audio.play(&clip).await;
                    true
                }
                None => false,
            }
        })
        .await;

        match spoken {
            Ok(true) => {
                debug!("question audio finished");
                GateOutcome::Played
            }
            Ok(false) => {
                tokio::time::sleep(self.timings.synthesis_fallback_delay).await;
                GateOutcome::FallbackDelay
            }
            Err(_) => {
                warn!(
                    timeout_secs = self.timings.playback_timeout.as_secs(),
                    "question audio timed out"
                );
                GateOutcome::PlaybackTimedOut
            }
        }
    }

    /// A one-second ticker whose first tick fires after one period.
    #[must_use]
    pub fn ticker(&self) -> Interval {
        delayed_interval(self.timings.tick)
    }

    /// Ticker for background saves; first tick after one period.
    #[must_use]
    pub fn autosave_ticker(&self) -> Interval {
        delayed_interval(self.timings.autosave)
    }
}

fn delayed_interval(period: Duration) -> Interval {
    let start = tokio::time::Instant::now() + period;
    let mut interval = tokio::time::interval_at(start, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
    interval
}

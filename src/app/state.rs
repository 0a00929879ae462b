use crate::api::NarrationClient;
use crate::config::AppConfig;
use crate::playback::PlaybackHandle;
use crate::voices::Voice;
use iced::Task;
use iced::widget::text_editor;
use std::path::PathBuf;
use std::time::{Duration, Instant};
use tracing::debug;

use super::messages::Message;

/// A PDF the user has loaded for submission, plus its display preview.
pub(super) struct LoadedPdf {
    pub(super) path: PathBuf,
    pub(super) file_name: String,
    pub(super) bytes: Vec<u8>,
    pub(super) preview: String,
}

pub(super) struct InputState {
    pub(super) youtube_url: String,
    pub(super) text: text_editor::Content,
    pub(super) pdf_path_input: String,
    pub(super) pdf: Option<LoadedPdf>,
    pub(super) pdf_loading: bool,
}

pub(super) struct VoiceState {
    pub(super) catalog: Vec<Voice>,
    pub(super) selected_id: String,
}

impl VoiceState {
    pub(super) fn selected_voice(&self) -> Option<Voice> {
        self.catalog
            .iter()
            .find(|voice| voice.voice_id == self.selected_id)
            .cloned()
    }
}

/// The single in-flight submission flag plus the sequence counter used to
/// recognize stale completions.
pub(super) struct SubmissionState {
    pub(super) in_flight: bool,
    pub(super) request_seq: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PlaybackLifecycle {
    Idle,
    Loading { generation: u64 },
    Playing,
    Paused,
}

pub(super) struct PlaybackState {
    pub(super) handle: Option<PlaybackHandle>,
    pub(super) lifecycle: PlaybackLifecycle,
    pub(super) generation: u64,
    pub(super) reference: Option<String>,
    pub(super) peaks: Vec<f32>,
    pub(super) duration: Duration,
    pub(super) started_at: Option<Instant>,
    pub(super) elapsed: Duration,
}

impl PlaybackState {
    pub(super) fn new() -> Self {
        Self {
            handle: None,
            lifecycle: PlaybackLifecycle::Idle,
            generation: 0,
            reference: None,
            peaks: Vec::new(),
            duration: Duration::ZERO,
            started_at: None,
            elapsed: Duration::ZERO,
        }
    }

    pub(super) fn is_playing(&self) -> bool {
        matches!(self.lifecycle, PlaybackLifecycle::Playing)
    }

    /// Tear down any live engine and enter the loading state for the next
    /// audio. Returns the generation the pending load must report back.
    pub(super) fn begin_loading(&mut self) -> u64 {
        self.teardown();
        self.generation = self.generation.wrapping_add(1);
        self.lifecycle = PlaybackLifecycle::Loading {
            generation: self.generation,
        };
        self.generation
    }

    /// The single teardown point; safe to call in any state.
    pub(super) fn teardown(&mut self) {
        if let Some(handle) = self.handle.take() {
            debug!("Tearing down playback engine");
            handle.stop();
        }
        self.lifecycle = PlaybackLifecycle::Idle;
        self.started_at = None;
        self.elapsed = Duration::ZERO;
    }

    pub(super) fn note_paused(&mut self) {
        if let Some(started) = self.started_at.take() {
            self.elapsed += Instant::now().saturating_duration_since(started);
        }
        self.lifecycle = PlaybackLifecycle::Paused;
    }

    pub(super) fn elapsed_now(&self) -> Duration {
        let running = self
            .started_at
            .map(|started| Instant::now().saturating_duration_since(started))
            .unwrap_or(Duration::ZERO);
        let total = self.elapsed + running;
        if self.duration.is_zero() {
            total
        } else {
            total.min(self.duration)
        }
    }

    /// Fraction of the track already played, for the waveform cursor.
    pub(super) fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 0.0;
        }
        (self.elapsed_now().as_secs_f32() / self.duration.as_secs_f32()).clamp(0.0, 1.0)
    }
}

/// Core application state composed of sub-models.
pub struct App {
    pub(super) config: AppConfig,
    pub(super) client: NarrationClient,
    pub(super) inputs: InputState,
    pub(super) voices: VoiceState,
    pub(super) submission: SubmissionState,
    pub(super) playback: PlaybackState,
    pub(super) notice: Option<String>,
}

impl App {
    pub(super) fn bootstrap(config: AppConfig, client: NarrationClient) -> (App, Task<Message>) {
        let app = App {
            inputs: InputState {
                youtube_url: String::new(),
                text: text_editor::Content::new(),
                pdf_path_input: String::new(),
                pdf: None,
                pdf_loading: false,
            },
            voices: VoiceState {
                catalog: Vec::new(),
                selected_id: config.default_voice_id.clone(),
            },
            submission: SubmissionState {
                in_flight: false,
                request_seq: 0,
            },
            playback: PlaybackState::new(),
            notice: None,
            client,
            config,
        };

        let fetch = {
            let client = app.client.clone();
            Task::perform(
                async move {
                    match client.fetch_voices().await {
                        Ok(voices) => Message::VoicesLoaded {
                            voices,
                            error: None,
                        },
                        Err(err) => Message::VoicesLoaded {
                            voices: Vec::new(),
                            error: Some(format!("{err:#}")),
                        },
                    }
                },
                |msg| msg,
            )
        };
        (app, fetch)
    }
}

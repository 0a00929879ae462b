use super::messages::Message;
use super::state::{App, PlaybackLifecycle};
use crate::api::{NarrationClient, is_youtube_url};
use crate::config::{MAX_VOLUME, MIN_VOLUME, ThemeMode, config_path, save_config};
use crate::playback::{LoadedAudio, PlaybackHandle};
use crate::{cache, pdf_text, playback};
use iced::time;
use iced::{Subscription, Task};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

impl App {
    pub fn subscription(app: &App) -> Subscription<Message> {
        if app.playback.is_playing() {
            time::every(Duration::from_millis(100)).map(Message::Tick)
        } else {
            Subscription::none()
        }
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        let mut tasks: Vec<Task<Message>> = Vec::new();

        match message {
            Message::ToggleTheme => {
                self.config.theme = match self.config.theme {
                    ThemeMode::Day => ThemeMode::Night,
                    ThemeMode::Night => ThemeMode::Day,
                };
                info!(
                    night_mode = matches!(self.config.theme, ThemeMode::Night),
                    "Toggled theme"
                );
                save_config(&config_path(), &self.config);
            }
            Message::VolumeChanged(volume) => {
                self.config.volume = volume.clamp(MIN_VOLUME, MAX_VOLUME);
                if let Some(handle) = &self.playback.handle {
                    handle.set_volume(self.config.volume);
                }
                debug!(volume = self.config.volume, "Adjusted playback volume");
                save_config(&config_path(), &self.config);
            }
            Message::YoutubeUrlChanged(url) => {
                self.inputs.youtube_url = url;
            }
            Message::TextEdited(action) => {
                self.inputs.text.perform(action);
            }
            Message::PdfPathChanged(path) => {
                self.inputs.pdf_path_input = path;
            }
            Message::LoadPdf => self.handle_load_pdf(&mut tasks),
            Message::PdfLoaded {
                path,
                bytes,
                preview,
            } => {
                let file_name = path
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "document.pdf".to_string());
                info!(
                    path = %path.display(),
                    size = bytes.len(),
                    preview_chars = preview.len(),
                    "Loaded PDF"
                );
                self.inputs.pdf_loading = false;
                self.inputs.pdf = Some(super::state::LoadedPdf {
                    path,
                    file_name,
                    bytes,
                    preview,
                });
                self.notice = None;
            }
            Message::PdfLoadFailed { path, error } => {
                warn!(path = %path.display(), %error, "Failed to read PDF");
                self.inputs.pdf_loading = false;
                self.notice = Some("Failed to read the PDF file. Check the path and try again.".to_string());
            }
            Message::VoicesLoaded { voices, error } => {
                if let Some(error) = error {
                    warn!(%error, "Voice catalog fetch failed; keeping current catalog");
                } else {
                    info!(count = voices.len(), "Voice catalog updated");
                    self.voices.catalog = voices;
                    let resolved =
                        crate::voices::resolve_selection(&self.voices.selected_id, &self.voices.catalog);
                    if resolved != self.voices.selected_id {
                        info!(
                            from = %self.voices.selected_id,
                            to = %resolved,
                            "Voice selection no longer in catalog; reset"
                        );
                        self.voices.selected_id = resolved;
                    }
                }
            }
            Message::VoiceSelected(voice) => {
                debug!(voice_id = %voice.voice_id, "Voice selected");
                self.voices.selected_id = voice.voice_id;
            }
            Message::SubmitYoutube => self.handle_submit_youtube(&mut tasks),
            Message::SubmitPdf => self.handle_submit_pdf(&mut tasks),
            Message::SubmitText => self.handle_submit_text(&mut tasks),
            Message::SubmissionFinished {
                request_id,
                audio_url,
                error,
            } => self.handle_submission_finished(request_id, audio_url, error, &mut tasks),
            Message::AudioLoaded {
                generation,
                audio,
                error,
            } => self.handle_audio_loaded(generation, audio, error),
            Message::TogglePlayPause => self.handle_toggle_play_pause(&mut tasks),
            Message::Tick(_now) => {
                if self.playback.is_playing() {
                    let finished = self
                        .playback
                        .handle
                        .as_ref()
                        .map(PlaybackHandle::is_finished)
                        .unwrap_or(false);
                    let engine_paused = self
                        .playback
                        .handle
                        .as_ref()
                        .map(PlaybackHandle::is_paused)
                        .unwrap_or(false);
                    if finished {
                        info!("Playback reached end of track");
                        self.playback.elapsed = self.playback.duration;
                        self.playback.started_at = None;
                        self.playback.lifecycle = PlaybackLifecycle::Paused;
                    } else if engine_paused {
                        // Keep the displayed state honest if the engine pauses
                        // without going through the toggle.
                        self.playback.note_paused();
                    }
                }
            }
        }

        Task::batch(tasks)
    }

    fn handle_load_pdf(&mut self, tasks: &mut Vec<Task<Message>>) {
        let input = self.inputs.pdf_path_input.trim();
        if input.is_empty() {
            self.notice = Some("Enter the path to a PDF file first.".to_string());
            return;
        }
        let path = PathBuf::from(input);
        info!(path = %path.display(), "Reading PDF");
        self.inputs.pdf_loading = true;
        self.notice = None;
        tasks.push(Task::perform(
            async move {
                match std::fs::read(&path) {
                    Ok(bytes) => {
                        let preview = pdf_text::extract_preview(&bytes);
                        Message::PdfLoaded {
                            path,
                            bytes,
                            preview,
                        }
                    }
                    Err(err) => Message::PdfLoadFailed {
                        path,
                        error: err.to_string(),
                    },
                }
            },
            |msg| msg,
        ));
    }

    fn handle_submit_youtube(&mut self, tasks: &mut Vec<Task<Message>>) {
        if self.submission.in_flight {
            debug!("Ignoring submission while another is in flight");
            return;
        }
        let url = self.inputs.youtube_url.trim().to_string();
        if !is_youtube_url(&url) {
            warn!(%url, "Rejected narration request without a YouTube host");
            self.notice = Some("Please enter a valid YouTube URL".to_string());
            return;
        }
        let voice_id = self.voices.selected_id.clone();
        let client = self.client.clone();
        let request_id = self.begin_submission();
        info!(%url, %voice_id, request_id, "Submitting YouTube narration request");
        tasks.push(Task::perform(
            async move {
                match client.submit_youtube(&url, &voice_id).await {
                    Ok(audio_url) => Message::SubmissionFinished {
                        request_id,
                        audio_url,
                        error: None,
                    },
                    Err(err) => Message::SubmissionFinished {
                        request_id,
                        audio_url: None,
                        error: Some(format!("{err:#}")),
                    },
                }
            },
            |msg| msg,
        ));
    }

    fn handle_submit_pdf(&mut self, tasks: &mut Vec<Task<Message>>) {
        if self.submission.in_flight {
            debug!("Ignoring submission while another is in flight");
            return;
        }
        let Some(pdf) = &self.inputs.pdf else {
            warn!("Rejected PDF narration request without a loaded file");
            self.notice = Some("Please upload a PDF first.".to_string());
            return;
        };
        let file_name = pdf.file_name.clone();
        let bytes = pdf.bytes.clone();
        let voice_id = self.voices.selected_id.clone();
        let client = self.client.clone();
        let request_id = self.begin_submission();
        info!(
            file = %file_name,
            size = bytes.len(),
            %voice_id,
            request_id,
            "Submitting PDF narration request"
        );
        tasks.push(Task::perform(
            async move {
                match client.submit_pdf(&file_name, bytes, &voice_id).await {
                    Ok(audio_url) => Message::SubmissionFinished {
                        request_id,
                        audio_url,
                        error: None,
                    },
                    Err(err) => Message::SubmissionFinished {
                        request_id,
                        audio_url: None,
                        error: Some(format!("{err:#}")),
                    },
                }
            },
            |msg| msg,
        ));
    }

    fn handle_submit_text(&mut self, tasks: &mut Vec<Task<Message>>) {
        if self.submission.in_flight {
            debug!("Ignoring submission while another is in flight");
            return;
        }
        let text = self.inputs.text.text();
        let text = text.trim().to_string();
        if text.is_empty() {
            warn!("Rejected narration request with empty text");
            self.notice = Some("Please enter some text to narrate.".to_string());
            return;
        }
        let voice_id = self.voices.selected_id.clone();
        let client = self.client.clone();
        let request_id = self.begin_submission();
        info!(chars = text.len(), %voice_id, request_id, "Submitting text narration request");
        tasks.push(Task::perform(
            async move {
                match client.submit_text(&text, &voice_id).await {
                    Ok(audio_url) => Message::SubmissionFinished {
                        request_id,
                        audio_url,
                        error: None,
                    },
                    Err(err) => Message::SubmissionFinished {
                        request_id,
                        audio_url: None,
                        error: Some(format!("{err:#}")),
                    },
                }
            },
            |msg| msg,
        ));
    }

    /// Acquire the loading gate. Only called after local validation passed.
    fn begin_submission(&mut self) -> u64 {
        self.submission.request_seq = self.submission.request_seq.wrapping_add(1);
        self.submission.in_flight = true;
        self.notice = None;
        self.submission.request_seq
    }

    fn handle_submission_finished(
        &mut self,
        request_id: u64,
        audio_url: Option<String>,
        error: Option<String>,
        tasks: &mut Vec<Task<Message>>,
    ) {
        if request_id != self.submission.request_seq {
            debug!(
                request_id,
                current = self.submission.request_seq,
                "Ignoring stale narration response"
            );
            return;
        }
        self.submission.in_flight = false;
        if let Some(error) = error {
            warn!(%error, "Narration request failed");
            self.notice = Some("Narration failed. Check the logs for details.".to_string());
            return;
        }
        match audio_url {
            Some(reference) => {
                let url = self.client.resolve_audio_url(&reference);
                info!(%url, "Received audio reference");
                self.set_audio_reference(url, tasks);
            }
            None => {
                info!("Narration settled without audio");
                self.notice = Some("The narration service produced no audio.".to_string());
            }
        }
    }

    /// Replace the current audio reference: tear down the live engine, then
    /// load the new audio under a fresh generation.
    fn set_audio_reference(&mut self, url: String, tasks: &mut Vec<Task<Message>>) {
        self.playback.reference = Some(url.clone());
        let generation = self.playback.begin_loading();
        let client = self.client.clone();
        let use_cache = self.config.cache_audio;
        debug!(%url, generation, "Loading audio reference");
        tasks.push(Task::perform(
            async move {
                match load_audio(client, &url, use_cache).await {
                    Ok(audio) => Message::AudioLoaded {
                        generation,
                        audio: Some(audio),
                        error: None,
                    },
                    Err(err) => Message::AudioLoaded {
                        generation,
                        audio: None,
                        error: Some(format!("{err:#}")),
                    },
                }
            },
            |msg| msg,
        ));
    }

    fn handle_audio_loaded(
        &mut self,
        generation: u64,
        audio: Option<LoadedAudio>,
        error: Option<String>,
    ) {
        if generation != self.playback.generation {
            debug!(
                generation,
                current = self.playback.generation,
                "Ignoring stale audio load"
            );
            return;
        }
        if let Some(error) = error {
            warn!(%error, "Audio load failed");
            self.playback.lifecycle = PlaybackLifecycle::Idle;
            return;
        }
        let Some(audio) = audio else {
            self.playback.lifecycle = PlaybackLifecycle::Idle;
            return;
        };
        self.playback.peaks = audio.peaks;
        self.playback.duration = audio.duration;
        match PlaybackHandle::start(&audio.bytes, self.config.volume) {
            Ok(handle) => {
                info!(
                    duration_ms = self.playback.duration.as_millis(),
                    "Audio loaded; playback started"
                );
                self.playback.handle = Some(handle);
                self.playback.elapsed = Duration::ZERO;
                self.playback.started_at = Some(Instant::now());
                self.playback.lifecycle = PlaybackLifecycle::Playing;
            }
            Err(err) => {
                warn!("Failed to start playback: {err:#}");
                self.playback.lifecycle = PlaybackLifecycle::Idle;
            }
        }
    }

    fn handle_toggle_play_pause(&mut self, tasks: &mut Vec<Task<Message>>) {
        match self.playback.lifecycle {
            PlaybackLifecycle::Playing => {
                if let Some(handle) = &self.playback.handle {
                    handle.pause();
                }
                self.playback.note_paused();
                info!("Paused playback");
            }
            PlaybackLifecycle::Paused => {
                let finished = self
                    .playback
                    .handle
                    .as_ref()
                    .map(PlaybackHandle::is_finished)
                    .unwrap_or(true);
                if finished {
                    if let Some(url) = self.playback.reference.clone() {
                        info!("Replaying audio reference");
                        self.set_audio_reference(url, tasks);
                    }
                } else if let Some(handle) = &self.playback.handle {
                    handle.play();
                    self.playback.started_at = Some(Instant::now());
                    self.playback.lifecycle = PlaybackLifecycle::Playing;
                    info!("Resumed playback");
                }
            }
            PlaybackLifecycle::Idle => {
                if let Some(url) = self.playback.reference.clone() {
                    info!("Retrying audio load");
                    self.set_audio_reference(url, tasks);
                }
            }
            PlaybackLifecycle::Loading { .. } => {}
        }
    }
}

/// Fetch the referenced audio (through the local cache when enabled) and
/// decode it for playback.
async fn load_audio(
    client: NarrationClient,
    url: &str,
    use_cache: bool,
) -> anyhow::Result<LoadedAudio> {
    let cache_root = Path::new(cache::CACHE_DIR);
    let bytes = match use_cache
        .then(|| cache::load_audio(cache_root, url))
        .flatten()
    {
        Some(bytes) => bytes,
        None => {
            let bytes = client.download_audio(url).await?;
            if use_cache {
                cache::store_audio(cache_root, url, &bytes);
            }
            bytes
        }
    };
    playback::analyze(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use iced::widget::text_editor;

    fn test_app() -> App {
        let config = AppConfig::default();
        let client = NarrationClient::new(&config).expect("client");
        App::bootstrap(config, client).0
    }

    fn finish_with_url(app: &mut App, request_id: u64, url: &str) {
        let _ = app.update(Message::SubmissionFinished {
            request_id,
            audio_url: Some(url.to_string()),
            error: None,
        });
    }

    #[test]
    fn empty_text_never_acquires_the_gate() {
        let mut app = test_app();
        let _ = app.update(Message::SubmitText);
        assert!(!app.submission.in_flight);
        assert_eq!(app.submission.request_seq, 0);
        assert_eq!(
            app.notice.as_deref(),
            Some("Please enter some text to narrate.")
        );
    }

    #[test]
    fn non_youtube_url_never_acquires_the_gate() {
        let mut app = test_app();
        app.inputs.youtube_url = "https://vimeo.com/123".to_string();
        let _ = app.update(Message::SubmitYoutube);
        assert!(!app.submission.in_flight);
        assert_eq!(app.submission.request_seq, 0);
        assert_eq!(app.notice.as_deref(), Some("Please enter a valid YouTube URL"));
    }

    #[test]
    fn pdf_submission_requires_a_loaded_file() {
        let mut app = test_app();
        let _ = app.update(Message::SubmitPdf);
        assert!(!app.submission.in_flight);
        assert_eq!(app.notice.as_deref(), Some("Please upload a PDF first."));
    }

    #[test]
    fn valid_text_submission_acquires_the_gate() {
        let mut app = test_app();
        app.inputs.text = text_editor::Content::with_text("Hello world");
        let _ = app.update(Message::SubmitText);
        assert!(app.submission.in_flight);
        assert_eq!(app.submission.request_seq, 1);
        assert!(app.notice.is_none());
    }

    #[test]
    fn stale_completion_releases_nothing() {
        let mut app = test_app();
        app.inputs.text = text_editor::Content::with_text("Hello world");
        let _ = app.update(Message::SubmitText);
        finish_with_url(&mut app, 0, "https://x/stale.mp3");
        assert!(app.submission.in_flight, "stale response released the gate");
        assert!(app.playback.reference.is_none());
    }

    #[test]
    fn failed_completion_releases_gate_and_keeps_reference() {
        let mut app = test_app();
        app.playback.reference = Some("https://x/old.mp3".to_string());
        app.inputs.text = text_editor::Content::with_text("Hello world");
        let _ = app.update(Message::SubmitText);
        let _ = app.update(Message::SubmissionFinished {
            request_id: 1,
            audio_url: None,
            error: Some("boom".to_string()),
        });
        assert!(!app.submission.in_flight);
        assert!(app.notice.is_some());
        assert_eq!(
            app.playback.reference.as_deref(),
            Some("https://x/old.mp3"),
            "a failed submission must not clear the previous reference"
        );
    }

    #[test]
    fn missing_audio_url_is_no_audio_not_an_error() {
        let mut app = test_app();
        app.inputs.text = text_editor::Content::with_text("Hello world");
        let _ = app.update(Message::SubmitText);
        let _ = app.update(Message::SubmissionFinished {
            request_id: 1,
            audio_url: None,
            error: None,
        });
        assert!(!app.submission.in_flight);
        assert!(app.playback.reference.is_none());
        assert_eq!(app.playback.lifecycle, PlaybackLifecycle::Idle);
    }

    #[test]
    fn successful_completion_enters_loading_under_a_new_generation() {
        let mut app = test_app();
        app.inputs.text = text_editor::Content::with_text("Hello world");
        let _ = app.update(Message::SubmitText);
        finish_with_url(&mut app, 1, "https://x/a.mp3");
        assert!(!app.submission.in_flight);
        assert_eq!(app.playback.reference.as_deref(), Some("https://x/a.mp3"));
        assert_eq!(app.playback.generation, 1);
        assert_eq!(
            app.playback.lifecycle,
            PlaybackLifecycle::Loading { generation: 1 }
        );
    }

    #[test]
    fn newer_reference_supersedes_the_pending_load() {
        let mut app = test_app();
        app.inputs.text = text_editor::Content::with_text("Hello world");
        let _ = app.update(Message::SubmitText);
        finish_with_url(&mut app, 1, "https://x/a.mp3");
        let _ = app.update(Message::SubmitText);
        finish_with_url(&mut app, 2, "https://x/b.mp3");
        assert_eq!(app.playback.generation, 2);

        // The first load settles late; it must not touch the newer state.
        let _ = app.update(Message::AudioLoaded {
            generation: 1,
            audio: None,
            error: Some("late failure".to_string()),
        });
        assert_eq!(
            app.playback.lifecycle,
            PlaybackLifecycle::Loading { generation: 2 }
        );
        assert_eq!(app.playback.reference.as_deref(), Some("https://x/b.mp3"));
    }

    #[test]
    fn audio_load_failure_returns_to_idle() {
        let mut app = test_app();
        app.inputs.text = text_editor::Content::with_text("Hello world");
        let _ = app.update(Message::SubmitText);
        finish_with_url(&mut app, 1, "https://x/a.mp3");
        let _ = app.update(Message::AudioLoaded {
            generation: 1,
            audio: None,
            error: Some("decode failed".to_string()),
        });
        assert_eq!(app.playback.lifecycle, PlaybackLifecycle::Idle);
        assert_eq!(
            app.playback.reference.as_deref(),
            Some("https://x/a.mp3"),
            "the reference stays for a manual retry"
        );
    }

    #[test]
    fn voice_fetch_failure_keeps_current_catalog() {
        let mut app = test_app();
        app.voices.catalog = vec![crate::voices::Voice {
            voice_id: "en-US-ken".to_string(),
            name: None,
            locale: None,
        }];
        app.voices.selected_id = "en-US-ken".to_string();
        let _ = app.update(Message::VoicesLoaded {
            voices: Vec::new(),
            error: Some("503".to_string()),
        });
        assert_eq!(app.voices.catalog.len(), 1);
        assert_eq!(app.voices.selected_id, "en-US-ken");
    }

    #[test]
    fn refreshed_catalog_re_resolves_the_selection() {
        let mut app = test_app();
        app.voices.selected_id = "gone".to_string();
        let _ = app.update(Message::VoicesLoaded {
            voices: vec![crate::voices::Voice {
                voice_id: "en-US-ken".to_string(),
                name: None,
                locale: None,
            }],
            error: None,
        });
        assert_eq!(app.voices.selected_id, "en-US-ken");
    }

    #[test]
    fn empty_catalog_falls_back_to_the_default_id() {
        let mut app = test_app();
        let _ = app.update(Message::VoicesLoaded {
            voices: Vec::new(),
            error: None,
        });
        assert_eq!(app.voices.selected_id, crate::voices::FALLBACK_VOICE_ID);
        assert!(app.voices.catalog.is_empty());
    }
}

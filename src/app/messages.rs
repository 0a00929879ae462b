use crate::playback::LoadedAudio;
use crate::voices::Voice;
use iced::widget::text_editor;
use std::path::PathBuf;
use std::time::Instant;

/// Messages emitted by the UI and by completed background work.
///
/// Completion messages carry the sequence/generation id of the work that
/// produced them so the reducer can drop anything stale.
#[derive(Debug, Clone)]
pub enum Message {
    ToggleTheme,
    VolumeChanged(f32),
    YoutubeUrlChanged(String),
    TextEdited(text_editor::Action),
    PdfPathChanged(String),
    LoadPdf,
    PdfLoaded {
        path: PathBuf,
        bytes: Vec<u8>,
        preview: String,
    },
    PdfLoadFailed {
        path: PathBuf,
        error: String,
    },
    VoicesLoaded {
        voices: Vec<Voice>,
        error: Option<String>,
    },
    VoiceSelected(Voice),
    SubmitYoutube,
    SubmitPdf,
    SubmitText,
    SubmissionFinished {
        request_id: u64,
        audio_url: Option<String>,
        error: Option<String>,
    },
    AudioLoaded {
        generation: u64,
        audio: Option<LoadedAudio>,
        error: Option<String>,
    },
    TogglePlayPause,
    Tick(Instant),
}

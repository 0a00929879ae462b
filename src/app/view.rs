use super::messages::Message;
use super::state::{App, PlaybackLifecycle};
use super::waveform::Waveform;
use crate::config::{MAX_VOLUME, MIN_VOLUME, ThemeMode};
use iced::alignment::Vertical;
use iced::widget::{
    Column, button, canvas, column, container, horizontal_space, pick_list, row, scrollable,
    slider, text, text_editor, text_input,
};
use iced::{Element, Length};
use std::time::Duration;

impl App {
    pub fn view(&self) -> Element<'_, Message> {
        let theme_label = if matches!(self.config.theme, ThemeMode::Night) {
            "Day Mode"
        } else {
            "Night Mode"
        };

        let header = row![
            text("EduDub").size(28),
            horizontal_space(),
            column![
                text(format!("Volume: {:.0}%", self.config.volume * 100.0)),
                slider(
                    MIN_VOLUME..=MAX_VOLUME,
                    self.config.volume,
                    Message::VolumeChanged
                )
                .step(0.01)
                .width(Length::Fixed(160.0))
            ]
            .spacing(4),
            button(theme_label).on_press(Message::ToggleTheme),
        ]
        .spacing(16)
        .align_y(Vertical::Center)
        .width(Length::Fill);

        let voice_row = row![
            text("Voice"),
            pick_list(
                self.voices.catalog.clone(),
                self.voices.selected_voice(),
                Message::VoiceSelected,
            )
            .placeholder("Loading voices…"),
        ]
        .spacing(8)
        .align_y(Vertical::Center);

        let mut content: Column<'_, Message> = column![
            header,
            voice_row,
            self.youtube_panel(),
            self.pdf_panel(),
            self.text_panel(),
        ]
        .padding(16)
        .spacing(16);

        if self.submission.in_flight {
            content = content.push(text("Narrating…"));
        }
        if let Some(notice) = &self.notice {
            content = content.push(text(notice.clone()));
        }
        if self.playback.reference.is_some() {
            content = content.push(self.playback_panel());
        }

        scrollable(container(content).width(Length::Fill)).into()
    }

    fn youtube_panel(&self) -> Element<'_, Message> {
        let input = text_input("Enter YouTube URL", &self.inputs.youtube_url)
            .on_input(Message::YoutubeUrlChanged)
            .on_submit(Message::SubmitYoutube);
        let submit = self.submit_button("Start Dubbing", Message::SubmitYoutube);

        container(
            column![text("YouTube Video Dubbing").size(20), input, submit].spacing(8),
        )
        .padding(12)
        .width(Length::Fill)
        .into()
    }

    fn pdf_panel(&self) -> Element<'_, Message> {
        let path_input = text_input("Path to a PDF file", &self.inputs.pdf_path_input)
            .on_input(Message::PdfPathChanged)
            .on_submit(Message::LoadPdf);
        let load_button = if self.inputs.pdf_loading {
            button("Loading…")
        } else {
            button("Load PDF").on_press(Message::LoadPdf)
        };

        let mut panel = column![
            text("PDF Narration").size(20),
            row![path_input, load_button]
                .spacing(8)
                .align_y(Vertical::Center),
        ]
        .spacing(8);

        if let Some(pdf) = &self.inputs.pdf {
            panel = panel.push(text(pdf.path.display().to_string()));
            panel = panel.push(
                text(truncate_preview(&pdf.preview, self.config.preview_chars)).size(13),
            );
        }
        panel = panel.push(self.submit_button("Narrate PDF", Message::SubmitPdf));

        container(panel).padding(12).width(Length::Fill).into()
    }

    fn text_panel(&self) -> Element<'_, Message> {
        let editor = text_editor(&self.inputs.text)
            .placeholder("Enter text to narrate")
            .on_action(Message::TextEdited)
            .height(Length::Fixed(120.0));
        let submit = self.submit_button("Narrate Text", Message::SubmitText);

        container(column![text("Text-to-Speech").size(20), editor, submit].spacing(8))
            .padding(12)
            .width(Length::Fill)
            .into()
    }

    /// Submit buttons lose their handler while a request is in flight, which
    /// is the only concurrency guard the submission path needs.
    fn submit_button<'a>(
        &self,
        label: &'a str,
        message: Message,
    ) -> iced::widget::Button<'a, Message> {
        if self.submission.in_flight {
            button(label)
        } else {
            button(label).on_press(message)
        }
    }

    fn playback_panel(&self) -> Element<'_, Message> {
        let wave = canvas(Waveform {
            peaks: &self.playback.peaks,
            progress: self.playback.progress(),
        })
        .width(Length::Fill)
        .height(Length::Fixed(100.0));

        let (play_label, play_enabled) = match self.playback.lifecycle {
            PlaybackLifecycle::Playing => ("Pause", true),
            PlaybackLifecycle::Loading { .. } => ("Loading…", false),
            PlaybackLifecycle::Paused | PlaybackLifecycle::Idle => ("Play", true),
        };
        let play_button = if play_enabled {
            button(play_label).on_press(Message::TogglePlayPause)
        } else {
            button(play_label)
        };

        let progress_label = format!(
            "{} / {}",
            format_clock(self.playback.elapsed_now()),
            format_clock(self.playback.duration)
        );

        container(
            column![
                wave,
                row![play_button, text(progress_label)]
                    .spacing(12)
                    .align_y(Vertical::Center),
            ]
            .spacing(8),
        )
        .padding(12)
        .width(Length::Fill)
        .into()
    }
}

fn truncate_preview(preview: &str, limit: usize) -> String {
    if preview.chars().count() <= limit {
        return preview.to_string();
    }
    let truncated: String = preview.chars().take(limit).collect();
    format!("{truncated}...")
}

fn format_clock(duration: Duration) -> String {
    let total_secs = duration.as_secs();
    format!("{}:{:02}", total_secs / 60, total_secs % 60)
}

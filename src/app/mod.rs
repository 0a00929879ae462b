mod messages;
mod state;
mod update;
mod view;
mod waveform;

pub use state::App;

use crate::api::NarrationClient;
use crate::config::{AppConfig, ThemeMode};
use iced::{Size, Theme, window};

/// Helper to launch the app with the provided config and backend client.
pub fn run_app(config: AppConfig, client: NarrationClient) -> iced::Result {
    let window_settings = window::Settings {
        size: Size::new(920.0, 760.0),
        ..window::Settings::default()
    };

    iced::application("EduDub", App::update, App::view)
        .window(window_settings)
        .subscription(App::subscription)
        .theme(|app: &App| {
            if matches!(app.config.theme, ThemeMode::Night) {
                Theme::Dark
            } else {
                Theme::Light
            }
        })
        .run_with(move || App::bootstrap(config, client))
}

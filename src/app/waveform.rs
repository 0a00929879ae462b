//! Waveform rendering for the loaded audio.

use iced::mouse;
use iced::widget::canvas::{self, Geometry};
use iced::{Color, Point, Rectangle, Renderer, Size, Theme};

const WAVE_COLOR: Color =
    Color::from_rgba(0x4F as f32 / 255.0, 0x46 as f32 / 255.0, 0xE5 as f32 / 255.0, 1.0);
const PROGRESS_COLOR: Color =
    Color::from_rgba(0x3B as f32 / 255.0, 0x82 as f32 / 255.0, 0xF6 as f32 / 255.0, 1.0);
const CURSOR_COLOR: Color = Color::WHITE;

/// Peak bars with a progress cursor, drawn across the full canvas bounds.
pub(super) struct Waveform<'a> {
    pub(super) peaks: &'a [f32],
    pub(super) progress: f32,
}

impl<Message> canvas::Program<Message> for Waveform<'_> {
    type State = ();

    fn draw(
        &self,
        _state: &Self::State,
        renderer: &Renderer,
        _theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<Geometry> {
        let mut frame = canvas::Frame::new(renderer, bounds.size());
        if self.peaks.is_empty() {
            return vec![frame.into_geometry()];
        }

        let width = frame.width();
        let height = frame.height();
        let slot = width / self.peaks.len() as f32;
        let bar_width = (slot * 0.7).clamp(1.0, 2.0);
        let played_x = self.progress.clamp(0.0, 1.0) * width;

        for (idx, peak) in self.peaks.iter().enumerate() {
            let x = idx as f32 * slot;
            let bar_height = (peak.clamp(0.0, 1.0).max(0.02)) * height;
            let y = (height - bar_height) / 2.0;
            let color = if x <= played_x {
                PROGRESS_COLOR
            } else {
                WAVE_COLOR
            };
            frame.fill_rectangle(Point::new(x, y), Size::new(bar_width, bar_height), color);
        }

        if self.progress > 0.0 {
            frame.fill_rectangle(
                Point::new(played_x.min(width - 1.0), 0.0),
                Size::new(1.0, height),
                CURSOR_COLOR,
            );
        }

        vec![frame.into_geometry()]
    }
}

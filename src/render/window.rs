//! `eframe` window surface.
//!
//! The timer is driven from [`eframe::App::update`]: every frame checks
//! whether a tick is due, runs the callback if so, and schedules the next
//! repaint for the following deadline. The display image is uploaded to a
//! texture only when a tick asked for a redraw.

use std::time::{Duration, Instant};

use ::egui::{Color32, ColorImage, Rect, TextureHandle, TextureOptions, pos2};
use log::debug;

use crate::core::frame::Size;
use crate::error::{CaptureError, CaptureResult};
use crate::render::{DisplayImage, RenderSurface, Tick, TimerCallback};

const NAME: &str = "egui";

/// Texture coordinates that draw a bottom-up image upright.
fn flipped_uv() -> Rect {
    Rect::from_min_max(pos2(0.0, 1.0), pos2(1.0, 0.0))
}

/// A native window showing the display image on a white background.
pub struct EguiSurface {
    title: String,
    display: Option<DisplayImage>,
    timer: Option<(Duration, TimerCallback)>,
    shut_down: bool,
}

impl EguiSurface {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            display: None,
            timer: None,
            shut_down: false,
        }
    }
}

impl RenderSurface for EguiSurface {
    fn create_display_image(&mut self, size: Size) -> CaptureResult<()> {
        if self.display.is_some() {
            return Err(CaptureError::state(
                "display image created",
                "create_display_image",
                "the display image size is fixed once created",
            ));
        }
        self.display = Some(DisplayImage::new(size)?);
        Ok(())
    }

    fn register_timer(&mut self, period: Duration, callback: TimerCallback) -> CaptureResult<()> {
        if period.is_zero() {
            return Err(CaptureError::config(
                "timer_period",
                format!("{:?}", period),
                "must be greater than zero",
            ));
        }
        self.timer = Some((period, callback));
        Ok(())
    }

    fn run_event_loop(&mut self) -> CaptureResult<()> {
        if self.shut_down {
            return Err(CaptureError::state(
                "shut down",
                "run_event_loop",
                "the window was already closed",
            ));
        }
        let (Some(display), Some((period, callback))) = (self.display.take(), self.timer.take())
        else {
            return Err(CaptureError::state(
                "not ready",
                "run_event_loop",
                "create the display image and register a timer first",
            ));
        };

        let size = display.size();
        let options = eframe::NativeOptions {
            viewport: ::egui::ViewportBuilder::default()
                .with_title(self.title.clone())
                .with_inner_size([size.width as f32, size.height as f32]),
            ..Default::default()
        };
        let app = ViewerApp {
            display,
            period,
            callback,
            next_tick: Instant::now() + period,
            texture: None,
        };

        eframe::run_native(&self.title, options, Box::new(|_cc| Box::new(app)))
            .map_err(|e| CaptureError::surface(NAME, e.to_string()))?;
        debug!("{} window closed", NAME);
        Ok(())
    }

    fn shutdown(&mut self) {
        self.shut_down = true;
        self.timer = None;
    }

    fn name(&self) -> &'static str {
        NAME
    }
}

struct ViewerApp {
    display: DisplayImage,
    period: Duration,
    callback: TimerCallback,
    next_tick: Instant,
    texture: Option<TextureHandle>,
}

impl ViewerApp {
    fn upload(&mut self, ctx: &::egui::Context) {
        let size = self.display.size();
        let image = ColorImage::from_rgb(
            [size.width as usize, size.height as usize],
            self.display.as_bytes(),
        );
        match &mut self.texture {
            Some(texture) => texture.set(image, TextureOptions::LINEAR),
            None => {
                self.texture = Some(ctx.load_texture("display", image, TextureOptions::LINEAR))
            }
        }
    }
}

impl eframe::App for ViewerApp {
    fn update(&mut self, ctx: &::egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        if now >= self.next_tick {
            let mut tick = Tick::new(&mut self.display, now);
            (self.callback)(&mut tick);
            let redraw = tick.redraw_requested();
            self.next_tick = (self.next_tick + self.period).max(now);
            if redraw {
                self.upload(ctx);
            }
        }
        // Blank until the first redraw.
        if self.texture.is_none() {
            self.upload(ctx);
        }

        ::egui::CentralPanel::default()
            .frame(::egui::Frame::none().fill(Color32::WHITE))
            .show(ctx, |ui| {
                if let Some(texture) = &self.texture {
                    let image = ::egui::Image::new((texture.id(), texture.size_vec2()))
                        .uv(flipped_uv())
                        .shrink_to_fit();
                    ui.centered_and_justified(|ui| ui.add(image));
                }
            });

        ctx.request_repaint_after(self.next_tick.saturating_duration_since(Instant::now()));
    }
}

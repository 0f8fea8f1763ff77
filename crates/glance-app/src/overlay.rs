use std::sync::Arc;

use glance_capture::SharedRegion;
use glance_types::{BorderStyle, Notice, RecognitionResult};
use image::DynamicImage;

/// The capture box as seen from the coordinator. Lives on the UI thread.
pub trait Overlay {
    /// Live on-screen position, shared with capture threads
    fn region(&self) -> SharedRegion;

    /// Width of the display the pointer moves across, in device pixels
    fn display_width(&self) -> f32;

    fn show_busy(&mut self);

    fn hide_busy(&mut self, instant: bool);

    /// `None` clears whatever image is shown inside the box
    fn set_preview(&mut self, image: Option<Arc<DynamicImage>>);

    fn set_border(&mut self, style: BorderStyle);

    /// `crop` is the unprocessed capture the result was read from
    fn show_result(&mut self, result: RecognitionResult, crop: Arc<DynamicImage>);

    fn notify(&mut self, notice: Notice);
}

use glance_config::capture::CaptureConfig;
use glance_types::CaptureRegion;
use image::{Rgb, RgbaImage};

/// Decides whether the overlay border in a frame has switched to its armed
/// colour, i.e. whether the frame is clean enough to recognize.
#[derive(Debug, Clone, Copy)]
pub struct ReadinessDetector {
    armed: Rgb<u8>,
    tolerance: u8,
}

impl ReadinessDetector {
    pub fn new(armed: [u8; 3], tolerance: u8) -> Self {
        Self {
            armed: Rgb(armed),
            tolerance,
        }
    }

    pub fn from_config(config: &CaptureConfig) -> Self {
        Self::new(config.armed_rgb(), config.tolerance)
    }

    /// Every pixel on the four border lines of `region` must match the
    /// reference colour. Regions that leave the frame are never ready.
    pub fn is_ready(&self, frame: &RgbaImage, region: CaptureRegion) -> bool {
        let Some((left, top, right, bottom)) = edges(frame, region) else {
            return false;
        };

        // The top-left pixel may stand in for the armed colour. It is also
        // part of the top row, so it always matches itself.
        let corner = rgb_at(frame, left, top);
        let reference = if corner != self.armed && is_acceptable_alternate_ready_color(corner) {
            corner
        } else {
            self.armed
        };

        let matches = |x: u32, y: u32| {
            is_rgb_within_tolerance(reference, rgb_at(frame, x, y), self.tolerance)
        };

        (left..=right).all(|x| matches(x, top))
            && (left..=right).all(|x| matches(x, bottom))
            && (top..=bottom).all(|y| matches(left, y))
            && (top..=bottom).all(|y| matches(right, y))
    }
}

/// Inclusive pixel bounds of `region`, if it lies entirely inside `frame`
fn edges(frame: &RgbaImage, region: CaptureRegion) -> Option<(u32, u32, u32, u32)> {
    if region.width == 0 || region.height == 0 {
        return None;
    }
    let left = u32::try_from(region.x).ok()?;
    let top = u32::try_from(region.y).ok()?;
    let right = left.checked_add(region.width - 1)?;
    let bottom = top.checked_add(region.height - 1)?;
    if right >= frame.width() || bottom >= frame.height() {
        return None;
    }
    Some((left, top, right, bottom))
}

fn rgb_at(frame: &RgbaImage, x: u32, y: u32) -> Rgb<u8> {
    let [r, g, b, _] = frame.get_pixel(x, y).0;
    Rgb([r, g, b])
}

/// Some capture providers shift the exact colour; accept any dominant red
pub fn is_acceptable_alternate_ready_color(color: Rgb<u8>) -> bool {
    let [r, g, b] = color.0.map(u32::from);
    g * 10 <= r && b * 10 <= r
}

pub fn is_rgb_within_tolerance(color: Rgb<u8>, to_check: Rgb<u8>, tolerance: u8) -> bool {
    color
        .0
        .iter()
        .zip(to_check.0.iter())
        .all(|(&c, &t)| is_color_within_tolerance(c, t, tolerance))
}

pub fn is_color_within_tolerance(color: u8, to_check: u8, tolerance: u8) -> bool {
    color.abs_diff(to_check) <= tolerance
}

//! Frame annotation for the live stream.
//!
//! Draws the zone layout, tracked person boxes and their center dots
//! directly on the RGB buffer. No text is rendered.

use image::{Rgb, RgbImage};

use storesight_models::{ZoneLabel, ZoneLayout};

use crate::error::{VisionError, VisionResult};
use crate::frame::Frame;
use crate::providers::TrackedPerson;

/// Renders overlays on a frame before it is streamed.
pub trait FrameAnnotator: Send + Sync {
    fn annotate(
        &self,
        frame: &Frame,
        layout: &ZoneLayout,
        tracks: &[TrackedPerson],
    ) -> VisionResult<Frame>;

    /// Annotator name for logging.
    fn name(&self) -> &'static str;
}

/// Default annotator: colored zone outlines, white person boxes, red
/// center dots.
pub struct BasicAnnotator {
    person_color: Rgb<u8>,
    center_color: Rgb<u8>,
    thickness: i64,
    dot_radius: i64,
}

impl BasicAnnotator {
    pub fn new() -> Self {
        Self {
            person_color: Rgb([240, 240, 240]),
            center_color: Rgb([230, 50, 50]),
            thickness: 2,
            dot_radius: 4,
        }
    }
}

impl Default for BasicAnnotator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameAnnotator for BasicAnnotator {
    fn annotate(
        &self,
        frame: &Frame,
        layout: &ZoneLayout,
        tracks: &[TrackedPerson],
    ) -> VisionResult<Frame> {
        let mut img = RgbImage::from_raw(frame.width, frame.height, frame.data.clone())
            .ok_or_else(|| VisionError::encode("frame buffer does not match dimensions"))?;

        for zone in layout.zones() {
            draw_rect_outline(
                &mut img,
                zone.x1 as i64,
                zone.y1 as i64,
                zone.x2 as i64,
                zone.y2 as i64,
                zone_color(zone.label),
                self.thickness,
            );
        }

        for track in tracks {
            let bbox = track.bbox;
            draw_rect_outline(
                &mut img,
                bbox.x as i64,
                bbox.y as i64,
                bbox.x2() as i64,
                bbox.y2() as i64,
                self.person_color,
                self.thickness,
            );
            let (cx, cy) = bbox.center();
            draw_filled_dot(&mut img, cx as i64, cy as i64, self.dot_radius, self.center_color);
        }

        let (width, height) = (img.width(), img.height());
        Frame::new(width, height, img.into_raw())
    }

    fn name(&self) -> &'static str {
        "basic"
    }
}

fn zone_color(label: ZoneLabel) -> Rgb<u8> {
    match label {
        ZoneLabel::A => Rgb([220, 60, 60]),
        ZoneLabel::B => Rgb([60, 110, 220]),
        ZoneLabel::C => Rgb([60, 180, 90]),
        ZoneLabel::D => Rgb([235, 160, 50]),
        ZoneLabel::E => Rgb([160, 80, 200]),
    }
}

fn put(img: &mut RgbImage, x: i64, y: i64, color: Rgb<u8>) {
    if x >= 0 && y >= 0 && (x as u32) < img.width() && (y as u32) < img.height() {
        img.put_pixel(x as u32, y as u32, color);
    }
}

fn draw_rect_outline(img: &mut RgbImage, x1: i64, y1: i64, x2: i64, y2: i64, color: Rgb<u8>, thickness: i64) {
    for offset in 0..thickness {
        for x in x1..=x2 {
            put(img, x, y1 + offset, color);
            put(img, x, y2 - offset, color);
        }
        for y in y1..=y2 {
            put(img, x1 + offset, y, color);
            put(img, x2 - offset, y, color);
        }
    }
}

fn draw_filled_dot(img: &mut RgbImage, cx: i64, cy: i64, radius: i64, color: Rgb<u8>) {
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy <= radius * radius {
                put(img, cx + dx, cy + dy, color);
            }
        }
    }
}

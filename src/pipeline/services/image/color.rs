use crate::pipeline::types::ColorStats;
use image::{Rgb, RgbImage};

/// RGB to HSV with hue in degrees [0, 360) and saturation/value on 0..=255.
pub fn rgb_to_hsv(px: &Rgb<u8>) -> (f64, f64, f64) {
    let r = px[0] as f64 / 255.0;
    let g = px[1] as f64 / 255.0;
    let b = px[2] as f64 / 255.0;

    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let hue = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta) + 120.0
    } else {
        60.0 * ((r - g) / delta) + 240.0
    };
    let hue = if hue < 0.0 { hue + 360.0 } else { hue };

    let saturation = if max == 0.0 { 0.0 } else { delta / max };

    (hue, saturation * 255.0, max * 255.0)
}

/// Arithmetic mean of per-pixel HSV over the whole image.
pub fn mean_hsv(image: &RgbImage) -> Option<ColorStats> {
    let count = image.width() as u64 * image.height() as u64;
    if count == 0 {
        return None;
    }

    let (mut hue, mut sat, mut val) = (0.0f64, 0.0f64, 0.0f64);
    for px in image.pixels() {
        let (h, s, v) = rgb_to_hsv(px);
        hue += h;
        sat += s;
        val += v;
    }

    let n = count as f64;
    Some(ColorStats::new(hue / n, sat / n, val / n))
}

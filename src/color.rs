use image::Rgb;
use palette::{Hsl, IntoColor, Srgb};

// ---------------------------------------------------------------------------
// Fixed chart colours
// ---------------------------------------------------------------------------

pub const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
pub const GRID: Rgb<u8> = Rgb([229, 229, 229]);
pub const AXIS: Rgb<u8> = Rgb([60, 60, 60]);
pub const IDENTITY_LINE: Rgb<u8> = Rgb([214, 39, 40]);

// ---------------------------------------------------------------------------
// Sequential ramp
// ---------------------------------------------------------------------------

/// `n` colours running from dark purple through teal to yellow, in the
/// spirit of matplotlib's viridis. The first colour is the darkest.
pub fn viridis_ramp(n: usize) -> Vec<Rgb<u8>> {
    if n == 0 {
        return Vec::new();
    }
    (0..n)
        .map(|i| {
            let t = if n == 1 { 0.5 } else { i as f32 / (n - 1) as f32 };
            hsl_to_rgb(Hsl::new(
                285.0 - 230.0 * t,
                0.55 + 0.35 * t,
                0.28 + 0.30 * t,
            ))
        })
        .collect()
}

/// A single mid-ramp colour for one-series charts.
pub fn viridis_mid() -> Rgb<u8> {
    hsl_to_rgb(Hsl::new(170.0, 0.70, 0.40))
}

/// Blend `color` towards white; `amount` 0 keeps it, 1 gives white.
pub fn lighten(color: Rgb<u8>, amount: f32) -> Rgb<u8> {
    let a = amount.clamp(0.0, 1.0);
    let Rgb([r, g, b]) = color;
    let mix = |c: u8| (c as f32 + (255.0 - c as f32) * a).round() as u8;
    Rgb([mix(r), mix(g), mix(b)])
}

fn hsl_to_rgb(hsl: Hsl) -> Rgb<u8> {
    let rgb: Srgb = hsl.into_color();
    Rgb([
        (rgb.red.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.green.clamp(0.0, 1.0) * 255.0) as u8,
        (rgb.blue.clamp(0.0, 1.0) * 255.0) as u8,
    ])
}

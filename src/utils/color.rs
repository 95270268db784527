use ratatui::style::Color;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorDepth {
    Truecolor,
    X256,
    X16,
}

/// Detect terminal color depth from environment.
/// Priority: WEAI_COLOR override -> COLORTERM truecolor/24bit -> TERM *256color -> fallback 16.
pub fn detect_color_depth() -> ColorDepth {
    if let Ok(force) = std::env::var("WEAI_COLOR") {
        if let Some(depth) = parse_color_depth(&force) {
            return depth;
        }
    }

    if let Ok(colorterm) = std::env::var("COLORTERM") {
        let s = colorterm.to_ascii_lowercase();
        if s.contains("truecolor") || s.contains("24bit") {
            return ColorDepth::Truecolor;
        }
    }
    if let Ok(term) = std::env::var("TERM") {
        if term.to_ascii_lowercase().contains("256color") {
            return ColorDepth::X256;
        }
    }
    ColorDepth::X16
}

fn parse_color_depth(value: &str) -> Option<ColorDepth> {
    match value.trim().to_ascii_lowercase().as_str() {
        "truecolor" | "24bit" | "24-bit" => Some(ColorDepth::Truecolor),
        "256" | "x256" | "256color" => Some(ColorDepth::X256),
        "16" | "ansi" | "x16" => Some(ColorDepth::X16),
        _ => None,
    }
}

/// Convert an HSL triple (hue in degrees, saturation and lightness in 0..=1) to RGB.
pub fn hsl_to_rgb(hue: f64, saturation: f64, lightness: f64) -> (u8, u8, u8) {
    let h = hue.rem_euclid(360.0) / 360.0;
    let s = saturation.clamp(0.0, 1.0);
    let l = lightness.clamp(0.0, 1.0);

    if s == 0.0 {
        let v = (l * 255.0).round() as u8;
        return (v, v, v);
    }

    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;

    let channel = |mut t: f64| -> u8 {
        if t < 0.0 {
            t += 1.0;
        }
        if t > 1.0 {
            t -= 1.0;
        }
        let v = if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        };
        (v * 255.0).round() as u8
    };

    (channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
}

/// Composite `fg` over `bg` with the given opacity, the way a canvas applies `globalAlpha`.
pub fn blend(fg: (u8, u8, u8), bg: (u8, u8, u8), alpha: f64) -> (u8, u8, u8) {
    let a = alpha.clamp(0.0, 1.0);
    let mix = |f: u8, b: u8| -> u8 { (f as f64 * a + b as f64 * (1.0 - a)).round() as u8 };
    (mix(fg.0, bg.0), mix(fg.1, bg.1), mix(fg.2, bg.2))
}

/// Map an RGB triple to the nearest color representable at `depth`.
pub fn quantize_rgb(rgb: (u8, u8, u8), depth: ColorDepth) -> Color {
    let (r, g, b) = rgb;
    match depth {
        ColorDepth::Truecolor => Color::Rgb(r, g, b),
        ColorDepth::X256 => Color::Indexed(rgb_to_xterm256(r, g, b)),
        ColorDepth::X16 => nearest_ansi16(r, g, b),
    }
}

const ANSI16: [(u8, u8, u8, Color); 16] = [
    (0, 0, 0, Color::Black),
    (205, 0, 0, Color::Red),
    (0, 205, 0, Color::Green),
    (205, 205, 0, Color::Yellow),
    (0, 0, 205, Color::Blue),
    (205, 0, 205, Color::Magenta),
    (0, 205, 205, Color::Cyan),
    (192, 192, 192, Color::Gray),
    (128, 128, 128, Color::DarkGray),
    (255, 0, 0, Color::LightRed),
    (0, 255, 0, Color::LightGreen),
    (255, 255, 0, Color::LightYellow),
    (92, 92, 255, Color::LightBlue),
    (255, 0, 255, Color::LightMagenta),
    (0, 255, 255, Color::LightCyan),
    (255, 255, 255, Color::White),
];

fn nearest_ansi16(r: u8, g: u8, b: u8) -> Color {
    ANSI16
        .iter()
        .min_by_key(|&&(rr, gg, bb, _)| dist_sq((r, g, b), (rr, gg, bb)))
        .map(|&(_, _, _, color)| color)
        .unwrap_or(Color::Reset)
}

fn rgb_to_xterm256(r: u8, g: u8, b: u8) -> u8 {
    // 6x6x6 cube vs. 24-step gray ramp, whichever lands closer.
    let level = |c: u8| -> u8 {
        if c < 48 {
            0
        } else if c < 114 {
            1
        } else {
            ((c - 35) / 40).min(5)
        }
    };
    let cube_comp = |i: u8| -> u8 {
        if i == 0 {
            0
        } else {
            55 + 40 * i
        }
    };

    let (ri, gi, bi) = (level(r), level(g), level(b));
    let cube_index = 16 + 36 * ri + 6 * gi + bi;
    let cube_rgb = (cube_comp(ri), cube_comp(gi), cube_comp(bi));

    let avg = (r as u16 + g as u16 + b as u16) / 3;
    let gray_step = (avg.saturating_sub(8) / 10).min(23) as u8;
    let gray_index = 232 + gray_step;
    let gray_value = 8 + 10 * gray_step;
    let gray_rgb = (gray_value, gray_value, gray_value);

    if dist_sq((r, g, b), gray_rgb) < dist_sq((r, g, b), cube_rgb) {
        gray_index
    } else {
        cube_index
    }
}

fn dist_sq(a: (u8, u8, u8), b: (u8, u8, u8)) -> u32 {
    let dr = a.0 as i32 - b.0 as i32;
    let dg = a.1 as i32 - b.1 as i32;
    let db = a.2 as i32 - b.2 as i32;
    (dr * dr + dg * dg + db * db) as u32
}

use crate::foundation::error::{MemeError, MemeResult};

/// Straight-alpha colour with normalized `0..=1` channels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
    pub a: f64,
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f64, g: f64, b: f64, a: f64) -> Self {
        Self { r, g, b, a }
    }

    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            f64::from(r) / 255.0,
            f64::from(g) / 255.0,
            f64::from(b) / 255.0,
            f64::from(a) / 255.0,
        )
    }

    /// Parse a CSS colour string: `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`,
    /// `rgba(..)` or `transparent`.
    pub fn parse(s: &str) -> MemeResult<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("transparent") {
            return Ok(Self::rgba(0.0, 0.0, 0.0, 0.0));
        }
        if let Some(hex) = s.strip_prefix('#') {
            return parse_hex(hex).map_err(MemeError::validation);
        }
        let lower = s.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .or_else(|| lower.strip_prefix("rgb("))
        {
            let args = args
                .strip_suffix(')')
                .ok_or_else(|| MemeError::validation(format!("unterminated colour \"{s}\"")))?;
            return parse_rgb_fn(args).map_err(MemeError::validation);
        }
        Err(MemeError::validation(format!("unsupported colour \"{s}\"")))
    }

    /// Parse `s`, logging and returning `fallback` when it is not a valid colour.
    pub fn parse_or(s: &str, fallback: Color) -> Self {
        match Self::parse(s) {
            Ok(c) => c,
            Err(e) => {
                tracing::warn!(colour = s, error = %e, "falling back to default colour");
                fallback
            }
        }
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [
            to_u8(self.r),
            to_u8(self.g),
            to_u8(self.b),
            to_u8(self.a),
        ]
    }

    pub(crate) fn to_cpu(self) -> vello_cpu::peniko::Color {
        let [r, g, b, a] = self.to_rgba8();
        vello_cpu::peniko::Color::from_rgba8(r, g, b, a)
    }
}

fn to_u8(x: f64) -> u8 {
    (x.clamp(0.0, 1.0) * 255.0).round() as u8
}

fn parse_hex(s: &str) -> Result<Color, String> {
    fn hex_byte(pair: &str) -> Result<u8, String> {
        u8::from_str_radix(pair, 16).map_err(|_| format!("invalid hex byte \"{pair}\""))
    }
    fn hex_nibble(c: &str) -> Result<u8, String> {
        let v = u8::from_str_radix(c, 16).map_err(|_| format!("invalid hex digit \"{c}\""))?;
        Ok(v * 17)
    }

    if !s.is_ascii() {
        return Err("hex colour must be ascii".to_owned());
    }

    let (r, g, b, a) = match s.len() {
        3 | 4 => {
            let r = hex_nibble(&s[0..1])?;
            let g = hex_nibble(&s[1..2])?;
            let b = hex_nibble(&s[2..3])?;
            let a = if s.len() == 4 {
                hex_nibble(&s[3..4])?
            } else {
                255
            };
            (r, g, b, a)
        }
        6 | 8 => {
            let r = hex_byte(&s[0..2])?;
            let g = hex_byte(&s[2..4])?;
            let b = hex_byte(&s[4..6])?;
            let a = if s.len() == 8 {
                hex_byte(&s[6..8])?
            } else {
                255
            };
            (r, g, b, a)
        }
        _ => {
            return Err(
                "hex colour must be #RGB, #RGBA, #RRGGBB or #RRGGBBAA (case-insensitive)".to_owned(),
            );
        }
    };

    Ok(Color::from_rgba8(r, g, b, a))
}

fn parse_rgb_fn(args: &str) -> Result<Color, String> {
    let parts: Vec<&str> = args.split(',').map(str::trim).collect();
    if parts.len() != 3 && parts.len() != 4 {
        return Err("rgb()/rgba() takes 3 or 4 components".to_owned());
    }

    let mut rgb = [0.0f64; 3];
    for (slot, part) in rgb.iter_mut().zip(&parts) {
        let v = if let Some(pct) = part.strip_suffix('%') {
            parse_num(pct)? / 100.0
        } else {
            parse_num(part)? / 255.0
        };
        *slot = v.clamp(0.0, 1.0);
    }
    let a = match parts.get(3) {
        Some(p) => match p.strip_suffix('%') {
            Some(pct) => parse_num(pct)? / 100.0,
            None => parse_num(p)?,
        },
        None => 1.0,
    };

    Ok(Color::rgba(rgb[0], rgb[1], rgb[2], a.clamp(0.0, 1.0)))
}

fn parse_num(s: &str) -> Result<f64, String> {
    let v: f64 = s
        .trim()
        .parse()
        .map_err(|_| format!("invalid colour component \"{s}\""))?;
    if !v.is_finite() {
        return Err(format!("colour component \"{s}\" is not finite"));
    }
    Ok(v)
}

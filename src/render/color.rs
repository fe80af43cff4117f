//! Colour output, with the dark-mode inversion.

/// How a colour is used. Dark mode treats fills as backgrounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    Foreground,
    Background,
}

/// `rgb(r,g,b)` for a packed 0xRRGGBB value.
pub fn rgb(value: u32, dark_mode: bool, role: Role) -> String {
    let value = if dark_mode { to_dark(value, role) } else { value };
    let [_, r, g, b] = value.to_be_bytes();
    format!("rgb({r},{g},{b})")
}

/// Invert a colour for a dark background while keeping its hue, and
/// keep backgrounds dark enough to sit behind inverted text.
fn to_dark(value: u32, role: Role) -> u32 {
    let x = 0xff_ffff - (value & 0xff_ffff);
    let [_, r, g, b] = x.to_be_bytes();
    let channels = [i64::from(r), i64::from(g), i64::from(b)];
    let mn = channels.iter().copied().min().unwrap_or(0);
    let mx = channels.iter().copied().max().unwrap_or(0);
    let mut out = channels.map(|c| mn + (mx - c));
    if role == Role::Background && mx > 127 {
        out = out.map(|c| c * 127 / mx);
    } else if mn < 128 && mx > mn {
        out = out.map(|c| 127 + ((c - mn) * 128) / (mx - mn));
    }
    let [r, g, b] = out.map(|c| c.clamp(0, 255) as u32);
    (r << 16) | (g << 8) | b
}

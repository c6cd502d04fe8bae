use super::Rgba;

const NAMED_COLORS: &[(&str, Rgba)] = &[
    ("aqua", Rgba::rgb(0x00, 0xFF, 0xFF)),
    ("black", Rgba::rgb(0x00, 0x00, 0x00)),
    ("blue", Rgba::rgb(0x00, 0x00, 0xFF)),
    ("brown", Rgba::rgb(0xA5, 0x2A, 0x2A)),
    ("coral", Rgba::rgb(0xFF, 0x7F, 0x50)),
    ("crimson", Rgba::rgb(0xDC, 0x14, 0x3C)),
    ("cyan", Rgba::rgb(0x00, 0xFF, 0xFF)),
    ("darkgray", Rgba::rgb(0xA9, 0xA9, 0xA9)),
    ("darkgrey", Rgba::rgb(0xA9, 0xA9, 0xA9)),
    ("fuchsia", Rgba::rgb(0xFF, 0x00, 0xFF)),
    ("gold", Rgba::rgb(0xFF, 0xD7, 0x00)),
    ("gray", Rgba::rgb(0x80, 0x80, 0x80)),
    ("green", Rgba::rgb(0x00, 0x80, 0x00)),
    ("grey", Rgba::rgb(0x80, 0x80, 0x80)),
    ("indigo", Rgba::rgb(0x4B, 0x00, 0x82)),
    ("lightgray", Rgba::rgb(0xD3, 0xD3, 0xD3)),
    ("lightgrey", Rgba::rgb(0xD3, 0xD3, 0xD3)),
    ("lime", Rgba::rgb(0x00, 0xFF, 0x00)),
    ("magenta", Rgba::rgb(0xFF, 0x00, 0xFF)),
    ("maroon", Rgba::rgb(0x80, 0x00, 0x00)),
    ("navy", Rgba::rgb(0x00, 0x00, 0x80)),
    ("olive", Rgba::rgb(0x80, 0x80, 0x00)),
    ("orange", Rgba::rgb(0xFF, 0xA5, 0x00)),
    ("pink", Rgba::rgb(0xFF, 0xC0, 0xCB)),
    ("purple", Rgba::rgb(0x80, 0x00, 0x80)),
    ("red", Rgba::rgb(0xFF, 0x00, 0x00)),
    ("silver", Rgba::rgb(0xC0, 0xC0, 0xC0)),
    ("teal", Rgba::rgb(0x00, 0x80, 0x80)),
    ("transparent", Rgba::new(0x00, 0x00, 0x00, 0x00)),
    ("turquoise", Rgba::rgb(0x40, 0xE0, 0xD0)),
    ("violet", Rgba::rgb(0xEE, 0x82, 0xEE)),
    ("white", Rgba::rgb(0xFF, 0xFF, 0xFF)),
    ("yellow", Rgba::rgb(0xFF, 0xFF, 0x00)),
];

pub(super) fn lookup(name: &str) -> Option<Rgba> {
    NAMED_COLORS
        .iter()
        .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name.trim()))
        .map(|(_, color)| *color)
}

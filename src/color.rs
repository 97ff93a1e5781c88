use crate::backend::Rgba8;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// A colour with floating point channels in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub(crate) fn to_rgba8(self) -> Rgba8 {
        let (r, g, b, a) = al_unmap_rgba(self);
        Rgba8 { r, g, b, a }
    }

    pub(crate) fn from_rgba8(rgba: Rgba8) -> Color {
        al_map_rgba(rgba.r, rgba.g, rgba.b, rgba.a)
    }
}

fn quantize(channel: f32) -> u8 {
    (channel * 255.0).round().max(0.0).min(255.0) as u8
}

pub fn al_map_rgb(r: u8, g: u8, b: u8) -> Color {
    al_map_rgba(r, g, b, 255)
}

pub fn al_map_rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
    Color {
        r: r as f32 / 255.0,
        g: g as f32 / 255.0,
        b: b as f32 / 255.0,
        a: a as f32 / 255.0,
    }
}

pub fn al_map_rgb_f(r: f32, g: f32, b: f32) -> Color {
    al_map_rgba_f(r, g, b, 1.0)
}

pub fn al_map_rgba_f(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color { r, g, b, a }
}

pub fn al_premul_rgba(r: u8, g: u8, b: u8, a: u8) -> Color {
    let alpha = a as f32 / 255.0;
    Color {
        r: (r as f32 / 255.0) * alpha,
        g: (g as f32 / 255.0) * alpha,
        b: (b as f32 / 255.0) * alpha,
        a: alpha,
    }
}

pub fn al_premul_rgba_f(r: f32, g: f32, b: f32, a: f32) -> Color {
    Color {
        r: r * a,
        g: g * a,
        b: b * a,
        a,
    }
}

pub fn al_unmap_rgb(color: Color) -> (u8, u8, u8) {
    (quantize(color.r), quantize(color.g), quantize(color.b))
}

/// Channels are rounded to the nearest 8-bit value, so anything built with
/// `al_map_rgba` comes back unchanged.
pub fn al_unmap_rgba(color: Color) -> (u8, u8, u8, u8) {
    (
        quantize(color.r),
        quantize(color.g),
        quantize(color.b),
        quantize(color.a),
    )
}

pub fn al_unmap_rgb_f(color: Color) -> (f32, f32, f32) {
    (color.r, color.g, color.b)
}

pub fn al_unmap_rgba_f(color: Color) -> (f32, f32, f32, f32) {
    (color.r, color.g, color.b, color.a)
}

static COLOR_NAMES: Lazy<HashMap<&'static str, (u8, u8, u8)>> = Lazy::new(|| {
    vec![
        ("black", (0, 0, 0)),
        ("white", (255, 255, 255)),
        ("red", (255, 0, 0)),
        ("green", (0, 255, 0)),
        ("blue", (0, 0, 255)),
        ("yellow", (255, 255, 0)),
        ("cyan", (0, 255, 255)),
        ("magenta", (255, 0, 255)),
        ("aqua", (0, 255, 255)),
        ("azure", (0, 127, 255)),
        ("beige", (245, 245, 220)),
        ("bisque", (255, 228, 196)),
        ("blanchedalmond", (255, 235, 205)),
        ("blueviolet", (138, 43, 226)),
        ("brown", (165, 42, 42)),
        ("burlywood", (222, 184, 135)),
        ("cadetblue", (95, 158, 160)),
        ("chartreuse", (127, 255, 0)),
        ("chocolate", (210, 105, 30)),
        ("coral", (255, 127, 80)),
        ("cornflowerblue", (100, 149, 237)),
        ("cornsilk", (255, 248, 220)),
        ("crimson", (220, 20, 60)),
        ("darkblue", (0, 0, 139)),
        ("darkcyan", (0, 139, 139)),
        ("darkgoldenrod", (184, 134, 11)),
        ("darkgray", (169, 169, 169)),
        ("darkgreen", (0, 100, 0)),
        ("darkkhaki", (189, 183, 107)),
        ("darkmagenta", (139, 0, 139)),
        ("darkolivegreen", (85, 107, 47)),
        ("darkorange", (255, 140, 0)),
        ("darkorchid", (153, 50, 204)),
        ("darkred", (139, 0, 0)),
        ("darksalmon", (233, 150, 122)),
        ("darkseagreen", (143, 188, 143)),
        ("darkslateblue", (72, 61, 139)),
        ("darkslategray", (47, 79, 79)),
        ("darkturquoise", (0, 206, 209)),
        ("darkviolet", (148, 0, 211)),
        ("deeppink", (255, 20, 147)),
        ("deepskyblue", (0, 191, 255)),
        ("dimgray", (105, 105, 105)),
        ("dodgerblue", (30, 144, 255)),
        ("firebrick", (178, 34, 34)),
        ("floralwhite", (255, 250, 240)),
        ("forestgreen", (34, 139, 34)),
        ("fuchsia", (255, 0, 255)),
        ("gainsboro", (220, 220, 220)),
        ("ghostwhite", (248, 248, 255)),
        ("gold", (255, 215, 0)),
        ("goldenrod", (218, 165, 32)),
        ("gray", (128, 128, 128)),
        ("greenyellow", (173, 255, 47)),
        ("honeydew", (240, 255, 240)),
        ("hotpink", (255, 105, 180)),
        ("indianred", (205, 92, 92)),
        ("indigo", (75, 0, 130)),
        ("ivory", (255, 255, 240)),
        ("khaki", (240, 230, 140)),
        ("lavender", (230, 230, 250)),
        ("lavenderblush", (255, 240, 245)),
        ("lawngreen", (124, 252, 0)),
        ("lemonchiffon", (255, 250, 205)),
        ("lightblue", (173, 216, 230)),
        ("lightcoral", (240, 128, 128)),
        ("lightcyan", (224, 255, 255)),
        ("lightgoldenrodyellow", (250, 250, 210)),
        ("lightgray", (211, 211, 211)),
        ("lightgreen", (144, 238, 144)),
        ("lightpink", (255, 182, 193)),
        ("lightsalmon", (255, 160, 122)),
        ("lightseagreen", (32, 178, 170)),
        ("lightskyblue", (135, 206, 250)),
        ("lightslategray", (119, 136, 153)),
        ("lightsteelblue", (176, 196, 222)),
        ("lightyellow", (255, 255, 224)),
        ("lime", (0, 255, 0)),
        ("limegreen", (50, 205, 50)),
        ("linen", (250, 240, 230)),
        ("maroon", (128, 0, 0)),
        ("mediumaquamarine", (102, 205, 170)),
        ("mediumblue", (0, 0, 205)),
        ("mediumorchid", (186, 85, 211)),
        ("mediumpurple", (147, 112, 219)),
        ("mediumseagreen", (60, 179, 113)),
        ("mediumslateblue", (123, 104, 238)),
        ("mediumspringgreen", (0, 250, 154)),
        ("mediumturquoise", (72, 209, 204)),
        ("mediumvioletred", (199, 21, 133)),
        ("midnightblue", (25, 25, 112)),
        ("mintcream", (245, 255, 250)),
        ("mistyrose", (255, 228, 225)),
        ("moccasin", (255, 228, 181)),
        ("navajowhite", (255, 222, 173)),
        ("navy", (0, 0, 128)),
        ("oldlace", (253, 245, 230)),
        ("olive", (128, 128, 0)),
        ("olivedrab", (107, 142, 35)),
        ("orange", (255, 165, 0)),
        ("orangered", (255, 69, 0)),
        ("orchid", (218, 112, 214)),
        ("palegoldenrod", (238, 232, 170)),
        ("palegreen", (152, 251, 152)),
        ("paleturquoise", (175, 238, 238)),
        ("palevioletred", (219, 112, 147)),
        ("papayawhip", (255, 239, 213)),
        ("peachpuff", (255, 218, 185)),
        ("peru", (205, 133, 63)),
        ("pink", (255, 192, 203)),
        ("plum", (221, 160, 221)),
        ("powderblue", (176, 224, 230)),
        ("purple", (128, 0, 128)),
        ("rosybrown", (188, 143, 143)),
        ("royalblue", (65, 105, 225)),
        ("saddlebrown", (139, 69, 19)),
        ("salmon", (250, 128, 114)),
        ("sandybrown", (244, 164, 96)),
        ("seagreen", (46, 139, 87)),
        ("seashell", (255, 245, 238)),
        ("sienna", (160, 82, 45)),
        ("silver", (192, 192, 192)),
        ("skyblue", (135, 206, 235)),
        ("slateblue", (106, 90, 205)),
        ("slategray", (112, 128, 144)),
        ("snow", (255, 250, 250)),
        ("springgreen", (0, 255, 127)),
        ("steelblue", (70, 130, 180)),
        ("tan", (210, 180, 140)),
        ("teal", (0, 128, 128)),
        ("thistle", (216, 191, 216)),
        ("tomato", (255, 99, 71)),
        ("turquoise", (64, 224, 208)),
        ("violet", (238, 130, 238)),
        ("wheat", (245, 222, 179)),
        ("whitesmoke", (245, 245, 245)),
        ("yellowgreen", (154, 205, 50)),
    ]
    .into_iter()
    .collect()
});

/// Looks up a CSS colour name, ignoring case.
pub fn al_color_name_to_rgb(name: &str, color: &mut Color) -> bool {
    match COLOR_NAMES.get(name.to_ascii_lowercase().as_str()) {
        Some(&(r, g, b)) => {
            *color = al_map_rgb(r, g, b);
            true
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmap_returns_mapped_channels() {
        for x in 0..=255u8 {
            let color = al_map_rgba(x, 255 - x, x / 2, x);
            assert_eq!(al_unmap_rgba(color), (x, 255 - x, x / 2, x));
        }
    }

    #[test]
    fn premul_f_scales_by_alpha() {
        let steps = [0.0f32, 0.1, 0.25, 0.5, 0.75, 0.9, 1.0];
        for &a in steps.iter() {
            for &c in steps.iter() {
                let color = al_premul_rgba_f(c, c / 2.0, 1.0 - c, a);
                assert_eq!(color.r, c * a);
                assert_eq!(color.g, (c / 2.0) * a);
                assert_eq!(color.b, (1.0 - c) * a);
                assert_eq!(color.a, a);
            }
        }
    }

    #[test]
    fn premul_integer_channels() {
        let color = al_premul_rgba(255, 0, 255, 0);
        assert_eq!(color, Color::default());

        let color = al_premul_rgba(255, 255, 255, 255);
        assert_eq!(al_unmap_rgba(color), (255, 255, 255, 255));
    }

    #[test]
    fn named_colors_ignore_case() {
        let mut color = Color::default();
        assert!(al_color_name_to_rgb("YellowGreen", &mut color));
        assert_eq!(al_unmap_rgba(color), (154, 205, 50, 255));

        assert!(!al_color_name_to_rgb("notacolour", &mut color));
        assert_eq!(al_unmap_rgb(color), (154, 205, 50));
    }
}

use serde::Serialize;

/// A selectable design direction for concept generation.
#[derive(Debug, Clone, Serialize)]
pub struct DesignStyle {
    pub id: &'static str,
    pub label: &'static str,
}

pub const DESIGN_STYLES: &[DesignStyle] = &[
    DesignStyle {
        id: "minimalist",
        label: "Modern & Minimalist",
    },
    DesignStyle {
        id: "luxury",
        label: "Elegant & Luxury",
    },
    DesignStyle {
        id: "geometric",
        label: "Bold & Geometric",
    },
    DesignStyle {
        id: "cartoon",
        label: "Playful & Cartoon",
    },
    DesignStyle {
        id: "retro",
        label: "Vintage & Retro",
    },
    DesignStyle {
        id: "tech",
        label: "Abstract & Tech",
    },
    DesignStyle {
        id: "organic",
        label: "Hand-Drawn & Organic",
    },
    DesignStyle {
        id: "neon",
        label: "Futuristic & Neon",
    },
];

pub fn default_style() -> &'static DesignStyle {
    &DESIGN_STYLES[0]
}

/// Accepts either a preset id (`retro`) or its label (case-insensitive).
pub fn find_style(query: &str) -> Option<&'static DesignStyle> {
    let query = query.trim();
    DESIGN_STYLES
        .iter()
        .find(|s| s.id.eq_ignore_ascii_case(query) || s.label.eq_ignore_ascii_case(query))
}

/// Resolves user input to the label sent to the gateway; unknown input passes through.
pub fn resolve_style_label(query: &str) -> String {
    match find_style(query) {
        Some(style) => style.label.to_string(),
        None => query.trim().to_string(),
    }
}

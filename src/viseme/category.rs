//! Viseme categories and the phoneme label mapping table.

/// The closed set of mouth shapes the renderer knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisemeCategory {
    /// Open vowel.
    A,
    /// Spread vowel.
    E,
    /// Rounded vowel.
    O,
    /// Narrow rounded vowel.
    U,
    /// Closed consonant, lips together.
    M,
    /// Teeth-visible consonant.
    F,
    /// Resting mouth, no speech.
    Idle,
    /// Safe default for anything unrecognized.
    Closed,
}

impl VisemeCategory {
    /// Every category, for exhaustive mapping checks.
    pub const ALL: [VisemeCategory; 8] = [
        VisemeCategory::A,
        VisemeCategory::E,
        VisemeCategory::O,
        VisemeCategory::U,
        VisemeCategory::M,
        VisemeCategory::F,
        VisemeCategory::Idle,
        VisemeCategory::Closed,
    ];

    /// Sprite key the renderer selects within the mouth layer.
    pub fn sprite_key(&self) -> &'static str {
        match self {
            VisemeCategory::A => "mouth_a",
            VisemeCategory::E => "mouth_e",
            VisemeCategory::O => "mouth_o",
            VisemeCategory::U => "mouth_u",
            VisemeCategory::M => "mouth_m",
            VisemeCategory::F => "mouth_f",
            VisemeCategory::Idle => "mouth_idle",
            VisemeCategory::Closed => "mouth_closed",
        }
    }
}

/// Maps a classifier label to its viseme category.
///
/// Total over all strings: silence labels map to `Idle`, anything outside
/// the known alphabet maps to `Closed`. Never an error.
pub fn map_label(label: &str) -> VisemeCategory {
    match label.to_lowercase().as_str() {
        "" | "sil" | "rest" | "sp" => VisemeCategory::Idle,
        "a" | "aa" | "ah" | "ax" => VisemeCategory::A,
        "e" | "eh" | "i" | "ih" | "iy" | "y" => VisemeCategory::E,
        "o" | "ao" | "ow" => VisemeCategory::O,
        "u" | "uw" | "w" => VisemeCategory::U,
        "m" | "b" | "p" => VisemeCategory::M,
        "f" | "v" | "s" | "z" | "th" => VisemeCategory::F,
        _ => VisemeCategory::Closed,
    }
}

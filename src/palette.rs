use image::Rgb;
use serde::Serialize;

/// Land-cover classes in the order of the model's output channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LandCoverClass {
    Building,
    Land,
    Road,
    Vegetation,
    Water,
    Unlabeled,
}

pub const NUM_CLASSES: usize = 6;

pub const CLASSES: [LandCoverClass; NUM_CLASSES] = [
    LandCoverClass::Building,
    LandCoverClass::Land,
    LandCoverClass::Road,
    LandCoverClass::Vegetation,
    LandCoverClass::Water,
    LandCoverClass::Unlabeled,
];

/// Index-aligned with `CLASSES`.
pub const CLASS_COLORS: [Rgb<u8>; NUM_CLASSES] = [
    Rgb([60, 16, 152]),
    Rgb([132, 41, 246]),
    Rgb([110, 193, 228]),
    Rgb([254, 221, 58]),
    Rgb([226, 169, 41]),
    Rgb([155, 155, 155]),
];

impl LandCoverClass {
    pub fn from_index(index: usize) -> Option<Self> {
        CLASSES.get(index).copied()
    }

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn label(self) -> &'static str {
        match self {
            LandCoverClass::Building => "Building",
            LandCoverClass::Land => "Land",
            LandCoverClass::Road => "Road",
            LandCoverClass::Vegetation => "Vegetation",
            LandCoverClass::Water => "Water",
            LandCoverClass::Unlabeled => "Unlabeled",
        }
    }

    pub fn color(self) -> Rgb<u8> {
        CLASS_COLORS[self.index()]
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ColorLabel {
    pub id: usize,
    pub label: String,
    pub color: String,
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl From<LandCoverClass> for ColorLabel {
    fn from(class: LandCoverClass) -> Self {
        let Rgb([red, green, blue]) = class.color();
        ColorLabel {
            id: class.index(),
            label: class.label().to_string(),
            color: format!("#{:02X}{:02X}{:02X}", red, green, blue),
            red,
            green,
            blue,
        }
    }
}

pub fn color_labels() -> Vec<ColorLabel> {
    CLASSES.iter().copied().map(ColorLabel::from).collect()
}

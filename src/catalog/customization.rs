//! Watch Customization
//!
//! Gold purity and diamond options, each adding a fixed surcharge to the base
//! price. The diamond carat surcharge applies to real diamonds only.

use std::{collections::BTreeMap, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::prices::Price;

/// Error returned when a customization option is not recognised.
#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown {kind} option: {value}")]
pub struct UnknownOption {
    /// Which option was being parsed
    pub kind: &'static str,

    /// The rejected input
    pub value: String,
}

/// Gold purity of the case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GoldCarat {
    /// 14 karat
    #[default]
    #[serde(rename = "14k")]
    K14,

    /// 18 karat
    #[serde(rename = "18k")]
    K18,

    /// 22 karat
    #[serde(rename = "22k")]
    K22,

    /// 24 karat
    #[serde(rename = "24k")]
    K24,
}

impl GoldCarat {
    /// Every option, cheapest first.
    pub const ALL: [Self; 4] = [Self::K14, Self::K18, Self::K22, Self::K24];

    /// The option's form value.
    pub fn code(self) -> &'static str {
        match self {
            Self::K14 => "14k",
            Self::K18 => "18k",
            Self::K22 => "22k",
            Self::K24 => "24k",
        }
    }

    /// Added to the base price.
    pub fn surcharge(self) -> Price {
        Price::from_major(match self {
            Self::K14 => 0,
            Self::K18 => 2_500,
            Self::K22 => 5_000,
            Self::K24 => 7_500,
        })
    }
}

/// Diamond setting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiamondType {
    /// No diamonds
    #[default]
    None,

    /// Lab-grown stones
    Artificial,

    /// Natural stones
    Real,
}

impl DiamondType {
    /// Every option, cheapest first.
    pub const ALL: [Self; 3] = [Self::None, Self::Artificial, Self::Real];

    /// The option's form value.
    pub fn code(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Artificial => "artificial",
            Self::Real => "real",
        }
    }

    /// Added to the base price.
    pub fn surcharge(self) -> Price {
        Price::from_major(match self {
            Self::None => 0,
            Self::Artificial => 1_500,
            Self::Real => 8_000,
        })
    }
}

/// Total diamond weight, only priced for real diamonds.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiamondCarat {
    /// 0.25 ct
    #[default]
    #[serde(rename = "0.25")]
    Quarter,

    /// 0.50 ct
    #[serde(rename = "0.50")]
    Half,

    /// 0.75 ct
    #[serde(rename = "0.75")]
    ThreeQuarters,

    /// 1.0 ct
    #[serde(rename = "1.0")]
    One,

    /// 1.5 ct
    #[serde(rename = "1.5")]
    OneAndHalf,

    /// 2.0 ct
    #[serde(rename = "2.0")]
    Two,
}

impl DiamondCarat {
    /// Every option, lightest first.
    pub const ALL: [Self; 6] = [
        Self::Quarter,
        Self::Half,
        Self::ThreeQuarters,
        Self::One,
        Self::OneAndHalf,
        Self::Two,
    ];

    /// The option's form value.
    pub fn code(self) -> &'static str {
        match self {
            Self::Quarter => "0.25",
            Self::Half => "0.50",
            Self::ThreeQuarters => "0.75",
            Self::One => "1.0",
            Self::OneAndHalf => "1.5",
            Self::Two => "2.0",
        }
    }

    /// Added to the base price when the diamonds are real.
    pub fn surcharge(self) -> Price {
        Price::from_major(match self {
            Self::Quarter => 0,
            Self::Half => 3_000,
            Self::ThreeQuarters => 6_000,
            Self::One => 12_000,
            Self::OneAndHalf => 20_000,
            Self::Two => 35_000,
        })
    }
}

macro_rules! option_from_str {
    ($option:ty, $kind:literal) => {
        impl FromStr for $option {
            type Err = UnknownOption;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let wanted = s.trim().to_ascii_lowercase();

                Self::ALL
                    .into_iter()
                    .find(|option| option.code() == wanted)
                    .ok_or_else(|| UnknownOption {
                        kind: $kind,
                        value: s.to_string(),
                    })
            }
        }

        impl fmt::Display for $option {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }
    };
}

option_from_str!(GoldCarat, "gold carat");
option_from_str!(DiamondType, "diamond type");
option_from_str!(DiamondCarat, "diamond carat");

/// A full set of customization choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customization {
    /// Gold purity
    pub gold_carat: GoldCarat,

    /// Diamond setting
    pub diamond_type: DiamondType,

    /// Diamond weight
    pub diamond_carat: DiamondCarat,
}

impl Customization {
    /// Total added to the base price.
    pub fn surcharge(&self) -> Price {
        let carat = if self.diamond_type == DiamondType::Real {
            self.diamond_carat.surcharge()
        } else {
            Price::ZERO
        };

        [self.gold_carat.surcharge(), self.diamond_type.surcharge(), carat]
            .into_iter()
            .sum()
    }

    /// Whether every choice is the cheapest option.
    pub fn is_standard(&self) -> bool {
        self.surcharge() == Price::ZERO
    }

    /// The choices as form field name → value pairs.
    pub fn selections(&self) -> BTreeMap<String, String> {
        let mut selections = BTreeMap::new();

        selections.insert("gold_carat".to_string(), self.gold_carat.code().to_string());
        selections.insert(
            "diamond_type".to_string(),
            self.diamond_type.code().to_string(),
        );

        if self.diamond_type == DiamondType::Real {
            selections.insert(
                "diamond_carat".to_string(),
                self.diamond_carat.code().to_string(),
            );
        }

        selections
    }

    /// A short label such as `18k gold, 1.0ct real diamonds`.
    pub fn describe(&self) -> String {
        match self.diamond_type {
            DiamondType::None => format!("{} gold", self.gold_carat),
            DiamondType::Artificial => format!("{} gold, artificial diamonds", self.gold_carat),
            DiamondType::Real => format!(
                "{} gold, {}ct real diamonds",
                self.gold_carat, self.diamond_carat
            ),
        }
    }
}

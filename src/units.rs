use serde::{Deserialize, Serialize};

/// Unit system a measurement record is tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    Cm,
    Inches,
    Feet,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Cm => "cm",
            UnitSystem::Inches => "inches",
            UnitSystem::Feet => "feet",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "cm" => Some(UnitSystem::Cm),
            "inches" => Some(UnitSystem::Inches),
            "feet" => Some(UnitSystem::Feet),
            _ => None,
        }
    }
}

impl Default for UnitSystem {
    fn default() -> Self {
        UnitSystem::Cm
    }
}

/// A converted value: either a single number in the target unit or a
/// feet-and-inches split.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", untagged)]
pub enum ConvertedValue {
    Single(f64),
    FeetInches { feet: i32, inches: f64 },
}

const CM_PER_INCH: f64 = 2.54;

fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn split_feet(total_inches: f64) -> ConvertedValue {
    let feet = (total_inches / 12.0).floor() as i32;
    let inches = round_tenth(total_inches % 12.0);
    ConvertedValue::FeetInches { feet, inches }
}

/// Convert a stored measurement for display. Source values are only ever
/// centimeters or inches; anything else passes through unchanged.
pub fn convert_measurement(value: f64, from: UnitSystem, to: UnitSystem) -> ConvertedValue {
    if from == to {
        return ConvertedValue::Single(value);
    }
    match (from, to) {
        (UnitSystem::Cm, UnitSystem::Inches) => ConvertedValue::Single(round_tenth(value / CM_PER_INCH)),
        (UnitSystem::Cm, UnitSystem::Feet) => split_feet(value / CM_PER_INCH),
        (UnitSystem::Inches, UnitSystem::Cm) => ConvertedValue::Single((value * CM_PER_INCH).round()),
        (UnitSystem::Inches, UnitSystem::Feet) => split_feet(value),
        _ => ConvertedValue::Single(value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_unit_is_identity() {
        assert_eq!(
            convert_measurement(86.0, UnitSystem::Cm, UnitSystem::Cm),
            ConvertedValue::Single(86.0)
        );
    }

    #[test]
    fn cm_to_inches_rounds_to_tenths() {
        assert_eq!(
            convert_measurement(170.0, UnitSystem::Cm, UnitSystem::Inches),
            ConvertedValue::Single(66.9)
        );
    }

    #[test]
    fn cm_to_feet_splits_feet_and_inches() {
        // 170cm = 66.93in = 5ft 6.9in
        assert_eq!(
            convert_measurement(170.0, UnitSystem::Cm, UnitSystem::Feet),
            ConvertedValue::FeetInches { feet: 5, inches: 6.9 }
        );
    }

    #[test]
    fn inches_to_cm_rounds_to_whole() {
        assert_eq!(
            convert_measurement(36.0, UnitSystem::Inches, UnitSystem::Cm),
            ConvertedValue::Single(91.0)
        );
    }

    #[test]
    fn inches_to_feet() {
        assert_eq!(
            convert_measurement(70.5, UnitSystem::Inches, UnitSystem::Feet),
            ConvertedValue::FeetInches { feet: 5, inches: 10.5 }
        );
    }

    #[test]
    fn unit_system_round_trips_through_strings() {
        for unit in [UnitSystem::Cm, UnitSystem::Inches, UnitSystem::Feet] {
            assert_eq!(UnitSystem::parse(unit.as_str()), Some(unit));
        }
        assert_eq!(UnitSystem::parse("furlongs"), None);
    }
}

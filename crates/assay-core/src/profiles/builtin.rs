use crate::error::AssayError;
use crate::profiles::schema::{ProfileDef, ProfileKind};

const HIGH_POTENCY_JSON: &str = include_str!("../../../../profiles/high-potency.json");
const LOW_POTENCY_JSON: &str = include_str!("../../../../profiles/low-potency.json");
const HEMP_COMPLIANT_JSON: &str = include_str!("../../../../profiles/hemp-compliant.json");
const DECARBOXYLATED_JSON: &str = include_str!("../../../../profiles/decarboxylated.json");
const CONCENTRATE_JSON: &str = include_str!("../../../../profiles/concentrate.json");
const EDIBLE_JSON: &str = include_str!("../../../../profiles/edible.json");

/// Available predefined profiles.
pub const PRESETS: &[&str] = &[
    "high-potency",
    "low-potency",
    "hemp-compliant",
    "decarboxylated",
    "concentrate",
    "edible",
];

/// Load a predefined profile by name.
pub fn load_preset(name: &str) -> Result<ProfileDef, AssayError> {
    match ProfileKind::from_str_loose(name) {
        Some(kind) => load_kind(kind),
        None => Err(AssayError::ProfileInvalid(format!(
            "unknown profile '{}'. Available: {}",
            name,
            PRESETS.join(", ")
        ))),
    }
}

/// Load the predefined profile for a variant.
pub fn load_kind(kind: ProfileKind) -> Result<ProfileDef, AssayError> {
    let json = match kind {
        ProfileKind::HighPotency => HIGH_POTENCY_JSON,
        ProfileKind::LowPotency => LOW_POTENCY_JSON,
        ProfileKind::HempCompliant => HEMP_COMPLIANT_JSON,
        ProfileKind::Decarboxylated => DECARBOXYLATED_JSON,
        ProfileKind::Concentrate => CONCENTRATE_JSON,
        ProfileKind::Edible => EDIBLE_JSON,
    };
    let profile = super::parse_profile_str(json)?;
    if profile.profile != kind {
        return Err(AssayError::ProfileInvalid(format!(
            "preset '{}' declares profile '{}'",
            kind, profile.profile
        )));
    }
    Ok(profile)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_every_preset_loads() {
        for name in PRESETS {
            let p = load_preset(name).unwrap();
            assert_eq!(p.profile.name(), *name);
        }
        for kind in ProfileKind::ALL {
            assert!(load_kind(kind).is_ok());
        }
    }

    #[test]
    fn test_high_potency_ranges() {
        let p = load_preset("high-potency").unwrap();
        assert_eq!(p.thca.min, dec!(18));
        assert_eq!(p.thca.max, dec!(30));
        assert!(p.moisture.is_some());
    }

    #[test]
    fn test_hemp_preset_stays_under_limit() {
        let p = load_preset("hemp").unwrap();
        let worst_case = p.d9_thc.max + dec!(0.877) * p.thca.max;
        assert!(worst_case <= dec!(0.3));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(load_preset("xyz").is_err());
    }
}

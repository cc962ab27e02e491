// Copyright (c) 2025 SOLARE S.R.O.
//
// This file is part of eKartoteka Bridge.
//
// Licensed under the Creative Commons Attribution-NonCommercial-NoDerivatives 4.0 International
// (CC BY-NC-ND 4.0). You may use and share this file for non-commercial purposes only and you may not
// create derivatives. See <https://creativecommons.org/licenses/by-nc-nd/4.0/>.
//
// This software is provided "AS IS", without warranty of any kind.
//
// For commercial licensing, please contact: info@solare.cz

//! Mapping from the portal's unit codes to display device classes and units.

/// Device class of a sensor, mirroring the host platform's sensor classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceClass {
    Water,
    Energy,
    Monetary,
}

impl DeviceClass {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Water => "water",
            Self::Energy => "energy",
            Self::Monetary => "monetary",
        }
    }
}

pub const CUBIC_METERS: &str = "m³";
pub const GIGA_JOULE: &str = "GJ";
/// Currency label the portal bills in.
pub const CURRENCY: &str = "zl";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UnitMapping {
    pub device_class: Option<DeviceClass>,
    pub unit: Option<String>,
}

/// Map a raw unit code: "m3" is a water volume in cubic meters, "GJ" an
/// energy amount in gigajoules, any other non-empty code passes through
/// verbatim, empty or absent yields no unit.
pub fn map_unit(raw: Option<&str>) -> UnitMapping {
    let unit = raw.unwrap_or_default().trim();
    match unit {
        "m3" => UnitMapping {
            device_class: Some(DeviceClass::Water),
            unit: Some(CUBIC_METERS.to_owned()),
        },
        "GJ" => UnitMapping {
            device_class: Some(DeviceClass::Energy),
            unit: Some(GIGA_JOULE.to_owned()),
        },
        "" => UnitMapping::default(),
        other => UnitMapping {
            device_class: None,
            unit: Some(other.to_owned()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_m3_maps_to_water_cubic_meters() {
        let mapping = map_unit(Some("m3"));
        assert_eq!(mapping.device_class, Some(DeviceClass::Water));
        assert_eq!(mapping.unit.as_deref(), Some("m³"));
    }

    #[test]
    fn test_gj_maps_to_energy_gigajoules() {
        let mapping = map_unit(Some("GJ"));
        assert_eq!(mapping.device_class, Some(DeviceClass::Energy));
        assert_eq!(mapping.unit.as_deref(), Some("GJ"));
    }

    #[test]
    fn test_empty_and_absent_yield_no_unit() {
        assert_eq!(map_unit(Some("")), UnitMapping::default());
        assert_eq!(map_unit(Some("   ")), UnitMapping::default());
        assert_eq!(map_unit(None), UnitMapping::default());
    }

    #[test]
    fn test_other_codes_pass_through_verbatim() {
        let mapping = map_unit(Some("kWh"));
        assert_eq!(mapping.device_class, None);
        assert_eq!(mapping.unit.as_deref(), Some("kWh"));
    }
}

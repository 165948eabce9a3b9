//! Parameter vocabulary and the fixed-shape [`ParamSet`].
//!
//! The robot exposes a closed set of thirteen tunable parameters.  A
//! [`ParamSet`] stores one `f64` per parameter in a fixed array indexed by
//! [`Param`], so a set can never be missing a key or carry an unknown one.
//! On the wire it serialises as a camelCase JSON object.

use core::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

// ---------------------------------------------------------------------------
// Parameter identity
// ---------------------------------------------------------------------------

/// Every tunable operating parameter of the cleaning robot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum Param {
    RobotSpeed = 0,
    BrushRpm = 1,
    WaterPressure = 2,
    DetergentFlowRate = 3,
    VacuumPower = 4,
    TurnRadius = 5,
    PassOverlap = 6,
    PathSpacing = 7,
    SqueegeePressure = 8,
    DwellTime = 9,
    RpmRampRate = 10,
    MaxWaterPerMin = 11,
    MaxEnergyPerMin = 12,
}

impl Param {
    /// Total number of parameters, used to size [`ParamSet`].
    pub const COUNT: usize = 13;

    /// All parameters in wire order.
    pub const ALL: [Param; Param::COUNT] = [
        Self::RobotSpeed,
        Self::BrushRpm,
        Self::WaterPressure,
        Self::DetergentFlowRate,
        Self::VacuumPower,
        Self::TurnRadius,
        Self::PassOverlap,
        Self::PathSpacing,
        Self::SqueegeePressure,
        Self::DwellTime,
        Self::RpmRampRate,
        Self::MaxWaterPerMin,
        Self::MaxEnergyPerMin,
    ];

    /// The camelCase wire name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::RobotSpeed => "robotSpeed",
            Self::BrushRpm => "brushRpm",
            Self::WaterPressure => "waterPressure",
            Self::DetergentFlowRate => "detergentFlowRate",
            Self::VacuumPower => "vacuumPower",
            Self::TurnRadius => "turnRadius",
            Self::PassOverlap => "passOverlap",
            Self::PathSpacing => "pathSpacing",
            Self::SqueegeePressure => "squeegeePressure",
            Self::DwellTime => "dwellTime",
            Self::RpmRampRate => "rpmRampRate",
            Self::MaxWaterPerMin => "maxWaterPerMin",
            Self::MaxEnergyPerMin => "maxEnergyPerMin",
        }
    }

    /// Look a parameter up by its exact wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.name() == name)
    }

    const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Serialize for Param {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.name())
    }
}

impl<'de> Deserialize<'de> for Param {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Param::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown parameter `{name}`")))
    }
}

// ---------------------------------------------------------------------------
// ParamSet
// ---------------------------------------------------------------------------

/// One value per [`Param`].  `Copy` so snapshots are plain value copies and
/// a partially-updated set can never escape the store.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamSet {
    values: [f64; Param::COUNT],
}

impl ParamSet {
    /// Build a set from values listed in [`Param::ALL`] order.
    pub const fn from_array(values: [f64; Param::COUNT]) -> Self {
        Self { values }
    }

    pub fn get(&self, param: Param) -> f64 {
        self.values[param.index()]
    }

    pub fn set(&mut self, param: Param, value: f64) {
        self.values[param.index()] = value;
    }

    /// Iterate `(param, value)` pairs in wire order.
    pub fn iter(&self) -> impl Iterator<Item = (Param, f64)> + '_ {
        Param::ALL.into_iter().map(|p| (p, self.get(p)))
    }
}

impl core::ops::Index<Param> for ParamSet {
    type Output = f64;

    fn index(&self, param: Param) -> &f64 {
        &self.values[param.index()]
    }
}

impl Serialize for ParamSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(Param::COUNT))?;
        for (param, value) in self.iter() {
            map.serialize_entry(param.name(), &value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for ParamSet {
    /// A complete set is required: every parameter must be present.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SetVisitor;

        impl<'de> Visitor<'de> for SetVisitor {
            type Value = ParamSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("an object with one number per parameter")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<ParamSet, A::Error> {
                let mut values = [None; Param::COUNT];
                while let Some((param, value)) = access.next_entry::<Param, f64>()? {
                    values[param.index()] = Some(value);
                }
                let mut set = ParamSet::from_array([0.0; Param::COUNT]);
                for param in Param::ALL {
                    let value = values[param.index()]
                        .ok_or_else(|| serde::de::Error::missing_field(param.name()))?;
                    set.set(param, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(SetVisitor)
    }
}

//! Age and gender demographic types.
//!
//! Bracket labels are serialized exactly as the age/gender estimation model
//! emits them, so snapshot files stay compatible with downstream consumers.

use std::fmt;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::geometry::BoundingBox;

/// The eight age brackets predicted by the age estimation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum AgeBracket {
    #[serde(rename = "(0-2)")]
    Age0To2,
    #[serde(rename = "(4-6)")]
    Age4To6,
    #[serde(rename = "(8-12)")]
    Age8To12,
    #[serde(rename = "(15-20)")]
    Age15To20,
    #[serde(rename = "(25-32)")]
    Age25To32,
    #[serde(rename = "(38-43)")]
    Age38To43,
    #[serde(rename = "(48-53)")]
    Age48To53,
    #[serde(rename = "(60-100)")]
    Age60To100,
}

impl AgeBracket {
    pub fn as_str(&self) -> &'static str {
        match self {
            AgeBracket::Age0To2 => "(0-2)",
            AgeBracket::Age4To6 => "(4-6)",
            AgeBracket::Age8To12 => "(8-12)",
            AgeBracket::Age15To20 => "(15-20)",
            AgeBracket::Age25To32 => "(25-32)",
            AgeBracket::Age38To43 => "(38-43)",
            AgeBracket::Age48To53 => "(48-53)",
            AgeBracket::Age60To100 => "(60-100)",
        }
    }
}

impl fmt::Display for AgeBracket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Binary gender as predicted by the gender estimation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
        }
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One face estimate inside a person crop.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct FaceObservation {
    pub age: AgeBracket,
    pub gender: Gender,
    /// Estimator confidence (0.0-1.0)
    pub confidence: f64,
    /// Face box in person-crop coordinates, when the estimator reports one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bbox: Option<BoundingBox>,
}

impl FaceObservation {
    pub fn new(age: AgeBracket, gender: Gender, confidence: f64) -> Self {
        Self {
            age,
            gender,
            confidence,
            bbox: None,
        }
    }
}

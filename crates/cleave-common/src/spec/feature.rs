use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CommonResult;

/// The column name conventionally holding precomputed fold labels.
pub const SPLIT_COLUMN: &str = "split";

/// The declared type of an input or output feature.
///
/// Types this crate does not reason about are kept verbatim in [`FeatureType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum FeatureType {
    Binary,
    Category,
    Number,
    Text,
    Date,
    Set,
    Bag,
    Sequence,
    Timeseries,
    Vector,
    Image,
    Audio,
    H3,
    Other(String),
}

impl FeatureType {
    pub fn as_str(&self) -> &str {
        match self {
            FeatureType::Binary => "binary",
            FeatureType::Category => "category",
            FeatureType::Number => "number",
            FeatureType::Text => "text",
            FeatureType::Date => "date",
            FeatureType::Set => "set",
            FeatureType::Bag => "bag",
            FeatureType::Sequence => "sequence",
            FeatureType::Timeseries => "timeseries",
            FeatureType::Vector => "vector",
            FeatureType::Image => "image",
            FeatureType::Audio => "audio",
            FeatureType::H3 => "h3",
            FeatureType::Other(name) => name,
        }
    }
}

impl From<String> for FeatureType {
    fn from(value: String) -> Self {
        match value.as_str() {
            "binary" => FeatureType::Binary,
            "category" => FeatureType::Category,
            "number" | "numerical" => FeatureType::Number,
            "text" => FeatureType::Text,
            "date" => FeatureType::Date,
            "set" => FeatureType::Set,
            "bag" => FeatureType::Bag,
            "sequence" => FeatureType::Sequence,
            "timeseries" => FeatureType::Timeseries,
            "vector" => FeatureType::Vector,
            "image" => FeatureType::Image,
            "audio" => FeatureType::Audio,
            "h3" => FeatureType::H3,
            _ => FeatureType::Other(value),
        }
    }
}

impl From<FeatureType> for String {
    fn from(value: FeatureType) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for FeatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureConfig {
    pub name: String,
    /// The dataset column backing this feature. Defaults to the feature name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<String>,
    #[serde(rename = "type")]
    pub feature_type: FeatureType,
    /// Encoder, decoder and preprocessing options.
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl FeatureConfig {
    pub fn new(name: impl Into<String>, feature_type: FeatureType) -> Self {
        Self {
            name: name.into(),
            column: None,
            feature_type,
            options: Map::new(),
        }
    }

    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn column(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// The `preprocessing.split` section: a splitter type tag plus variant options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SplitParams {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub split_type: Option<String>,
    #[serde(flatten)]
    pub options: Map<String, Value>,
}

impl SplitParams {
    pub fn of_type(split_type: impl Into<String>) -> Self {
        Self {
            split_type: Some(split_type.into()),
            options: Map::new(),
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }
}

/// Global preprocessing parameters shared by every feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingParameters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split: Option<SplitParams>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

/// A declarative model configuration.
///
/// Only the sections this workspace interprets are typed; everything else
/// (trainer, combiner, defaults, ...) is preserved in `other`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default)]
    pub input_features: Vec<FeatureConfig>,
    #[serde(default)]
    pub output_features: Vec<FeatureConfig>,
    #[serde(default)]
    pub preprocessing: PreprocessingParameters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hyperopt: Option<Value>,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl ModelConfig {
    pub fn from_json_str(value: &str) -> CommonResult<Self> {
        Ok(serde_json::from_str(value)?)
    }

    pub fn from_value(value: Value) -> CommonResult<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_value(&self) -> CommonResult<Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Input features followed by output features.
    pub fn features(&self) -> impl Iterator<Item = &FeatureConfig> {
        self.input_features.iter().chain(self.output_features.iter())
    }

    pub fn find_feature_by_column(&self, column: &str) -> Option<&FeatureConfig> {
        self.features().find(|f| f.column() == column)
    }
}

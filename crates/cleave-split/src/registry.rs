use std::collections::BTreeMap;
use std::sync::Arc;

use cleave_common::spec::SplitParams;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::error::{SplitError, SplitResult};
use crate::splitter::{
    DatetimeSplitConfig, DatetimeSplitter, FixedSplitConfig, FixedSplitter, RandomSplitConfig,
    RandomSplitter, Splitter, StratifySplitConfig, StratifySplitter,
};

/// Builds a splitter from the options of a `preprocessing.split` section, excluding `type`.
pub type SplitterFactory =
    Arc<dyn Fn(&Map<String, Value>) -> SplitResult<Box<dyn Splitter>> + Send + Sync>;

pub const DEFAULT_SPLIT_TYPE: &str = "random";

/// The splitter types available to split resolution.
#[derive(Clone)]
pub struct SplitterRegistry {
    factories: BTreeMap<String, SplitterFactory>,
    default_type: String,
}

impl SplitterRegistry {
    /// Creates a registry with no splitter types.
    pub fn new(default_type: impl Into<String>) -> Self {
        Self {
            factories: BTreeMap::new(),
            default_type: default_type.into(),
        }
    }

    /// Creates a registry with the `random`, `fixed`, `stratify` and `datetime` splitters,
    /// `random` being the default.
    pub fn builtin() -> Self {
        let mut registry = Self::new(DEFAULT_SPLIT_TYPE);
        let builtins = [
            ("random", from_options::<RandomSplitConfig, RandomSplitter>()),
            ("fixed", from_options::<FixedSplitConfig, FixedSplitter>()),
            ("stratify", from_options::<StratifySplitConfig, StratifySplitter>()),
            ("datetime", from_options::<DatetimeSplitConfig, DatetimeSplitter>()),
        ];
        for (name, factory) in builtins {
            registry.factories.insert(name.to_string(), factory);
        }
        registry
    }

    pub fn register(
        &mut self,
        name: impl Into<String>,
        factory: SplitterFactory,
    ) -> SplitResult<()> {
        let name = name.into();
        if self.factories.contains_key(&name) {
            return Err(SplitError::invalid(format!(
                "split type already registered: {name}"
            )));
        }
        self.factories.insert(name, factory);
        Ok(())
    }

    /// Changes the splitter type used when the split section has no `type`.
    pub fn with_default(mut self, default_type: impl Into<String>) -> SplitResult<Self> {
        let default_type = default_type.into();
        if !self.factories.contains_key(&default_type) {
            return Err(SplitError::invalid(format!(
                "invalid default split type: {default_type}"
            )));
        }
        self.default_type = default_type;
        Ok(self)
    }

    pub fn default_type(&self) -> &str {
        &self.default_type
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.factories.keys().map(String::as_str)
    }

    pub fn get_splitter(&self, params: &SplitParams) -> SplitResult<Box<dyn Splitter>> {
        let split_type = params.split_type.as_deref().unwrap_or(&self.default_type);
        let factory = self.factories.get(split_type).ok_or_else(|| {
            SplitError::invalid(format!(
                "invalid split type: {split_type} (expected one of: {})",
                self.names().collect::<Vec<_>>().join(", ")
            ))
        })?;
        factory(&params.options)
    }

    pub fn default_splitter(&self) -> SplitResult<Box<dyn Splitter>> {
        self.get_splitter(&SplitParams::default())
    }
}

impl Default for SplitterRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

impl std::fmt::Debug for SplitterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SplitterRegistry")
            .field("types", &self.factories.keys().collect::<Vec<_>>())
            .field("default_type", &self.default_type)
            .finish()
    }
}

/// A factory deserializing the options into `C` and converting it to the splitter `S`.
///
/// Options `C` does not know about are ignored.
pub fn from_options<C, S>() -> SplitterFactory
where
    C: DeserializeOwned,
    S: Splitter + From<C> + 'static,
{
    Arc::new(
        |options: &Map<String, Value>| -> SplitResult<Box<dyn Splitter>> {
            let config: C = serde_json::from_value(Value::Object(options.clone()))?;
            Ok(Box::new(S::from(config)))
        },
    )
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use cleave_common::spec::Fold;

    use super::*;

    #[test]
    fn test_builtin_resolution() {
        let registry = SplitterRegistry::builtin();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["datetime", "fixed", "random", "stratify"]
        );
        assert_eq!(registry.default_splitter().unwrap().name(), "random");

        let params = SplitParams::of_type("stratify")
            .with_option("column", "label")
            .with_option("probabilities", vec![0.5, 0.0, 0.5])
            .with_option("unused", true);
        let splitter = registry.get_splitter(&params).unwrap();
        assert_eq!(splitter.name(), "stratify");
        assert!(!splitter.has_split(Fold::Validation));
        assert_eq!(splitter.required_columns(), vec!["label".to_string()]);

        let fixed = registry.get_splitter(&SplitParams::of_type("fixed")).unwrap();
        assert_eq!(fixed.required_columns(), vec!["split".to_string()]);
    }

    #[test]
    fn test_invalid_options() {
        let registry = SplitterRegistry::builtin();
        let err = registry
            .get_splitter(&SplitParams::of_type("hash"))
            .unwrap_err();
        assert!(err.to_string().contains("invalid split type: hash"));

        // `column` is required for stratified splits
        assert!(matches!(
            registry.get_splitter(&SplitParams::of_type("stratify")),
            Err(SplitError::InvalidConfig(_))
        ));
        let params =
            SplitParams::of_type("random").with_option("probabilities", vec![0.5, -0.5, 1.0]);
        assert!(registry.get_splitter(&params).is_err());
    }

    #[test]
    fn test_register_and_default() {
        let mut registry = SplitterRegistry::builtin();
        let err = registry.register("fixed", from_options::<FixedSplitConfig, FixedSplitter>());
        assert!(err.is_err());
        registry
            .register("by_label", from_options::<FixedSplitConfig, FixedSplitter>())
            .unwrap();
        let registry = registry.with_default("by_label").unwrap();
        assert_eq!(registry.default_splitter().unwrap().name(), "fixed");
        assert!(registry.with_default("unknown").is_err());
    }
}

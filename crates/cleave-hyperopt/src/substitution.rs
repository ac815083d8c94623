use cleave_common::spec::ModelConfig;
use serde_json::{Map, Value};

use crate::error::{HyperoptError, HyperoptResult};
use crate::sampler::TrialParameters;

const DEFAULTS: &str = "defaults";
const FEATURE_SECTIONS: [&str; 2] = ["input_features", "output_features"];

/// Applies sampled parameters to a copy of the model config.
///
/// Parameter paths are resolved as follows:
/// * `defaults.<section>.<type>.<param>` sets `param` on every feature of `type` in
///   `section` (`input_features` or `output_features`) and is recorded under the
///   config `defaults` section.
/// * `<feature name>.<param>` sets `param` on the named input or output feature,
///   after the defaults so that it takes precedence.
/// * any other path is assigned into the nested config sections.
pub fn substitute_parameters(
    config: &ModelConfig,
    parameters: &TrialParameters,
) -> HyperoptResult<ModelConfig> {
    let mut root = match config.to_value()? {
        Value::Object(root) => root,
        _ => return Err(HyperoptError::config("the model config is not an object")),
    };
    let feature_names = config
        .features()
        .map(|f| f.name.clone())
        .collect::<Vec<_>>();

    let mut feature_parameters = vec![];
    let mut config_parameters = vec![];
    for (name, value) in parameters {
        let path = name.split('.').collect::<Vec<_>>();
        match path.as_slice() {
            [DEFAULTS, section, feature_type, param @ ..] if FEATURE_SECTIONS.contains(section) => {
                if param.is_empty() {
                    return Err(HyperoptError::parameter(name, "missing the feature parameter"));
                }
                for feature in features_mut(&mut root, section)? {
                    if feature.get("type").and_then(Value::as_str) == Some(*feature_type) {
                        set_path(feature, param, value.clone(), name)?;
                    }
                }
                config_parameters.push((name, value));
            }
            [feature, param @ ..] if feature_names.iter().any(|n| n == feature) => {
                if param.is_empty() {
                    return Err(HyperoptError::parameter(name, "missing the feature parameter"));
                }
                feature_parameters.push((name, *feature, param.to_vec(), value));
            }
            _ => config_parameters.push((name, value)),
        }
    }
    for (name, feature_name, param, value) in feature_parameters {
        for section in FEATURE_SECTIONS {
            for feature in features_mut(&mut root, section)? {
                if feature.get("name").and_then(Value::as_str) == Some(feature_name) {
                    set_path(feature, &param, value.clone(), name)?;
                }
            }
        }
    }
    for (name, value) in config_parameters {
        let path = name.split('.').collect::<Vec<_>>();
        set_path(&mut root, &path, value.clone(), name)?;
    }
    Ok(ModelConfig::from_value(Value::Object(root))?)
}

fn features_mut<'a>(
    root: &'a mut Map<String, Value>,
    section: &str,
) -> HyperoptResult<Vec<&'a mut Map<String, Value>>> {
    match root.get_mut(section) {
        Some(Value::Array(features)) => Ok(features
            .iter_mut()
            .filter_map(Value::as_object_mut)
            .collect()),
        Some(_) => Err(HyperoptError::config(format!("{section} is not a list"))),
        None => Ok(vec![]),
    }
}

/// Assigns `value` at the nested `path`, creating intermediate sections as needed.
fn set_path(
    target: &mut Map<String, Value>,
    path: &[&str],
    value: Value,
    name: &str,
) -> HyperoptResult<()> {
    match path {
        [] => Err(HyperoptError::parameter(name, "empty parameter path")),
        [key] => {
            target.insert(key.to_string(), value);
            Ok(())
        }
        [key, rest @ ..] => {
            let section = target
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            match section {
                Value::Object(section) => set_path(section, rest, value, name),
                _ => Err(HyperoptError::parameter(
                    name,
                    format!("{key} is not a config section"),
                )),
            }
        }
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn config() -> ModelConfig {
        ModelConfig::from_value(json!({
            "input_features": [
                {"name": "title", "type": "text", "encoder": "parallel_cnn"},
                {"name": "summary", "type": "text"},
                {"name": "color", "type": "category"},
            ],
            "output_features": [{"name": "label", "type": "category"}],
            "combiner": {"type": "concat", "num_fc_layers": 2},
            "trainer": {"epochs": 2, "learning_rate": 0.001},
        }))
        .unwrap()
    }

    fn parameters(value: Value) -> TrialParameters {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_nested_config_parameters() {
        let original = config();
        let config = substitute_parameters(
            &original,
            &parameters(json!({
                "trainer.learning_rate": 0.01,
                "combiner.num_fc_layers": 3,
                "preprocessing.split.type": "fixed",
            })),
        )
        .unwrap();
        assert_eq!(config.other["trainer"], json!({"epochs": 2, "learning_rate": 0.01}));
        assert_eq!(config.other["combiner"]["num_fc_layers"], json!(3));
        assert_eq!(
            config.preprocessing.split.unwrap().split_type.as_deref(),
            Some("fixed")
        );
        assert_eq!(original.other["trainer"]["learning_rate"], json!(0.001));
    }

    #[test]
    fn test_defaults_and_feature_parameters() {
        let config = substitute_parameters(
            &config(),
            &parameters(json!({
                "defaults.input_features.text.cell_type": "gru",
                "defaults.input_features.category.vocab_size": 5,
                "defaults.output_features.category.vocab_size": 7,
                "color.vocab_size": 2,
                "label.decoder.num_fc_layers": 4,
            })),
        )
        .unwrap();
        for feature in &config.input_features[..2] {
            assert_eq!(feature.options["cell_type"], json!("gru"));
        }
        assert_eq!(config.input_features[2].options["vocab_size"], json!(2));
        assert_eq!(config.output_features[0].options["vocab_size"], json!(7));
        assert_eq!(
            config.output_features[0].options["decoder"],
            json!({"num_fc_layers": 4})
        );
        assert_eq!(
            config.other["defaults"],
            json!({
                "input_features": {
                    "text": {"cell_type": "gru"},
                    "category": {"vocab_size": 5},
                },
                "output_features": {"category": {"vocab_size": 7}},
            })
        );
    }

    #[test]
    fn test_invalid_paths() {
        let result = substitute_parameters(
            &config(),
            &parameters(json!({"trainer.epochs.value": 3})),
        );
        assert!(matches!(result, Err(HyperoptError::InvalidParameter(_, _))));

        let result = substitute_parameters(&config(), &parameters(json!({"label": 3})));
        assert!(result.is_err());
    }
}

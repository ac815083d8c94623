use std::path::PathBuf;

use clap::{Parser, Subcommand};
use cleave_common::config::AppConfig;
use cleave_telemetry::init_telemetry;

use crate::hyperopt::{run_hyperopt_plan, HyperoptPlanOptions};
use crate::split::{run_split, SplitOptions};

#[derive(Parser)]
#[command(version, name = "cleave")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    #[command(about = "Split a CSV dataset into train, validation and test files")]
    Split {
        #[arg(long, help = "The CSV file to split")]
        dataset: PathBuf,
        #[arg(long, help = "The JSON model config with the preprocessing split section")]
        config: PathBuf,
        #[arg(long, help = "The directory to write the split files to")]
        output_dir: PathBuf,
        #[arg(long, help = "The random seed, overriding the application config")]
        seed: Option<u64>,
        #[arg(
            long,
            help = "Shard the dataset into this many partitions, overriding the application config"
        )]
        partitions: Option<usize>,
    },
    #[command(about = "Sample hyperparameter trials and print the config of each trial")]
    HyperoptPlan {
        #[arg(long, help = "The JSON model config with the hyperopt section")]
        config: PathBuf,
        #[arg(long, help = "Write the trials to this file instead of standard output")]
        output: Option<PathBuf>,
    },
}

pub fn main(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse_from(args);
    let config = AppConfig::load()?;
    init_telemetry()?;
    run(cli.command, &config)
}

fn run(command: Command, config: &AppConfig) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Command::Split {
            dataset,
            config: model_config,
            output_dir,
            seed,
            partitions,
        } => run_split(
            config,
            SplitOptions {
                dataset,
                model_config,
                output_dir,
                seed,
                partitions,
            },
        ),
        Command::HyperoptPlan { config, output } => run_hyperopt_plan(HyperoptPlanOptions {
            model_config: config,
            output,
        }),
    }
}

#[allow(clippy::unwrap_used)]
#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use super::*;

    fn run_args(args: &[&str]) -> Result<(), Box<dyn std::error::Error>> {
        let cli = Cli::parse_from(std::iter::once("cleave").chain(args.iter().copied()));
        run(cli.command, &AppConfig::load().unwrap())
    }

    fn write_dataset(dir: &Path) -> PathBuf {
        let path = dir.join("data.csv");
        let mut content = "id,C,split\n".to_string();
        for i in 0..100 {
            content.push_str(&format!("{i},{},{}\n", (i * 37) % 100, i % 3));
        }
        fs::write(&path, content).unwrap();
        path
    }

    fn line_count(path: &Path) -> usize {
        fs::read_to_string(path).unwrap().lines().count()
    }

    #[test]
    fn test_split_command() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path());
        let config = dir.path().join("config.json");
        fs::write(
            &config,
            r#"{
                "input_features": [{"name": "C", "type": "number"}],
                "output_features": [{"name": "id", "type": "number"}],
                "preprocessing": {"split": {"type": "random", "probabilities": [0.8, 0.0, 0.2]}}
            }"#,
        )
        .unwrap();
        let output = dir.path().join("out");
        run_args(&[
            "split",
            "--dataset",
            dataset.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
            "--seed",
            "7",
        ])
        .unwrap();

        assert_eq!(line_count(&output.join("train.csv")), 81);
        assert_eq!(line_count(&output.join("test.csv")), 21);
        assert!(!output.join("validation.csv").exists());
    }

    #[test]
    fn test_fixed_split_on_partitions() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = write_dataset(dir.path());
        let config = dir.path().join("config.json");
        fs::write(&config, r#"{"preprocessing": {"split": {"type": "fixed"}}}"#).unwrap();
        let output = dir.path().join("out");
        run_args(&[
            "split",
            "--dataset",
            dataset.to_str().unwrap(),
            "--config",
            config.to_str().unwrap(),
            "--output-dir",
            output.to_str().unwrap(),
            "--partitions",
            "4",
        ])
        .unwrap();

        assert_eq!(line_count(&output.join("train.csv")), 35);
        assert_eq!(line_count(&output.join("validation.csv")), 34);
        assert_eq!(line_count(&output.join("test.csv")), 34);
    }

    #[test]
    fn test_hyperopt_plan_command() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("config.json");
        fs::write(
            &config,
            r#"{
                "input_features": [{"name": "title", "type": "text"}],
                "output_features": [{"name": "label", "type": "category"}],
                "trainer": {"learning_rate": 0.001},
                "hyperopt": {
                    "parameters": {
                        "trainer.learning_rate": {"space": "grid_search", "values": [0.01, 0.1]},
                        "title.cell_type": {"space": "choice", "categories": ["lstm", "gru"]}
                    },
                    "executor": {"num_samples": 2}
                }
            }"#,
        )
        .unwrap();
        let output = dir.path().join("trials.json");
        run_args(&[
            "hyperopt-plan",
            "--config",
            config.to_str().unwrap(),
            "--output",
            output.to_str().unwrap(),
        ])
        .unwrap();

        let trials: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        let trials = trials.as_array().unwrap();
        assert_eq!(trials.len(), 4);
        for trial in trials {
            assert_eq!(
                trial["config"]["trainer"]["learning_rate"],
                trial["parameters"]["trainer.learning_rate"]
            );
            assert_eq!(
                trial["config"]["input_features"][0]["cell_type"],
                trial["parameters"]["title.cell_type"]
            );
        }
    }
}

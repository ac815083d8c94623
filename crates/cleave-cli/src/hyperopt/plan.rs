use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use cleave_common::spec::ModelConfig;
use cleave_hyperopt::{HyperoptConfig, SerialExecutor};
use log::info;

pub(crate) struct HyperoptPlanOptions {
    pub model_config: PathBuf,
    pub output: Option<PathBuf>,
}

pub(crate) fn run_hyperopt_plan(
    options: HyperoptPlanOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let model_config =
        ModelConfig::from_json_str(&std::fs::read_to_string(&options.model_config)?)?;
    let executor = SerialExecutor::new(HyperoptConfig::from_model_config(&model_config)?);
    let trials = executor.plan(&model_config)?;
    info!(
        "Planned {} trials to {} {} of {}",
        trials.len(),
        executor.config().goal,
        executor.config().metric,
        executor.config().output_feature
    );

    let mut writer: Box<dyn Write> = match &options.output {
        Some(path) => Box::new(BufWriter::new(File::create(path)?)),
        None => Box::new(std::io::stdout().lock()),
    };
    serde_json::to_writer_pretty(&mut writer, &trials)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

use std::path::PathBuf;

use cleave_common::config::{AppConfig, EngineKind};
use cleave_common::spec::ModelConfig;
use cleave_data::io::{read_csv, write_csv};
use cleave_data::Backend;
use cleave_split::{resolve_splitter, split_with_splitter, SplitterRegistry};
use log::info;

const CSV_BATCH_SIZE: usize = 8192;

pub(crate) struct SplitOptions {
    pub dataset: PathBuf,
    pub model_config: PathBuf,
    pub output_dir: PathBuf,
    pub seed: Option<u64>,
    pub partitions: Option<usize>,
}

fn backend(
    config: &AppConfig,
    partitions: Option<usize>,
) -> Result<Backend, Box<dyn std::error::Error>> {
    let backend = match (partitions, config.engine.kind) {
        (Some(n), _) => Backend::partitioned(n)?,
        (None, EngineKind::Partitioned) => Backend::partitioned(config.engine.num_partitions)?,
        (None, EngineKind::Local) => Backend::local(),
    };
    Ok(backend)
}

pub(crate) fn run_split(
    config: &AppConfig,
    options: SplitOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let model_config =
        ModelConfig::from_json_str(&std::fs::read_to_string(&options.model_config)?)?;
    let backend = backend(config, options.partitions)?;
    let registry = SplitterRegistry::builtin().with_default(config.split.default_type.as_str())?;
    let seed = options.seed.unwrap_or(config.split.random_seed);

    let df = read_csv(&options.dataset, CSV_BATCH_SIZE)?;
    let df = backend
        .df_engine()
        .from_batches(df.schema(), df.into_partitions())?;
    info!(
        "Splitting {} rows from {} with the {} engine",
        df.num_rows(),
        options.dataset.display(),
        backend.df_engine().name()
    );
    let splitter = resolve_splitter(&df, &model_config.preprocessing, &registry)?;
    let splits = split_with_splitter(&df, &model_config, splitter.as_ref(), &backend, seed)?;

    std::fs::create_dir_all(&options.output_dir)?;
    for (fold, split) in splits.iter() {
        if !splitter.has_split(fold) {
            continue;
        }
        let path = options.output_dir.join(format!("{fold}.csv"));
        write_csv(&path, split)?;
        info!("Wrote {} {fold} rows to {}", split.num_rows(), path.display());
    }
    Ok(())
}

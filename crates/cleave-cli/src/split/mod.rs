mod run;

pub(crate) use run::{run_split, SplitOptions};

mod plan;

pub(crate) use plan::{run_hyperopt_plan, HyperoptPlanOptions};

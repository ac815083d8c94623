mod hyperopt;
pub mod runner;
mod split;

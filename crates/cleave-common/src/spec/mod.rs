mod feature;
mod fold;

pub use feature::*;
pub use fold::*;

mod catalog;
mod validation;

pub use catalog::{ModelCatalog, ModelInfo, DEFAULT_MODEL};
pub use validation::{ModelCheck, ModelValidator};

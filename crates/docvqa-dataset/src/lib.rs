mod dataset;
mod prepare;

pub use dataset::{DatasetDirectory, DEFAULT_MANIFEST, SUPPORTED_EXTENSIONS};
pub use prepare::prepare_dataset;

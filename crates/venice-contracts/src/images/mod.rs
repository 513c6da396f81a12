mod record;
mod registry;

pub use record::{ImageDraft, ImageRecord};
pub use registry::{ImageStore, InMemoryImageRegistry};

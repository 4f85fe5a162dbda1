use crate::document::DocumentDescriptor;
use crate::error::Result;

pub type DocumentStream = Box<dyn Iterator<Item = Result<DocumentDescriptor>> + Send>;

/// Produces the documents of a run in a stable order.
///
/// `documents` fails up front (e.g. `NotFound`) when the backing data cannot
/// be opened; entries that fail to decode are yielded as `Err` items.
pub trait DocumentSource: Send + Sync {
    fn documents(&self) -> Result<DocumentStream>;
}

impl DocumentSource for Vec<DocumentDescriptor> {
    fn documents(&self) -> Result<DocumentStream> {
        Ok(Box::new(self.clone().into_iter().map(Ok)))
    }
}

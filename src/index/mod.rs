//! Index module - lifecycle management for named document indexes

mod handle;
mod manager;
mod meta;
mod state;

pub use handle::{
    ActiveIndex, DocumentAddResult, IndexHandle, IndexStatus, IndexedChunk, NewDocument,
};
pub use manager::{validate_index_name, IndexManager};
pub use meta::{IndexMeta, IndexSettings};
pub use state::IndexState;

pub mod discovery;
pub mod filter;
pub mod memory;
pub mod persistence;
pub mod slot;
pub mod sort;
pub mod store;
pub mod view;

pub use filter::Filter;
pub use memory::MemoryStorage;
pub use persistence::FileStorage;
pub use slot::Slot;
pub use sort::SortKey;
pub use store::{CollectionStore, ImportReport};
pub use view::View;

//! Record types for the collections the store is used with.
//!
//! [`Document`] is schemaless and backs the CLI; [`Task`], [`Product`] and
//! [`CartLine`] are typed records with their own helpers on
//! [`CollectionStore`](crate::engine::CollectionStore).

pub mod cart;
pub mod document;
pub mod product;
pub mod task;

pub use cart::{CartLine, CartTotals};
pub use document::{Document, DocumentId};
pub use product::{sample_catalog, Product};
pub use task::{now_millis, sample_tasks, Priority, Task, TaskStatus, TodoStats};

//! Object-store client port.
//!
//! The platform's object store is an external collaborator; the controller
//! only ever talks to it through the [`Store`] trait. All durable state lives
//! there: workflow resources, the container runs they own, and the opaque
//! resources materialised by external connectors. The controller itself holds
//! no private persistent state.
//!
//! [`MemoryStore`] is the in-process implementation used by tests and by the
//! demo binary.

mod error;
mod memory;
mod store;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use store::Store;

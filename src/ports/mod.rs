pub mod storage;

pub use storage::{ObjectListing, ObjectStoreClient};

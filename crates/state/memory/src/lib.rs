mod store;

pub use store::MemoryLockStore;

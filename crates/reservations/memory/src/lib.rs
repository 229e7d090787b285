mod store;

pub use store::MemoryReservationStore;

pub mod checkpoint_store;
pub mod session_store;

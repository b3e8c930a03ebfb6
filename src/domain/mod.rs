pub mod posting;
pub mod session;

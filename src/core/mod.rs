pub mod detection;
pub mod error;
pub mod notification;
pub mod species;

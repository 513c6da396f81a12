pub mod events;
pub mod images;
pub mod models;
pub mod tools;

// Row generation, comparable encoding, data file storage, and error modeling.
pub mod config;
pub mod datum;
pub mod error;
pub mod generator;
pub mod row;
pub mod store;

pub mod mirror;
pub mod repository;
pub mod sqlite;

//! Domain model: value objects, aggregates and refresh notices
pub mod aggregates;
pub mod events;
pub mod value_objects;

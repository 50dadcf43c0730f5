pub mod api;
pub mod record;
pub mod roster;
pub mod store;
pub mod submission;
pub mod summary;

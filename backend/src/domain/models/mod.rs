pub mod child;
pub mod growth_record;
pub mod user;

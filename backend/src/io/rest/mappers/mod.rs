pub mod child_mapper;
pub mod growth_mapper;
pub mod user_mapper;

pub use child_mapper::ChildMapper;
pub use growth_mapper::GrowthMapper;
pub use user_mapper::UserMapper;

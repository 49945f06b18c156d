pub mod child_repository;
pub mod growth_record_repository;
pub mod token_repository;
pub mod user_repository;

pub use child_repository::ChildRepository;
pub use growth_record_repository::GrowthRecordRepository;
pub use token_repository::TokenRepository;
pub use user_repository::UserRepository;

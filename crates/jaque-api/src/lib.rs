pub mod error;
pub mod export;
pub mod import;
pub mod mapper;
pub mod moves;
pub mod users;

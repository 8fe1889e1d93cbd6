pub mod context;
pub mod jwt;

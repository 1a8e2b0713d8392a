//! 가격 저장소.

pub mod postgres;

pub use postgres::PgPriceStore;

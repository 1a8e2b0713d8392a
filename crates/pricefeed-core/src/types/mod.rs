//! 수집 파이프라인 전반에서 사용되는 공통 타입.

mod decimal;
mod quote;
mod symbol;

pub use decimal::*;
pub use quote::*;
pub use symbol::*;

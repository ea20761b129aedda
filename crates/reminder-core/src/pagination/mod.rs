pub mod engine;
pub mod page;

pub use engine::PaginationEngine;
pub use page::{PageResult, NO_CURSOR};

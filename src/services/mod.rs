pub mod interaction;
pub mod query;
pub mod store;
pub mod vote;

// 重新导出常用类型
pub use interaction::{InteractionError, InteractionService};
pub use query::InteractionQueryService;
pub use store::{InteractionStore, MemoryInteractionStore, StoreError, SurrealInteractionStore};

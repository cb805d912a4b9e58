//! Query services: one per entity, each owning that entity's reads, writes,
//! and referential-integrity checks. Dependencies (pool, cache) are injected
//! at construction; services are cheap to clone and share the process-wide
//! pool and cache client.

mod accounts;
mod categories;
mod goals;
mod integrity;
mod reports;
mod transactions;
mod users;

pub use accounts::AccountService;
pub use categories::CategoryService;
pub use goals::GoalService;
pub use reports::ReportService;
pub use transactions::TransactionService;
pub use users::UserService;

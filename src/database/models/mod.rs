pub mod account;
pub mod category;
pub mod goal;
pub mod report;
pub mod transaction;
pub mod user;

pub use account::{Account, NewAccount, UpdateAccount};
pub use category::{Category, CategoryKind, NewCategory, UpdateCategory};
pub use goal::{FinancialGoal, GoalProgress, NewFinancialGoal, UpdateFinancialGoal};
pub use report::{CategoryExpense, Report, ReportContent};
pub use transaction::{IncomeExpenseSummary, NewTransaction, Transaction, TransactionKind};
pub use user::{NewUser, UpdateUser, User};

use std::path::Path;

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Pool, Sqlite};

use finance_service::cache::{CacheStore, MemoryCache};
use finance_service::database::db::migrate::run_migrations;
use finance_service::database::models::{
    CategoryKind, NewAccount, NewCategory, NewFinancialGoal, NewTransaction, NewUser,
    ReportContent, TransactionKind, UpdateUser,
};
use finance_service::error::ServiceError;
use finance_service::services::{
    AccountService, CategoryService, GoalService, ReportService, TransactionService, UserService,
};

/// In-memory database with the ledger bootstrapped and the real schema
/// scripts applied. A single connection keeps every query on the same
/// in-memory instance.
async fn setup_pool() -> Pool<Sqlite> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("in-memory pool");
    sqlx::query(
        "CREATE TABLE migrations (
            migration_name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        )",
    )
    .execute(&pool)
    .await
    .expect("create ledger");
    run_migrations(&pool, Path::new("migrations"))
        .await
        .expect("apply schema");
    pool
}

async fn seed_base(pool: &Pool<Sqlite>) -> (i64, i64, i64) {
    let user = UserService::new(pool.clone())
        .create(NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "hash".into(),
            preferred_currency: "USD".into(),
        })
        .await
        .expect("create user");
    let account = AccountService::new(pool.clone())
        .create(NewAccount {
            user_id: user.id,
            name: "Checking".into(),
            balance: Decimal::new(10000, 2),
            currency: "USD".into(),
            kind: "debit".into(),
        })
        .await
        .expect("create account");
    let category = CategoryService::new(pool.clone())
        .create(NewCategory {
            user_id: user.id,
            name: "Groceries".into(),
            kind: CategoryKind::Expense,
        })
        .await
        .expect("create category");
    (user.id, account.id, category.id)
}

fn transaction_service(pool: &Pool<Sqlite>) -> TransactionService {
    TransactionService::new(pool.clone(), CacheStore::new(MemoryCache::new(64)))
}

fn expense(user_id: i64, account_id: i64, category_id: i64, cents: i64) -> NewTransaction {
    NewTransaction {
        user_id,
        account_id,
        category_id,
        amount: Decimal::new(cents, 2),
        kind: TransactionKind::Expense,
        currency: "USD".into(),
        description: Some("weekly shop".into()),
    }
}

#[tokio::test]
async fn user_crud_roundtrip() {
    let pool = setup_pool().await;
    let users = UserService::new(pool.clone());

    let created = users
        .create(NewUser {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password_hash: "hash".into(),
            preferred_currency: "USD".into(),
        })
        .await
        .expect("create");

    let updated = users
        .update(
            created.id,
            UpdateUser {
                name: "Ada L".into(),
                email: "ada.l@example.com".into(),
                preferred_currency: "CAD".into(),
            },
        )
        .await
        .expect("update");
    assert_eq!(updated.email, "ada.l@example.com");
    assert_eq!(updated.preferred_currency, "CAD");

    users.delete(created.id).await.expect("delete");
    let err = users.get_by_id(created.id).await.expect_err("gone");
    assert!(matches!(err, ServiceError::NotFound("user")));
}

#[tokio::test]
async fn account_create_requires_an_existing_user() {
    let pool = setup_pool().await;
    let err = AccountService::new(pool.clone())
        .create(NewAccount {
            user_id: 999,
            name: "Orphan".into(),
            balance: Decimal::ZERO,
            currency: "USD".into(),
            kind: "debit".into(),
        })
        .await
        .expect_err("no such user");
    assert!(matches!(err, ServiceError::Reference("user")));
}

#[tokio::test]
async fn transaction_create_rejects_a_missing_account_without_writing() {
    let pool = setup_pool().await;
    let (user_id, account_id, category_id) = seed_base(&pool).await;
    let transactions = transaction_service(&pool);

    let err = transactions
        .create(expense(user_id, account_id + 100, category_id, 2500))
        .await
        .expect_err("missing account");
    assert!(matches!(err, ServiceError::Reference("account")));

    let rows: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM transactions")
        .fetch_one(&pool)
        .await
        .expect("count");
    assert_eq!(rows, 0);
}

#[tokio::test]
async fn transaction_create_rejects_a_nonpositive_amount() {
    let pool = setup_pool().await;
    let (user_id, account_id, category_id) = seed_base(&pool).await;
    let transactions = transaction_service(&pool);

    let err = transactions
        .create(expense(user_id, account_id, category_id, 0))
        .await
        .expect_err("zero amount");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn transaction_create_and_get_roundtrip() {
    let pool = setup_pool().await;
    let (user_id, account_id, category_id) = seed_base(&pool).await;
    let transactions = transaction_service(&pool);

    let created = transactions
        .create(expense(user_id, account_id, category_id, 2500))
        .await
        .expect("create");
    let fetched = transactions.get_by_id(created.id).await.expect("get");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.amount, Decimal::new(2500, 2));
    assert_eq!(fetched.kind, TransactionKind::Expense);
    assert_eq!(fetched.description.as_deref(), Some("weekly shop"));
}

#[tokio::test]
async fn transaction_update_rejects_a_missing_category() {
    let pool = setup_pool().await;
    let (user_id, account_id, category_id) = seed_base(&pool).await;
    let transactions = transaction_service(&pool);

    let created = transactions
        .create(expense(user_id, account_id, category_id, 2500))
        .await
        .expect("create");

    let err = transactions
        .update(created.id, expense(user_id, account_id, category_id + 100, 2500))
        .await
        .expect_err("missing category");
    assert!(matches!(err, ServiceError::Reference("category")));

    // Row untouched by the failed update.
    let fetched = transactions.get_by_id(created.id).await.expect("get");
    assert_eq!(fetched.category_id, category_id);
}

#[tokio::test]
async fn cached_listing_reflects_writes() {
    let pool = setup_pool().await;
    let (user_id, account_id, category_id) = seed_base(&pool).await;
    let transactions = transaction_service(&pool);

    transactions
        .create(expense(user_id, account_id, category_id, 2500))
        .await
        .expect("first create");
    let listed = transactions.list_by_user(user_id).await.expect("list");
    assert_eq!(listed.len(), 1);

    // The create invalidates the freshly populated listing, so the next read
    // sees the new row instead of the cached one.
    transactions
        .create(expense(user_id, account_id, category_id, 1200))
        .await
        .expect("second create");
    let listed = transactions.list_by_user(user_id).await.expect("relist");
    assert_eq!(listed.len(), 2);

    let by_account = transactions
        .list_by_account(account_id)
        .await
        .expect("by account");
    assert_eq!(by_account.len(), 2);
    let by_category = transactions
        .list_by_category(category_id)
        .await
        .expect("by category");
    assert_eq!(by_category.len(), 2);
}

#[tokio::test]
async fn income_and_expense_totals_are_grouped_by_kind() {
    let pool = setup_pool().await;
    let (user_id, account_id, category_id) = seed_base(&pool).await;
    let salary = CategoryService::new(pool.clone())
        .create(NewCategory {
            user_id,
            name: "Salary".into(),
            kind: CategoryKind::Income,
        })
        .await
        .expect("income category");
    let transactions = transaction_service(&pool);

    transactions
        .create(expense(user_id, account_id, category_id, 2500))
        .await
        .expect("expense");
    transactions
        .create(NewTransaction {
            user_id,
            account_id,
            category_id: salary.id,
            amount: Decimal::new(400000, 2),
            kind: TransactionKind::Income,
            currency: "USD".into(),
            description: None,
        })
        .await
        .expect("income");

    let summary = transactions
        .compare_income_and_expenses(user_id)
        .await
        .expect("summary");
    assert!((summary.income - 4000.0).abs() < 1e-9);
    assert!((summary.expense - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn deleting_a_missing_transaction_is_not_found() {
    let pool = setup_pool().await;
    let transactions = transaction_service(&pool);
    let err = transactions.delete(9999).await.expect_err("missing row");
    assert!(matches!(err, ServiceError::NotFound("transaction")));
}

#[tokio::test]
async fn goal_progress_is_computed_from_amounts() {
    let pool = setup_pool().await;
    let (user_id, _, _) = seed_base(&pool).await;
    let goals = GoalService::new(pool.clone());
    let deadline = Utc::now()
        .date_naive()
        .checked_add_days(chrono::Days::new(30))
        .expect("deadline");

    goals
        .create(NewFinancialGoal {
            user_id,
            name: "Emergency fund".into(),
            target_amount: Decimal::new(20000, 2),
            saved_amount: Decimal::new(5000, 2),
            deadline,
            priority: 1,
            description: None,
        })
        .await
        .expect("create goal");

    let progress = goals.progress(user_id).await.expect("progress");
    assert_eq!(progress.len(), 1);
    assert!((progress[0].progress - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn summary_report_is_generated_once_and_then_served_from_storage() {
    let pool = setup_pool().await;
    let (user_id, account_id, category_id) = seed_base(&pool).await;
    let transactions = transaction_service(&pool);
    let goals = GoalService::new(pool.clone());
    let reports = ReportService::new(pool.clone());

    transactions
        .create(expense(user_id, account_id, category_id, 2500))
        .await
        .expect("expense");
    let deadline = Utc::now()
        .date_naive()
        .checked_add_days(chrono::Days::new(30))
        .expect("deadline");
    goals
        .create(NewFinancialGoal {
            user_id,
            name: "Vacation".into(),
            target_amount: Decimal::new(10000, 2),
            saved_amount: Decimal::new(10000, 2),
            deadline,
            priority: 2,
            description: None,
        })
        .await
        .expect("completed goal");

    let first = reports.summary(user_id).await.expect("first summary");
    match &first {
        ReportContent::Summary {
            total_balance,
            total_expenses_this_month,
            completed_goals,
        } => {
            assert!((total_balance - 100.0).abs() < 1e-9);
            assert!((total_expenses_this_month - 25.0).abs() < 1e-9);
            assert_eq!(*completed_goals, 1);
        }
    }

    // A later write does not change the stored report.
    transactions
        .create(expense(user_id, account_id, category_id, 9900))
        .await
        .expect("later expense");
    let second = reports.summary(user_id).await.expect("second summary");
    assert_eq!(second, first);
}

#[tokio::test]
async fn stored_reports_are_listed() {
    let pool = setup_pool().await;
    let (user_id, _, _) = seed_base(&pool).await;
    let reports = ReportService::new(pool.clone());

    let generated = reports.summary(user_id).await.expect("generate");
    let listed = reports.list_by_user(user_id).await.expect("list");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].report_name, "summary");
    assert_eq!(listed[0].content, generated);
}

#[tokio::test]
async fn malformed_stored_report_is_rejected() {
    let pool = setup_pool().await;
    let (user_id, _, _) = seed_base(&pool).await;
    sqlx::query(
        r#"
        INSERT INTO reports (user_id, report_name, generated_at, content)
        VALUES (?, 'summary', datetime('now'), '{"report":"unknown"}')
        "#,
    )
    .bind(user_id)
    .execute(&pool)
    .await
    .expect("seed malformed report");

    let err = ReportService::new(pool.clone())
        .summary(user_id)
        .await
        .expect_err("malformed blob");
    assert!(matches!(err, ServiceError::Validation(_)));
}

#[tokio::test]
async fn expenses_group_by_category_name_within_the_range() {
    let pool = setup_pool().await;
    let (user_id, account_id, groceries) = seed_base(&pool).await;
    let rent = CategoryService::new(pool.clone())
        .create(NewCategory {
            user_id,
            name: "Rent".into(),
            kind: CategoryKind::Expense,
        })
        .await
        .expect("rent category");
    let transactions = transaction_service(&pool);

    transactions
        .create(expense(user_id, account_id, groceries, 2500))
        .await
        .expect("groceries 1");
    transactions
        .create(expense(user_id, account_id, groceries, 1500))
        .await
        .expect("groceries 2");
    transactions
        .create(expense(user_id, account_id, rent.id, 120000))
        .await
        .expect("rent");

    let today = Utc::now().date_naive();
    let start = today.pred_opt().expect("start");
    let end = today.succ_opt().expect("end");
    let grouped = ReportService::new(pool.clone())
        .expenses_by_category(user_id, start, end)
        .await
        .expect("grouped");

    assert_eq!(grouped.len(), 2);
    assert_eq!(grouped[0].category, "Groceries");
    assert!((grouped[0].total - 40.0).abs() < 1e-9);
    assert_eq!(grouped[1].category, "Rent");
    assert!((grouped[1].total - 1200.0).abs() < 1e-9);
}

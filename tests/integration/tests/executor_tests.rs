//! Statement and transaction executor tests

use std::thread;
use std::time::Duration;

use anyhow::Result;
use brain_db::{DbError, Statement, Value, WriteOutcome};
use integration_tests::helpers::TestDb;
use integration_tests::{unique_email, unverified_account, verified_account};

#[tokio::test]
async fn write_reports_affected_rows_and_insert_rowid() -> Result<()> {
    let db = TestDb::new()?;
    let email = unique_email();
    db.seed(verified_account(&email)).await?;

    let outcome = db
        .statements
        .execute_write(
            Statement::new(
                "INSERT INTO chat_history (user_id, sender, response) VALUES (?1, 'user', 'hi')",
            )
            .bind(format!("uuid-{email}")),
        )
        .await?;

    assert_eq!(outcome.rows_affected, 1);
    assert!(outcome.last_insert_rowid > 0);
    Ok(())
}

#[tokio::test]
async fn write_matching_nothing_affects_zero_rows() -> Result<()> {
    let db = TestDb::new()?;

    let outcome = db
        .statements
        .execute_write(
            Statement::new("UPDATE chat_users SET is_verified = 1 WHERE email = ?1")
                .bind("nobody@example.com".to_string()),
        )
        .await?;

    assert_eq!(outcome.rows_affected, 0);
    Ok(())
}

#[tokio::test]
async fn reads_return_empty_results_not_errors() -> Result<()> {
    let db = TestDb::new()?;

    let row = db
        .statements
        .fetch_optional(
            Statement::new("SELECT * FROM chat_users WHERE email = ?1")
                .bind("nobody@example.com".to_string()),
        )
        .await?;
    assert!(row.is_none());

    let rows = db
        .statements
        .fetch_all(Statement::new("SELECT * FROM chat_users"))
        .await?;
    assert!(rows.is_empty());
    Ok(())
}

#[tokio::test]
async fn reads_produce_dictionary_rows() -> Result<()> {
    let db = TestDb::new()?;
    let email = unique_email();
    db.seed(verified_account(&email)).await?;

    let row = db
        .statements
        .fetch_optional(
            Statement::new("SELECT email, is_verified FROM chat_users WHERE email = ?1")
                .bind(email.clone()),
        )
        .await?
        .expect("seeded account missing");

    assert_eq!(row.get("email"), Some(&Value::Text(email)));
    assert_eq!(row.get("is_verified"), Some(&Value::Integer(1)));
    Ok(())
}

#[tokio::test]
async fn malformed_sql_is_a_query_error() -> Result<()> {
    let db = TestDb::new()?;

    let err = db
        .statements
        .execute_write(Statement::new("DELETE FROM no_such_table"))
        .await
        .unwrap_err();
    assert!(matches!(err, DbError::Query(_)));

    // The connection is still released and usable
    let rows = db
        .statements
        .fetch_all(Statement::new("SELECT * FROM chat_users"))
        .await?;
    assert!(rows.is_empty());
    Ok(())
}

#[tokio::test]
async fn concurrent_verification_attempts_have_one_winner() -> Result<()> {
    let db = TestDb::new()?;
    let email = unique_email();
    db.seed(unverified_account(&email, "2099-01-01 00:00:00")).await?;

    async fn activate(db: &TestDb, email: &str) -> Result<WriteOutcome, DbError> {
        db.statements
            .execute_write(
                Statement::new(
                    "UPDATE chat_users \
                     SET is_verified = 1, verification_token = NULL, verification_expiration = NULL \
                     WHERE verification_token = ?1 AND email = ?2",
                )
                .bind(format!("verify-{email}"))
                .bind(email.to_string()),
            )
            .await
    }

    let (first, second) = tokio::join!(activate(&db, &email), activate(&db, &email));
    let affected = first?.rows_affected + second?.rows_affected;

    // Exactly one attempt clears the token; the other finds zero matches
    assert_eq!(affected, 1);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn cancelled_caller_leaves_pool_and_data_consistent() -> Result<()> {
    let db = TestDb::with_max_connections(1)?;
    let email = unique_email();

    let pool = db.pool.clone();
    let bridge = db.bridge.clone();
    let insert_email = email.clone();
    let slow_write = tokio::spawn(async move {
        bridge
            .run(move || {
                let conn = pool.acquire()?;
                // In-flight blocking work cannot be interrupted mid-statement
                thread::sleep(Duration::from_millis(150));
                conn.execute(
                    "INSERT INTO chat_users (user_uuid, email, password_hash, is_verified) \
                     VALUES (?1, ?2, 'hash', 1)",
                    [format!("uuid-{insert_email}"), insert_email],
                )
                .map_err(|e| DbError::Query(e.to_string()))?;
                Ok(())
            })
            .await
    });

    tokio::time::sleep(Duration::from_millis(30)).await;
    slow_write.abort();
    tokio::time::sleep(Duration::from_millis(300)).await;

    // The job ran to completion despite the cancelled caller
    assert_eq!(
        db.count("SELECT COUNT(*) AS n FROM chat_users").await?,
        1
    );
    assert_eq!(db.pool.open_connections(), 1);
    assert_eq!(db.pool.idle_connections(), 1);
    Ok(())
}

#[tokio::test]
async fn transaction_commits_all_statements_in_order() -> Result<()> {
    let db = TestDb::new()?;
    let emails: Vec<String> = (0..3).map(|_| unique_email()).collect();

    let outcomes = db
        .transactions
        .run(emails.iter().map(|e| verified_account(e)).collect())
        .await?;

    assert_eq!(outcomes.len(), 3);
    for (i, outcome) in outcomes.iter().enumerate() {
        assert_eq!(outcome.index, i);
        assert_eq!(outcome.rows_affected, 1);
    }
    assert_eq!(db.count("SELECT COUNT(*) AS n FROM chat_users").await?, 3);
    Ok(())
}

#[tokio::test]
async fn failing_statement_rolls_back_the_whole_batch() -> Result<()> {
    let db = TestDb::new()?;
    let email = unique_email();
    let other = unique_email();

    let err = db
        .transactions
        .run(vec![
            verified_account(&email),
            // Duplicate email violates the unique constraint
            verified_account(&email),
            verified_account(&other),
        ])
        .await
        .unwrap_err();

    assert_eq!(err.failing_index(), Some(1));
    assert!(matches!(err, DbError::Transaction { .. }));

    // The first statement's insert was rolled back too
    assert_eq!(db.count("SELECT COUNT(*) AS n FROM chat_users").await?, 0);
    Ok(())
}

#[tokio::test]
async fn empty_batch_is_a_successful_noop() -> Result<()> {
    let db = TestDb::new()?;

    let open_before = db.pool.open_connections();
    let outcomes = db.transactions.run(Vec::new()).await?;
    assert!(outcomes.is_empty());

    // The no-op never checked anything out of the pool
    assert_eq!(db.pool.open_connections(), open_before);
    assert_eq!(db.pool.idle_connections(), open_before as usize);
    Ok(())
}

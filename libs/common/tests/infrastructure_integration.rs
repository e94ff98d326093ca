//! Integration tests for the infrastructure components
//!
//! These tests verify that the PostgreSQL database and the Redis mail queue
//! are properly configured and accessible from the application. They need
//! running services and are ignored by default:
//!
//! ```text
//! cargo test -p common -- --ignored
//! ```

use common::{
    database::{DatabaseConfig, health_check, init_pool},
    mail::{MailKind, OutgoingMail},
    queue::{RedisConfig, RedisQueue},
};
use sqlx::Row;

/// Test that verifies both PostgreSQL and Redis are accessible
/// and can perform basic operations
#[tokio::test]
#[ignore = "requires running PostgreSQL and Redis instances"]
async fn test_infrastructure_integration() -> Result<(), Box<dyn std::error::Error>> {
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;

    assert!(health_check(&pool).await?, "Database health check failed");

    let row = sqlx::query("SELECT 1 as result").fetch_one(&pool).await?;
    let result: i32 = row.get("result");
    assert_eq!(result, 1, "PostgreSQL simple query test failed");

    let redis_config = RedisConfig {
        queue_key: format!("integration_test_queue:{}", uuid::Uuid::new_v4()),
        ..RedisConfig::from_env()
    };
    let queue = RedisQueue::new(&redis_config)?;

    assert!(queue.health_check().await?, "Redis health check failed");

    let mail = OutgoingMail::new(
        MailKind::Activation,
        "alice@example.com",
        "noreply@localhost",
        "Activate your account",
        "Follow the link",
    );
    queue.push(&mail).await?;

    assert_eq!(queue.pop(1).await?, Some(mail), "Redis push/pop test failed");
    assert_eq!(queue.pop(1).await?, None, "Queue should be drained");

    Ok(())
}

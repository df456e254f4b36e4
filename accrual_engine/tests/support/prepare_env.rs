use accrual_engine::{db_types::NewUser, OrderManagement, SqliteDatabase};
use log::*;

/// Creates a fresh SQLite database with a random name in the temp directory, and brings its schema up to date.
pub async fn prepare_test_env() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_url();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating connection to database");
    db.run_migrations().await.expect("Error running DB migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub fn random_db_url() -> String {
    let path = std::env::temp_dir().join(format!("accrual_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

pub async fn new_user(db: &SqliteDatabase, login: &str) -> i64 {
    db.create_user(NewUser::new(login, "not-a-real-hash")).await.expect("Error creating user").id
}

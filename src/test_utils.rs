#[cfg(test)]
pub mod test_utils {
    use std::sync::Arc;
    use std::time::Duration;

    use crate::router::create_router;
    use crate::schemas::AppState;
    use access::{BcryptHasher, PasswordHasher};
    use axum::Router;
    use chrono::Utc;
    use migration::{Migrator, MigratorTrait};
    use model::entities::{role, user};
    use sea_orm::{
        ActiveModelTrait, ColumnTrait, Database, DatabaseConnection, EntityTrait, QueryFilter, Set,
    };
    use tracing::Level;
    use tracing_subscriber::FmtSubscriber;

    pub const TEST_PASSWORD: &str = "Passw0rdX";

    /// Identity headers of a seeded account.
    #[derive(Debug, Clone, Copy)]
    pub struct TestActor {
        pub user_id: i32,
        pub role_id: i32,
    }

    impl TestActor {
        pub fn user_header(&self) -> String {
            self.user_id.to_string()
        }

        pub fn role_header(&self) -> String {
            self.role_id.to_string()
        }
    }

    /// Accounts seeded into every test database.
    #[derive(Debug, Clone, Copy)]
    pub struct Seeded {
        pub super_admin: TestActor,
        pub sub_admin: TestActor,
        pub student: TestActor,
        pub student_role_id: i32,
        pub super_admin_role_id: i32,
    }

    /// Create an in-memory SQLite database for testing
    pub async fn setup_test_db() -> DatabaseConnection {
        let db = Database::connect("sqlite::memory:")
            .await
            .expect("Failed to connect to in-memory database");

        // Run migrations
        Migrator::up(&db, None)
            .await
            .expect("Failed to run migrations");

        db
    }

    async fn role_id(db: &DatabaseConnection, name: &str) -> i32 {
        role::Entity::find()
            .filter(role::Column::RoleName.eq(name))
            .one(db)
            .await
            .expect("Failed to query roles")
            .unwrap_or_else(|| panic!("Role {name} should be seeded"))
            .role_id
    }

    async fn seed_user(
        db: &DatabaseConnection,
        hasher: &dyn PasswordHasher,
        username: &str,
        role_id: i32,
    ) -> TestActor {
        let now = Utc::now();
        let created = user::ActiveModel {
            username: Set(username.to_string()),
            email: Set(format!("{username}@learnhub.test")),
            password_hash: Set(hasher.hash(TEST_PASSWORD).expect("Failed to hash password")),
            role_id: Set(role_id),
            status: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .expect("Failed to create test user");

        TestActor {
            user_id: created.user_id,
            role_id,
        }
    }

    /// Create AppState for testing, with one account per builtin role
    pub async fn setup_test_app_state() -> (AppState, Seeded) {
        let db = setup_test_db().await;
        // Lowest bcrypt cost keeps the tests fast.
        let hasher = BcryptHasher::new(4);

        let super_admin_role_id = role_id(&db, "SUPER_ADMIN").await;
        let sub_admin_role_id = role_id(&db, "SUB_ADMIN").await;
        let student_role_id = role_id(&db, "STUDENT").await;

        let seeded = Seeded {
            super_admin: seed_user(&db, &hasher, "root", super_admin_role_id).await,
            sub_admin: seed_user(&db, &hasher, "subby", sub_admin_role_id).await,
            student: seed_user(&db, &hasher, "learner", student_role_id).await,
            student_role_id,
            super_admin_role_id,
        };

        let state = AppState {
            db,
            hasher: Arc::new(hasher),
        };
        (state, seeded)
    }

    /// Initialize tracing for tests with output to STDERR.
    ///
    /// The log level is determined by the RUST_LOG environment variable,
    /// defaulting to WARN if not set.
    fn init_test_tracing() -> tracing::subscriber::DefaultGuard {
        let log_level = std::env::var("RUST_LOG")
            .ok()
            .and_then(|level| match level.to_uppercase().as_str() {
                "ERROR" => Some(Level::ERROR),
                "WARN" => Some(Level::WARN),
                "INFO" => Some(Level::INFO),
                "DEBUG" => Some(Level::DEBUG),
                "TRACE" => Some(Level::TRACE),
                _ => None,
            })
            .unwrap_or(Level::WARN);

        let subscriber = FmtSubscriber::builder()
            .with_max_level(log_level)
            .with_writer(std::io::stderr)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    /// Create axum app for testing
    pub async fn setup_test_app() -> (Router, Seeded, tracing::subscriber::DefaultGuard) {
        let guard = init_test_tracing();
        let (state, seeded) = setup_test_app_state().await;
        let router = create_router(state, Duration::from_secs(30));
        (router, seeded, guard)
    }
}

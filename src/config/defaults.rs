pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: i64 = 8080;
pub const DEFAULT_RUST_LOG: &str = "info,tower_http=info";
pub const DEFAULT_DATABASE_URL: &str = "sqlite://./data/todos.db";
pub const DEFAULT_DB_MAX_CONNECTIONS: i64 = 10;
pub const DEFAULT_DB_MIN_IDLE: i64 = 1;
pub const DEFAULT_CORS_ORIGIN: &str = "http://localhost:3000";

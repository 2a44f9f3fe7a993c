use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};

/// Key for the cached course catalog list.
pub const ALL_COURSES_KEY: &str = "all_courses";

/// Thin wrapper around the Redis connection manager. Holds two kinds of
/// entries: user sessions keyed by user id hex, and course previews keyed by
/// course id hex (plus the `all_courses` list). Entries are written with
/// plain SET so a repopulation overwrites in one step instead of opening a
/// delete-then-set window for concurrent readers.
#[derive(Clone)]
pub struct RedisCache {
    conn: ConnectionManager,
}

impl RedisCache {
    pub async fn new(url: &str) -> Result<Self, redis::RedisError> {
        let client = Client::open(url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }

    pub async fn get(&self, key: &str) -> Result<Option<String>, redis::RedisError> {
        let mut conn = self.conn.clone();
        conn.get(key).await
    }

    pub async fn set(&self, key: &str, value: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(key, value).await
    }

    pub async fn del(&self, key: &str) -> Result<(), redis::RedisError> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(key).await
    }
}

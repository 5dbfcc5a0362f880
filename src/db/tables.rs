use redb::TableDefinition;

/// Movies collection: movie id (64-char hex) -> MovieRecord (serialized)
pub const MOVIES: TableDefinition<&str, &[u8]> = TableDefinition::new("movies");

/// Metadata collection: singleton key "movieCount" -> CounterRecord (serialized)
pub const METADATA: TableDefinition<&str, &[u8]> = TableDefinition::new("metadata");

/// Accounts table: email (lowercase) -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Sessions table: token hash -> SessionRecord (serialized)
pub const SESSIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("sessions");

/// Key of the movie counter singleton inside METADATA
pub const MOVIE_COUNT_KEY: &str = "movieCount";

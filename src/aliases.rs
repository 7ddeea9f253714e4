use diesel_async::{AsyncPgConnection, pooled_connection::bb8::Pool};

pub type DbPool = Pool<AsyncPgConnection>;

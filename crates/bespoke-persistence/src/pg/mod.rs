//! `KeyValueStore` sobre Postgres.
//!
//! Cada operación es una única sentencia SQL (atómica por sí misma); no se
//! abren transacciones entre claves, igual que en el backend en memoria.
//!
//! - strings: `kv_strings` con upsert / `ON CONFLICT DO NOTHING`.
//! - hashes: `kv_hash_fields` con PK compuesta `(key, field)`.
//! - listas: `kv_list_items` ordenadas por `id` (BIGSERIAL); `lpop` borra la
//!   fila más antigua con `FOR UPDATE SKIP LOCKED` para que dos procesos no
//!   saquen el mismo elemento.
//!
//! Errores transitorios (pool, serialización) se reintentan con backoff.

use bespoke_core::store::StoreResult;
use bespoke_core::{KeyValueStore, StoreError};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use diesel::sql_types::Text;
use log::{info, warn};
use std::collections::BTreeMap;

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{kv_hash_fields, kv_list_items, kv_strings};

/// Pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones (pool real o doble de test).
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

pub(crate) fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict | PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Hasta 3 reintentos con backoff de 15ms, 30ms, 45ms.
pub(crate) fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms", attempts + 1, e, delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

#[derive(QueryableByName, Debug)]
struct ValueRow {
    #[diesel(sql_type = Text)]
    value: String,
}

const INCR_SQL: &str = "INSERT INTO kv_strings (key, value) VALUES ($1, '1') \
                        ON CONFLICT (key) DO UPDATE SET value = ((kv_strings.value)::bigint + 1)::text \
                        RETURNING value";

const LPOP_SQL: &str = "DELETE FROM kv_list_items WHERE id = (\
                        SELECT id FROM kv_list_items WHERE key = $1 ORDER BY id LIMIT 1 FOR UPDATE SKIP LOCKED\
                        ) RETURNING value";

pub struct PgKeyValueStore<P: ConnectionProvider> {
    provider: P,
}

impl PgKeyValueStore<PoolProvider> {
    pub fn from_pool(pool: PgPool) -> Self {
        Self { provider: PoolProvider { pool } }
    }
}

impl<P: ConnectionProvider> PgKeyValueStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn run<T, F>(&self, mut op: F) -> StoreResult<T>
        where F: FnMut(&mut PgConnection) -> QueryResult<T>
    {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            op(&mut conn).map_err(PersistenceError::from)
        }).map_err(StoreError::from)
    }
}

impl<P: ConnectionProvider> KeyValueStore for PgKeyValueStore<P> {
    fn get(&self, key: &str) -> StoreResult<Option<String>> {
        self.run(|conn| {
                kv_strings::table.find(key)
                                 .select(kv_strings::value)
                                 .first::<String>(conn)
                                 .optional()
            })
    }

    fn set(&self, key: &str, value: &str) -> StoreResult<()> {
        self.run(|conn| {
                diesel::insert_into(kv_strings::table).values((kv_strings::key.eq(key), kv_strings::value.eq(value)))
                                                      .on_conflict(kv_strings::key)
                                                      .do_update()
                                                      .set(kv_strings::value.eq(value))
                                                      .execute(conn)
                                                      .map(|_| ())
            })
    }

    fn set_if_absent(&self, key: &str, value: &str) -> StoreResult<bool> {
        self.run(|conn| {
                diesel::insert_into(kv_strings::table).values((kv_strings::key.eq(key), kv_strings::value.eq(value)))
                                                      .on_conflict_do_nothing()
                                                      .execute(conn)
                                                      .map(|rows| rows == 1)
            })
    }

    fn incr(&self, key: &str) -> StoreResult<i64> {
        let row = self.run(|conn| diesel::sql_query(INCR_SQL).bind::<Text, _>(key).get_result::<ValueRow>(conn))?;
        row.value
           .parse()
           .map_err(|_| StoreError::Codec(format!("value at {key} is not an integer")))
    }

    fn hget(&self, key: &str, field: &str) -> StoreResult<Option<String>> {
        self.run(|conn| {
                kv_hash_fields::table.filter(kv_hash_fields::key.eq(key).and(kv_hash_fields::field.eq(field)))
                                     .select(kv_hash_fields::value)
                                     .first::<String>(conn)
                                     .optional()
            })
    }

    fn hset(&self, key: &str, field: &str, value: &str) -> StoreResult<()> {
        self.run(|conn| {
                diesel::insert_into(kv_hash_fields::table).values((kv_hash_fields::key.eq(key),
                                                                   kv_hash_fields::field.eq(field),
                                                                   kv_hash_fields::value.eq(value)))
                                                          .on_conflict((kv_hash_fields::key, kv_hash_fields::field))
                                                          .do_update()
                                                          .set(kv_hash_fields::value.eq(value))
                                                          .execute(conn)
                                                          .map(|_| ())
            })
    }

    fn hset_if_absent(&self, key: &str, field: &str, value: &str) -> StoreResult<bool> {
        self.run(|conn| {
                diesel::insert_into(kv_hash_fields::table).values((kv_hash_fields::key.eq(key),
                                                                   kv_hash_fields::field.eq(field),
                                                                   kv_hash_fields::value.eq(value)))
                                                          .on_conflict_do_nothing()
                                                          .execute(conn)
                                                          .map(|rows| rows == 1)
            })
    }

    fn hgetall(&self, key: &str) -> StoreResult<BTreeMap<String, String>> {
        let rows = self.run(|conn| {
                           kv_hash_fields::table.filter(kv_hash_fields::key.eq(key))
                                                .select((kv_hash_fields::field, kv_hash_fields::value))
                                                .load::<(String, String)>(conn)
                       })?;
        Ok(rows.into_iter().collect())
    }

    fn rpush(&self, key: &str, value: &str) -> StoreResult<()> {
        self.run(|conn| {
                diesel::insert_into(kv_list_items::table).values((kv_list_items::key.eq(key), kv_list_items::value.eq(value)))
                                                         .execute(conn)
                                                         .map(|_| ())
            })
    }

    fn lpop(&self, key: &str) -> StoreResult<Option<String>> {
        let row = self.run(|conn| {
                          diesel::sql_query(LPOP_SQL).bind::<Text, _>(key)
                                                     .get_result::<ValueRow>(conn)
                                                     .optional()
                      })?;
        Ok(row.map(|r| r.value))
    }

    fn lrange_all(&self, key: &str) -> StoreResult<Vec<String>> {
        self.run(|conn| {
                kv_list_items::table.filter(kv_list_items::key.eq(key))
                                    .order(kv_list_items::id.asc())
                                    .select(kv_list_items::value)
                                    .load::<String>(conn)
            })
    }

    fn lrem(&self, key: &str, value: &str) -> StoreResult<usize> {
        self.run(|conn| {
                diesel::delete(kv_list_items::table.filter(kv_list_items::key.eq(key).and(kv_list_items::value.eq(value))))
                    .execute(conn)
            })
    }

    fn llen(&self, key: &str) -> StoreResult<usize> {
        let n = self.run(|conn| {
                        kv_list_items::table.filter(kv_list_items::key.eq(key))
                                            .count()
                                            .get_result::<i64>(conn)
                    })?;
        Ok(usize::try_from(n).unwrap_or(0))
    }

    fn close(&self) {
        info!("postgres key-value store closed");
    }
}

/// Construye el pool y ejecuta las migraciones pendientes una vez.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let max = max_size.max(1);
    let min = min_size.max(1).min(max);
    if min_size > max_size {
        warn!("min_size > max_size ({} > {}), adjusting min=max", min_size, max_size);
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(min))
                                    .max_size(max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    info!("postgres pool ready min={} max={}", min, max);
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

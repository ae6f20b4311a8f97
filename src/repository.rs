//! CRUD and list operations over typed envelopes.
//!
//! Writes are conditional: a create only succeeds when the key is free, and an update
//! only succeeds when the stored `UpdateUtcTick` still equals the one the caller read.
//! Reads go through an optional [`cache::EnvelopeCache`]. Every store failure is mapped
//! to an [`error::RepositoryError`].

use crate::{
    cache, clock, common, config,
    envelope::Envelope,
    error, query, read,
    store::{self, Store},
    write,
};

use aws_sdk_dynamodb::types;
use std::{future, marker, sync};

/// Whether a list ran to the end of the range.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ListStatus {
    /// Every matching record was returned.
    Complete,
    /// The list stopped early; resume from [`ListResult::last_evaluated_key`].
    Partial,
}

impl ListStatus {
    /// HTTP-equivalent status code: 200 or 206.
    pub fn status_code(self) -> u16 {
        match self {
            Self::Complete => 200,
            Self::Partial => 206,
        }
    }
}

/// Records returned by [`Repository::list`].
#[derive(Clone, Debug, PartialEq)]
pub struct ListResult<E> {
    /// Records in index order.
    pub items: Vec<E>,
    /// Key to resume from when the result is partial.
    pub last_evaluated_key: Option<common::Item>,
    /// Only [`ListStatus::Complete`] means the end of the range was reached.
    pub status: ListStatus,
}

impl<E> ListResult<E> {
    /// Whether the end of the range was reached.
    pub fn is_complete(&self) -> bool {
        self.status == ListStatus::Complete
    }
}

/// Single-table repository of envelopes of type `E` over store `S`.
///
/// ```rust
/// use dynamodb_envelope::{
///     config::{CallerInfo, RepositoryConfig},
///     envelope::{DataEnvelope, Entity, Envelope, EnvelopeKeys},
///     repository::Repository,
///     store::memory::MemoryStore,
/// };
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Deserialize, Serialize)]
/// struct Customer {
///     id: String,
///     name: String,
/// }
///
/// impl Entity for Customer {
///     const TYPE_NAME: &'static str = "Customer";
///
///     fn keys(&self) -> EnvelopeKeys {
///         EnvelopeKeys::new(format!("CUSTOMER#{}", self.id), Some("PROFILE"))
///     }
/// }
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let repository: Repository<DataEnvelope<Customer>, _> =
///     Repository::new(MemoryStore::new(), RepositoryConfig::new("customers"));
/// let caller = CallerInfo::default();
///
/// let customer = Customer {
///     id: "7".to_string(),
///     name: "Ada".to_string(),
/// };
/// let created = repository.create(customer, &caller).await?;
/// let read = repository.read("CUSTOMER#7", Some("PROFILE"), &caller).await?;
/// assert_eq!(read.entity().name, "Ada");
/// assert_eq!(read.record().update_utc_tick, created.record().update_utc_tick);
/// # Ok(())
/// # }
/// ```
pub struct Repository<E, S> {
    cache: cache::EnvelopeCache,
    clock: sync::Arc<dyn clock::Clock>,
    config: config::RepositoryConfig,
    envelope: marker::PhantomData<fn() -> E>,
    store: S,
}

impl<E, S> Repository<E, S>
where
    E: Envelope,
    S: Store,
{
    /// Repository over `store` using the wall clock.
    pub fn new(store: S, config: config::RepositoryConfig) -> Self {
        Self::with_clock(store, config, sync::Arc::new(clock::SystemClock))
    }

    /// Repository over `store` reading time from `clock`.
    pub fn with_clock(
        store: S,
        config: config::RepositoryConfig,
        clock: sync::Arc<dyn clock::Clock>,
    ) -> Self {
        let cache = cache::EnvelopeCache::new(
            config.cache_capacity,
            config.cache_freshness,
            clock.clone(),
        );
        Self {
            cache,
            clock,
            config,
            envelope: marker::PhantomData,
            store,
        }
    }

    /// Instance configuration.
    pub fn config(&self) -> &config::RepositoryConfig {
        &self.config
    }

    /// Read cache.
    pub fn cache(&self) -> &cache::EnvelopeCache {
        &self.cache
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    fn table_name<'a>(&'a self, caller: &'a config::CallerInfo) -> &'a str {
        caller.table.as_deref().unwrap_or(&self.config.table_name)
    }

    fn use_cache(&self, caller: &config::CallerInfo) -> bool {
        caller.use_cache.unwrap_or(self.config.use_cache)
    }

    /// Await a store call, bounded by the caller's or the configured timeout.
    async fn call<T>(
        &self,
        caller: &config::CallerInfo,
        request: impl future::Future<Output = Result<T, store::StoreError>>,
    ) -> Result<T, store::StoreError> {
        match caller.timeout.or(self.config.timeout) {
            Some(timeout) => tokio::time::timeout(timeout, request)
                .await
                .unwrap_or_else(|_| {
                    Err(store::StoreError::Unavailable(format!(
                        "store call timed out after {timeout:?}"
                    )))
                }),
            None => request.await,
        }
    }

    /// Store a new record. Fails with [`error::RepositoryError::Conflict`] when its key is taken.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.create",
            skip_all,
            fields(table = %self.table_name(caller)),
            err(Display)
        )
    )]
    pub async fn create(
        &self,
        entity: E::Entity,
        caller: &config::CallerInfo,
    ) -> error::Result<E> {
        let table_name = self.table_name(caller);
        let mut envelope = E::from_entity(entity)?;
        let now = self.clock.now_ticks();
        let record = envelope.record_mut();
        record.create_utc_tick = now;
        record.update_utc_tick = now;
        let key = envelope.primary_key();
        let item = envelope.to_item()?;

        let request = write::put_item::PutItem {
            item: item.clone(),
            write_args: write::common::WriteArgs {
                condition: Some(common::condition::ConditionExpression::all(vec![
                    common::condition::KeyCondition::new(
                        common::key::PARTITION_KEY,
                        common::condition::Condition::Null,
                    ),
                ])),
                table_name: table_name.to_string(),
            },
        };
        self.call(caller, self.store.put_item(request))
            .await
            .map_err(|err| map_store_error(err, table_name, &key))?;

        self.refresh_cache(caller, key.cache_key(table_name), item)
            .await;
        Ok(envelope)
    }

    /// Fetch a record by key, from the cache when a fresh entry is held.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.read",
            skip_all,
            fields(table = %self.table_name(caller), pk = pk, sk = ?sk),
            err(Display)
        )
    )]
    pub async fn read(
        &self,
        pk: &str,
        sk: Option<&str>,
        caller: &config::CallerInfo,
    ) -> error::Result<E> {
        let table_name = self.table_name(caller);
        let key = primary_key(pk, sk)?;
        let cache_key = key.cache_key(table_name);
        let use_cache = self.use_cache(caller);

        if use_cache && let Some(item) = self.cache.get(&cache_key).await {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %cache_key, "cache hit");
            return E::from_item(item).map_err(Into::into);
        }

        let request = read::get_item::GetItem {
            consistent_read: Some(self.config.consistent_read),
            key: key.clone(),
            table_name: table_name.to_string(),
        };
        let item = self
            .call(caller, self.store.get_item(request))
            .await
            .map_err(|err| map_store_error(err, table_name, &key))?
            .ok_or_else(|| error::RepositoryError::NotFound {
                table: table_name.to_string(),
                key: describe(&key),
            })?;
        let envelope = E::from_item(item.clone())?;
        if use_cache {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %cache_key, "cache miss");
            self.cache.insert(cache_key, item).await;
        }
        Ok(envelope)
    }

    /// Write a changed record, provided nobody else updated it since it was read.
    ///
    /// `UpdateUtcTick` advances to the current tick, or one past the previous value when
    /// the clock lags. A stale envelope fails with [`error::RepositoryError::Conflict`].
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.update",
            skip_all,
            fields(table = %self.table_name(caller)),
            err(Display)
        )
    )]
    pub async fn update(&self, mut envelope: E, caller: &config::CallerInfo) -> error::Result<E> {
        let table_name = self.table_name(caller);
        let expected = envelope.record().update_utc_tick;
        envelope.seal()?;
        envelope.record_mut().update_utc_tick = self
            .clock
            .now_ticks()
            .max(expected.saturating_add(1));
        let key = envelope.primary_key();
        let cache_key = key.cache_key(table_name);
        let item = envelope.to_item()?;

        let request = write::put_item::PutItem {
            item: item.clone(),
            write_args: write::common::WriteArgs {
                condition: Some(common::condition::ConditionExpression::all(vec![
                    common::condition::KeyCondition::new(
                        "UpdateUtcTick",
                        common::condition::Condition::Equals(types::AttributeValue::N(
                            expected.to_string(),
                        )),
                    ),
                ])),
                table_name: table_name.to_string(),
            },
        };
        let result = self.call(caller, self.store.put_item(request)).await;
        if let Err(store::StoreError::ConditionalCheckFailed) = &result {
            #[cfg(feature = "tracing")]
            tracing::debug!(key = %cache_key, expected, "stale update rejected");
            self.cache.remove(&cache_key).await;
        }
        result.map_err(|err| map_store_error(err, table_name, &key))?;

        self.refresh_cache(caller, cache_key, item).await;
        Ok(envelope)
    }

    /// Delete a record by key. Deleting a missing key succeeds.
    ///
    /// With soft delete enabled the record is kept, marked `IsDeleted` and given a `TTL`
    /// when one is configured; it stays readable by key.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.delete",
            skip_all,
            fields(
                table = %self.table_name(caller),
                pk = pk,
                sk = ?sk,
                soft = self.config.use_soft_delete
            ),
            err(Display)
        )
    )]
    pub async fn delete(
        &self,
        pk: &str,
        sk: Option<&str>,
        caller: &config::CallerInfo,
    ) -> error::Result<()> {
        if self.config.use_soft_delete {
            return self.soft_delete(pk, sk, caller).await;
        }

        let table_name = self.table_name(caller);
        let key = primary_key(pk, sk)?;
        let cache_key = key.cache_key(table_name);
        let request = write::delete_item::DeleteItem {
            key: key.clone(),
            write_args: write::common::WriteArgs {
                condition: None,
                table_name: table_name.to_string(),
            },
        };
        self.call(caller, self.store.delete_item(request))
            .await
            .map_err(|err| map_store_error(err, table_name, &key))?;
        self.cache.remove(&cache_key).await;
        Ok(())
    }

    async fn soft_delete(
        &self,
        pk: &str,
        sk: Option<&str>,
        caller: &config::CallerInfo,
    ) -> error::Result<()> {
        let mut envelope = match self.read(pk, sk, &caller.clone().with_cache(false)).await {
            Ok(envelope) => envelope,
            Err(error::RepositoryError::NotFound { .. }) => return Ok(()),
            Err(err) => return Err(err),
        };
        if envelope.is_deleted() {
            return Ok(());
        }
        let now = self.clock.now_ticks();
        let record = envelope.record_mut();
        record.is_deleted = Some(true);
        record.ttl = self
            .config
            .soft_delete_ttl
            .map(|ttl| {
                let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);
                clock::ticks_to_unix_seconds(now).saturating_add(ttl)
            });
        self.update(envelope, caller).await?;
        Ok(())
    }

    /// Query a range of records, paging until the size ceiling, `limit` records (zero
    /// meaning no limit) or the end of the range is reached.
    ///
    /// Only [`ListStatus::Complete`] tells the range was exhausted; a partial result can
    /// be resumed with [`query::ListQuery::starting_after`]. Listed records are not cached.
    #[cfg_attr(
        feature = "tracing",
        tracing::instrument(
            name = "dynamodb_envelope.list",
            skip_all,
            fields(
                table = %self.table_name(caller),
                partition = query.partition_key(),
                limit = limit
            ),
            err(Display)
        )
    )]
    pub async fn list(
        &self,
        query: &query::ListQuery,
        limit: usize,
        caller: &config::CallerInfo,
    ) -> error::Result<ListResult<E>> {
        let table_name = self.table_name(caller);
        let exclude_deleted = self.config.use_is_deleted && !query.includes_deleted();
        let key = common::key::PrimaryKey {
            pk: query.partition_key().to_string(),
            sk: None,
        };
        let mut items = Vec::new();
        let mut size = 0;
        let mut start = query.exclusive_start_key().cloned();

        loop {
            let remaining = (limit > 0).then(|| limit - items.len());
            let page_limit = match (remaining, self.config.list_page_size) {
                (Some(remaining), Some(page_size)) => Some(remaining.min(page_size)),
                (remaining, page_size) => remaining.or(page_size),
            }
            .map(|page_limit| i32::try_from(page_limit).unwrap_or(i32::MAX));

            let request = query.to_request(table_name, page_limit, start.take(), exclude_deleted);
            let store::QueryPage {
                items: page_items,
                last_evaluated_key,
            } = self
                .call(caller, self.store.query(request))
                .await
                .map_err(|err| map_store_error(err, table_name, &key))?;

            // Crossing the ceiling inside a page resumes after the last kept item.
            let mut stopped = None;
            let mut page_items = page_items.into_iter().peekable();
            while let Some(item) = page_items.next() {
                size += common::item_size(&item);
                let envelope = E::from_item(item)?;
                if size > self.config.list_size_ceiling && page_items.peek().is_some() {
                    stopped = Some(query.resume_key(envelope.record()));
                    items.push(envelope);
                    break;
                }
                items.push(envelope);
            }
            start = stopped.or(last_evaluated_key);

            if start.is_none()
                || size > self.config.list_size_ceiling
                || (limit > 0 && items.len() >= limit)
            {
                break;
            }
        }

        let status = match start {
            Some(_) => ListStatus::Partial,
            None => ListStatus::Complete,
        };
        #[cfg(feature = "tracing")]
        tracing::debug!(size, count = items.len(), ?status, "listed records");
        Ok(ListResult {
            items,
            last_evaluated_key: start,
            status,
        })
    }

    /// Drop the cached record under a key, if any.
    pub async fn invalidate(&self, pk: &str, sk: Option<&str>, caller: &config::CallerInfo) {
        let key = common::key::PrimaryKey::new(pk, sk);
        self.cache.remove(&key.cache_key(self.table_name(caller))).await;
    }

    /// Whether a record is cached under a key, fresh or not.
    pub async fn is_cached(&self, pk: &str, sk: Option<&str>, caller: &config::CallerInfo) -> bool {
        let key = common::key::PrimaryKey::new(pk, sk);
        self.cache
            .contains(&key.cache_key(self.table_name(caller)))
            .await
    }

    async fn refresh_cache(
        &self,
        caller: &config::CallerInfo,
        cache_key: String,
        item: common::Item,
    ) {
        if self.use_cache(caller) {
            self.cache.insert(cache_key, item).await;
        } else {
            self.cache.remove(&cache_key).await;
        }
    }
}

fn primary_key(pk: &str, sk: Option<&str>) -> error::Result<common::key::PrimaryKey> {
    if pk.is_empty() {
        return Err(error::RepositoryError::BadRequest(
            "partition key must not be empty".to_string(),
        ));
    }
    Ok(common::key::PrimaryKey::new(pk, sk))
}

fn describe(key: &common::key::PrimaryKey) -> String {
    format!("{}{}", key.pk, key.sk.as_deref().unwrap_or_default())
}

fn map_store_error(
    err: store::StoreError,
    table_name: &str,
    key: &common::key::PrimaryKey,
) -> error::RepositoryError {
    match err {
        store::StoreError::ConditionalCheckFailed => {
            #[cfg(feature = "tracing")]
            tracing::debug!(table = table_name, key = %describe(key), "conditional write rejected");
            error::RepositoryError::Conflict {
                table: table_name.to_string(),
                key: describe(key),
            }
        }
        store::StoreError::Validation(message) => error::RepositoryError::BadRequest(message),
        store::StoreError::Unavailable(message) => {
            error::RepositoryError::ServiceUnavailable(message)
        }
        store::StoreError::Other(message) => error::RepositoryError::Internal(message),
    }
}

use crate::{common, read, store, write};

use async_trait::async_trait;
use aws_sdk_dynamodb::types;
use std::{cmp, collections, sync::atomic};
use tokio::sync::{Mutex, RwLock};

type Table = collections::BTreeMap<(String, String), common::Item>;

/// In-process store with DynamoDB semantics.
///
/// Honors write conditions, secondary indexes named `{hash}-{range}-Index` (sparse:
/// items without the range attribute are not indexed), native sort-key order,
/// filter-after-limit and `last_evaluated_key` paging.
#[derive(Debug, Default)]
pub struct MemoryStore {
    failures: Mutex<collections::VecDeque<store::StoreError>>,
    requests: atomic::AtomicUsize,
    tables: RwLock<collections::HashMap<String, Table>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next request fail with `error`.
    pub async fn fail_next(&self, error: store::StoreError) {
        self.failures.lock().await.push_back(error);
    }

    /// Number of requests served so far, failed ones included.
    pub fn requests(&self) -> usize {
        self.requests.load(atomic::Ordering::SeqCst)
    }

    /// The stored item under `key`, bypassing any request accounting.
    pub async fn item(
        &self,
        table_name: &str,
        key: &common::key::PrimaryKey,
    ) -> Option<common::Item> {
        let tables = self.tables.read().await;
        tables
            .get(table_name)?
            .get(&(key.pk.clone(), key.sk.clone().unwrap_or_default()))
            .cloned()
    }

    /// Names of the tables holding or having held items, sorted.
    pub async fn table_names(&self) -> Vec<String> {
        let tables = self.tables.read().await;
        let mut names: Vec<String> = tables.keys().cloned().collect();
        names.sort();
        names
    }

    /// Number of items stored in a table.
    pub async fn len(&self, table_name: &str) -> usize {
        let tables = self.tables.read().await;
        tables.get(table_name).map_or(0, |table| table.len())
    }

    async fn begin(&self) -> Result<(), store::StoreError> {
        self.requests.fetch_add(1, atomic::Ordering::SeqCst);
        match self.failures.lock().await.pop_front() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

fn storage_key(item: &common::Item) -> Result<(String, String), store::StoreError> {
    match common::key::PrimaryKey::from_item(item) {
        Some(key) if !key.pk.is_empty() => Ok((key.pk, key.sk.unwrap_or_default())),
        _ => Err(store::StoreError::Validation(
            "item is missing a non-empty PK string attribute".to_string(),
        )),
    }
}

fn check_condition(
    condition: Option<&common::condition::ConditionExpression>,
    existing: Option<&common::Item>,
) -> Result<(), store::StoreError> {
    let empty = common::Item::new();
    match condition {
        Some(condition) if !condition.matches(existing.unwrap_or(&empty)) => {
            Err(store::StoreError::ConditionalCheckFailed)
        }
        _ => Ok(()),
    }
}

/// Hash and range attributes of a table or index.
fn index_schema(index_name: Option<&str>) -> Result<(String, String), store::StoreError> {
    match index_name {
        None => Ok((
            common::key::PARTITION_KEY.to_string(),
            common::key::SORT_KEY.to_string(),
        )),
        Some(index_name) => index_name
            .strip_suffix("-Index")
            .and_then(|schema| schema.split_once('-'))
            .map(|(hash, range)| (hash.to_string(), range.to_string()))
            .ok_or_else(|| store::StoreError::Validation(format!("unknown index {index_name}"))),
    }
}

fn index_order(left: &common::Item, right: &common::Item, range: &str) -> cmp::Ordering {
    let by_range = match (left.get(range), right.get(range)) {
        (Some(left), Some(right)) => {
            common::condition::compare(left, right).unwrap_or(cmp::Ordering::Equal)
        }
        _ => cmp::Ordering::Equal,
    };
    by_range.then_with(|| {
        let left = common::key::PrimaryKey::from_item(left);
        let right = common::key::PrimaryKey::from_item(right);
        let left = left.map(|key| (key.pk, key.sk.unwrap_or_default()));
        let right = right.map(|key| (key.pk, key.sk.unwrap_or_default()));
        left.cmp(&right)
    })
}

fn evaluated_key(item: &common::Item, hash: &str, range: &str) -> common::Item {
    [
        common::key::PARTITION_KEY,
        common::key::SORT_KEY,
        hash,
        range,
    ]
    .into_iter()
    .filter_map(|name| Some((name.to_string(), item.get(name)?.clone())))
    .collect()
}

#[async_trait]
impl store::Store for MemoryStore {
    async fn put_item(&self, request: write::put_item::PutItem) -> Result<(), store::StoreError> {
        self.begin().await?;
        let key = storage_key(&request.item)?;
        let mut tables = self.tables.write().await;
        let table = tables.entry(request.write_args.table_name).or_default();
        check_condition(request.write_args.condition.as_ref(), table.get(&key))?;
        table.insert(key, request.item);
        Ok(())
    }

    async fn get_item(
        &self,
        request: read::get_item::GetItem,
    ) -> Result<Option<common::Item>, store::StoreError> {
        self.begin().await?;
        let key = storage_key(&request.key.into())?;
        let tables = self.tables.read().await;
        Ok(tables
            .get(&request.table_name)
            .and_then(|table| table.get(&key))
            .cloned())
    }

    async fn delete_item(
        &self,
        request: write::delete_item::DeleteItem,
    ) -> Result<(), store::StoreError> {
        self.begin().await?;
        let key = storage_key(&request.key.into())?;
        let mut tables = self.tables.write().await;
        let Some(table) = tables.get_mut(&request.write_args.table_name) else {
            return check_condition(request.write_args.condition.as_ref(), None);
        };
        check_condition(request.write_args.condition.as_ref(), table.get(&key))?;
        table.remove(&key);
        Ok(())
    }

    async fn query(
        &self,
        request: read::query::Query,
    ) -> Result<store::QueryPage, store::StoreError> {
        self.begin().await?;
        let (hash, range) = index_schema(request.index_name.as_deref())?;
        if request.partition_key.name != hash {
            return Err(store::StoreError::Validation(format!(
                "key condition must target {hash}, got {}",
                request.partition_key.name
            )));
        }
        if let Some(sort_key_condition) = &request.sort_key_condition
            && sort_key_condition.name != range
        {
            return Err(store::StoreError::Validation(format!(
                "sort key condition must target {range}, got {}",
                sort_key_condition.name
            )));
        }
        let limit = match request.limit {
            Some(limit) if limit < 1 => {
                return Err(store::StoreError::Validation(
                    "limit must be at least 1".to_string(),
                ));
            }
            Some(limit) => Some(limit as usize),
            None => None,
        };
        let partition_value = types::AttributeValue::S(request.partition_key.value);
        let forward = request.scan_index_forward.unwrap_or(true);

        let mut candidates: Vec<common::Item> = {
            let tables = self.tables.read().await;
            tables
                .get(&request.table_name)
                .into_iter()
                .flat_map(|table| table.values())
                .filter(|item| item.get(&hash) == Some(&partition_value))
                .filter(|item| range == common::key::SORT_KEY || item.contains_key(&range))
                .filter(|item| {
                    request
                        .sort_key_condition
                        .as_ref()
                        .is_none_or(|condition| condition.matches(item))
                })
                .cloned()
                .collect()
        };
        candidates.sort_by(|left, right| index_order(left, right, &range));
        if !forward {
            candidates.reverse();
        }
        if let Some(start) = &request.exclusive_start_key {
            candidates.retain(|item| {
                let order = index_order(item, start, &range);
                if forward {
                    order == cmp::Ordering::Greater
                } else {
                    order == cmp::Ordering::Less
                }
            });
        }

        let evaluated = limit.map_or(candidates.len(), |limit| limit.min(candidates.len()));
        let last_evaluated_key = (evaluated < candidates.len())
            .then(|| evaluated_key(&candidates[evaluated - 1], &hash, &range));
        let items = candidates
            .into_iter()
            .take(evaluated)
            .filter(|item| {
                request
                    .filter
                    .as_ref()
                    .is_none_or(|filter| filter.matches(item))
            })
            .map(|item| match &request.projection {
                Some(projection) => projection.apply(item),
                None => item,
            })
            .collect();
        Ok(store::QueryPage {
            items,
            last_evaluated_key,
        })
    }
}

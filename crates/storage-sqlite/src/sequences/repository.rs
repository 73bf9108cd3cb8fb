use async_trait::async_trait;
use diesel::prelude::*;
use std::sync::Arc;

use crate::db::{get_connection, PartitionPools};
use crate::errors::StorageError;
use crate::schema::sequence_counters;
use snds_core::errors::Result;
use snds_core::sequences::SequenceRepositoryTrait;
use snds_core::PartitionHandle;

pub struct SequenceRepository {
    pools: Arc<PartitionPools>,
}

impl SequenceRepository {
    pub fn new(pools: Arc<PartitionPools>) -> Self {
        SequenceRepository { pools }
    }
}

#[async_trait]
impl SequenceRepositoryTrait for SequenceRepository {
    async fn increment(&self, partition: &PartitionHandle, counter_name: &str) -> Result<i64> {
        let db = self.pools.get(partition)?;
        let counter_name = counter_name.to_string();
        db.writer
            .exec(move |conn| -> Result<i64> {
                // INSERT .. ON CONFLICT(name) DO UPDATE SET value = value + 1 RETURNING value
                Ok(diesel::insert_into(sequence_counters::table)
                    .values((
                        sequence_counters::name.eq(&counter_name),
                        sequence_counters::value.eq(1_i64),
                    ))
                    .on_conflict(sequence_counters::name)
                    .do_update()
                    .set(sequence_counters::value.eq(sequence_counters::value + 1_i64))
                    .returning(sequence_counters::value)
                    .get_result::<i64>(conn)
                    .map_err(StorageError::from)?)
            })
            .await
    }

    fn current(&self, partition: &PartitionHandle, counter_name: &str) -> Result<Option<i64>> {
        let db = self.pools.get(partition)?;
        let mut conn = get_connection(&db.pool)?;
        Ok(sequence_counters::table
            .find(counter_name)
            .select(sequence_counters::value)
            .first::<i64>(&mut conn)
            .optional()
            .map_err(StorageError::from)?)
    }
}

use chrono::{DateTime, Utc};
use sea_orm::{
    sea_query::{Expr, OnConflict},
    ConnectionTrait, EntityTrait, Set,
};

use crate::{
    entities::commerce::{order_sequence, OrderSequence},
    errors::ServiceError,
};

/// Mints `PREFIX-YYYYMMDD-NNNN` numbers from a per-day counter row.
///
/// Must run inside the transaction that inserts the order. The counter is
/// bumped by a single upsert, so concurrent checkouts queue on the row lock
/// and a rolled-back order hands its number back. The unique index on
/// `orders.order_number` still backs this up; order creation retries a
/// collision once.
#[derive(Debug, Clone)]
pub struct OrderNumberGenerator {
    prefix: String,
}

impl OrderNumberGenerator {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    pub fn day_key(now: DateTime<Utc>) -> String {
        now.format("%Y%m%d").to_string()
    }

    pub fn day_prefix(&self, now: DateTime<Utc>) -> String {
        format!("{}-{}-", self.prefix, Self::day_key(now))
    }

    pub fn format(&self, now: DateTime<Utc>, sequence: u64) -> String {
        format!("{}{:04}", self.day_prefix(now), sequence)
    }

    pub async fn next<C: ConnectionTrait>(
        &self,
        conn: &C,
        now: DateTime<Utc>,
    ) -> Result<String, ServiceError> {
        let counter = OrderSequence::insert(order_sequence::ActiveModel {
            day: Set(Self::day_key(now)),
            last_value: Set(1),
        })
        .on_conflict(
            OnConflict::column(order_sequence::Column::Day)
                .value(
                    order_sequence::Column::LastValue,
                    Expr::col((OrderSequence, order_sequence::Column::LastValue)).add(1),
                )
                .to_owned(),
        )
        .exec_with_returning(conn)
        .await?;

        let sequence = u64::try_from(counter.last_value).map_err(|_| {
            ServiceError::InternalError(format!(
                "order sequence for {} is negative",
                counter.day
            ))
        })?;
        Ok(self.format(now, sequence))
    }
}

use crate::{
    entities::commerce::{cart, cart_item, Cart, CartItem},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::{Duration, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    Set, TransactionTrait,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// What a merge did with the guest cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum MergeOutcome {
    /// No guest cart exists for the session token.
    NoGuestCart,
    /// The user had no cart; the guest cart now belongs to them.
    #[serde(rename_all = "camelCase")]
    Reassigned { cart_id: Uuid },
    /// Guest lines were folded into the user's cart and the guest cart deleted.
    #[serde(rename_all = "camelCase")]
    Merged { cart_id: Uuid, lines_merged: usize },
}

/// Folds a session-scoped guest cart into a user's cart at login.
#[derive(Clone)]
pub struct CartMergeService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    expiry_days: i64,
}

impl CartMergeService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>, expiry_days: i64) -> Self {
        Self {
            db,
            event_sender,
            expiry_days,
        }
    }

    /// Runs in one transaction. Quantities of shared products are summed
    /// without a stock check; checkout re-validates stock.
    #[instrument(skip(self))]
    pub async fn merge(&self, session_id: &str, user_id: &str) -> Result<MergeOutcome, ServiceError> {
        let now = Utc::now();
        let expires_at = now + Duration::days(self.expiry_days);
        let txn = self.db.begin().await?;

        let Some(guest) = Cart::find()
            .filter(cart::Column::SessionId.eq(session_id))
            .filter(cart::Column::UserId.is_null())
            .one(&txn)
            .await?
        else {
            txn.commit().await?;
            return Ok(MergeOutcome::NoGuestCart);
        };

        let user_cart = Cart::find()
            .filter(cart::Column::UserId.eq(user_id))
            .one(&txn)
            .await?;

        let Some(user_cart) = user_cart else {
            let guest_id = guest.id;
            let mut active: cart::ActiveModel = guest.into();
            active.user_id = Set(Some(user_id.to_string()));
            active.session_id = Set(None);
            active.expires_at = Set(expires_at);
            active.updated_at = Set(now);
            active.update(&txn).await?;
            txn.commit().await?;

            self.publish(guest_id, guest_id, user_id, true).await;
            info!(cart_id = %guest_id, %user_id, "reassigned guest cart to user");
            return Ok(MergeOutcome::Reassigned { cart_id: guest_id });
        };

        let guest_lines = CartItem::find()
            .filter(cart_item::Column::CartId.eq(guest.id))
            .all(&txn)
            .await?;
        let user_lines: HashMap<Uuid, Uuid> = CartItem::find()
            .filter(cart_item::Column::CartId.eq(user_cart.id))
            .all(&txn)
            .await?
            .into_iter()
            .map(|line| (line.product_id, line.id))
            .collect();

        let lines_merged = guest_lines.len();
        for line in guest_lines {
            match user_lines.get(&line.product_id) {
                Some(existing_id) => {
                    CartItem::update_many()
                        .col_expr(
                            cart_item::Column::Quantity,
                            Expr::col(cart_item::Column::Quantity).add(line.quantity),
                        )
                        .col_expr(cart_item::Column::UpdatedAt, Expr::value(now))
                        .filter(cart_item::Column::Id.eq(*existing_id))
                        .exec(&txn)
                        .await?;
                }
                None => {
                    cart_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        cart_id: Set(user_cart.id),
                        product_id: Set(line.product_id),
                        quantity: Set(line.quantity),
                        price_at_add: Set(line.price_at_add),
                        created_at: Set(line.created_at),
                        updated_at: Set(now),
                    }
                    .insert(&txn)
                    .await?;
                }
            }
        }

        super::cart_service::delete_carts(&txn, &[guest.id]).await?;
        Cart::update_many()
            .col_expr(cart::Column::ExpiresAt, Expr::value(expires_at))
            .col_expr(cart::Column::UpdatedAt, Expr::value(now))
            .filter(cart::Column::Id.eq(user_cart.id))
            .exec(&txn)
            .await?;
        txn.commit().await?;

        self.publish(guest.id, user_cart.id, user_id, false).await;
        info!(guest_cart_id = %guest.id, user_cart_id = %user_cart.id, lines_merged, "merged guest cart");
        Ok(MergeOutcome::Merged {
            cart_id: user_cart.id,
            lines_merged,
        })
    }

    async fn publish(&self, guest_cart_id: Uuid, user_cart_id: Uuid, user_id: &str, reassigned: bool) {
        self.event_sender
            .send_or_log(Event::CartMerged {
                guest_cart_id,
                user_cart_id,
                user_id: user_id.to_string(),
                reassigned,
            })
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn outcome_is_tagged() {
        let json = serde_json::to_value(MergeOutcome::Merged {
            cart_id: Uuid::nil(),
            lines_merged: 2,
        })
        .unwrap();
        assert_eq!(json["outcome"], "merged");
        assert_eq!(json["linesMerged"], 2);
        assert_eq!(json["cartId"], Uuid::nil().to_string());
        assert!(json.get("lines_merged").is_none());

        let json = serde_json::to_value(MergeOutcome::NoGuestCart).unwrap();
        assert_eq!(json["outcome"], "no_guest_cart");
    }
}

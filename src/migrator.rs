use sea_orm_migration::prelude::*;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_products_table::Migration),
            Box::new(m20250101_000002_create_cart_tables::Migration),
            Box::new(m20250101_000003_create_orders_table::Migration),
            Box::new(m20250101_000004_create_coupon_tables::Migration),
            Box::new(m20250101_000005_create_order_sequences_table::Migration),
        ]
    }
}

mod m20250101_000001_create_products_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000001_create_products_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Products::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Products::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Products::Name).string().not_null())
                        .col(ColumnDef::new(Products::Slug).string().not_null().unique_key())
                        .col(ColumnDef::new(Products::Price).decimal().not_null())
                        .col(ColumnDef::new(Products::SalePrice).decimal().null())
                        .col(
                            ColumnDef::new(Products::StockQuantity)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Products::TrackInventory)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Products::LowStockThreshold)
                                .integer()
                                .not_null()
                                .default(5),
                        )
                        .col(ColumnDef::new(Products::Status).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Products::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Products::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(Products::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Products {
        Table,
        Id,
        Name,
        Slug,
        Price,
        SalePrice,
        StockQuantity,
        TrackInventory,
        LowStockThreshold,
        Status,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000002_create_cart_tables {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000002_create_cart_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Carts::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Carts::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Carts::UserId).string().null())
                        .col(ColumnDef::new(Carts::SessionId).string().null())
                        .col(
                            ColumnDef::new(Carts::ExpiresAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Carts::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Carts::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            // One cart per identity; concurrent lazy creation loses on these.
            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_carts_user_id")
                        .table(Carts::Table)
                        .col(Carts::UserId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_carts_session_id")
                        .table(Carts::Table)
                        .col(Carts::SessionId)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_carts_expires_at")
                        .table(Carts::Table)
                        .col(Carts::ExpiresAt)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CartItems::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CartItems::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CartItems::CartId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::ProductId).uuid().not_null())
                        .col(ColumnDef::new(CartItems::Quantity).integer().not_null())
                        .col(
                            ColumnDef::new(CartItems::PriceAtAdd)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartItems::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CartItems::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_cart_items_cart_id")
                                .from(CartItems::Table, CartItems::CartId)
                                .to(Carts::Table, Carts::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_cart_items_cart_product")
                        .table(CartItems::Table)
                        .col(CartItems::CartId)
                        .col(CartItems::ProductId)
                        .unique()
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CartItems::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Carts::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Carts {
        Table,
        Id,
        UserId,
        SessionId,
        ExpiresAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CartItems {
        Table,
        Id,
        CartId,
        ProductId,
        Quantity,
        PriceAtAdd,
        CreatedAt,
        UpdatedAt,
    }
}

mod m20250101_000003_create_orders_table {

    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000003_create_orders_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Orders::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Orders::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Orders::OrderNumber).string().not_null())
                        .col(ColumnDef::new(Orders::UserId).string().null())
                        .col(ColumnDef::new(Orders::CustomerEmail).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerFirstName).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerLastName).string().not_null())
                        .col(ColumnDef::new(Orders::CustomerPhone).string().null())
                        .col(ColumnDef::new(Orders::ShippingAddress).json().not_null())
                        .col(ColumnDef::new(Orders::BillingAddress).json().not_null())
                        .col(ColumnDef::new(Orders::Items).json().not_null())
                        .col(ColumnDef::new(Orders::Subtotal).decimal().not_null())
                        .col(
                            ColumnDef::new(Orders::ShippingCost)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::TaxAmount).decimal().not_null())
                        .col(
                            ColumnDef::new(Orders::DiscountAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::TotalAmount)
                                .decimal()
                                .not_null(),
                        )
                        .col(ColumnDef::new(Orders::CouponCode).string().null())
                        .col(ColumnDef::new(Orders::PaymentIntentId).string().null())
                        .col(ColumnDef::new(Orders::Status).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::PaymentStatus).string_len(20).not_null())
                        .col(ColumnDef::new(Orders::TrackingNumber).string().null())
                        .col(
                            ColumnDef::new(Orders::ShippedAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::DeliveredAt)
                                .timestamp_with_time_zone()
                                .null(),
                        )
                        .col(
                            ColumnDef::new(Orders::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Orders::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_order_number")
                        .table(Orders::Table)
                        .col(Orders::OrderNumber)
                        .unique()
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_user_id")
                        .table(Orders::Table)
                        .col(Orders::UserId)
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_orders_status")
                        .table(Orders::Table)
                        .col(Orders::Status)
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(OrderStatusHistory::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderStatusHistory::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderStatusHistory::OrderId).uuid().not_null())
                        .col(
                            ColumnDef::new(OrderStatusHistory::Status)
                                .string_len(20)
                                .not_null(),
                        )
                        .col(ColumnDef::new(OrderStatusHistory::Notes).text().null())
                        .col(
                            ColumnDef::new(OrderStatusHistory::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_order_status_history_order_id")
                                .from(OrderStatusHistory::Table, OrderStatusHistory::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_order_status_history_order_id")
                        .table(OrderStatusHistory::Table)
                        .col(OrderStatusHistory::OrderId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderStatusHistory::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Orders::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    pub enum Orders {
        Table,
        Id,
        OrderNumber,
        UserId,
        CustomerEmail,
        CustomerFirstName,
        CustomerLastName,
        CustomerPhone,
        ShippingAddress,
        BillingAddress,
        Items,
        Subtotal,
        ShippingCost,
        TaxAmount,
        DiscountAmount,
        TotalAmount,
        CouponCode,
        PaymentIntentId,
        Status,
        PaymentStatus,
        TrackingNumber,
        ShippedAt,
        DeliveredAt,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum OrderStatusHistory {
        Table,
        Id,
        OrderId,
        Status,
        Notes,
        CreatedAt,
    }
}

mod m20250101_000004_create_coupon_tables {

    use super::m20250101_000003_create_orders_table::Orders;
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000004_create_coupon_tables"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(Coupons::Table)
                        .if_not_exists()
                        .col(ColumnDef::new(Coupons::Id).uuid().primary_key().not_null())
                        .col(ColumnDef::new(Coupons::Code).string().not_null().unique_key())
                        .col(ColumnDef::new(Coupons::Description).text().null())
                        .col(ColumnDef::new(Coupons::DiscountType).string_len(20).not_null())
                        .col(
                            ColumnDef::new(Coupons::DiscountValue)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::MinimumOrder)
                                .decimal()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Coupons::MaximumDiscount)
                                .decimal()
                                .null(),
                        )
                        .col(ColumnDef::new(Coupons::UsageLimit).integer().null())
                        .col(
                            ColumnDef::new(Coupons::UsedCount)
                                .integer()
                                .not_null()
                                .default(0),
                        )
                        .col(
                            ColumnDef::new(Coupons::ValidFrom)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::ValidUntil)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::IsActive)
                                .boolean()
                                .not_null()
                                .default(true),
                        )
                        .col(
                            ColumnDef::new(Coupons::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(Coupons::UpdatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_table(
                    Table::create()
                        .table(CouponUsage::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(CouponUsage::Id)
                                .uuid()
                                .primary_key()
                                .not_null(),
                        )
                        .col(ColumnDef::new(CouponUsage::CouponId).uuid().not_null())
                        .col(ColumnDef::new(CouponUsage::OrderId).uuid().not_null())
                        .col(ColumnDef::new(CouponUsage::UserId).string().null())
                        .col(
                            ColumnDef::new(CouponUsage::DiscountApplied)
                                .decimal()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(CouponUsage::CreatedAt)
                                .timestamp_with_time_zone()
                                .not_null(),
                        )
                        .foreign_key(
                            ForeignKey::create()
                                .name("fk_coupon_usage_order_id")
                                .from(CouponUsage::Table, CouponUsage::OrderId)
                                .to(Orders::Table, Orders::Id)
                                .on_delete(ForeignKeyAction::Cascade),
                        )
                        .to_owned(),
                )
                .await?;

            manager
                .create_index(
                    Index::create()
                        .if_not_exists()
                        .name("idx_coupon_usage_coupon_id")
                        .table(CouponUsage::Table)
                        .col(CouponUsage::CouponId)
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(CouponUsage::Table).to_owned())
                .await?;
            manager
                .drop_table(Table::drop().table(Coupons::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum Coupons {
        Table,
        Id,
        Code,
        Description,
        DiscountType,
        DiscountValue,
        MinimumOrder,
        MaximumDiscount,
        UsageLimit,
        UsedCount,
        ValidFrom,
        ValidUntil,
        IsActive,
        CreatedAt,
        UpdatedAt,
    }

    #[derive(DeriveIden)]
    enum CouponUsage {
        Table,
        Id,
        CouponId,
        OrderId,
        UserId,
        DiscountApplied,
        CreatedAt,
    }
}

mod m20250101_000005_create_order_sequences_table {
    use sea_orm_migration::prelude::*;

    pub struct Migration;

    impl MigrationName for Migration {
        fn name(&self) -> &str {
            "m20250101_000005_create_order_sequences_table"
        }
    }

    #[async_trait::async_trait]
    impl MigrationTrait for Migration {
        async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .create_table(
                    Table::create()
                        .table(OrderSequences::Table)
                        .if_not_exists()
                        .col(
                            ColumnDef::new(OrderSequences::Day)
                                .string_len(8)
                                .primary_key()
                                .not_null(),
                        )
                        .col(
                            ColumnDef::new(OrderSequences::LastValue)
                                .big_integer()
                                .not_null(),
                        )
                        .to_owned(),
                )
                .await
        }

        async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
            manager
                .drop_table(Table::drop().table(OrderSequences::Table).to_owned())
                .await
        }
    }

    #[derive(DeriveIden)]
    enum OrderSequences {
        Table,
        Day,
        LastValue,
    }
}

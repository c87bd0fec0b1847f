//! Create place, media and review tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Place::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Place::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Place::Name).string_len(180).not_null())
                    .col(
                        ColumnDef::new(Place::Slug)
                            .string_len(200)
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(Place::Category)
                            .string_len(20)
                            .not_null()
                            .default("otro"),
                    )
                    .col(
                        ColumnDef::new(Place::Description)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Place::Address)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Place::Lat).decimal_len(9, 6).null())
                    .col(ColumnDef::new(Place::Lng).decimal_len(9, 6).null())
                    .col(
                        ColumnDef::new(Place::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Place::CreatedBy).big_integer().null())
                    .col(
                        ColumnDef::new(Place::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_place_created_by")
                            .from(Place::Table, Place::CreatedBy)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_place_category")
                    .table(Place::Table)
                    .col(Place::Category)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_place_created_at")
                    .table(Place::Table)
                    .col(Place::CreatedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Media::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Media::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Media::PlaceId).big_integer().not_null())
                    .col(ColumnDef::new(Media::Image).string_len(512).not_null())
                    .col(
                        ColumnDef::new(Media::Caption)
                            .string_len(150)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Media::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_media_place")
                            .from(Media::Table, Media::PlaceId)
                            .to(Place::Table, Place::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_media_place_id")
                    .table(Media::Table)
                    .col(Media::PlaceId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Review::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Review::PlaceId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Review::Rating)
                            .integer()
                            .not_null()
                            .default(5)
                            .check(Expr::col(Review::Rating).between(1, 5)),
                    )
                    .col(
                        ColumnDef::new(Review::Comment)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(Review::AuthorName)
                            .string_len(120)
                            .not_null()
                            .default(""),
                    )
                    .col(ColumnDef::new(Review::Photo).string_len(512).null())
                    .col(
                        ColumnDef::new(Review::IsApproved)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Review::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_place")
                            .from(Review::Table, Review::PlaceId)
                            .to(Place::Table, Place::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_review_place_approved")
                    .table(Review::Table)
                    .col(Review::PlaceId)
                    .col(Review::IsApproved)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Media::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Place::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Place {
    Table,
    Id,
    Name,
    Slug,
    Category,
    Description,
    Address,
    Lat,
    Lng,
    IsActive,
    CreatedBy,
    CreatedAt,
}

#[derive(Iden)]
enum Media {
    Table,
    Id,
    PlaceId,
    Image,
    Caption,
    CreatedAt,
}

#[derive(Iden)]
enum Review {
    Table,
    Id,
    PlaceId,
    Rating,
    Comment,
    AuthorName,
    Photo,
    IsApproved,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}

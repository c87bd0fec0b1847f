//! Create contact_info and gallery_item tables.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ContactInfo::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ContactInfo::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ContactInfo::Name).string_len(120).not_null())
                    .col(
                        ColumnDef::new(ContactInfo::Category)
                            .string_len(20)
                            .not_null()
                            .default("GENERAL"),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::Phone)
                            .string_len(20)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::Whatsapp)
                            .string_len(20)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::Email)
                            .string_len(254)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::Address)
                            .string_len(255)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::Facebook)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::Instagram)
                            .string_len(200)
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ContactInfo::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_contact_info_category_name")
                    .table(ContactInfo::Table)
                    .col(ContactInfo::Category)
                    .col(ContactInfo::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GalleryItem::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GalleryItem::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GalleryItem::Title).string_len(150).not_null())
                    .col(
                        ColumnDef::new(GalleryItem::MediaType)
                            .string_len(10)
                            .not_null()
                            .default("IMAGE"),
                    )
                    .col(ColumnDef::new(GalleryItem::MediaFile).string_len(512).null())
                    .col(
                        ColumnDef::new(GalleryItem::MediaFileUrl)
                            .string_len(512)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(GalleryItem::Order)
                            .integer()
                            .not_null()
                            .default(0)
                            .check(Expr::col(GalleryItem::Order).gte(0)),
                    )
                    .col(
                        ColumnDef::new(GalleryItem::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(GalleryItem::UploadedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_gallery_item_order")
                    .table(GalleryItem::Table)
                    .col(GalleryItem::Order)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GalleryItem::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(ContactInfo::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum ContactInfo {
    Table,
    Id,
    Name,
    Category,
    Phone,
    Whatsapp,
    Email,
    Address,
    Facebook,
    Instagram,
    IsActive,
    CreatedAt,
}

#[derive(Iden)]
enum GalleryItem {
    Table,
    Id,
    Title,
    MediaType,
    MediaFile,
    MediaFileUrl,
    Order,
    IsActive,
    UploadedAt,
}

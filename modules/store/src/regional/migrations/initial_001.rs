use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(OrgUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrgUsers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OrgUsers::Email).string().not_null())
                    .col(ColumnDef::new(OrgUsers::PasswordHash).string())
                    .col(ColumnDef::new(OrgUsers::IsAdmin).boolean().not_null())
                    .col(ColumnDef::new(OrgUsers::EmployerId).uuid().not_null())
                    .col(ColumnDef::new(OrgUsers::Status).string().not_null())
                    .col(ColumnDef::new(OrgUsers::FullName).string())
                    .col(
                        ColumnDef::new(OrgUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrgUserRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrgUserRoles::OrgUserId).uuid().not_null())
                    .col(ColumnDef::new(OrgUserRoles::Role).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(OrgUserRoles::OrgUserId)
                            .col(OrgUserRoles::Role),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_org_user_roles_org_user")
                            .from(OrgUserRoles::Table, OrgUserRoles::OrgUserId)
                            .to(OrgUsers::Table, OrgUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmployerDomains::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(EmployerDomains::EmployerId).uuid().not_null())
                    .col(ColumnDef::new(EmployerDomains::Domain).string().not_null())
                    .col(
                        ColumnDef::new(EmployerDomains::VerificationToken)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployerDomains::TokenExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(EmployerDomains::Status).string().not_null())
                    .col(
                        ColumnDef::new(EmployerDomains::ConsecutiveFailures)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(EmployerDomains::LastVerifiedAt).timestamp_with_time_zone(),
                    )
                    .col(
                        ColumnDef::new(EmployerDomains::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(EmployerDomains::EmployerId)
                            .col(EmployerDomains::Domain),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrgTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrgTokens::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrgTokens::Kind).string().not_null())
                    .col(ColumnDef::new(OrgTokens::OrgUserId).uuid().not_null())
                    .col(ColumnDef::new(OrgTokens::TfaCode).string())
                    .col(
                        ColumnDef::new(OrgTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrgTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_org_tokens_org_user")
                            .from(OrgTokens::Table, OrgTokens::OrgUserId)
                            .to(OrgUsers::Table, OrgUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrgSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrgSessions::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrgSessions::OrgUserId).uuid().not_null())
                    .col(
                        ColumnDef::new(OrgSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrgSessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_org_sessions_org_user")
                            .from(OrgSessions::Table, OrgSessions::OrgUserId)
                            .to(OrgUsers::Table, OrgUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmailOutbox::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmailOutbox::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmailOutbox::EmailType).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::ToAddr).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::Subject).string().not_null())
                    .col(ColumnDef::new(EmailOutbox::TextBody).text().not_null())
                    .col(ColumnDef::new(EmailOutbox::HtmlBody).text().not_null())
                    .col(
                        ColumnDef::new(EmailOutbox::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(EmailOutbox::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmployerDomains::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgUserRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgUsers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum OrgUsers {
    Table,
    Id,
    Email,
    PasswordHash,
    IsAdmin,
    EmployerId,
    Status,
    FullName,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OrgUserRoles {
    Table,
    OrgUserId,
    Role,
}

#[derive(DeriveIden)]
enum EmployerDomains {
    Table,
    EmployerId,
    Domain,
    VerificationToken,
    TokenExpiresAt,
    Status,
    ConsecutiveFailures,
    LastVerifiedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OrgTokens {
    Table,
    Token,
    Kind,
    OrgUserId,
    TfaCode,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum OrgSessions {
    Table,
    Token,
    OrgUserId,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum EmailOutbox {
    Table,
    Id,
    EmailType,
    ToAddr,
    Subject,
    TextBody,
    HtmlBody,
    CreatedAt,
}

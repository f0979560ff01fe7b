use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Employers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Employers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Employers::DisplayName).string().not_null())
                    .col(ColumnDef::new(Employers::HomeRegion).string().not_null())
                    .col(
                        ColumnDef::new(Employers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(EmployerDomains::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(EmployerDomains::Domain)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(EmployerDomains::EmployerId).uuid().not_null())
                    .col(ColumnDef::new(EmployerDomains::Region).string().not_null())
                    .col(ColumnDef::new(EmployerDomains::Status).string().not_null())
                    .col(
                        ColumnDef::new(EmployerDomains::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employer_domains_employer")
                            .from(EmployerDomains::Table, EmployerDomains::EmployerId)
                            .to(Employers::Table, Employers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrgUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(OrgUsers::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(OrgUsers::EmailHash).string().not_null())
                    .col(ColumnDef::new(OrgUsers::EmployerId).uuid().not_null())
                    .col(ColumnDef::new(OrgUsers::HomeRegion).string().not_null())
                    .col(ColumnDef::new(OrgUsers::Status).string().not_null())
                    .col(ColumnDef::new(OrgUsers::FullName).string())
                    .col(ColumnDef::new(OrgUsers::PreferredLanguage).string().not_null())
                    .col(
                        ColumnDef::new(OrgUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_org_users_employer")
                            .from(OrgUsers::Table, OrgUsers::EmployerId)
                            .to(Employers::Table, Employers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Email identity is (employer, email hash): the same address may
        // exist at two employers, never twice at one.
        manager
            .create_index(
                Index::create()
                    .name("ux_org_users_employer_email_hash")
                    .table(OrgUsers::Table)
                    .col(OrgUsers::EmployerId)
                    .col(OrgUsers::EmailHash)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(OrgSignupTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(OrgSignupTokens::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(OrgSignupTokens::Email).string().not_null())
                    .col(ColumnDef::new(OrgSignupTokens::Region).string().not_null())
                    .col(
                        ColumnDef::new(OrgSignupTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(OrgSignupTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminUsers::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminUsers::Id).uuid().not_null().primary_key())
                    .col(
                        ColumnDef::new(AdminUsers::Email)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(AdminUsers::PasswordHash).string())
                    .col(ColumnDef::new(AdminUsers::Status).string().not_null())
                    .col(ColumnDef::new(AdminUsers::FullName).string())
                    .col(
                        ColumnDef::new(AdminUsers::PreferredLanguage)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminUsers::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminRoles::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(AdminRoles::AdminUserId).uuid().not_null())
                    .col(ColumnDef::new(AdminRoles::Role).string().not_null())
                    .primary_key(
                        Index::create()
                            .col(AdminRoles::AdminUserId)
                            .col(AdminRoles::Role),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_roles_admin_user")
                            .from(AdminRoles::Table, AdminRoles::AdminUserId)
                            .to(AdminUsers::Table, AdminUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminTokens::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminTokens::Kind).string().not_null())
                    .col(ColumnDef::new(AdminTokens::AdminUserId).uuid().not_null())
                    .col(ColumnDef::new(AdminTokens::TfaCode).string())
                    .col(
                        ColumnDef::new(AdminTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_tokens_admin_user")
                            .from(AdminTokens::Table, AdminTokens::AdminUserId)
                            .to(AdminUsers::Table, AdminUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(AdminSessions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AdminSessions::Token)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AdminSessions::AdminUserId).uuid().not_null())
                    .col(
                        ColumnDef::new(AdminSessions::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(AdminSessions::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_admin_sessions_admin_user")
                            .from(AdminSessions::Table, AdminSessions::AdminUserId)
                            .to(AdminUsers::Table, AdminUsers::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(AdminSessions::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminRoles::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(AdminUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgSignupTokens::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(OrgUsers::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(EmployerDomains::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Employers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Employers {
    Table,
    Id,
    DisplayName,
    HomeRegion,
    CreatedAt,
}

#[derive(DeriveIden)]
enum EmployerDomains {
    Table,
    Domain,
    EmployerId,
    Region,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OrgUsers {
    Table,
    Id,
    EmailHash,
    EmployerId,
    HomeRegion,
    Status,
    FullName,
    PreferredLanguage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum OrgSignupTokens {
    Table,
    Token,
    Email,
    Region,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum AdminUsers {
    Table,
    Id,
    Email,
    PasswordHash,
    Status,
    FullName,
    PreferredLanguage,
    CreatedAt,
}

#[derive(DeriveIden)]
enum AdminRoles {
    Table,
    AdminUserId,
    Role,
}

#[derive(DeriveIden)]
enum AdminTokens {
    Table,
    Token,
    Kind,
    AdminUserId,
    TfaCode,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum AdminSessions {
    Table,
    Token,
    AdminUserId,
    CreatedAt,
    ExpiresAt,
}

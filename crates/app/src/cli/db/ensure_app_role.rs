use clap::Args;
use sqlx::{Postgres, Transaction, query, query_scalar};
use syncbridge_app::database;

/// Attributes that keep the runtime role subject to tenant policies.
const ROLE_ATTRIBUTES: &str = "NOSUPERUSER NOCREATEDB NOCREATEROLE NOREPLICATION NOBYPASSRLS";

#[derive(Debug, Args)]
pub(crate) struct EnsureAppRoleArgs {
    /// Administrative PostgreSQL connection string
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    database_url: String,

    /// Role the server and workers connect as
    #[arg(long, default_value = "syncbridge_app")]
    role_name: String,

    /// Password for the runtime role
    #[arg(long, env = "APP_DB_PASSWORD", hide_env_values = true)]
    password: String,
}

/// `CREATE ROLE` or `ALTER ROLE` for already-quoted identifiers.
fn role_statement(exists: bool, role: &str, password: &str) -> String {
    let verb = if exists { "ALTER" } else { "CREATE" };

    format!("{verb} ROLE {role} LOGIN PASSWORD {password} {ROLE_ATTRIBUTES}")
}

/// Table access for every current and future table in `public`. Ids are uuids, so no
/// sequence grants are needed.
fn grant_statements(database: &str, role: &str) -> [String; 4] {
    [
        format!("GRANT CONNECT ON DATABASE {database} TO {role}"),
        format!("GRANT USAGE ON SCHEMA public TO {role}"),
        format!("GRANT SELECT, INSERT, UPDATE, DELETE ON ALL TABLES IN SCHEMA public TO {role}"),
        format!(
            "ALTER DEFAULT PRIVILEGES IN SCHEMA public \
             GRANT SELECT, INSERT, UPDATE, DELETE ON TABLES TO {role}"
        ),
    ]
}

/// Quote `value` server-side; identifiers and passwords cannot be bound in DDL.
async fn quoted(
    tx: &mut Transaction<'static, Postgres>,
    function: &str,
    value: &str,
) -> Result<String, String> {
    query_scalar(&format!("SELECT {function}($1)"))
        .bind(value)
        .fetch_one(&mut **tx)
        .await
        .map_err(|error| format!("failed to {function} value: {error}"))
}

pub(crate) async fn run(args: EnsureAppRoleArgs) -> Result<(), String> {
    if args.role_name.trim().is_empty() {
        return Err("role_name cannot be empty".to_string());
    }

    if args.password.trim().is_empty() {
        return Err("password cannot be empty".to_string());
    }

    let pool = database::connect(&args.database_url)
        .await
        .map_err(|error| format!("failed to connect to database: {error}"))?;

    let mut tx = pool
        .begin()
        .await
        .map_err(|error| format!("failed to start transaction: {error}"))?;

    let role = quoted(&mut tx, "quote_ident", &args.role_name).await?;
    let password = quoted(&mut tx, "quote_literal", &args.password).await?;

    let exists: bool = query_scalar("SELECT EXISTS (SELECT 1 FROM pg_roles WHERE rolname = $1)")
        .bind(&args.role_name)
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to check role existence: {error}"))?;

    query(&role_statement(exists, &role, &password))
        .execute(&mut *tx)
        .await
        .map_err(|error| format!("failed to create/update role: {error}"))?;

    let database: String = query_scalar("SELECT quote_ident(current_database())")
        .fetch_one(&mut *tx)
        .await
        .map_err(|error| format!("failed to resolve database name: {error}"))?;

    for sql in grant_statements(&database, &role) {
        query(&sql)
            .execute(&mut *tx)
            .await
            .map_err(|error| format!("failed to apply `{sql}`: {error}"))?;
    }

    tx.commit()
        .await
        .map_err(|error| format!("failed to commit changes: {error}"))?;

    println!("ensured app role: {}", args.role_name);

    Ok(())
}

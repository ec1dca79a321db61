use std::{
    io::{self, BufRead, Write},
    path::{Path, PathBuf},
};
use tokio_postgres::IsolationLevel;

use crate::{prelude::*, config::Config};
use super::{Db, create_pool, migrations};


#[derive(Debug, clap::Subcommand)]
pub(crate) enum DbCommand {
    /// Removes all data and tables from the database.
    Clear,

    /// Runs an `.sql` script with the configured database connection.
    Script {
        /// Path to a file containing an SQL script.
        script: PathBuf,
    },

    /// Runs the database migrations that also automatically run when starting
    /// the server.
    Migrate,

    /// Equivalent to `db clear` followed by `db migrate`.
    Reset,
}

/// Entry point for `db` commands.
pub(crate) async fn run(cmd: &DbCommand, config: &Config) -> Result<()> {
    // Connect to database
    let pool = create_pool(&config.db).await?;
    let mut db = pool.get().await?;

    // Dispatch command
    match cmd {
        DbCommand::Clear => clear(&mut db, config).await?,
        DbCommand::Migrate => super::migrate(&mut db).await?,
        DbCommand::Reset => {
            clear(&mut db, config).await?;
            super::migrate(&mut db).await?;
        }
        DbCommand::Script { script } => run_script(&db, script).await?,
    }

    Ok(())
}


/// Clears the whole database by removing and re-creating the `public` schema.
///
/// This has an interactive check, asking the user to confirm the removal.
async fn clear(db: &mut Db, config: &Config) -> Result<()> {
    let tx = db.build_transaction()
        .isolation_level(IsolationLevel::Serializable)
        .start()
        .await?;

    warn!("You are about to delete all existing data, tables, types and everything in \
        the 'public' schema of the database!");

    println!();
    println!("Database host: {}", config.db.host);
    println!("Database name: {}", config.db.database);

    println!();
    println!("The database currently holds these tables:");
    let tables = migrations::all_table_names(&tx).await?;
    for name in &tables {
        let num_rows = tx.query_one(&*format!("select count(*) from {name}"), &[])
            .await?
            .get::<_, i64>(0);
        println!(" - {name} ({num_rows} rows)");
    }

    println!();
    println!("Are you sure you want to completely remove everything in this database? \
        This completely drops the 'public' schema. \
        Please double-check the server you are running this on!\n\
        Type 'yes' to proceed to delete the data.");
    prompt_for_yes()?;

    // We clear everything by dropping the 'public' schema. This is suggested
    // here, for example: https://stackoverflow.com/a/21247009/2408867
    tx.execute("drop schema public cascade", &[]).await?;
    tx.execute("create schema public", &[]).await?;
    tx.execute(&*format!("grant all on schema public to {}", config.db.user), &[]).await?;
    tx.execute("grant all on schema public to public", &[]).await?;
    tx.execute("comment on schema public is 'standard public schema'", &[]).await?;
    tx.commit().await.context("failed to commit clear transaction")?;

    info!("Dropped and recreated schema 'public'");

    Ok(())
}

async fn run_script(db: &Db, script_path: &Path) -> Result<()> {
    let script = tokio::fs::read_to_string(script_path)
        .await
        .context(format!("failed to read script file '{}'", script_path.display()))?;

    db.batch_execute(&script).await.context("failed to execute script")?;
    info!("Successfully ran SQL script");

    Ok(())
}

/// Reads a line from stdin and returns `Ok` only if it is exactly "yes".
fn prompt_for_yes() -> Result<()> {
    print!("> ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("could not read from stdin")?;

    if line.trim() == "yes" {
        Ok(())
    } else {
        println!("Answer was not 'yes'. Aborting.");
        bail!("user did not confirm checking: operation was aborted.");
    }
}

use clap::Parser as ClapParser;
use repo_index::cli::Args;
use repo_index::config::{init_logging, RuntimeConfig};
use repo_index::db::Database;
use repo_index::error::IndexError;
use repo_index::{run_delete, run_sync};
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    init_logging();
    let args = Args::parse();
    let config = RuntimeConfig::from_env();

    if let Err(err) = dispatch(args, config).await {
        eprintln!("index: {err}");
        return exit_code_for(&err);
    }
    ExitCode::SUCCESS
}

async fn dispatch(args: Args, config: RuntimeConfig) -> Result<(), IndexError> {
    let db = Database::open(&args.database).await?;

    if let Some(path) = args.path {
        run_sync(&db, &path, config).await?;
    } else if let Some(name) = args.delete {
        run_delete(&db, &name).await?;
    } else {
        unreachable!("clap's ArgGroup guarantees exactly one of path/delete is set");
    }

    Ok(())
}

/// Fatal errors (schema/open failures) get a distinct exit code from
/// operation-fatal ones, so callers can tell "database is broken" apart
/// from "this particular sync failed".
fn exit_code_for(err: &IndexError) -> ExitCode {
    match err {
        IndexError::Schema(_) => ExitCode::from(2),
        IndexError::UnknownRepository(_) => ExitCode::from(3),
        IndexError::Naming(_) | IndexError::Sync(_) => ExitCode::FAILURE,
    }
}

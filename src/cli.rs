use clap::{ArgGroup, Parser as ClapParser};
use std::path::PathBuf;

/// Sync a bare repository into a database, or delete a registered repository.
#[derive(ClapParser, Debug)]
#[command(
    name = "index",
    author,
    version,
    about = "Incrementally index a bare git repository's commit graph, file changes, and refs",
    long_about = None
)]
#[command(group(ArgGroup::new("action").args(["path", "delete"]).required(true)))]
pub struct Args {
    /// Path to the target database file
    #[arg(short = 't', long = "target", value_name = "DATABASE")]
    pub database: PathBuf,

    /// Path to the bare repository to sync
    #[arg(short = 'p', long = "path", value_name = "GIT_DIR")]
    pub path: Option<PathBuf>,

    /// Name of a previously registered repository to delete
    #[arg(short = 'd', long = "delete", value_name = "NAME")]
    pub delete: Option<String>,
}

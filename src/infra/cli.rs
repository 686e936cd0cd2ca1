use clap::Parser;

#[derive(Parser, Debug, Default)]
#[command(version, about = "Storefront server for digital design assets")]
pub struct Cli {
    /// Serve from an in-memory store instead of Postgres. Nothing is persisted.
    #[arg(long)]
    pub in_memory: bool,

    /// Create or update the admin account named in the `auth.seed_admin` settings.
    #[arg(long)]
    pub seed_admin: bool,
}

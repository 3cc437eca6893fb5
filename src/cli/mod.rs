pub mod commands;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "project-dashboard")]
#[command(about = "Project Dashboard API - projects, milestones, tasks and time tracking")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Run the HTTP API (default when no command is given)")]
    Serve {
        #[arg(long, help = "Port to listen on (overrides API_PORT/PORT)")]
        port: Option<u16>,
    },

    #[command(about = "Apply database migrations and exit")]
    Migrate,

    #[command(about = "Create an admin account without going through the API")]
    CreateAdmin {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.command.unwrap_or(Commands::Serve { port: None }) {
        Commands::Serve { port } => commands::serve::handle(port).await,
        Commands::Migrate => commands::migrate::handle().await,
        Commands::CreateAdmin {
            username,
            email,
            password,
        } => commands::admin::handle(username, email, password).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_create_admin() {
        let cli = Cli::parse_from([
            "project-dashboard",
            "create-admin",
            "--username",
            "root",
            "--email",
            "root@example.com",
            "--password",
            "change-me-now",
        ]);
        assert!(matches!(cli.command, Some(Commands::CreateAdmin { ref username, .. }) if username == "root"));
    }

    #[test]
    fn no_command_means_serve() {
        let cli = Cli::parse_from(["project-dashboard"]);
        assert!(cli.command.is_none());
        let cli = Cli::parse_from(["project-dashboard", "serve", "--port", "9001"]);
        assert!(matches!(cli.command, Some(Commands::Serve { port: Some(9001) })));
    }
}

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "vimtodo")]
#[command(about = "Vim-style terminal client for vimtodo")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Run against a real vimtodo-api server (the default)
    Run,
    /// Run in dev mode with local in-memory data
    Dev,
    /// Authenticate and save the session
    Login {
        /// Log in with email and password instead of the browser
        #[arg(long)]
        password: bool,
        /// Email for password login; prompted for when omitted
        #[arg(long, requires = "password")]
        email: Option<String>,
    },
    /// End the server session and remove the local one
    Logout,
    /// Print config path and create default file if missing
    ConfigPath,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subcommands() {
        let cli = Cli::try_parse_from(["vimtodo"]).unwrap();
        assert!(cli.command.is_none());

        let cli =
            Cli::try_parse_from(["vimtodo", "login", "--password", "--email", "a@b.c"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Login { password: true, email: Some(ref e) }) if e == "a@b.c"
        ));

        assert!(Cli::try_parse_from(["vimtodo", "login", "--email", "a@b.c"]).is_err());
    }
}

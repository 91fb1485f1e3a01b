use clap::{Args, Subcommand};

use roster_core::{LocalCache, SnapshotCache};

#[derive(Args)]
pub struct TokenCommand {
    #[command(subcommand)]
    pub command: TokenSubcommand,
}

#[derive(Subcommand)]
pub enum TokenSubcommand {
    /// Store the bearer token sent with API requests
    Set {
        token: String,
    },

    /// Show whether a token is stored
    Show {
        /// Print the full token instead of a masked one
        #[arg(long)]
        reveal: bool,
    },

    /// Remove the stored token
    Clear,
}

impl TokenCommand {
    pub async fn run(&self, cache: &LocalCache) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TokenSubcommand::Set { token } => {
                let token = token.trim();
                if token.is_empty() {
                    return Err("Token cannot be empty".into());
                }
                cache.write_token(token).await?;
                println!("Token saved.");
                Ok(())
            }

            TokenSubcommand::Show { reveal } => {
                match cache.read_token().await {
                    Some(token) if *reveal => println!("{}", token),
                    Some(token) => println!("{}", mask(&token)),
                    None => println!("No token stored. Requests are sent unauthenticated."),
                }
                Ok(())
            }

            TokenSubcommand::Clear => {
                cache.clear_token().await?;
                println!("Token cleared.");
                Ok(())
            }
        }
    }
}

fn mask(token: &str) -> String {
    let visible: String = token.chars().take(4).collect();
    if token.chars().count() <= 8 {
        "********".to_string()
    } else {
        format!("{}********", visible)
    }
}

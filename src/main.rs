use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "gachatalk")]
#[command(version)]
#[command(
    about = "Spin a conversation-starter gacha backed by a text-generation API",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate one conversation theme and hint
    #[clap(visible_alias = "s")]
    Spin {
        /// Keyword to bias the theme toward
        #[arg(short, long)]
        keyword: Option<String>,
        /// Resolve a concrete entity for the keyword before generating
        #[arg(short, long)]
        specific: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Spin { keyword, specific } => gachatalk::spin(keyword.as_deref(), specific),
    };

    match result {
        Ok(record) => match serde_json::to_string_pretty(&record) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

use anyhow::{Result, bail};
use clap::{Parser, Subcommand};
use letterpad_application::SaveOutcome;
use letterpad_core::letter::{LetterBuffer, SaveTarget};
use letterpad_infrastructure::AppConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod app;

#[derive(Parser)]
#[command(name = "letterpad")]
#[command(about = "Letterpad - letter writing with draft and cloud persistence", long_about = None)]
struct Cli {
    /// Path to letterpad.toml (default: ~/.letterpad/letterpad.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Email for password sign-in
    #[arg(long, global = true)]
    email: Option<String>,

    /// Password for password sign-in
    #[arg(long, global = true)]
    password: Option<String>,

    /// Sign in through the Google consent flow instead
    #[arg(long, global = true)]
    google: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Verify sign-in and mirror tokens to local storage
    Login,
    /// Clear the session and every cached token
    Logout,
    /// List your letters
    List,
    /// Show a letter by id
    Show {
        id: String,
        /// Print the cloud copy instead of the stored content
        #[arg(long)]
        cloud: bool,
    },
    /// Save a letter as a draft or to cloud storage
    Save {
        /// Existing letter id; omit to create a new letter
        #[arg(long)]
        id: Option<String>,
        #[arg(long)]
        title: Option<String>,
        /// Inline content; mutually exclusive with --file
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,
        /// Read content from a file
        #[arg(long)]
        file: Option<PathBuf>,
        /// Save to cloud storage instead of a draft
        #[arg(long)]
        cloud: bool,
    },
    /// Fetch raw cloud file content by file id
    Fetch { file_id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    let app = app::build(config)?;

    app.session.restore().await?;
    if cli.google {
        app.session.sign_in_with_google().await?;
        app.session.start_refresh_scheduler();
    } else if let (Some(email), Some(password)) = (&cli.email, &cli.password) {
        app.session.sign_in(email, password).await?;
        app.session.start_refresh_scheduler();
    }

    match cli.command {
        Commands::Login => {
            let Some(credential) = app.session.credential().await else {
                bail!("provide --email and --password, or --google");
            };
            println!(
                "signed in as {} ({})",
                credential.user.email.as_deref().unwrap_or("unknown"),
                credential.user.uid
            );
        }
        Commands::Logout => {
            app.session.logout().await?;
        }
        Commands::List => {
            for letter in app.letters.list().await? {
                let updated = letter
                    .updated_at
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_else(|| "-".to_string());
                println!("{}  {:?}  {}  {}", letter.id, letter.status, updated, letter.title);
            }
        }
        Commands::Show { id, cloud } => {
            let Some(letter) = app.letters.load(&id).await? else {
                bail!("no letter with id {id}");
            };
            if cloud {
                let Some(file_id) = &letter.cloud_file_id else {
                    bail!("letter {id} has never been saved to cloud storage");
                };
                println!("{}", app.letters.fetch_cloud_content(file_id).await?);
            } else {
                println!("{}\n\n{}", letter.title, letter.content);
            }
        }
        Commands::Save {
            id,
            title,
            content,
            file,
            cloud,
        } => {
            let mut buffer = match &id {
                Some(existing) => match app.letters.load(existing).await? {
                    Some(letter) => LetterBuffer::from_letter(&letter),
                    None => bail!("no letter with id {existing}"),
                },
                None => LetterBuffer::default(),
            };
            if let Some(title) = title {
                buffer.title = title;
            }
            if let Some(content) = content {
                buffer.content = content;
            } else if let Some(path) = file {
                buffer.content = std::fs::read_to_string(&path)?;
            }

            let target = if cloud {
                SaveTarget::Cloud
            } else {
                SaveTarget::Draft
            };
            match app.letters.save(&buffer, target).await? {
                SaveOutcome::Saved { letter_id, created } => {
                    if created {
                        println!("created letter {letter_id}");
                    } else {
                        println!("updated letter {letter_id}");
                    }
                }
                SaveOutcome::Skipped => {
                    bail!("not signed in; nothing was saved");
                }
            }
        }
        Commands::Fetch { file_id } => {
            println!("{}", app.letters.fetch_cloud_content(&file_id).await?);
        }
    }

    Ok(())
}

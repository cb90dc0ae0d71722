//! Qeta CLI
//!
//! Command-line interface for qeta - questions and answers knowledge base.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use qeta_core::{Config, Store};

mod commands;
mod editor;
mod output;

use commands::question::{EditArgs, ListArgs};
use commands::stats::Metric;
use commands::Direction;
use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "qeta")]
#[command(about = "qeta - Questions and answers knowledge base")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - ids only
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Act as this user (defaults to default_user from the config)
    #[arg(short, long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ask, browse and manage questions
    #[command(alias = "q")]
    Question {
        #[command(subcommand)]
        command: QuestionCommands,
    },
    /// Post and manage answers
    #[command(alias = "a")]
    Answer {
        #[command(subcommand)]
        command: AnswerCommands,
    },
    /// List all tags with usage counts
    Tags,
    /// Show usage statistics over time
    Stats {
        /// Which statistic to show
        #[arg(value_enum)]
        metric: Metric,
        /// Only count content by this author
        #[arg(short, long)]
        author: Option<String>,
        /// Bucket size: day, week, month or year
        #[arg(short, long, default_value = "day")]
        granularity: String,
        /// First day to include (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// First day to exclude (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
    },
    /// Store and fetch attachments
    Attachment {
        #[command(subcommand)]
        command: AttachmentCommands,
    },
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand)]
enum QuestionCommands {
    /// Ask a new question
    #[command(alias = "new")]
    Ask {
        /// Question title
        title: String,
        /// Question body in markdown (opens editor if not provided)
        #[arg(short, long)]
        body: Option<String>,
        /// Tags to add
        #[arg(short, long)]
        tag: Vec<String>,
        /// Catalog entities the question is about
        #[arg(short, long)]
        entity: Vec<String>,
        /// Attachment ids to link
        #[arg(short, long)]
        image: Vec<i64>,
    },
    /// Show a question with answers and comments
    Show {
        /// Question id
        id: i64,
        /// Do not count this as a view
        #[arg(long)]
        no_view: bool,
    },
    /// List questions
    #[command(alias = "ls")]
    List(ListArgs),
    /// Edit one of your questions
    Edit {
        /// Question id
        id: i64,
        #[command(flatten)]
        changes: EditArgs,
    },
    /// Delete one of your questions
    #[command(alias = "rm")]
    Delete {
        /// Question id
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Vote on a question
    Vote {
        /// Question id
        id: i64,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Add a question to your favorites
    Favorite {
        /// Question id
        id: i64,
    },
    /// Remove a question from your favorites
    Unfavorite {
        /// Question id
        id: i64,
    },
    /// Comment on a question
    Comment {
        /// Question id
        id: i64,
        /// Comment text
        content: String,
    },
    /// Delete one of your comments on a question
    Uncomment {
        /// Question id
        id: i64,
        /// Comment id
        comment_id: i64,
    },
}

#[derive(Subcommand)]
enum AnswerCommands {
    /// Answer a question
    Post {
        /// Question id
        question_id: i64,
        /// Answer body in markdown (opens editor if not provided)
        #[arg(short, long)]
        body: Option<String>,
        /// Attachment ids to link
        #[arg(short, long)]
        image: Vec<i64>,
    },
    /// Show an answer
    Show {
        /// Answer id
        id: i64,
    },
    /// Edit one of your answers
    Edit {
        /// Answer id
        id: i64,
        /// New body (opens editor if nothing else is changed)
        #[arg(short, long)]
        body: Option<String>,
        /// Replace linked attachment ids
        #[arg(short, long)]
        image: Vec<i64>,
        /// Unlink all attachments
        #[arg(long, conflicts_with = "image")]
        clear_images: bool,
    },
    /// Delete one of your answers
    #[command(alias = "rm")]
    Delete {
        /// Answer id
        id: i64,
        /// Skip confirmation
        #[arg(short, long)]
        yes: bool,
    },
    /// Vote on an answer
    Vote {
        /// Answer id
        id: i64,
        #[arg(value_enum)]
        direction: Direction,
    },
    /// Mark an answer to your question as correct
    Accept {
        /// Answer id
        id: i64,
    },
    /// Clear the correct mark of an answer to your question
    Reject {
        /// Answer id
        id: i64,
    },
    /// Comment on an answer
    Comment {
        /// Answer id
        id: i64,
        /// Comment text
        content: String,
    },
    /// Delete one of your comments on an answer
    Uncomment {
        /// Answer id
        id: i64,
        /// Comment id
        comment_id: i64,
    },
}

#[derive(Subcommand)]
enum AttachmentCommands {
    /// Store a file
    Add {
        /// File to store
        file: PathBuf,
        /// Record an external location instead of storing the bytes
        #[arg(long)]
        external: Option<String>,
    },
    /// Show an attachment or save its content
    Get {
        /// Attachment uuid
        uuid: String,
        /// Write the content to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (data_dir, default_user, page_size, max_page_size, trend_gravity)
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Log to stderr; QETA_LOG takes precedence over RUST_LOG, default is warn
fn init_logging() {
    let filter = EnvFilter::try_from_env("QETA_LOG")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// The acting user: `--user`, else the configured default
fn resolve_user(flag: Option<String>, config: &Config) -> Result<String> {
    flag.or_else(|| config.default_user.clone())
        .filter(|u| !u.trim().is_empty())
        .context("No user given. Pass --user or run `qeta config set default_user <name>`")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));

    // Config commands don't need the store
    if let Commands::Config { command } = &cli.command {
        return match command.clone() {
            Some(ConfigCommands::Show) | None => commands::config::show(&output),
            Some(ConfigCommands::Set { key, value }) => commands::config::set(key, value, &output),
        };
    }

    let config = Config::load().context("Failed to load configuration")?;
    let store = Store::open(&config).context("Failed to open database")?;
    debug!("Opened store at {:?}", config.sqlite_path());

    match cli.command {
        Commands::Question { command } => {
            let user = resolve_user(cli.user, &config)?;
            handle_question_command(command, &store, &user, &output)
        }
        Commands::Answer { command } => handle_answer_command(command, &store, cli.user, &config, &output),
        Commands::Tags => commands::tag::list(&store, &output),
        Commands::Stats {
            metric,
            author,
            granularity,
            from,
            to,
        } => {
            let request = commands::stats::build_request(
                author,
                &granularity,
                from.as_deref(),
                to.as_deref(),
            )?;
            commands::stats::show(&store, metric, &request, &output)
        }
        Commands::Attachment { command } => match command {
            AttachmentCommands::Add { file, external } => {
                let creator = cli.user.or(config.default_user.clone());
                commands::attachment::add(&store, creator.as_deref(), file, external, &output)
            }
            AttachmentCommands::Get { uuid, output: out } => {
                commands::attachment::get(&store, uuid, out, &output)
            }
        },
        Commands::Config { .. } => Ok(()), // Handled above
    }
}

fn handle_question_command(
    command: QuestionCommands,
    store: &Store,
    user: &str,
    output: &Output,
) -> Result<()> {
    use commands::question;

    match command {
        QuestionCommands::Ask {
            title,
            body,
            tag,
            entity,
            image,
        } => question::ask(store, user, title, body, tag, entity, image, output),
        QuestionCommands::Show { id, no_view } => question::show(store, user, id, !no_view, output),
        QuestionCommands::List(args) => question::list(store, user, &args, output),
        QuestionCommands::Edit { id, changes } => question::edit(store, user, id, &changes, output),
        QuestionCommands::Delete { id, yes } => question::delete(store, user, id, yes, output),
        QuestionCommands::Vote { id, direction } => question::vote(store, user, id, direction, output),
        QuestionCommands::Favorite { id } => question::favorite(store, user, id, true, output),
        QuestionCommands::Unfavorite { id } => question::favorite(store, user, id, false, output),
        QuestionCommands::Comment { id, content } => question::comment(store, user, id, content, output),
        QuestionCommands::Uncomment { id, comment_id } => {
            question::uncomment(store, user, id, comment_id, output)
        }
    }
}

fn handle_answer_command(
    command: AnswerCommands,
    store: &Store,
    user_flag: Option<String>,
    config: &Config,
    output: &Output,
) -> Result<()> {
    use commands::answer;

    // Reading an answer needs no identity
    if let AnswerCommands::Show { id } = command {
        return answer::show(store, id, output);
    }
    let user = resolve_user(user_flag, config)?;
    let user = user.as_str();

    match command {
        AnswerCommands::Post {
            question_id,
            body,
            image,
        } => answer::post(store, user, question_id, body, image, output),
        AnswerCommands::Show { id } => answer::show(store, id, output),
        AnswerCommands::Edit {
            id,
            body,
            image,
            clear_images,
        } => answer::edit(store, user, id, body, image, clear_images, output),
        AnswerCommands::Delete { id, yes } => answer::delete(store, user, id, yes, output),
        AnswerCommands::Vote { id, direction } => answer::vote(store, user, id, direction, output),
        AnswerCommands::Accept { id } => answer::mark(store, user, id, true, output),
        AnswerCommands::Reject { id } => answer::mark(store, user, id, false, output),
        AnswerCommands::Comment { id, content } => answer::comment(store, user, id, content, output),
        AnswerCommands::Uncomment { id, comment_id } => {
            answer::uncomment(store, user, id, comment_id, output)
        }
    }
}

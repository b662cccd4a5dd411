use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process;
use std::str::FromStr;

use clap::{Parser, Subcommand, ValueEnum};
use log::error;
use rand::seq::SliceRandom;

use pollvote_client::{
    build_chain,
    model::{Question, QuestionId, VoteOutcome, VoteRequest},
    reveal_milestone, ApiClient, Config, MilestoneDraft, QuestionDraft, QuestionService,
};

#[derive(Parser)]
#[command(name = "pollvote", about = "Command-line client for the Poll Voting service")]
struct Args {
    /// Base URL of the service API.
    #[arg(long, env = "POLLVOTE_API_URL", default_value = "http://localhost:8080/api")]
    api_url: String,

    /// Request deadline in seconds.
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    /// File used to persist the bearer token between runs.
    #[arg(long, default_value = ".pollvote-token")]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account.
    Register {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log in and persist the bearer token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Log out and discard the persisted token.
    Logout,
    /// Show the logged-in user's profile.
    Profile,
    /// List today's main questions.
    Today,
    /// Show one random main question from today's cache.
    Random,
    /// Show one question by id.
    Show { id: String },
    /// Vote on a question and surface any milestone it reveals.
    Vote {
        id: String,
        /// Which of the two choices to vote for.
        #[arg(long, value_enum, default_value_t = Choice::First)]
        choice: Choice,
    },
    /// Create a question, optionally with chained milestone questions.
    Create {
        #[arg(long)]
        text: String,
        #[arg(long)]
        first_choice: String,
        #[arg(long)]
        second_choice: String,
        /// Milestone in the form `threshold:text:first:second`; repeatable.
        #[arg(long = "milestone")]
        milestones: Vec<MilestoneArg>,
    },
    /// Show the most recently archived question.
    Last,
}

#[derive(Debug, Copy, Clone, ValueEnum)]
enum Choice {
    First,
    Second,
}

/// Milestone argument of the form `threshold:text:first:second`.
#[derive(Debug, Clone)]
struct MilestoneArg(MilestoneDraft);

impl FromStr for MilestoneArg {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = raw.splitn(4, ':').collect();
        if fields.len() != 4 {
            return Err("expected threshold:text:first:second".to_string());
        }
        let threshold = fields[0]
            .trim()
            .parse::<u32>()
            .map_err(|_| format!("invalid threshold {:?}", fields[0]))?;
        Ok(Self(MilestoneDraft {
            threshold,
            text: fields[1].to_string(),
            first_choice: fields[2].to_string(),
            second_choice: fields[3].to_string(),
        }))
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let config = Config::new(&args.api_url, args.timeout);
    let client = ApiClient::with_config(&config)?;
    if let Some(token) = load_token(&args.token_file) {
        client.session().set_token(token);
    }

    match args.command {
        Command::Register { email, password } => {
            let user = client.register(&email, &password).await?;
            println!("registered {} (user id {})", user.email, user.user_id);
        }
        Command::Login { email, password } => {
            client.login(&email, &password).await?;
            println!("logged in as {email}");
        }
        Command::Logout => {
            client.logout().await?;
            println!("logged out");
        }
        Command::Profile => {
            let profile = client.profile().await?;
            println!("{} ({})", profile.email, profile.user_id);
        }
        Command::Today => {
            let questions = client.main_questions_today().await?;
            if questions.is_empty() {
                println!("no questions in today's cache");
            }
            for question in &questions {
                print_question(question);
            }
        }
        Command::Random => {
            let questions = client.main_questions_today().await?;
            match questions.choose(&mut rand::thread_rng()) {
                Some(question) => print_question(question),
                None => println!("no questions in today's cache"),
            }
        }
        Command::Show { id } => {
            let question = client.question(&QuestionId::from(id)).await?;
            print_question(&question);
        }
        Command::Vote { id, choice } => {
            let id = QuestionId::from(id);
            let profile = client.profile().await?;
            let outcome = client
                .vote(&VoteRequest {
                    question_id: id.clone(),
                    is_first_choice: matches!(choice, Choice::First),
                    user_id: profile.user_id,
                })
                .await?;
            match outcome {
                VoteOutcome::AlreadyVoted => {
                    println!("you have already voted on this question");
                }
                VoteOutcome::Counted(receipt) => {
                    println!(
                        "vote counted: {} vs {} ({} participants)",
                        receipt.first_choice_count,
                        receipt.second_choice_count,
                        receipt.total_participants
                    );
                    let updated = client.question(&id).await?;
                    if let Some(milestone) = reveal_milestone(&client, &updated).await? {
                        println!("milestone question unlocked:");
                        print_question(&milestone);
                        println!("vote on it with `pollvote vote {}`", milestone.question_id);
                    }
                }
            }
        }
        Command::Create {
            text,
            first_choice,
            second_choice,
            milestones,
        } => {
            let drafts = milestones.into_iter().map(|arg| arg.0).collect();
            let chain = build_chain(
                &client,
                QuestionDraft {
                    text,
                    first_choice,
                    second_choice,
                },
                drafts,
            )
            .await?;
            println!("created question {}", chain.main);
            for entry in chain.schedule.iter() {
                println!("  milestone at {} votes: {}", entry.threshold, entry.question);
            }
        }
        Command::Last => {
            let archived = client.last_archived().await?;
            println!(
                "[{}] {} (archived {})",
                archived.question_id, archived.question_text, archived.archive_date
            );
            println!(
                "    {} ({}) vs {} ({}), {} participants",
                archived.first_choice,
                archived.first_choice_count,
                archived.second_choice,
                archived.second_choice_count,
                archived.total_participants
            );
        }
    }

    store_token(&args.token_file, client.session().token())?;
    Ok(())
}

fn print_question(question: &Question) {
    println!("[{}] {}", question.question_id, question.text);
    println!(
        "    {} ({}) vs {} ({}), {} participants",
        question.first_choice,
        question.first_choice_count,
        question.second_choice,
        question.second_choice_count,
        question.total_participants
    );
}

/// The token persisted by a previous run, if any.
fn load_token(path: &Path) -> Option<String> {
    match fs::read_to_string(path) {
        Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
        _ => None,
    }
}

/// Persist the session token for the next run, or remove the file when the
/// session ended without one.
fn store_token(path: &Path, token: Option<String>) -> std::io::Result<()> {
    match token {
        Some(token) => fs::write(path, token),
        None => match fs::remove_file(path) {
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            other => other,
        },
    }
}

#[tokio::main]
async fn main() {
    // Set up logging.
    log4rs::init_file("log4rs.yaml", Default::default()).expect("Failed to initialise logging");

    if let Err(err) = run(Args::parse()).await {
        error!("{err}");
        process::exit(1)
    }
}

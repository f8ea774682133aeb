//! craftgraph binary: start, resume and inspect upcycling workflow threads.

use std::io::{BufRead, Write};

use clap::{Parser, Subcommand};
use craftgraph_cli::{
    build_orchestrator, init_tracing, new_thread_id, render_report, render_status, resume,
    run_interactive, start, state, status, Error, RunConfig, RunOptions,
};

#[derive(Parser, Debug)]
#[command(name = "craftgraph")]
#[command(about = "Turn leftover household materials into an upcycled product package")]
struct Args {
    /// Answer every model call with the offline fallbacks (no API key needed)
    #[arg(long, global = true)]
    offline: bool,

    /// SQLite file holding thread checkpoints (default: DB_PATH or craftgraph.db)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<String>,

    /// Model name override (default: OPENAI_MODEL or gpt-4o-mini)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Print node progress and debug logs to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start a new workflow from a description of your materials
    Start {
        /// Thread id (default: THREAD_ID or a generated one)
        #[arg(short, long)]
        thread: Option<String>,
        /// Ask questions on the terminal and keep going until the run completes
        #[arg(short, long)]
        interactive: bool,
        /// What you have, e.g. "3 plastic water bottles and some twine"
        #[arg(required = true, trailing_var_arg = true)]
        input: Vec<String>,
    },
    /// Answer the pending question of a thread
    Resume {
        thread: String,
        #[arg(required = true, trailing_var_arg = true)]
        answer: Vec<String>,
    },
    /// Show phase, pending questions and errors of a thread
    Status { thread: String },
    /// Print the saved state of a thread as JSON
    Show { thread: String },
}

fn prompt_answer(question: &str) -> Result<String, Error> {
    print!("{} > ", question);
    std::io::stdout().flush()?;
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

async fn execute(args: Args) -> Result<(), Error> {
    let options = RunOptions {
        model: args.model,
        db_path: args.db,
        offline: args.offline,
        verbose: args.verbose,
    };
    let config = RunConfig::load(&options)?;
    let orchestrator = build_orchestrator(&config)?;

    match args.command {
        Command::Start {
            thread,
            interactive,
            input,
        } => {
            let thread_id = thread
                .or_else(|| std::env::var("THREAD_ID").ok())
                .unwrap_or_else(new_thread_id);
            let input = input.join(" ");
            let report = if interactive {
                run_interactive(&orchestrator, &thread_id, &input, |report| {
                    let question = report.questions.last().map(String::as_str).unwrap_or("?");
                    prompt_answer(question)
                })
                .await?
            } else {
                start(&orchestrator, &thread_id, &input).await?
            };
            print!("{}", render_report(&report));
        }
        Command::Resume { thread, answer } => {
            let report = resume(&orchestrator, &thread, &answer.join(" ")).await?;
            print!("{}", render_report(&report));
        }
        Command::Status { thread } => {
            let view = status(&orchestrator, &thread).await?;
            print!("{}", render_status(&view));
        }
        Command::Show { thread } => {
            let state = state(&orchestrator, &thread).await?;
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse();
    if let Err(e) = init_tracing(args.verbose) {
        eprintln!("warning: tracing not initialized: {}", e);
    }
    if let Err(e) = execute(args).await {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

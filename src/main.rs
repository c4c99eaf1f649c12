use anyhow::Result;
use clap::Parser;
use page_reader::cli::commands::PageArgs;
use page_reader::cli::{Cli, Commands};
use page_reader::{utils, FileExtractor, IndexOutcome, SessionHandle, Settings};
use tokio::io::{self, AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let settings = Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&settings.logging.level)),
        )
        .init();

    let cli = Cli::parse();
    let session = SessionHandle::new(settings)?;

    let result = match cli.command {
        Commands::Index { page } => handle_index(&session, &page).await,
        Commands::Ask { page, question } => handle_ask(&session, &page, question).await,
        Commands::Interactive { page } => handle_interactive(&session, &page).await,
    };

    session.shutdown().await?;

    result
}

async fn analyze(session: &SessionHandle, page: &PageArgs) -> Result<()> {
    utils::print_info("FETCHING_DATA...");

    let extractor = FileExtractor::new(page.url.clone(), page.file.clone());
    match session.analyze_with(&extractor).await {
        Ok(IndexOutcome::AlreadyIndexed) => {
            utils::print_success(&format!("{} already indexed", page.url));
            Ok(())
        }
        Ok(IndexOutcome::Indexed(ack)) => {
            utils::print_success(&format!("Indexed {}", page.url));
            tracing::debug!("Backend acknowledgment: {}", ack);
            Ok(())
        }
        Err(e) => {
            utils::print_error(&format!("Analysis failed: {}", e));
            Err(e)
        }
    }
}

async fn handle_index(session: &SessionHandle, page: &PageArgs) -> Result<()> {
    analyze(session, page).await
}

async fn handle_ask(session: &SessionHandle, page: &PageArgs, question: String) -> Result<()> {
    analyze(session, page).await?;
    ask(session, question).await
}

/// Submit one question and print the answer as it is revealed.
async fn ask(session: &SessionHandle, question: String) -> Result<()> {
    let mut updates = session.subscribe();

    if !session.submit_question(question).await? {
        utils::print_error("Question ignored: page not ready, empty input, or a turn in flight");
        return Ok(());
    }

    let answer_id = session.view().last_assistant().map(|m| m.id);
    let mut shown = String::new();

    utils::print_prompt("Assistant: ");
    loop {
        let view = updates.borrow_and_update().clone();
        if let Some(message) = view.messages.iter().find(|m| Some(m.id) == answer_id) {
            if !message.is_typing {
                utils::print_growth(&mut shown, &message.text);
            }
        }
        if !view.busy || updates.changed().await.is_err() {
            break;
        }
    }
    println!("\n");

    Ok(())
}

async fn handle_interactive(session: &SessionHandle, page: &PageArgs) -> Result<()> {
    utils::print_header("Page Reader");
    analyze(session, page).await?;
    utils::print_info("Ask about the page (/help for commands, Ctrl+C to exit)\n");

    let stdin = io::stdin();
    let mut reader = BufReader::new(stdin);

    loop {
        utils::print_prompt("You: ");
        let mut input = String::new();
        if reader.read_line(&mut input).await? == 0 {
            break;
        }

        let input = input.trim_end_matches(['\r', '\n']);
        match input.trim() {
            "" => continue,
            "/help" => {
                println!("Special commands:");
                println!("  /analyze - Re-run page analysis");
                println!("  /reset   - Wipe caches and conversation");
                println!("  /copy    - Print the last answer");
                println!("  /help    - Show this help");
                println!("  Ctrl+C   - Exit\n");
            }
            "/reset" => {
                session.reset().await?;
                utils::print_success("SESSION_WIPED. Run /analyze to index the page again.\n");
            }
            "/analyze" => {
                if let Err(e) = analyze(session, page).await {
                    tracing::warn!("Analysis failed: {}", e);
                }
            }
            "/copy" => match session
                .view()
                .last_assistant()
                .and_then(|m| session.message_text(m.id))
            {
                Some(text) => println!("{}\n", text),
                None => utils::print_info("Nothing to copy yet\n"),
            },
            _ => ask(session, input.to_string()).await?,
        }
    }

    Ok(())
}

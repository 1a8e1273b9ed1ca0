//! Terminal client: streams a summary from a running server and redraws the
//! bullets every time new text arrives.

use std::io::{self, Write};
use std::process::ExitCode;

use clap::Parser;
use news_summarizer::client::{SummaryClient, SummarySession, SummaryState};
use news_summarizer::render::render_bullets;
use news_summarizer::source::names_article_url;
use tracing::warn;
use tracing_subscriber::{fmt as tfmt, EnvFilter};

#[derive(Parser, Debug)]
#[command(name = "summarize", about = "Summarize a CNBC Indonesia article")]
struct Cli {
    /// Article URL, or its path such as `tech/20210901160000-37-273436/slug`
    article: String,

    /// Base URL of the summarizer server
    #[arg(long, env = "SUMMARIZER_URL", default_value = "http://127.0.0.1:3000")]
    server: String,
}

fn draw(state: &SummaryState) -> io::Result<()> {
    let mut out = io::stdout().lock();
    // clear screen, cursor home
    write!(out, "\x1b[2J\x1b[H")?;
    if let Some(path) = &state.address_path {
        writeln!(out, "{}\n", path)?;
    }
    write!(out, "{}", render_bullets(&state.summary))?;
    if state.loading {
        writeln!(out, "…")?;
    }
    out.flush()
}

/// Logs a failed redraw; a closed pipe just means nobody is reading any more.
fn report_draw_error(err: &io::Error) {
    if err.kind() != io::ErrorKind::BrokenPipe {
        warn!(error = %err, "failed to draw summary");
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tfmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let args = Cli::parse();
    let session = SummarySession::new(SummaryClient::new(args.server));

    let mut updates = session.subscribe();
    let view = tokio::spawn(async move {
        while updates.changed().await.is_ok() {
            let state = updates.borrow_and_update().clone();
            if let Err(e) = draw(&state) {
                report_draw_error(&e);
                break;
            }
        }
    });

    let result = if names_article_url(&args.article) {
        session.submit(Some(&args.article)).await
    } else {
        let segments: Vec<&str> = args.article.split('/').collect();
        match session.seed_from_path(&segments).await {
            Some(result) => result,
            None => session.submit(None).await,
        }
    };

    view.abort();
    let state = session.snapshot();
    if let Err(e) = draw(&state) {
        report_draw_error(&e);
    }

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if let Some(notice) = state.notice {
                eprintln!("{}", notice);
            } else {
                eprintln!("error: {}", e);
            }
            ExitCode::FAILURE
        }
    }
}

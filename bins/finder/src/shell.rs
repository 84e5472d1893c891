//! Line-oriented terminal shell over the search view.

use std::fmt::Write as _;

use models::{DogId, SortDirection};
use service::api::{CatalogApi, MatchApi};
use service::errors::{FailureKind, IntentError};
use service::observability::encode_metrics;
use service::pagination::Pagination;
use service::search::{OperationStatus, ResultsState, SearchOrchestrator, SearchView, UserIntent};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

pub const HELP: &str = "commands: breed <name>|-  zip <code>|-  sort asc|desc  page <n>  next  prev  \
fav <id>  unfav <id>  match  retry  show  metrics  help  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Intent(UserIntent),
    NextPage,
    PrevPage,
    Show,
    Metrics,
    Help,
    Quit,
}

/// `-` or nothing clears a filter.
fn optional_arg(arg: Option<&str>) -> Option<String> {
    arg.filter(|a| *a != "-").map(str::to_string)
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, Some(r.trim()).filter(|r| !r.is_empty())),
        None => (line, None),
    };
    let command = match word.to_ascii_lowercase().as_str() {
        "breed" => Command::Intent(UserIntent::FilterBreedChanged(optional_arg(rest))),
        "zip" => Command::Intent(UserIntent::FilterLocationChanged(optional_arg(rest))),
        "sort" => {
            let direction: SortDirection = rest
                .ok_or("sort needs asc or desc")?
                .parse()
                .map_err(|e: models::ModelError| e.to_string())?;
            Command::Intent(UserIntent::SortChanged(direction))
        }
        "page" => {
            let page = rest
                .ok_or("page needs a number")?
                .parse::<u32>()
                .map_err(|_| "page needs a positive number".to_string())?;
            Command::Intent(UserIntent::PageChanged(page))
        }
        "next" => Command::NextPage,
        "prev" => Command::PrevPage,
        "fav" => Command::Intent(UserIntent::DogFavorited(DogId::new(rest.ok_or("fav needs a dog id")?))),
        "unfav" => Command::Intent(UserIntent::DogUnfavorited(DogId::new(rest.ok_or("unfav needs a dog id")?))),
        "match" => Command::Intent(UserIntent::MatchRequested),
        "retry" => Command::Intent(UserIntent::Retry),
        "show" | "" => Command::Show,
        "metrics" => Command::Metrics,
        "help" | "?" => Command::Help,
        "quit" | "exit" | "q" => Command::Quit,
        other => return Err(format!("unknown command '{other}'")),
    };
    Ok(command)
}

fn failure_label(kind: FailureKind) -> &'static str {
    match kind {
        FailureKind::Transport => "network unreachable",
        FailureKind::Rejected => "rejected by server",
        FailureKind::Decode => "unreadable response",
        FailureKind::Invalid => "invalid request",
    }
}

fn status_label(status: OperationStatus) -> String {
    match status {
        OperationStatus::Idle => "idle".into(),
        OperationStatus::Loading => "loading".into(),
        OperationStatus::Ready => "ok".into(),
        OperationStatus::Failed(kind) => format!("failed ({})", failure_label(kind)),
    }
}

pub fn render(view: &SearchView) -> String {
    let mut out = String::new();
    let c = &view.criteria;
    let _ = writeln!(
        out,
        "== page {} of {} ({} dogs) | breed: {} | zip: {} | sort: {}",
        view.current_page,
        view.total_pages.max(1),
        view.total,
        c.breed.as_deref().unwrap_or("any"),
        c.zip_code.as_deref().unwrap_or("any"),
        c.sort.map_or("default", SortDirection::as_str),
    );
    match view.results {
        ResultsState::Idle => out.push_str("   (no search yet)\n"),
        ResultsState::Loading => out.push_str("   loading...\n"),
        ResultsState::NoResults => out.push_str("   no dogs match these filters\n"),
        ResultsState::Failed(kind) => {
            let _ = writeln!(out, "   fetch failed: {} (type `retry`)", failure_label(kind));
        }
        ResultsState::Showing => {}
    }
    for dog in &view.dogs {
        let mark = if view.is_favorite(&dog.id) { "*" } else { " " };
        let _ = writeln!(
            out,
            "  [{mark}] {:<24} {:<16} {:<20} age {:>2}  zip {}",
            dog.id.as_str(), dog.name, dog.breed, dog.age, dog.zip_code
        );
    }
    let favorites: Vec<String> = view.favorites.iter().map(|d| d.name.clone()).collect();
    let _ = writeln!(
        out,
        "favorites ({}): {}{}",
        favorites.len(),
        favorites.join(", "),
        if view.match_enabled { "  -- `match` available" } else { "" }
    );
    if let Some(dog) = &view.matched {
        let _ = writeln!(out, "match: {} the {} ({}) {}", dog.name, dog.breed, dog.id, dog.img);
    } else if view.match_status != OperationStatus::Idle {
        let _ = writeln!(out, "match: {}", status_label(view.match_status));
    }
    if view.breeds_status != OperationStatus::Ready || view.locations_status != OperationStatus::Ready {
        let _ = writeln!(
            out,
            "breeds: {} | locations: {}",
            status_label(view.breeds_status),
            status_label(view.locations_status)
        );
    }
    out
}

/// Neighbouring page of the displayed one, or a message when already at that end.
pub fn step_page(view: &SearchView, forward: bool) -> Result<UserIntent, &'static str> {
    let pagination = Pagination::new(view.current_page);
    if forward {
        if !pagination.has_next(view.total) {
            return Err("already on the last page");
        }
        Ok(UserIntent::PageChanged(view.current_page + 1))
    } else {
        if !pagination.has_prev() {
            return Err("already on the first page");
        }
        Ok(UserIntent::PageChanged(view.current_page - 1))
    }
}

/// Read commands until `quit` or EOF. Intents run as separate tasks so a slow search never
/// blocks input; each finished intent re-renders the view.
pub async fn run<A>(orch: SearchOrchestrator<A>) -> anyhow::Result<()>
where
    A: CatalogApi + MatchApi + 'static,
{
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<Result<(), IntentError>>();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                let command = match parse(&line) {
                    Ok(command) => command,
                    Err(e) => {
                        println!("! {e}");
                        continue;
                    }
                };
                let intent = match command {
                    Command::Intent(intent) => intent,
                    Command::NextPage => match step_page(&orch.view(), true) {
                        Ok(intent) => intent,
                        Err(message) => {
                            println!("! {message}");
                            continue;
                        }
                    },
                    Command::PrevPage => match step_page(&orch.view(), false) {
                        Ok(intent) => intent,
                        Err(message) => {
                            println!("! {message}");
                            continue;
                        }
                    },
                    Command::Show => {
                        println!("{}", render(&orch.view()));
                        continue;
                    }
                    Command::Metrics => {
                        print!("{}", encode_metrics());
                        continue;
                    }
                    Command::Help => {
                        println!("{HELP}");
                        continue;
                    }
                    Command::Quit => break,
                };
                let orch = orch.clone();
                let done_tx = done_tx.clone();
                tokio::spawn(async move {
                    let _ = done_tx.send(orch.dispatch(intent).await);
                });
            }
            Some(result) = done_rx.recv() => {
                if let Err(e) = result {
                    println!("! {e}");
                }
                println!("{}", render(&orch.view()));
            }
        }
    }
    Ok(())
}

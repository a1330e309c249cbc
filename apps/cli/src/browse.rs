//! `pageguide browse`: a line-oriented guidance session over stdin.

use std::sync::Arc;

use color_eyre::eyre::Result;
use pageguide_core::{
    ContextProvider, GuidanceSession, GuidanceSnapshot, PageContext, StaticContext,
};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::commands::Runtime;
use crate::console;

const HELP: &str = "\
  list              show the current artefact and linked quick answers
  open <n|id>       show a linked quick answer by number or id
  back              return to the overview
  zoom              open the related document in the live window
  page <name>       move to a page by name and re-resolve
  object <api>      move to an object's page and re-resolve
  goto <location>   move to a location and re-resolve
  refresh           re-resolve the current page
  quit              leave";

#[derive(Debug, Clone, PartialEq, Eq)]
enum BrowseCommand {
    List,
    Open(String),
    Back,
    Zoom,
    Page(String),
    Object(String),
    Goto(String),
    Refresh,
    Help,
    Quit,
}

fn parse(line: &str) -> Option<BrowseCommand> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };
    let arg = || (!rest.is_empty()).then(|| rest.to_string());

    match word {
        "list" | "ls" => Some(BrowseCommand::List),
        "open" => arg().map(BrowseCommand::Open),
        "back" => Some(BrowseCommand::Back),
        "zoom" => Some(BrowseCommand::Zoom),
        "page" => arg().map(BrowseCommand::Page),
        "object" => arg().map(BrowseCommand::Object),
        "goto" => arg().map(BrowseCommand::Goto),
        "refresh" => Some(BrowseCommand::Refresh),
        "help" | "?" => Some(BrowseCommand::Help),
        "quit" | "exit" | "q" => Some(BrowseCommand::Quit),
        _ => None,
    }
}

/// `open` accepts a 1-based position in the linked list or an artefact id.
fn linked_target(snapshot: &GuidanceSnapshot, selector: &str) -> Option<String> {
    match selector.parse::<usize>() {
        Ok(n) if n >= 1 => snapshot
            .linked()
            .get(n - 1)
            .and_then(|slot| slot.as_ref())
            .map(|a| a.id.clone()),
        _ => Some(selector.to_string()),
    }
}

async fn refresh(runtime: &Runtime, session: &GuidanceSession) -> Option<GuidanceSnapshot> {
    runtime
        .console
        .spinning("Resolving guidance...", session.refresh())
        .await
}

pub(crate) async fn run(runtime: &Runtime, initial: PageContext) -> Result<()> {
    let context = Arc::new(StaticContext::new(initial));
    let session = runtime.session(context.clone());
    let assist = runtime.assist();

    if let Some(snapshot) = refresh(runtime, &session).await {
        console::print_snapshot(&snapshot);
    }
    eprintln!("Type `help` for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let Some(command) = parse(&line) else {
            eprintln!("Unknown command. Type `help` for commands.");
            continue;
        };

        match command {
            BrowseCommand::List => console::print_snapshot(&session.snapshot()),
            BrowseCommand::Open(selector) => {
                let snapshot = session.snapshot();
                let selected = linked_target(&snapshot, &selector)
                    .is_some_and(|id| session.select_linked(&id));
                if selected {
                    console::print_snapshot(&session.snapshot());
                } else {
                    eprintln!("No linked quick answer matches `{selector}`.");
                }
            }
            BrowseCommand::Back => {
                session.return_to_overview();
                console::print_snapshot(&session.snapshot());
            }
            BrowseCommand::Zoom => {
                let document = session.current_document_id();
                runtime
                    .console
                    .spinning(
                        "Opening document...",
                        assist.zoom(runtime.username(), document.as_deref()),
                    )
                    .await;
            }
            BrowseCommand::Page(name) => {
                context.set(PageContext::default().with_page_name(name));
                if let Some(snapshot) = refresh(runtime, &session).await {
                    console::print_snapshot(&snapshot);
                }
            }
            BrowseCommand::Object(api) => {
                context.set(PageContext::default().with_object_api_name(api));
                if let Some(snapshot) = refresh(runtime, &session).await {
                    console::print_snapshot(&snapshot);
                }
            }
            BrowseCommand::Goto(location) => {
                context.set(PageContext::default().with_location(location));
                if let Some(snapshot) = refresh(runtime, &session).await {
                    console::print_snapshot(&snapshot);
                }
            }
            BrowseCommand::Refresh => {
                tracing::debug!(context = ?context.current(), "manual refresh");
                if let Some(snapshot) = refresh(runtime, &session).await {
                    console::print_snapshot(&snapshot);
                }
            }
            BrowseCommand::Help => eprintln!("{HELP}"),
            BrowseCommand::Quit => break,
        }
    }

    Ok(())
}

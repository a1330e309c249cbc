//! Terminal output: notifications, the progress spinner, and rendering of
//! guidance snapshots.

use std::future::Future;
use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use pageguide_core::{GuidanceSnapshot, KeyedDocument, Notifier, QuickAnswer};
use pageguide_shared::{Artefact, Notification};

/// Prints notifications to stderr, around the spinner if one is running.
#[derive(Default)]
pub(crate) struct Console {
    active: Mutex<Option<ProgressBar>>,
}

impl Console {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    fn active(&self) -> MutexGuard<'_, Option<ProgressBar>> {
        self.active.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Show a spinner with `message` until `work` completes.
    pub(crate) async fn spinning<F: Future>(&self, message: &str, work: F) -> F::Output {
        let spinner = new_spinner(message);
        *self.active() = Some(spinner.clone());
        let output = work.await;
        self.active().take();
        spinner.finish_and_clear();
        output
    }
}

impl Notifier for Console {
    fn notify(&self, notification: Notification) {
        let line = format!("[{}] {}", notification.severity, notification.message);
        match self.active().as_ref() {
            Some(spinner) => spinner.suspend(|| eprintln!("{line}")),
            None => eprintln!("{line}"),
        }
    }
}

fn new_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.cyan} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]);
    spinner.set_style(style);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));
    spinner
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

pub(crate) fn print_artefact(artefact: &Artefact) {
    println!("  # {}", artefact.id);
    if let Some(doc) = &artefact.panviva_document_id {
        println!("  panviva document #{doc}");
    }
    println!();
    let text = artefact.plaintext();
    if text.is_empty() {
        for line in artefact.content_lines() {
            println!("  {}", line.text);
        }
    } else {
        for line in text.lines() {
            println!("  {line}");
        }
    }
    println!();
}

/// Current artefact, then the numbered linked list.
pub(crate) fn print_snapshot(snapshot: &GuidanceSnapshot) {
    println!();
    if let Some(scope) = &snapshot.scope {
        println!("  {}", scope.describe());
        println!();
    }

    let Some(current) = snapshot.current_artefact() else {
        println!("  No guidance ({:?}).", snapshot.state);
        println!();
        return;
    };
    print_artefact(current);

    let Some(overview) = &snapshot.overview else {
        return;
    };
    let linked = snapshot.linked();
    if linked.is_empty() {
        return;
    }

    println!("  Linked quick answers:");
    for (index, (scope, slot)) in overview.linked_scopes().iter().zip(linked).enumerate() {
        let marker = match slot {
            Some(a) if a.id == current.id && !snapshot.overview_mode() => ">",
            _ => " ",
        };
        match slot {
            Some(artefact) => println!("  {marker} {}. {}", index + 1, artefact.id),
            None => println!("    {}. (nothing found for {scope})", index + 1),
        }
    }
    println!();
}

pub(crate) fn print_quick_answer(answer: &QuickAnswer) {
    println!();
    println!("  Top of {} results:", answer.total);
    print_artefact(&answer.artefact);
}

pub(crate) fn print_documents(documents: &[KeyedDocument]) {
    if documents.is_empty() {
        return;
    }
    println!();
    for doc in documents {
        let name = doc.hit.name.as_deref().unwrap_or("(untitled)");
        match &doc.hit.id {
            Some(id) => println!("  [{}] {name} (#{id})", doc.key),
            None => println!("  [{}] {name}", doc.key),
        }
        if let Some(description) = doc.hit.description.as_deref().filter(|d| !d.is_empty()) {
            println!("      {description}");
        }
    }
    println!();
}

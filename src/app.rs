// Application shell: the coordinator, the screens it shows, and the console loop driving them.
// Fetching happens on the tokio runtime; every screen is polled from the loop's thread.

use std::io::{BufRead, Write};
use std::sync::{Arc, mpsc};
use std::time::Duration;

pub mod config;
pub mod coordinator;
mod details_screen;
mod main_screen;
pub mod pagination;
mod runtime;
pub mod scroll;
mod sources;
#[cfg(test)]
mod test_support;

pub use runtime::rt;

use coordinator::{Coordinator, Screen};
use details_screen::DetailsScreen;
use main_screen::{MainAction, MainScreen};
use pagination::{PageFetcher, RetryPolicy};
use scroll::ScrollProximity;
use sources::{DetailsProvider, ListPageFetcher, SimilarPageFetcher, TmdbDetailsProvider};
use crate::api::ShowSummary;
use crate::types::ShowId;

const HELP: &str =
    "[enter/n] scroll  [m] more similar  [<number>] open  [b] back  [r] retry  [l] logs  [h] help  [q] quit";
const LOG_TAIL: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Scroll,
    More,
    Open(usize),
    Back,
    Retry,
    Logs,
    Help,
    Quit,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        match line {
            "" | "n" => Command::Scroll,
            "m" => Command::More,
            "b" => Command::Back,
            "r" => Command::Retry,
            "l" => Command::Logs,
            "h" | "?" => Command::Help,
            "q" => Command::Quit,
            other => match other.parse::<usize>() {
                Ok(idx) => Command::Open(idx),
                Err(_) => Command::Unknown(other.to_string()),
            },
        }
    }
}

/// Builds the data sources of a detail screen; swapped out in tests.
type DetailsFactory =
    Box<dyn Fn(ShowId) -> (Arc<dyn DetailsProvider>, Arc<dyn PageFetcher<ShowSummary>>)>;

pub struct BrowserApp {
    coordinator: Coordinator,
    main: MainScreen,
    details: Vec<DetailsScreen>,
    details_factory: DetailsFactory,
    handle: tokio::runtime::Handle,
    retry: RetryPolicy,
    notice: Option<String>,
}

impl BrowserApp {
    pub fn from_config(handle: tokio::runtime::Handle) -> Self {
        let (list, retry, reload_distance, rows) = config::with_config(|c| {
            (c.list, c.retry, c.reload_distance, c.page_rows)
        });
        let main = MainScreen::new(
            list,
            Arc::new(ListPageFetcher::new(list)),
            handle.clone(),
            retry,
            ScrollProximity::new(reload_distance),
            rows,
        );
        let factory: DetailsFactory = Box::new(|id| {
            (
                Arc::new(TmdbDetailsProvider) as Arc<dyn DetailsProvider>,
                Arc::new(SimilarPageFetcher::new(id)) as Arc<dyn PageFetcher<ShowSummary>>,
            )
        });
        Self::with_parts(main, factory, handle, retry)
    }

    fn with_parts(
        main: MainScreen,
        details_factory: DetailsFactory,
        handle: tokio::runtime::Handle,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            coordinator: Coordinator::new(),
            main,
            details: Vec::new(),
            details_factory,
            handle,
            retry,
            notice: None,
        }
    }

    pub fn start(&mut self) {
        self.coordinator.start();
        self.main.on_appear();
    }

    #[cfg(test)]
    pub fn current_screen(&self) -> Option<Screen> {
        self.coordinator.current()
    }

    /// Applies one user command. Returns false when the app should exit.
    pub fn handle(&mut self, cmd: Command) -> bool {
        self.notice = None;
        match cmd {
            Command::Quit => return false,
            Command::Scroll => match self.details.last_mut() {
                Some(d) => {
                    d.scroll_down();
                }
                None => self.main.scroll_down(),
            },
            Command::More => match self.details.last_mut() {
                Some(d) => {
                    if !d.scroll_down() {
                        self.notice = Some("no more similar shows to load".to_string());
                    }
                }
                None => {
                    self.notice =
                        Some("m loads similar shows on a detail screen; enter/n scrolls".to_string())
                }
            },
            Command::Open(idx) => {
                let target = match self.details.last() {
                    Some(d) => d.select_similar(idx),
                    None => self.main.select(idx).map(|MainAction::OpenDetails(id)| id),
                };
                match target {
                    Some(id) => self.open_details(id),
                    None => self.notice = Some(format!("no show at {}", idx)),
                }
            }
            Command::Back => {
                if self.coordinator.back() {
                    self.details.pop();
                }
            }
            Command::Retry => {
                let issued = match self.details.last_mut() {
                    Some(d) => d.retry(),
                    None => self.main.retry(),
                };
                if !issued {
                    self.notice = Some("nothing to retry".to_string());
                }
            }
            Command::Logs => self.notice = Some(recent_logs(LOG_TAIL)),
            Command::Help => self.notice = Some(HELP.to_string()),
            Command::Unknown(s) => self.notice = Some(format!("unknown command: {s}\n{HELP}")),
        }
        true
    }

    fn open_details(&mut self, show_id: ShowId) {
        let (provider, similar) = (self.details_factory)(show_id);
        let mut screen =
            DetailsScreen::new(show_id, provider, similar, self.handle.clone(), self.retry);
        screen.on_appear();
        self.coordinator.open_details(show_id);
        self.details.push(screen);
    }

    /// Polls every live screen. Returns true if the visible one changed.
    pub fn update(&mut self) -> bool {
        let main_changed = self.main.poll();
        let mut top_changed = false;
        let top = self.details.len();
        for (i, d) in self.details.iter_mut().enumerate() {
            let changed = d.poll();
            if i + 1 == top {
                top_changed = changed;
            }
        }
        if top == 0 { main_changed } else { top_changed }
    }

    pub fn render(&self) -> String {
        let mut out = match (self.coordinator.current(), self.details.last()) {
            (Some(Screen::Details { .. }), Some(d)) => d.render(),
            _ => self.main.render(),
        };
        if let Some(notice) = &self.notice {
            out.push_str(notice);
            out.push('\n');
        }
        out
    }
}

fn recent_logs(n: usize) -> String {
    let mut out = String::from("-- recent log --\n");
    for line in crate::logger::tail(n) {
        out.push_str(&line);
        out.push('\n');
    }
    out
}

fn redraw(out: &mut impl Write, app: &BrowserApp) -> std::io::Result<()> {
    write!(out, "\n{}\n> ", app.render().trim_end())?;
    out.flush()
}

/// Console loop: stdin lines become commands, fetch completions are picked up between them.
pub fn run() -> std::io::Result<()> {
    let mut app = BrowserApp::from_config(rt().handle().clone());
    app.start();

    let (cmd_tx, cmd_rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            if cmd_tx.send(Command::parse(&line)).is_err() {
                break;
            }
        }
    });

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    writeln!(out, "{HELP}")?;
    redraw(&mut out, &app)?;
    loop {
        match cmd_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(cmd) => {
                if !app.handle(cmd) {
                    break;
                }
                redraw(&mut out, &app)?;
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
        if app.update() {
            redraw(&mut out, &app)?;
        }
    }
    log::info!("console closed");
    Ok(())
}

use std::error::Error;

use clap::Args;
use furodoro_core::integrations::category_error_placeholder;
use furodoro_core::{
    Category, CategoryChoice, Event, FocusController, LifeUpClient, NoWakeLock, ReportError,
    SelectorState, SequenceKey, Settings, TaskChoice, TaskItem, TaskListing,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::{self, UnboundedSender};

use super::load_settings;

#[derive(Args)]
pub struct RunArgs {
    /// Do not contact the LifeUp server on startup
    #[arg(long)]
    pub offline: bool,
    /// Only print a status line when a command changes state
    #[arg(long)]
    pub quiet: bool,
}

const HELP: &str = "\
commands:
  m              main action (start work / start break / resume work)
  l              long break, or reset while in one
  p              pause
  reset          reset timer and credit
  phase <name>   enter work | break | long_break (paused)
  s              status
  cats           load categories
  cat <id>       select category and load its tasks
  task <id>      select task
  add            queue the selected task
  queue          list the queue
  rm <n>         remove entry n
  mv <from> <to> move entry
  shuffle        shuffle the queue
  dur <n> <min>  set planned minutes of entry n
  go <n>         start entry n
  next           start the next entry
  apply          apply config changes now
  hide | show    page visibility
  help           this text
  quit           exit";

pub fn run(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(session(args))
}

enum Flow {
    Continue,
    Quit,
}

struct Session {
    ctl: FocusController,
    client: LifeUpClient,
    settings: Settings,
    categories: Vec<Category>,
    tasks: Vec<TaskItem>,
    reports: UnboundedSender<Result<(), ReportError>>,
    quiet: bool,
}

async fn session(args: RunArgs) -> Result<(), Box<dyn Error>> {
    let settings = load_settings(None)?;
    let client = LifeUpClient::new(&settings);
    let (ctl, mut ticks) = FocusController::new(settings.clone(), NoWakeLock);
    let (reports, mut report_results) = mpsc::unbounded_channel();

    let mut session = Session {
        ctl,
        client,
        settings,
        categories: Vec::new(),
        tasks: Vec::new(),
        reports,
        quiet: args.quiet,
    };

    if !args.offline {
        session.load_categories(true).await;
    }
    session.print_status();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            Some(tick) = ticks.recv() => {
                let events = session.ctl.on_tick(tick);
                session.render(&events, !session.quiet);
            }
            Some(result) = report_results.recv() => {
                let notice = session.ctl.report_outcome(&result);
                session.render(&[notice], false);
            }
            line = lines.next_line() => {
                let Some(line) = line? else { break };
                if let Flow::Quit = session.command(line.trim()).await {
                    break;
                }
            }
        }
    }

    session.ctl.shutdown();
    Ok(())
}

impl Session {
    async fn command(&mut self, line: &str) -> Flow {
        let mut parts = line.split_whitespace();
        let Some(cmd) = parts.next() else {
            return Flow::Continue;
        };
        let args: Vec<&str> = parts.collect();

        self.refresh_settings();

        match (cmd, args.as_slice()) {
            ("m", []) => {
                let events = self.ctl.toggle_main_action();
                self.render(&events, true);
            }
            ("l", []) => {
                let (events, report) = self.ctl.toggle_long_break_or_reset();
                self.render(&events, true);
                if let Some(report) = report {
                    let client = self.client.clone();
                    let tx = self.reports.clone();
                    tokio::spawn(async move {
                        let _ = tx.send(client.report_session(&report).await);
                    });
                }
            }
            ("p", []) => {
                let events = self.ctl.pause();
                self.render(&events, true);
            }
            ("reset", []) => {
                let events = self.ctl.reset();
                self.render(&events, true);
            }
            ("phase", [name]) => {
                let events = self.ctl.enter_phase_named(name, false);
                self.render(&events, true);
            }
            ("s", []) => self.print_status(),
            ("cats", []) => self.load_categories(false).await,
            ("cat", [id]) => self.select_category(id).await,
            ("task", [id]) => self.select_task(id),
            ("add", []) => {
                let events = self.ctl.enqueue_selected();
                if events.is_empty() {
                    println!("Select a category and a task first.");
                }
                self.render(&events, false);
                self.print_queue();
            }
            ("queue", []) => self.print_queue(),
            ("rm", [n]) => {
                let result = self.key_at(n).and_then(|key| {
                    self.ctl.remove_task(key).map_err(|e| e.to_string())
                });
                self.after_queue_op(result);
            }
            ("mv", [from, to]) => {
                let result = match (position(from), position(to)) {
                    (Some(from), Some(to)) => {
                        self.ctl.move_task(from, to).map_err(|e| e.to_string())
                    }
                    _ => Err(format!("invalid positions: {from} {to}")),
                };
                self.after_queue_op(result);
            }
            ("shuffle", []) => {
                let events = self.ctl.shuffle_tasks();
                self.after_queue_op(Ok(events));
            }
            ("dur", [n, minutes]) => {
                // Unparseable input is treated like zero and reverts to the default.
                let minutes = minutes.parse::<i64>().unwrap_or(0);
                let result = self.key_at(n).and_then(|key| {
                    self.ctl
                        .set_task_duration(key, minutes)
                        .map_err(|e| e.to_string())
                });
                self.after_queue_op(result);
            }
            ("go", [n]) => {
                let result = self
                    .key_at(n)
                    .and_then(|key| self.ctl.start_task(key).map_err(|e| e.to_string()));
                match result {
                    Ok(events) => self.render(&events, true),
                    Err(e) => println!("{e}"),
                }
            }
            ("next", []) => match self.ctl.start_next_task() {
                Ok(events) => self.render(&events, true),
                Err(e) => println!("{e}"),
            },
            ("apply", []) => {
                let events = self.ctl.apply_settings(self.settings.clone());
                self.render(&events, true);
            }
            ("hide", []) => self.ctl.set_visible(false),
            ("show", []) => self.ctl.set_visible(true),
            ("help", []) => println!("{HELP}"),
            ("quit" | "q", []) => return Flow::Quit,
            _ => println!("unknown command: {line} (try 'help')"),
        }
        Flow::Continue
    }

    /// Settings are re-read from the config file before every command.
    fn refresh_settings(&mut self) {
        match load_settings(Some(&self.settings)) {
            Ok(settings) => {
                if settings.server_url != self.settings.server_url
                    || settings.report_scheme != self.settings.report_scheme
                {
                    self.client = LifeUpClient::new(&settings);
                }
                self.ctl.replace_settings(settings.clone());
                self.settings = settings;
            }
            Err(e) => tracing::warn!(error = %e, "keeping previous settings"),
        }
    }

    async fn load_categories(&mut self, announce: bool) {
        match self.client.fetch_categories().await {
            Ok(categories) => {
                if announce {
                    println!("[success] Connected to LifeUp server");
                }
                for c in &categories {
                    println!("  {:>4}  {}", c.id, c.name);
                }
                self.categories = categories;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to fetch task categories");
                println!("{}", category_error_placeholder(&e));
                println!("{}", SelectorState::CategoryError.placeholder());
            }
        }
    }

    async fn select_category(&mut self, id: &str) {
        let choice = self
            .categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| CategoryChoice {
                id: c.id.clone(),
                name: c.name.clone(),
                color: c.color.clone(),
                kind: c.kind,
            })
            .unwrap_or_else(|| CategoryChoice {
                id: id.to_string(),
                name: id.to_string(),
                color: None,
                kind: None,
            });
        self.ctl.select_category(Some(choice));
        self.tasks.clear();

        let result = self.client.fetch_tasks(id).await;
        let state = SelectorState::for_tasks(&result);
        match result {
            Ok(TaskListing::Tasks(tasks)) => {
                for t in &tasks {
                    println!("  {:>4}  {}", t.id, t.name);
                }
                self.tasks = tasks;
            }
            Ok(TaskListing::Empty) => {}
            Err(e) => tracing::error!(error = %e, "Failed to fetch tasks"),
        }
        println!("{}", state.placeholder());
    }

    fn select_task(&mut self, id: &str) {
        match self.tasks.iter().find(|t| t.id == id) {
            Some(task) => {
                self.ctl.select_task(Some(TaskChoice {
                    id: task.id.clone(),
                    name: task.name.clone(),
                }));
                println!("{}", self.ctl.current_task_label());
            }
            None => println!("no task {id} in the selected category"),
        }
    }

    fn key_at(&self, n: &str) -> Result<SequenceKey, String> {
        let index = position(n).ok_or_else(|| format!("invalid position: {n}"))?;
        self.ctl.queue().key_at(index).map_err(|e| e.to_string())
    }

    fn after_queue_op(&self, result: Result<Vec<Event>, String>) {
        match result {
            Ok(events) => {
                self.render(&events, false);
                self.print_queue();
            }
            Err(e) => println!("{e}"),
        }
    }

    fn print_queue(&self) {
        let queue = self.ctl.queue();
        if queue.is_empty() {
            println!("(queue empty)");
            return;
        }
        let active = queue.active_key();
        for (i, task) in queue.iter().enumerate() {
            let marker = if Some(task.sequence_key) == active { '*' } else { ' ' };
            println!(
                "{marker}{:>3}. {} [{}] {} min",
                i + 1,
                task.name,
                task.category_name,
                task.planned_minutes
            );
        }
        if let Some(next) = self.ctl.next_task_label() {
            println!("{next}");
        }
    }

    fn print_status(&self) {
        let snap = self.ctl.snapshot();
        println!(
            "{} [{:>5.1}%] {}",
            snap.title, snap.progress_pct, snap.stat_line
        );
        println!(
            "{} | actions: {} / {}",
            self.ctl.current_task_label(),
            snap.main_action_label,
            snap.secondary_action_label
        );
    }

    /// Print notifications, and the status line when `status` is set.
    fn render(&self, events: &[Event], status: bool) {
        for event in events {
            match event {
                Event::Notification { level, message, .. } => {
                    println!("[{}] {message}", level.as_str());
                }
                Event::StateSnapshot { snapshot, .. } if status => {
                    println!(
                        "{} [{:>5.1}%] {}",
                        snapshot.title, snapshot.progress_pct, snapshot.stat_line
                    );
                }
                other => tracing::debug!(?other, "event"),
            }
        }
    }
}

/// 1-based position from user input.
fn position(raw: &str) -> Option<usize> {
    raw.parse::<usize>().ok()?.checked_sub(1)
}

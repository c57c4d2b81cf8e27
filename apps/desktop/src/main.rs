use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{DateTime, Utc};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

use client_core::{
    FilterStore, HttpApiService, MountPoint, MountPosition, PointsStore, TripPresenter, ViewHost,
    ViewId, ViewSpec,
};
use shared::domain::{
    DestinationId, EventKind, FilterKind, OfferId, PointDraft, PointId, SortKind, UpdateKind,
};

mod stats;
mod term_view;

use term_view::TermHost;

#[derive(Parser, Debug)]
struct Args {
    /// Base URL of the itinerary API.
    #[arg(long, default_value = "https://16.ecmascript.pages.academy/big-trip")]
    end_point: String,
    /// Authorization header value sent with every request.
    #[arg(long, default_value = "Basic hS2sfS44wcl1sa2j")]
    authorization: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScreenMode {
    Table,
    Stats,
}

struct Shell {
    points: Arc<PointsStore>,
    filter: Arc<FilterStore>,
    host: Arc<TermHost>,
    presenter: Arc<TripPresenter>,
    mode: ScreenMode,
    stats_view: Option<ViewId>,
    /// Add-button affordance: hidden while the creation form is open,
    /// restored by the form's close callback.
    creating: Arc<AtomicBool>,
}

impl Shell {
    fn show_table(&mut self) {
        if self.mode == ScreenMode::Table {
            return;
        }
        if let Some(view) = self.stats_view.take() {
            self.host.unmount(view);
        }
        self.presenter.init();
        self.mode = ScreenMode::Table;
        info!("switched to table view");
    }

    fn show_stats(&mut self) {
        if self.creating.load(Ordering::SeqCst) {
            warn!("finish the new point before switching views");
            return;
        }
        if self.mode == ScreenMode::Stats {
            return;
        }
        self.presenter.destroy();
        let lines = stats::stat_lines(&self.points.points());
        self.stats_view = Some(self.host.mount(
            MountPoint::Root,
            ViewSpec::Statistics { lines },
            MountPosition::BeforeEnd,
        ));
        self.mode = ScreenMode::Stats;
        info!("switched to statistics view");
    }

    fn start_creation(&mut self) {
        if self.creating.load(Ordering::SeqCst) {
            warn!("a new point is already being created");
            return;
        }
        // The add button always lands on a fresh table, whatever was shown.
        if let Some(view) = self.stats_view.take() {
            self.host.unmount(view);
        }
        self.presenter.destroy();
        self.presenter.init();
        self.mode = ScreenMode::Table;

        self.creating.store(true, Ordering::SeqCst);
        let creating = self.creating.clone();
        self.presenter
            .create_point(Box::new(move || creating.store(false, Ordering::SeqCst)));
    }

    fn screen(&self) -> String {
        self.host.render()
    }
}

fn parse_sort(token: &str) -> Result<SortKind> {
    match token {
        "day" => Ok(SortKind::Day),
        "time" => Ok(SortKind::Time),
        "price" => Ok(SortKind::Price),
        other => bail!("unknown sort kind: {other}"),
    }
}

fn parse_filter(token: &str) -> Result<FilterKind> {
    match token {
        "everything" => Ok(FilterKind::Everything),
        "future" => Ok(FilterKind::Future),
        "past" => Ok(FilterKind::Past),
        other => bail!("unknown filter kind: {other}"),
    }
}

fn parse_kind(token: &str) -> Result<EventKind> {
    serde_json::from_value(serde_json::Value::String(token.to_string()))
        .map_err(|_| anyhow!("unknown event kind: {token}"))
}

fn parse_date(token: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(token)
        .map(|parsed| parsed.with_timezone(&Utc))
        .with_context(|| format!("invalid date (want RFC 3339): {token}"))
}

/// Apply `key=value` tokens to a draft. Fields: kind, dest, from, to, price,
/// fav, offers (comma-separated ids).
fn apply_overrides(draft: &mut PointDraft, tokens: &[&str]) -> Result<()> {
    for token in tokens {
        let (key, value) = token
            .split_once('=')
            .ok_or_else(|| anyhow!("expected key=value, got: {token}"))?;
        match key {
            "kind" => draft.kind = parse_kind(value)?,
            "dest" => draft.destination = Some(DestinationId::new(value)),
            "from" => draft.date_from = parse_date(value)?,
            "to" => draft.date_to = parse_date(value)?,
            "price" => draft.base_price = value.parse().context("invalid price")?,
            "fav" => draft.is_favorite = value.parse().context("invalid favorite flag")?,
            "offers" => {
                draft.offers = value
                    .split(',')
                    .filter(|part| !part.is_empty())
                    .map(|part| part.parse().map(OfferId).context("invalid offer id"))
                    .collect::<Result<Vec<_>>>()?;
            }
            other => bail!("unknown field: {other}"),
        }
    }
    Ok(())
}

const HELP: &str = "\
commands:
  show                         print the current screen
  table | stats                switch the top-level view
  new                          open the creation form
  save-new [field=value ...]   submit the creation form
  edit <id>                    open a row's edit form
  save <id> [field=value ...]  submit an open edit form
  close <id>                   close an edit form, discarding changes
  esc                          cancellation key
  fav <id>                     toggle favorite
  del <id>                     delete a point
  sort day|time|price          change the sort
  filter everything|future|past
  quit
fields: kind dest from to price fav offers (dates RFC 3339)";

async fn run_command(shell: &mut Shell, line: &str) -> Result<bool> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&command, rest)) = tokens.split_first() else {
        return Ok(true);
    };
    match (command, rest) {
        ("quit", _) | ("exit", _) => return Ok(false),
        ("help", _) => println!("{HELP}"),
        ("show", _) => {}
        ("table", _) => shell.show_table(),
        ("stats", _) => shell.show_stats(),
        ("new", _) => shell.start_creation(),
        ("esc", _) => {
            // The key listener only exists while a form is open.
            if shell.host.escape_armed() {
                shell.presenter.escape();
            }
        }
        ("edit", [id]) => shell.presenter.open_editor(&PointId::new(*id)),
        ("close", [id]) => shell.presenter.close_editor(&PointId::new(*id)),
        ("fav", [id]) => {
            shell
                .presenter
                .toggle_favorite(&PointId::new(*id))
                .await?;
        }
        ("del", [id]) => {
            shell.presenter.request_delete(&PointId::new(*id)).await?;
        }
        ("sort", [kind]) => shell.presenter.set_sort(parse_sort(kind)?),
        ("filter", [kind]) => shell
            .filter
            .set_filter(UpdateKind::Major, parse_filter(kind)?),
        ("save", [id, overrides @ ..]) => {
            let point_id = PointId::new(*id);
            let record = shell
                .points
                .points()
                .into_iter()
                .find(|point| point.id == point_id)
                .ok_or_else(|| anyhow!("no point with id {point_id}"))?;
            let mut draft = record.to_draft();
            apply_overrides(&mut draft, overrides)?;
            shell.presenter.submit_editor(&point_id, draft).await?;
        }
        ("save-new", overrides) => {
            let mut draft = PointDraft::blank(Utc::now());
            if let Some(first) = shell.points.destinations().first() {
                draft.destination = Some(first.id.clone());
            }
            apply_overrides(&mut draft, overrides)?;
            let created = shell.presenter.submit_new(draft).await?;
            info!(point_id = %created.id, "point created");
        }
        (other, _) => bail!("unknown command: {other} (try `help`)"),
    }
    println!("{}", shell.screen());
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().init();
    let args = Args::parse();

    let api = Arc::new(HttpApiService::new(&args.end_point, args.authorization)?);
    let points = Arc::new(PointsStore::new(api));
    let filter = Arc::new(FilterStore::new());
    let host = Arc::new(TermHost::new());
    let presenter = TripPresenter::new(points.clone(), filter.clone(), host.clone());
    presenter.init();

    if let Err(err) = points.load().await {
        // The table stays on its loading placeholder; nothing stale is shown.
        error!(error = %err, "initial load failed");
    }

    let mut shell = Shell {
        points,
        filter,
        host,
        presenter,
        mode: ScreenMode::Table,
        stats_view: None,
        creating: Arc::new(AtomicBool::new(false)),
    };
    println!("{}", shell.screen());
    println!("type `help` for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match run_command(&mut shell, &line).await {
            Ok(true) => {}
            Ok(false) => break,
            Err(err) => error!(error = %err, "command failed"),
        }
    }

    shell.presenter.destroy();
    Ok(())
}

pub mod cli;
pub mod clock;
pub mod config;
pub mod display;
pub mod export;
pub mod facets;
pub mod nl;
pub mod presets;
pub mod rules;
pub mod schema;
pub mod serializer;
pub mod state;

use crate::clock::{Clock, FixedClock};
use crate::config::FilterConfig;
use crate::display::{heading, print_json, print_warnings};
use crate::export::{DirectorySink, ExportSink, export_data};
use crate::facets::{FacetSpec, compute_facets};
use crate::presets::{FilterPreset, PresetError, PresetStore, SearchHistory};
use crate::rules::Row;
use crate::schema::{FieldDef, FieldType, record_fields, rule_warnings};
use crate::serializer::{Dialect, render, to_sql};
use crate::state::{FileStore, FilterState, FilterStateManager, FilterUpdate, UrlLocation};
use anyhow::{Context, bail};
use colored::Colorize;
use regex::Regex;
use serde_json::{Value, json};
use std::fs;
use std::path::Path;

pub use cli::{
    Cli, ColorMode, Commands, HistoryCommand, OutputFormat, PresetCommand, PresetWindow,
    StateCommand, cli_parse,
};
pub use rules::{Combinator, Operator, Rule, RuleNode, RuleTree, RuleValue};

/// Everything a command needs besides its own arguments.
struct Session {
    config: FilterConfig,
    clock: FixedClock,
    format: OutputFormat,
}

impl Session {
    fn store(&self) -> FileStore {
        FileStore::new(self.config.storage.dir.clone())
    }

    fn state_manager(&self, url: Option<&str>) -> anyhow::Result<FilterStateManager> {
        let mut builder = FilterStateManager::builder()
            .storage(self.store(), self.config.storage.state_key.clone())
            .clock(self.clock);
        if let Some(url) = url {
            if self.config.storage.url_persistence {
                let location =
                    UrlLocation::parse(url).with_context(|| format!("Invalid URL '{url}'"))?;
                builder = builder.url(location);
            } else {
                tracing::warn!("URL persistence is disabled in the config; ignoring --url");
            }
        }
        Ok(builder.build())
    }

    fn presets(&self) -> anyhow::Result<PresetStore<FileStore>> {
        PresetStore::load(self.store()).context("Failed to load saved filters")
    }

    fn history(&self) -> anyhow::Result<SearchHistory<FileStore>> {
        SearchHistory::load(self.store(), self.config.history.limit)
            .context("Failed to load search history")
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

fn read_rows(path: &Path) -> anyhow::Result<Vec<Row>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read rows from '{}'", path.display()))?;
    json5::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON array of objects", path.display()))
}

/// Rows matching the tree plus the consumer-side search term and regex.
fn apply_state(
    rows: Vec<Row>,
    tree: &RuleTree,
    search_term: &str,
    regex: Option<&Regex>,
) -> Vec<Row> {
    let term = search_term.to_lowercase();
    rows.into_iter()
        .filter(|row| tree.matches(row))
        .filter(|row| term.is_empty() || row_text(row).any(|s| s.to_lowercase().contains(&term)))
        .filter(|row| regex.is_none_or(|re| row_text(row).any(|s| re.is_match(&s))))
        .collect()
}

fn row_text(row: &Row) -> impl Iterator<Item = String> + '_ {
    row.values().filter_map(|v| match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    })
}

/// Facet kind follows the schema type; unknown fields get checkboxes.
fn facet_spec(field: &str, schema: &[FieldDef]) -> FacetSpec {
    match schema.iter().find(|f| f.name == field) {
        Some(def) => match def.field_type {
            FieldType::Number => FacetSpec::range(&def.name, &def.label, None),
            FieldType::Date => FacetSpec::date(&def.name, &def.label),
            _ => FacetSpec::checkbox(&def.name, &def.label),
        },
        None => FacetSpec::checkbox(field, field),
    }
}

fn history_label(query: Option<&str>, state: &FilterState, tree: &RuleTree) -> String {
    if let Some(text) = query.or(state.natural_language_query.as_deref()) {
        return text.to_string();
    }
    if !state.search_term.is_empty() {
        return state.search_term.clone();
    }
    to_sql(tree)
}

fn report_state(session: &Session, manager: &FilterStateManager) -> anyhow::Result<()> {
    let tree = manager.composite_tree();
    if session.json() {
        let mut out = json!({
            "state": manager.state(),
            "sql": to_sql(&tree),
            "mongo": serializer::to_mongo(&tree),
        });
        if let Some(url) = manager.url() {
            out["url"] = Value::String(url.to_string());
        }
        return print_json(&out);
    }

    heading("Filter state");
    println!("{}", serde_json::to_string_pretty(manager.state())?);
    display::print_queries(&render(&tree, Dialect::All))?;
    if let Some(url) = manager.url() {
        heading("URL");
        println!("{url}");
    }
    Ok(())
}

fn find_preset<'a>(
    store: &'a PresetStore<FileStore>,
    id: &str,
) -> anyhow::Result<&'a FilterPreset> {
    store
        .get(id)
        .ok_or_else(|| PresetError::NotFound(id.to_string()).into())
}

pub fn run(cli: Cli) -> anyhow::Result<()> {
    let config =
        crate::config::load_config(cli.config.as_deref()).context("Failed to load config")?;

    match cli.color {
        ColorMode::Always => colored::control::set_override(true),
        ColorMode::Never => colored::control::set_override(false),
        ColorMode::Auto => {}
    }

    let clock = match cli.now.as_deref() {
        Some(now) => FixedClock::parse(now)
            .with_context(|| format!("Invalid --now instant '{now}'"))?,
        // one invocation is one instant
        None => FixedClock(clock::SystemClock.now()),
    };

    let session = Session {
        config,
        clock,
        format: cli.format,
    };
    tracing::debug!(dir = %session.config.storage.dir.display(), "using storage directory");

    match cli.command {
        Commands::Parse { text, dialect } => {
            let tree = nl::parse_with_clock(&text, &session.clock);
            let rendered = render(&tree, dialect);
            print_warnings(&rule_warnings(&tree, &record_fields()));

            if session.json() {
                let mut out = json!({ "tree": tree });
                if let Some(sql) = rendered.sql {
                    out["sql"] = Value::String(sql);
                }
                if let Some(mongo) = rendered.mongo {
                    out["mongo"] = mongo;
                }
                print_json(&out)?;
            } else {
                heading("Rule tree");
                println!("{}", serde_json::to_string_pretty(&tree)?);
                display::print_queries(&rendered)?;
            }
        }
        Commands::Fields => {
            let fields = record_fields();
            if session.json() {
                print_json(&fields)?;
            } else {
                println!("{}", display::fields_table(&fields));
            }
        }
        Commands::Filter {
            input,
            query,
            no_history,
        } => {
            let rows = read_rows(&input)?;
            let total = rows.len();

            let state = match query.as_deref() {
                Some(text) => FilterState {
                    query: nl::parse_with_clock(text, &session.clock),
                    natural_language_query: Some(text.to_string()),
                    ..FilterState::default()
                },
                None => session.state_manager(None)?.state().clone(),
            };
            let tree = state.to_rule_tree();
            print_warnings(&rule_warnings(&tree, &record_fields()));

            let regex = state.active_regex();
            let matched = apply_state(rows, &tree, &state.search_term, regex.as_ref());

            if !no_history {
                let label = history_label(query.as_deref(), &state, &tree);
                if !label.is_empty() {
                    session
                        .history()?
                        .add_to_history(&label, matched.len(), &session.clock)
                        .context("Failed to record search history")?;
                }
            }

            if session.json() {
                print_json(&matched)?;
            } else {
                if !matched.is_empty() {
                    println!("{}", display::rows_table(&matched));
                }
                println!("{} of {} rows match", matched.len().to_string().bold(), total);
            }
        }
        Commands::Facets { input, fields } => {
            let rows = read_rows(&input)?;
            let schema = record_fields();
            let specs: Vec<FacetSpec> = fields.iter().map(|f| facet_spec(f, &schema)).collect();
            let manager = session.state_manager(None)?;
            let facets = compute_facets(&rows, &specs, &manager.state().column_filters);

            if session.json() {
                print_json(&facets)?;
            } else {
                display::print_facets(&facets);
            }
        }
        Commands::Export {
            input,
            export_format,
            columns,
            date_format,
            delimiter,
            no_headers,
            metadata,
            filtered,
            out_dir,
        } => {
            let mut rows = read_rows(&input)?;
            let defaults = &session.config.export;
            let mut options = defaults
                .to_options()
                .columns(columns)
                .include_headers(defaults.include_headers && !no_headers)
                .include_metadata(defaults.include_metadata || metadata);
            if let Some(date_format) = date_format {
                options = options.date_format(date_format);
            }
            if let Some(delimiter) = delimiter {
                options = options.delimiter(delimiter);
            }

            if filtered {
                let state = session.state_manager(None)?.state().clone();
                let regex = state.active_regex();
                rows = apply_state(rows, &state.to_rule_tree(), &state.search_term, regex.as_ref());
                options = options.filters(Some(state));
            }

            let artifact = export_data(&rows, export_format, &options, &session.clock)?;
            let dir = out_dir.unwrap_or_else(|| defaults.out_dir.clone());
            let path = DirectorySink::new(dir).deliver(&artifact)?;

            if session.json() {
                print_json(&json!({
                    "path": path.display().to_string(),
                    "mimeType": artifact.mime_type,
                    "rows": rows.len(),
                }))?;
            } else {
                println!("Exported {} rows to {}", rows.len(), path.display().to_string().green());
            }
        }
        Commands::State { url, action } => {
            let mut manager = session.state_manager(url.as_deref())?;
            match action {
                StateCommand::Show => {}
                StateCommand::Nl { text } => {
                    let parsed = manager.apply_natural_language(&text);
                    if parsed.is_empty() {
                        eprintln!("{} nothing recognized in '{text}'", "note:".yellow().bold());
                    }
                }
                StateCommand::Search { term } => manager.set_search_term(&term),
                StateCommand::Quick { tag } => manager.toggle_quick_filter(&tag),
                StateCommand::Regex { pattern } => {
                    let check = manager.set_regex(&pattern);
                    if let Some(message) = check.message {
                        print_warnings(&[format!("regex is stored but not applied: {message}")]);
                    }
                }
                StateCommand::Time { preset } => manager.set_time_preset(preset.into()),
                StateCommand::Facet { field, value } => manager.select_facet_value(&field, &value),
                StateCommand::ClearFacet { field, all } => match (field, all) {
                    (_, true) => manager.clear_all_facets(),
                    (Some(field), false) => manager.clear_facet(&field),
                    (None, false) => bail!("Pass a facet field or --all"),
                },
                StateCommand::Clear => manager.clear_filters(),
            }
            report_state(&session, &manager)?;
        }
        Commands::Presets { action } => match action {
            PresetCommand::List => {
                let store = session.presets()?;
                if session.json() {
                    print_json(store.presets())?;
                } else if store.presets().is_empty() {
                    println!("No saved filters");
                } else {
                    println!("{}", display::presets_table(store.presets()));
                }
            }
            PresetCommand::Save {
                name,
                description,
                public,
                tags,
                created_by,
            } => {
                let state = session.state_manager(None)?.state().clone();
                let preset = FilterPreset::new(name, state, &session.clock)
                    .description(description)
                    .public(public)
                    .tags(tags)
                    .created_by(created_by);
                let mut store = session.presets()?;
                let saved = store.save_filter(preset).context("Failed to save filter")?;
                if session.json() {
                    print_json(saved)?;
                } else {
                    println!("Saved '{}' as {}", saved.name, saved.id.green());
                }
            }
            PresetCommand::Delete { id } => {
                let mut store = session.presets()?;
                if store.delete_filter(&id)? {
                    println!("Deleted {id}");
                } else {
                    println!("No saved filter with id '{id}'");
                }
            }
            PresetCommand::Apply { id } => {
                let store = session.presets()?;
                let preset = find_preset(&store, &id)?;
                let mut manager = session.state_manager(None)?;
                manager.update_filter(FilterUpdate::from(preset.query.clone()));
                report_state(&session, &manager)?;
            }
            PresetCommand::Export { id, out_dir } => {
                let store = session.presets()?;
                let artifact = store.export_preset(&id)?;
                let dir = out_dir.unwrap_or_else(|| session.config.export.out_dir.clone());
                let path = DirectorySink::new(dir).deliver(&artifact)?;
                println!("Wrote {}", path.display().to_string().green());
            }
            PresetCommand::Import { file } => {
                let bytes = fs::read(&file)
                    .with_context(|| format!("Failed to read '{}'", file.display()))?;
                let mut store = session.presets()?;
                let imported = store
                    .import_preset(&bytes)
                    .with_context(|| format!("Failed to import '{}'", file.display()))?;
                println!("Imported '{}' ({})", imported.name, imported.id);
            }
            PresetCommand::Share { id } => {
                let store = session.presets()?;
                let preset = find_preset(&store, &id)?;
                let share = &session.config.share;
                println!("{}", presets::share_link(preset, &share.origin, &share.path));
            }
            PresetCommand::Decode { link } => {
                let shared = presets::decode_share_link(&link)?;
                print_json(&shared)?;
            }
        },
        Commands::History { action } => {
            let mut history = session.history()?;
            match action {
                HistoryCommand::List { limit } => {
                    let entries = &history.entries()[..limit.min(history.len())];
                    if session.json() {
                        print_json(entries)?;
                    } else if entries.is_empty() {
                        println!("No searches recorded");
                    } else {
                        println!("{}", display::history_table(entries));
                    }
                }
                HistoryCommand::Clear => {
                    history.clear_history()?;
                    println!("Search history cleared");
                }
            }
        }
    }

    Ok(())
}

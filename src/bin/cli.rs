use std::fs;
use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use collection_store::engine::{discovery, CollectionStore, Filter, Slot, SortKey};
use collection_store::models::{sample_catalog, sample_tasks, now_millis, Document, DocumentId};
use collection_store::SlotEnumeration;
use serde_json::Value;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[arg(short, long, env = "COLLECTION_DATA_DIR", default_value = "data")]
    data_dir: String,

    /// Durable slot holding the collection.
    #[arg(short, long, env = "COLLECTION_SLOT", default_value = "items")]
    slot: String,

    #[arg(long, env = "COLLECTION_PAGE_SIZE", default_value_t = 12)]
    page_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Clone)]
enum Commands {
    /// Append a JSON object with an `id`.
    Add { json: String },
    Remove { id: String },
    /// Shallow-merge a JSON object into a record; `null` deletes a field.
    Update { id: String, patch: String },
    Get { id: String },
    List(ListArgs),
    /// Append records from a JSON array file, skipping taken ids.
    Import { file: String },
    Export,
    /// List slot keys in the data directory.
    Slots,
    /// Write a sample collection into the slot if it is empty.
    Seed { kind: SeedKind },
}

#[derive(clap::Args, Clone)]
struct ListArgs {
    /// Case-insensitive text search.
    #[arg(long)]
    search: Option<String>,
    /// Fields the search looks at.
    #[arg(long = "search-field", default_value = "name")]
    search_fields: Vec<String>,
    /// Exact match, `field=value`.
    #[arg(long = "where")]
    exact: Vec<String>,
    /// Numeric range, `field=min-max` or `field=min+`.
    #[arg(long)]
    range: Vec<String>,
    /// Minimum value, `field=x`.
    #[arg(long)]
    min: Vec<String>,
    /// Boolean match, `field=true|false`.
    #[arg(long)]
    flag: Vec<String>,
    #[arg(long, default_value = "default")]
    sort: String,
    #[arg(long, default_value_t = 1)]
    page: usize,
}

#[derive(ValueEnum, Clone, Copy)]
enum SeedKind {
    Products,
    Tasks,
}

fn split_pair(arg: &str) -> anyhow::Result<(&str, &str)> {
    arg.split_once('=')
        .with_context(|| format!("expected field=value, got '{}'", arg))
}

fn parse_object(json: &str) -> anyhow::Result<serde_json::Map<String, Value>> {
    match serde_json::from_str::<Value>(json).context("invalid JSON")? {
        Value::Object(map) => Ok(map),
        _ => bail!("expected a JSON object"),
    }
}

fn apply_list_args(store: &mut CollectionStore<Document>, args: &ListArgs) -> anyhow::Result<()> {
    if let Some(query) = &args.search {
        store.set_filter("search", Filter::search(args.search_fields.iter().cloned(), query));
    }
    for arg in &args.exact {
        let (field, value) = split_pair(arg)?;
        store.set_filter(field, Filter::exact(field, value));
    }
    for arg in &args.range {
        let (field, spec) = split_pair(arg)?;
        store.set_filter(&format!("{}-range", field), Filter::parse_range(field, spec)?);
    }
    for arg in &args.min {
        let (field, spec) = split_pair(arg)?;
        store.set_filter(&format!("{}-min", field), Filter::parse_at_least(field, spec)?);
    }
    for arg in &args.flag {
        let (field, value) = split_pair(arg)?;
        let value: bool = value.parse().with_context(|| format!("'{}' is not true or false", value))?;
        store.set_filter(&format!("{}-flag", field), Filter::flag(field, value));
    }
    store.set_sort(args.sort.parse::<SortKey>()?);
    if !store.set_page(args.page) {
        eprintln!("Page {} does not exist, showing page {}", args.page, store.page());
    }
    Ok(())
}

fn seed_documents<T: serde::Serialize>(records: Vec<T>) -> anyhow::Result<Vec<Document>> {
    records
        .into_iter()
        .map(|r| -> anyhow::Result<Document> { Ok(serde_json::from_value(serde_json::to_value(r)?)?) })
        .collect()
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let storage = discovery::open(&cli.data_dir)?;

    if let Commands::Slots = cli.command {
        println!("{}", serde_json::to_string_pretty(&storage.keys()?)?);
        return Ok(());
    }

    let mut store: CollectionStore<Document> =
        CollectionStore::open(Slot::new(storage, &cli.slot), cli.page_size, Vec::new);

    match cli.command {
        Commands::Add { json } => {
            let doc = Document::from_json(&json).context("record must be a JSON object with an integer or string id")?;
            store.add(doc)?;
            println!("OK");
        }
        Commands::Remove { id } => {
            let id: DocumentId = id.parse()?;
            match store.remove(&id) {
                Some(_) => println!("OK"),
                None => println!("No record with id {}", id),
            }
        }
        Commands::Update { id, patch } => {
            let id: DocumentId = id.parse()?;
            let patch = parse_object(&patch)?;
            let mut patched = store
                .get(&id)
                .with_context(|| format!("record not found: {}", id))?
                .clone();
            patched.merge(&patch)?;
            let updated = store.update(&id, |doc| *doc = patched)?;
            println!("{}", serde_json::to_string_pretty(updated)?);
        }
        Commands::Get { id } => {
            let id: DocumentId = id.parse()?;
            let doc = store.get(&id).with_context(|| format!("record not found: {}", id))?;
            println!("{}", serde_json::to_string_pretty(doc)?);
        }
        Commands::List(args) => {
            apply_list_args(&mut store, &args)?;
            let view = store.view();
            println!("{}", serde_json::to_string_pretty(&view.items)?);
            eprintln!(
                "{} results, page {} of {}",
                view.filtered_count, view.page, view.page_count
            );
        }
        Commands::Import { file } => {
            let content = fs::read_to_string(&file).with_context(|| format!("could not read {}", file))?;
            let records: Vec<Document> = serde_json::from_str(&content).context("expected a JSON array of records")?;
            let report = store.import(records);
            println!("Imported {}, skipped {} duplicate ids", report.added, report.skipped);
        }
        Commands::Export => {
            println!("{}", store.export()?);
        }
        Commands::Seed { kind } => {
            if !store.is_empty() {
                bail!("slot {} already holds {} records", cli.slot, store.len());
            }
            let records = match kind {
                SeedKind::Products => seed_documents(sample_catalog())?,
                SeedKind::Tasks => seed_documents(sample_tasks(now_millis()))?,
            };
            let report = store.import(records);
            println!("Seeded {} records", report.added);
        }
        Commands::Slots => {}
    }

    if let Some(e) = store.last_storage_error() {
        eprintln!("warning: changes were not saved: {}", e);
    }

    Ok(())
}

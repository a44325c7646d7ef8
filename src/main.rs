use std::path::PathBuf;

use anyhow::Context;
use clap::{ArgMatches, CommandFactory, FromArgMatches, Parser};
use hashrel::{Collection, Config, FieldValue, Query, RecordType, Relation};
use serde_json::Value;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "hashrel")]
#[command(about = "Query a JSON record set with lazily-evaluated relations", long_about = None)]
struct Args {
    /// JSON file holding an array of records
    #[arg(short, long)]
    data: Option<PathBuf>,

    /// Record type name used in error messages
    #[arg(short, long)]
    name: Option<String>,

    /// Identifier field of the records
    #[arg(long)]
    id_field: Option<String>,

    /// Directory to load hashrel.toml and .env from
    #[arg(long, default_value = ".")]
    config_dir: PathBuf,

    /// Keep records matching a JSON query (repeatable)
    #[arg(short = 'w', long = "where")]
    filters: Vec<String>,

    /// Drop records matching a JSON query (repeatable)
    #[arg(long = "not")]
    exclusions: Vec<String>,

    /// Find a record by identifier
    #[arg(long, conflicts_with_all = ["find_by", "order", "pluck", "pick", "count"])]
    find: Option<String>,

    /// Find the first record matching a JSON query, failing if none does
    #[arg(long, conflicts_with_all = ["order", "pluck", "pick", "count"])]
    find_by: Option<String>,

    /// Order clause such as "name, age DESC"
    #[arg(long, conflicts_with_all = ["pluck", "pick", "count"])]
    order: Option<String>,

    /// Comma-separated fields to project from every record
    #[arg(long, value_delimiter = ',', conflicts_with_all = ["pick", "count"])]
    pluck: Vec<String>,

    /// Comma-separated fields to project from the first record
    #[arg(long, value_delimiter = ',', conflicts_with = "count")]
    pick: Vec<String>,

    /// Print the number of matching records
    #[arg(long)]
    count: bool,

    /// Pretty-print JSON output
    #[arg(long)]
    pretty: bool,
}

fn main() -> anyhow::Result<()> {
    let matches = Args::command().get_matches();
    let args = Args::from_arg_matches(&matches)?;

    let mut config = Config::load(&args.config_dir)?;
    if args.data.is_some() {
        config.data = args.data.clone();
    }
    if args.name.is_some() {
        config.type_name = args.name.clone();
    }
    if let Some(id_field) = &args.id_field {
        config.id_field = id_field.clone();
    }

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let data = config
        .data
        .clone()
        .context("no data file given (use --data or HASHREL_DATA)")?;
    let collection = Collection::load(&config.resolved_type_name(), &config.id_field, &data)
        .with_context(|| format!("failed to load records from {}", data.display()))?;
    tracing::info!("Loaded {} {} records", collection.len(), collection.name());

    let mut relation = collection.all();
    for (negated, raw) in clauses_in_order(&matches) {
        let query = parse_query(raw)?;
        relation = if negated {
            relation.not(query)
        } else {
            relation.filter(query)
        };
    }
    tracing::debug!("Query: {:?}", relation);

    let output = run(&args, &relation)?;
    let rendered = if args.pretty {
        serde_json::to_string_pretty(&output)?
    } else {
        serde_json::to_string(&output)?
    };
    println!("{}", rendered);

    Ok(())
}

/// `--where` and `--not` values in command-line order, `true` marking `--not`.
fn clauses_in_order(matches: &ArgMatches) -> Vec<(bool, &str)> {
    let mut clauses = Vec::new();
    for (id, negated) in [("filters", false), ("exclusions", true)] {
        if let (Some(indices), Some(values)) =
            (matches.indices_of(id), matches.get_many::<String>(id))
        {
            clauses.extend(indices.zip(values).map(|(index, raw)| (index, negated, raw.as_str())));
        }
    }
    clauses.sort_by_key(|(index, _, _)| *index);
    clauses
        .into_iter()
        .map(|(_, negated, raw)| (negated, raw))
        .collect()
}

fn parse_query(raw: &str) -> anyhow::Result<Query> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("invalid JSON query: {}", raw))?;
    Ok(Query::from_json(&value)?)
}

/// Run the requested terminal operation and return its JSON output.
fn run(args: &Args, relation: &Relation<'_, Collection>) -> anyhow::Result<Value> {
    if let Some(id) = &args.find {
        let id = serde_json::from_str::<Value>(id).unwrap_or_else(|_| Value::String(id.clone()));
        let record = relation.find(FieldValue::from(&id))?;
        return Ok(serde_json::to_value(record)?);
    }

    if let Some(query) = &args.find_by {
        let record = relation.find_by_strict(parse_query(query)?)?;
        return Ok(serde_json::to_value(record)?);
    }

    if let Some(clause) = &args.order {
        let records = relation.order(clause.as_str())?;
        return Ok(serde_json::to_value(records)?);
    }

    if !args.pluck.is_empty() {
        let fields: Vec<&str> = args.pluck.iter().map(String::as_str).collect();
        return Ok(serde_json::to_value(relation.pluck(&fields))?);
    }

    if !args.pick.is_empty() {
        let fields: Vec<&str> = args.pick.iter().map(String::as_str).collect();
        return Ok(relation.pick(&fields).map(Value::from).unwrap_or(Value::Null));
    }

    if args.count {
        return Ok(Value::from(relation.count()));
    }

    let records = relation.to_vec();
    tracing::debug!("{} of {} records matched", records.len(), relation.owner().records().len());
    Ok(serde_json::to_value(records)?)
}

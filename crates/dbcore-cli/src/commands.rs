use std::sync::Arc;

use anyhow::{bail, Context as _};
use chrono::{DateTime, Utc};
use colored::Colorize;
use serde_json::json;

use dbcore_store::{
    Envelope, FileRecordStore, RecordKey, RecordStore, StoreConfig, StoreError, StoreResult,
    TypeRegistry,
};
use dbcore_types::{timestamp, EntityId, EntityMeta, Record};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    tracing::debug!(base_dir = %config.base_dir.display(), "store configured");

    // Opening a file store touches nothing on disk.
    let store = FileRecordStore::new(config, Arc::new(TypeRegistry::with_base_types()));
    match cli.command {
        Command::Ls(args) => cmd_ls(&store, args, cli.format),
        Command::Show(args) => cmd_show(&store, args, cli.format),
        Command::Rm(args) => cmd_rm(&store, args, cli.format),
        Command::Fsck(args) => cmd_fsck(&store, args, cli.format),
        Command::Config => cmd_config(store.config(), cli.format),
    }
}

/// Process exit status for a failed command.
///
/// Store failures get one status per kind; everything else is 1.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<StoreError>().map(StoreError::code) {
        Some("not_found") => 2,
        Some("decode") => 3,
        Some("missing_field") => 4,
        Some("type_resolution") => 5,
        Some("invalid_key") => 6,
        _ => 1,
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<StoreConfig> {
    let mut config = match &cli.config {
        Some(path) => StoreConfig::from_toml_file(path)?,
        None => StoreConfig::default(),
    };
    if let Some(dir) = &cli.dir {
        config.base_dir = dir.clone();
    }
    Ok(config)
}

fn parse_key(args: &KeyArgs) -> StoreResult<RecordKey> {
    let id: EntityId = args.id.parse().map_err(|e| StoreError::InvalidKey {
        reason: format!("{e}"),
    })?;
    RecordKey::new(args.type_tag.as_str(), id)
}

/// Load a record far enough to prove it is intact.
///
/// Types known to the registry are fully decoded. For any other type the
/// attributes must at least hold valid entity metadata matching the key.
fn check_record(
    store: &FileRecordStore,
    key: &RecordKey,
) -> StoreResult<(Envelope, EntityMeta)> {
    let envelope = store.read_envelope(key)?;
    if store
        .registry()
        .contains(&envelope.type_location, &envelope.type_tag)
    {
        let record = envelope.open(key, store.registry())?;
        let meta = record.meta().clone();
        return Ok((envelope, meta));
    }

    let meta: EntityMeta = serde_json::from_str(&envelope.attributes)
        .map_err(|e| StoreError::decode(key, e.to_string()))?;
    if !key.has_type(&envelope.type_tag) || meta.id != key.id() {
        return Err(StoreError::decode(
            key,
            format!(
                "envelope does not match key: holds {}+{}",
                envelope.type_tag, meta.id
            ),
        ));
    }
    Ok((envelope, meta))
}

fn cmd_ls(store: &FileRecordStore, args: LsArgs, format: OutputFormat) -> anyhow::Result<()> {
    let keys = match &args.type_tag {
        Some(tag) => store.list_keys(tag)?,
        None => store.keys()?,
    };

    match format {
        OutputFormat::Json => {
            let keys: Vec<String> = keys.iter().map(ToString::to_string).collect();
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        OutputFormat::Text => {
            for key in &keys {
                println!("{} {}", key.type_tag().cyan(), key.id());
            }
            if keys.is_empty() {
                println!("No records.");
            }
        }
    }
    Ok(())
}

fn cmd_show(store: &FileRecordStore, args: KeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = parse_key(&args)?;
    let (envelope, meta) = check_record(store, &key)?;

    match format {
        OutputFormat::Json => {
            let attributes: serde_json::Value = serde_json::from_str(&envelope.attributes)
                .with_context(|| format!("attributes of {key}"))?;
            let out = json!({
                "key": key.to_string(),
                "type_tag": envelope.type_tag,
                "type_location": envelope.type_location,
                "attributes": attributes,
            });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            println!("{}", key.to_string().yellow().bold());
            println!("  Type: {} ({})", envelope.type_tag.cyan(), envelope.type_location);
            match meta.parent_id {
                Some(parent) => println!("  Parent: {parent}"),
                None => println!("  Parent: {}", "none".dimmed()),
            }
            println!("  Created: {}", stamp(meta.created_at));
            println!("  Updated: {}", stamp(meta.updated_at));
            if meta.is_deleted {
                println!(
                    "  Deleted: {} at {}",
                    "yes".red(),
                    stamp(meta.deleted_at)
                );
            }
            println!("  Attributes: {}", envelope.attributes);
        }
    }
    Ok(())
}

fn stamp(at: Option<DateTime<Utc>>) -> String {
    at.as_ref().map_or_else(|| "-".into(), timestamp::format)
}

fn cmd_rm(store: &FileRecordStore, args: KeyArgs, format: OutputFormat) -> anyhow::Result<()> {
    let key = parse_key(&args)?;
    store.delete(&key)?;
    match format {
        OutputFormat::Json => println!("{}", json!({ "deleted": key.to_string() })),
        OutputFormat::Text => println!("{} Deleted {}", "✓".green(), key.to_string().yellow()),
    }
    Ok(())
}

fn cmd_fsck(store: &FileRecordStore, args: FsckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let keys = match &args.type_tag {
        Some(tag) => store.list_keys(tag)?,
        None => store.keys()?,
    };

    let mut failures = Vec::new();
    for key in &keys {
        if let Err(e) = check_record(store, key) {
            // A record deleted mid-scan is not corruption.
            if !e.is_not_found() {
                failures.push((key.clone(), e));
            }
        }
    }

    match format {
        OutputFormat::Json => {
            let failed: Vec<_> = failures
                .iter()
                .map(|(key, e)| {
                    json!({ "key": key.to_string(), "code": e.code(), "error": e.to_string() })
                })
                .collect();
            let out = json!({ "checked": keys.len(), "failed": failed });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        OutputFormat::Text => {
            for (key, e) in &failures {
                println!("{} {} [{}] {}", "✗".red(), key, e.code().red(), e);
            }
            if failures.is_empty() {
                println!("{} {} records, no issues.", "✓".green().bold(), keys.len());
            }
        }
    }

    if !failures.is_empty() {
        bail!("{} of {} records failed to load", failures.len(), keys.len());
    }
    Ok(())
}

fn cmd_config(config: &StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(config)?),
        OutputFormat::Text => print!("{}", toml::to_string(config)?),
    }
    Ok(())
}

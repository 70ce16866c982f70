//! CLI command implementations
//!
//! Each command loads what it needs, runs once and writes a single result
//! to stdout.

use std::path::Path;

use serde_json::{json, Value};
use tracing::debug;

use crate::codec::{decode_filters, encode_filters};
use crate::config::DashboardConfig;
use crate::search::JsonClauseBuilder;
use crate::service::FilterService;

use super::args::Command;
use super::errors::{CliError, CliResult};
use super::io::{write_json, write_line};

/// Caller id for filters exchanged from the command line
const CLI_CALLER: &str = "cli";

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    run_command(cli.command)
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    match cmd {
        Command::Encode { config } => write_line(&encode(&config)?),
        Command::Decode { query } => write_json(&decode(&query)?),
        Command::Describe { config } => write_json(&describe(&config)?),
        Command::Apply {
            config,
            query,
            write,
        } => write_json(&apply(&config, &query, write)?),
    }
}

/// Compact query string of the saved filters in a config file
pub fn encode(config_path: &Path) -> CliResult<String> {
    let config = DashboardConfig::load(config_path)?;
    Ok(encode_filters(&config.filters))
}

/// Saved filter designs of a query string, as JSON
pub fn decode(query: &str) -> CliResult<Value> {
    let filters = decode_filters(query)?;
    Ok(serde_json::to_value(filters)?)
}

/// Activate the saved filters and list every non-empty bucket
pub fn describe(config_path: &Path) -> CliResult<Value> {
    let config = DashboardConfig::load(config_path)?;
    config.validate()?;

    let service = restore(&config);
    let buckets: Vec<Value> = service
        .collection()
        .iter()
        .filter(|(_, filters)| !filters.is_empty())
        .map(|(data_sources, filters)| {
            json!({
                "data_sources": data_sources.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "filters": filters
                    .iter()
                    .map(|filter| json!({
                        "id": filter.id(),
                        "name": filter.name(),
                        "relations": filter.relations(),
                    }))
                    .collect::<Vec<_>>(),
            })
        })
        .collect();

    Ok(json!({ "buckets": buckets }))
}

/// Exchange the filters of a query string into the saved filters.
///
/// Relation groups of the config apply to the added filters. With `write`
/// the resulting filters replace those of the config file.
pub fn apply(config_path: &Path, query: &str, write: bool) -> CliResult<Value> {
    let mut config = DashboardConfig::load(config_path)?;
    let relations = config.relation_groups()?;

    let designs = decode_filters(query)?
        .iter()
        .map(|saved| {
            saved
                .resolve(&config)
                .ok_or_else(|| CliError::UnresolvedFilter(saved.describe()))
        })
        .collect::<CliResult<Vec<_>>>()?;

    let service = restore(&config);
    let change = service.exchange_filters(CLI_CALLER, &designs, &relations, &JsonClauseBuilder, &[]);
    config.filters = service.get_filters_to_save_in_config();
    debug!(
        config = %config_path.display(),
        buckets = change.len(),
        filters = config.filters.len(),
        "Applied query filters"
    );

    if write {
        config.save(config_path)?;
    }

    Ok(json!({
        "change": serde_json::to_value(&change)?,
        "filters": serde_json::to_value(&config.filters)?,
    }))
}

fn restore(config: &DashboardConfig) -> FilterService {
    let service = FilterService::new();
    service.set_filters_from_config(&config.filters, config, &JsonClauseBuilder);
    service
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_config(temp_dir: &TempDir, filters: Value) -> PathBuf {
        let config_path = temp_dir.path().join("dashboard.json");
        let config = json!({
            "datastores": [{
                "name": "es",
                "databases": [{
                    "name": "news",
                    "pretty_name": "News",
                    "tables": [
                        {"name": "articles", "pretty_name": "Articles", "fields": [
                            {"column_name": "author", "pretty_name": "Author"},
                            {"column_name": "words", "pretty_name": "Words", "type": "integer"}
                        ]},
                        {"name": "authors", "pretty_name": "Authors", "fields": [
                            {"column_name": "name", "pretty_name": "Name"}
                        ]}
                    ]
                }]
            }],
            "relations": [[["es.news.articles.author"], ["es.news.authors.name"]]],
            "filters": filters
        });

        fs::write(&config_path, config.to_string()).unwrap();
        config_path
    }

    fn words_filter(value: i64) -> Value {
        json!({
            "datastore": "es", "database": "news", "table": "articles",
            "field": "words", "operator": ">", "value": value
        })
    }

    #[test]
    fn test_encode_saved_filters() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!([words_filter(100)]));

        let query = encode(&config_path).unwrap();
        assert_eq!(query, r#"[["es.news.articles.words",">",100,"and"]]"#);
    }

    #[test]
    fn test_decode_query() {
        let decoded = decode(r#"[["es.news.articles.words",">",100]]"#).unwrap();
        assert_eq!(
            decoded,
            json!([{
                "root": "and",
                "datastore": "es",
                "database": "news",
                "table": "articles",
                "field": "words",
                "operator": ">",
                "value": 100
            }])
        );
    }

    #[test]
    fn test_decode_invalid_query() {
        let result = decode("[1]");
        assert_eq!(result.unwrap_err().code(), "DASHFILTER_CLI_QUERY_ERROR");
    }

    #[test]
    fn test_describe_lists_buckets() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!([words_filter(100)]));

        let described = describe(&config_path).unwrap();
        let buckets = described["buckets"].as_array().unwrap();
        assert_eq!(buckets.len(), 1);
        assert_eq!(
            buckets[0]["data_sources"],
            json!(["es.news.articles.words >"])
        );
        assert_eq!(
            buckets[0]["filters"][0]["name"],
            json!("News / Articles / Words > 100")
        );
    }

    #[test]
    fn test_describe_rejects_unknown_field() {
        let temp_dir = TempDir::new().unwrap();
        let mut unknown = words_filter(1);
        unknown["field"] = json!("title");
        let config_path = create_config(&temp_dir, json!([unknown]));

        let result = describe(&config_path);
        assert_eq!(result.unwrap_err().code(), "DASHFILTER_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_apply_expands_relations_and_writes() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!([words_filter(100)]));

        let result = apply(
            &config_path,
            r#"[["es.news.articles.author","=","Ann"]]"#,
            true,
        )
        .unwrap();
        assert_eq!(result["change"]["entries"].as_array().unwrap().len(), 2);

        let saved = DashboardConfig::load(&config_path).unwrap();
        assert_eq!(saved.filters.len(), 3);
        assert_eq!(saved.filters[1].relations().len(), 1);
        assert_eq!(saved.filters[2].relations().len(), 1);
    }

    #[test]
    fn test_apply_replaces_compatible_filter() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!([words_filter(100)]));

        let result = apply(
            &config_path,
            r#"[["es.news.articles.words",">",500]]"#,
            false,
        )
        .unwrap();
        assert_eq!(result["filters"].as_array().unwrap().len(), 1);
        assert_eq!(result["filters"][0]["value"], json!(500));

        let untouched = DashboardConfig::load(&config_path).unwrap();
        assert_eq!(encode_filters(&untouched.filters), r#"[["es.news.articles.words",">",100,"and"]]"#);
    }

    #[test]
    fn test_apply_unknown_field() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = create_config(&temp_dir, json!([]));

        let result = apply(&config_path, r#"[["es.news.articles.title","=","x"]]"#, false);
        assert_eq!(result.unwrap_err().code(), "DASHFILTER_CLI_UNKNOWN_FIELD");
    }

    #[test]
    fn test_missing_config() {
        let temp_dir = TempDir::new().unwrap();
        let result = encode(&temp_dir.path().join("missing.json"));
        assert_eq!(result.unwrap_err().code(), "DASHFILTER_CLI_CONFIG_ERROR");
    }
}

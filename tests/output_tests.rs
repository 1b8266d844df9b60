// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use std::path::PathBuf;

use sql_lineage_analyzer::{
    classify::{ClassificationResult, preview_requests},
    output::{
        EMPTY_LISTING_MESSAGE, OutputFormat, OutputOptions, format_classification, format_error,
        format_listing, format_prompts, format_warning
    },
    repo::{ScriptFile, ScriptLocator}
};

fn plain(format: OutputFormat) -> OutputOptions {
    OutputOptions {
        format,
        colored: false
    }
}

fn sample_files() -> Vec<ScriptFile> {
    vec![
        ScriptFile {
            name:    "customers_etl.sql".to_string(),
            locator: ScriptLocator::Local(PathBuf::from("/work/etl/customers_etl.sql"))
        },
        ScriptFile {
            name:    "orders_etl.sql".to_string(),
            locator: ScriptLocator::Remote("https://raw.example/orders_etl.sql".to_string())
        }
    ]
}

fn sample_result() -> ClassificationResult {
    ClassificationResult {
        source_tables:      "staging.orders".to_string(),
        destination_tables: "dw.orders".to_string(),
        business_logic:     "Copies staged orders into the warehouse.".to_string()
    }
}

#[test]
fn test_output_format_default() {
    let format = OutputFormat::default();
    assert!(matches!(format, OutputFormat::Text));
}

#[test]
fn test_output_options_default() {
    let opts = OutputOptions::default();
    assert!(matches!(opts.format, OutputFormat::Text));
    assert!(opts.colored);
}

#[test]
fn test_format_listing_text() {
    let output = format_listing(&sample_files(), &plain(OutputFormat::Text));
    assert!(output.starts_with("SQL files:\n"));
    assert!(output.contains("  1. customers_etl.sql\n"));
    assert!(output.contains("  2. orders_etl.sql\n"));
}

#[test]
fn test_format_listing_empty() {
    let output = format_listing(&[], &plain(OutputFormat::Text));
    assert_eq!(output, format!("warning: {}", EMPTY_LISTING_MESSAGE));
}

#[test]
fn test_format_listing_json() {
    let output = format_listing(&sample_files(), &plain(OutputFormat::Json));
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed[0]["name"], "customers_etl.sql");
    assert_eq!(parsed[0]["locator"]["kind"], "local");
    assert_eq!(parsed[1]["locator"]["at"], "https://raw.example/orders_etl.sql");
}

#[test]
fn test_format_listing_yaml() {
    let output = format_listing(&sample_files(), &plain(OutputFormat::Yaml));
    assert!(output.contains("name: orders_etl.sql"));
}

#[test]
fn test_format_classification_text() {
    let output = format_classification(
        "orders_etl.sql",
        &sample_result(),
        &plain(OutputFormat::Text)
    );
    assert_eq!(
        output,
        "=== Analysis Results: orders_etl.sql ===\n\n\
         Source Tables:\nstaging.orders\n\n\
         Destination Tables:\ndw.orders\n\n\
         Business Logic:\nCopies staged orders into the warehouse."
    );
}

#[test]
fn test_format_classification_failed() {
    let result = ClassificationResult::failed(&"connection refused");
    let output = format_classification("orders_etl.sql", &result, &plain(OutputFormat::Text));
    assert!(output.ends_with("Business Logic:\nError analyzing script: connection refused"));
}

#[test]
fn test_format_classification_json() {
    let output = format_classification(
        "orders_etl.sql",
        &sample_result(),
        &plain(OutputFormat::Json)
    );
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed["file"], "orders_etl.sql");
    assert_eq!(parsed["result"]["source_tables"], "staging.orders");
    assert_eq!(parsed["result"]["destination_tables"], "dw.orders");
}

#[test]
fn test_format_classification_yaml() {
    let output = format_classification(
        "orders_etl.sql",
        &sample_result(),
        &plain(OutputFormat::Yaml)
    );
    assert!(output.contains("source_tables: staging.orders"));
}

#[test]
fn test_format_classification_colored_keeps_content() {
    let opts = OutputOptions {
        format:  OutputFormat::Text,
        colored: true
    };
    let output = format_classification("orders_etl.sql", &sample_result(), &opts);
    assert!(output.contains("staging.orders"));
    assert!(output.contains("Source Tables:"));
}

#[test]
fn test_format_prompts_text() {
    let script = "INSERT INTO dw.orders SELECT * FROM staging.orders;";
    let prompts = preview_requests(script, 0.7);
    let output = format_prompts("orders_etl.sql", &prompts, &plain(OutputFormat::Text));

    assert!(output.starts_with("=== DRY RUN - Would send to LLM: orders_etl.sql ==="));
    assert!(output.contains("[Source Tables] max_tokens=150"));
    assert!(output.contains("[Destination Tables] max_tokens=150"));
    assert!(output.contains("[Business Logic] max_tokens=250"));
    assert_eq!(output.matches(script).count(), 3);
}

#[test]
fn test_format_prompts_json() {
    let prompts = preview_requests("SELECT 1;", 0.7);
    let output = format_prompts("a.sql", &prompts, &plain(OutputFormat::Json));
    let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
    assert_eq!(parsed.as_array().unwrap().len(), 3);
    assert_eq!(parsed[2]["category"], "business_logic");
    assert_eq!(parsed[2]["request"]["max_tokens"], 250);
}

#[test]
fn test_format_warning_and_error() {
    let opts = plain(OutputFormat::Text);
    assert_eq!(format_warning("careful", &opts), "warning: careful");
    assert_eq!(format_error("broken", &opts), "error: broken");
}

// SPDX-FileCopyrightText: 2025 RAprogramm
// SPDX-License-Identifier: MIT

use clap::Parser;
use sql_lineage_analyzer::cli::{Cli, Commands, Format, Policy, Provider, Transport};

#[test]
fn test_provider_default_model_groq() {
    assert_eq!(Provider::Groq.default_model(), "llama-3.1-8b-instant");
}

#[test]
fn test_provider_default_model_openai() {
    assert_eq!(Provider::OpenAI.default_model(), "gpt-4");
}

#[test]
fn test_provider_default_model_anthropic() {
    assert_eq!(Provider::Anthropic.default_model(), "claude-sonnet-4-20250514");
}

#[test]
fn test_provider_default_model_ollama() {
    assert_eq!(Provider::Ollama.default_model(), "llama3.2");
}

#[test]
fn test_provider_default_base_url() {
    assert_eq!(
        Provider::Groq.default_base_url(),
        "https://api.groq.com/openai/v1"
    );
    assert_eq!(Provider::Ollama.default_base_url(), "http://localhost:11434");
}

#[test]
fn test_provider_from_name() {
    assert_eq!(Provider::from_name("groq"), Some(Provider::Groq));
    assert_eq!(Provider::from_name("OpenAI"), Some(Provider::OpenAI));
    assert_eq!(Provider::from_name("ollama"), Some(Provider::Ollama));
    assert_eq!(Provider::from_name("bard"), None);
}

#[test]
fn test_parse_list_command() {
    let cli = Cli::try_parse_from([
        "sql-lineage-analyzer",
        "list",
        "-r",
        "acme/warehouse",
        "-t",
        "ghp_x",
        "--transport",
        "clone",
        "--workdir",
        "/tmp/w"
    ])
    .unwrap();

    let Commands::List {
        repo,
        output_format,
        no_color
    } = cli.command
    else {
        panic!("expected list command");
    };
    assert_eq!(repo.repo.as_deref(), Some("acme/warehouse"));
    assert_eq!(repo.transport, Transport::Clone);
    assert_eq!(output_format, Format::Text);
    assert!(!no_color);
}

#[test]
fn test_parse_analyze_command() {
    let cli = Cli::try_parse_from([
        "sql-lineage-analyzer",
        "--verbose",
        "analyze",
        "-r",
        "acme/warehouse",
        "-t",
        "ghp_x",
        "--provider",
        "openai",
        "--file",
        "orders_etl.sql",
        "--error-policy",
        "per-category",
        "--temperature",
        "0.3",
        "-f",
        "json",
        "--dry-run"
    ])
    .unwrap();

    assert!(cli.verbose);
    let Commands::Analyze {
        llm,
        file,
        error_policy,
        output_format,
        dry_run,
        ..
    } = cli.command
    else {
        panic!("expected analyze command");
    };
    assert_eq!(llm.provider, Some(Provider::OpenAI));
    assert_eq!(llm.temperature, Some(0.3));
    assert_eq!(file.as_deref(), Some("orders_etl.sql"));
    assert_eq!(error_policy, Some(Policy::PerCategory));
    assert_eq!(output_format, Format::Json);
    assert!(dry_run);
}

#[test]
fn test_parse_rejects_unknown_transport() {
    let result = Cli::try_parse_from([
        "sql-lineage-analyzer",
        "list",
        "--transport",
        "ftp"
    ]);
    assert!(result.is_err());
}

#[test]
fn test_repo_args_mut_reaches_either_command() {
    let mut cli = Cli::try_parse_from(["sql-lineage-analyzer", "list", "-r", "acme/etl"]).unwrap();
    cli.repo_args_mut().token = Some("ghp_typed".to_string());
    let Commands::List { repo, .. } = &cli.command else {
        panic!("expected list command");
    };
    assert_eq!(repo.token.as_deref(), Some("ghp_typed"));

    let mut cli =
        Cli::try_parse_from(["sql-lineage-analyzer", "analyze", "-r", "acme/etl"]).unwrap();
    assert_eq!(cli.repo_args_mut().repo.as_deref(), Some("acme/etl"));
}

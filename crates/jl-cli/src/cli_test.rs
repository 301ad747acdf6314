use super::*;
use clap::CommandFactory;

#[test]
fn verify_cli_args() {
    // Validates the entire command tree: short flag conflicts,
    // duplicate args, and other clap definition errors.
    Cli::command().debug_assert();
}

#[test]
fn test_check_args() {
    let cli = Cli::try_parse_from([
        "jl",
        "check",
        "-e",
        "a,b",
        "--fail-fast",
        "-o",
        "json",
        "-p",
        "tutorial",
    ])
    .unwrap();

    assert_eq!(cli.global.project_dir, "tutorial");
    match cli.command {
        Commands::Check(args) => {
            assert_eq!(args.entries.as_deref(), Some("a,b"));
            assert!(args.fail_fast);
            assert_eq!(args.output, CheckOutput::Json);
            assert!(!args.timings);
        }
        other => panic!("unexpected command: {:?}", other),
    }
}

#[test]
fn test_global_target_after_subcommand() {
    let cli = Cli::try_parse_from(["jl", "seed", "--target", "fixtures.duckdb"]).unwrap();
    assert_eq!(cli.global.target.as_deref(), Some("fixtures.duckdb"));
    assert!(matches!(cli.command, Commands::Seed(_)));
}

#[test]
fn test_unknown_output_format_is_rejected() {
    assert!(Cli::try_parse_from(["jl", "ls", "-o", "tree"]).is_err());
}

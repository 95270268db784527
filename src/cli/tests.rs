use super::*;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn bare_invocation_defaults_to_chat() {
    let args = parse_args(&["weai"]);
    assert!(args.command.is_none());
    assert!(!args.chat.open);
    assert!(!args.chat.no_background);
    assert!(args.chat.server_url.is_none());
}

#[test]
fn chat_flags_parse_before_and_after_subcommand() {
    let args = parse_args(&[
        "weai",
        "--server-url",
        "http://farm.local:8000",
        "chat",
        "--open",
        "--log",
        "talk.txt",
        "--no-background",
    ]);
    assert!(matches!(args.command, Some(Commands::Chat)));
    assert_eq!(
        args.chat.server_url.as_deref(),
        Some("http://farm.local:8000")
    );
    assert!(args.chat.open);
    assert!(args.chat.no_background);
    assert_eq!(args.chat.log.as_deref(), Some("talk.txt"));

    let options: ChatOptions = args.chat.into();
    assert!(options.open);
    assert_eq!(options.log.as_deref(), Some("talk.txt"));
}

#[test]
fn debug_log_is_separate_from_transcript_log() {
    let args = parse_args(&["weai", "--debug-log", "trace.log"]);
    assert_eq!(args.chat.debug_log.as_deref(), Some("trace.log"));
    assert!(args.chat.log.is_none());
}

#[test]
fn set_collects_multi_word_values() {
    let args = parse_args(&["weai", "set", "greeting", "Hello", "there", "farmer"]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key, "greeting");
            assert_eq!(join_value(value).as_deref(), Some("Hello there farmer"));
        }
        _ => panic!("expected set subcommand"),
    }
}

#[test]
fn set_without_value_prints_config() {
    let args = parse_args(&["weai", "set", "server-url"]);
    match args.command {
        Some(Commands::Set { value, .. }) => assert!(join_value(value).is_none()),
        _ => panic!("expected set subcommand"),
    }
}

#[test]
fn unset_takes_a_key() {
    let args = parse_args(&["weai", "unset", "background"]);
    match args.command {
        Some(Commands::Unset { key }) => assert_eq!(key, "background"),
        _ => panic!("expected unset subcommand"),
    }
    assert!(Args::try_parse_from(["weai", "unset"]).is_err());
}

#[test]
fn version_mentions_package_version() {
    assert!(VERSION.starts_with(env!("CARGO_PKG_VERSION")));
}

use hostfacts_core::{CommandSource, ParserDefinitionError};
use hostfacts_parsers::ParserRegistry;
use hostfacts_parsers::parser::CommandParser;
use hostfacts_parsers::parser::strategies::{PsParser, RpmParser};

fn ps_source(name: &str, args: &[&str]) -> CommandSource {
    CommandSource::new(name, "/bin/ps", args.iter().copied()).with_supported_os(["Linux"])
}

fn good_ps_sources() -> Vec<CommandSource> {
    vec![
        ps_source("GoodPsArgs1", &["-ef"])
            .with_doc("ps with the default/typical non-specified format."),
        ps_source("GoodPsArgs2", &["h", "-ewwo", "pid,ppid,uid,comm,cmd"])
            .with_doc("ps where we specify the format."),
    ]
}

#[test]
fn test_empty_source_list_is_valid() {
    assert!(PsParser.validate(&[]).is_ok());
}

#[test]
fn test_good_ps_sources_are_valid() {
    assert!(PsParser.validate(&good_ps_sources()).is_ok());
}

#[test]
fn test_each_bad_ps_source_fails_validation() {
    let bad = [
        ps_source("BadPsArgsDuplicateCmd", &["h", "-ewwo", "pid,ppid,uid,cmd,comm,cmd"]),
        ps_source("BadPsArgsCmdNotAtEnd", &["-ewwo", "pid,ppid,uid,cmd,comm"]),
        ps_source("BadPsArgsNoPid", &["h", "-eo", "user,comm,args"]),
    ];

    for source in bad {
        let mut sources = good_ps_sources();
        sources.push(source.clone());

        let err = PsParser
            .validate(&sources)
            .expect_err("bad source must be rejected");
        assert_eq!(err.source_name(), Some(source.name.as_str()));
    }
}

#[test]
fn test_duplicate_cmd_is_reported_as_duplicate_first() {
    let sources = [ps_source(
        "BadPsArgsDuplicateCmd",
        &["h", "-ewwo", "pid,ppid,uid,cmd,comm,cmd"],
    )];

    let errors = PsParser.definition_errors(&sources);
    assert_eq!(
        errors.first(),
        Some(&ParserDefinitionError::DuplicateField {
            source_name: "BadPsArgsDuplicateCmd".to_string(),
            field: "cmd".to_string(),
        })
    );
}

#[test]
fn test_validation_does_not_touch_sources() {
    let sources = good_ps_sources();
    let before = sources.clone();
    let _ = PsParser.validate(&sources);
    assert_eq!(sources, before);
}

#[test]
fn test_platform_mismatch_is_rejected() {
    let source = CommandSource::new("WinPackages", "/bin/rpm", ["-qa"]).with_supported_os(["Windows"]);
    let err = RpmParser.validate(&[source]).expect_err("platform mismatch");
    assert_eq!(err.rule(), "unsupported_platform");
}

#[test]
fn test_catalog_validation_routes_by_command() {
    let registry = ParserRegistry::with_defaults();
    let mut sources = good_ps_sources();
    sources.push(CommandSource::new("RedhatPackages", "/bin/rpm", ["-qa"]));
    sources.push(CommandSource::new("DebianPackages", "/usr/bin/dpkg", ["--list"]));
    sources.push(CommandSource::new("Hardware", "/usr/sbin/dmidecode", ["-q"]));
    assert!(registry.validate_catalog(&sources).is_ok());

    sources.push(ps_source("BadPsArgsCmdNotAtEnd", &["-ewwo", "pid,ppid,uid,cmd,comm"]));
    sources.push(CommandSource::new("RedhatPackages", "/bin/rpm", ["-qa"]));

    let rules: Vec<_> = registry
        .catalog_errors(&sources)
        .iter()
        .map(ParserDefinitionError::rule)
        .collect();
    assert_eq!(rules, vec!["duplicate_source", "command_line_not_last"]);
}

#[test]
fn test_user_filter_value_is_not_a_layout() {
    let sources = [
        ps_source("PsForBuild", &["-f", "-U", "build"]),
        ps_source("PsForUbuntu", &["-f", "-u", "ubuntu"]),
        ps_source("PsPidList", &["-f", "-p", "1,2,3"]),
    ];
    assert!(PsParser.validate(&sources).is_ok());
}

//! CLI arg parsing tests driven through the built binary.
use std::process::Command;

fn run(args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_apuctl"))
        .args(args)
        .output()
        .expect("run apuctl");
    let text = format!(
        "{}{}",
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr)
    );
    (output.status.success(), text)
}

#[test]
fn help_lists_every_subcommand() {
    let (ok, text) = run(&["--help"]);
    assert!(ok, "apuctl --help did not succeed\n{text}");
    for command in [
        "info",
        "watch",
        "set-tdp",
        "set-governor",
        "set-epp",
        "toggle-max-perf",
    ] {
        assert!(
            text.contains(command),
            "help text missing subcommand '{command}'\n{text}"
        );
    }
}

#[test]
fn set_tdp_rejects_non_numeric_watts() {
    let (ok, text) = run(&["set-tdp", "plenty"]);
    assert!(!ok, "set-tdp accepted a non-numeric argument\n{text}");
}

#[test]
fn watch_help_mentions_the_verbose_flag() {
    let (ok, text) = run(&["watch", "--help"]);
    assert!(ok, "apuctl watch --help did not succeed\n{text}");
    assert!(text.contains("--verbose"), "missing --verbose flag\n{text}");
}

#[test]
fn unknown_subcommands_are_rejected() {
    let (ok, _) = run(&["defrag"]);
    assert!(!ok, "unknown subcommand was accepted");
}

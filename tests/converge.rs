#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! End-to-end convergence against a temporary home: idempotence, backup
//! safety, partial failure, and the dotfile link scenarios.

mod common;

use common::*;

use bootstrap_cli::backends::BackendSet;
use bootstrap_cli::commands::{Outcome, install};
use bootstrap_cli::config::catalog::Backend;
use bootstrap_cli::converge;
use bootstrap_cli::platform::Os;

const APT_CATALOG: &str = r#"
[essential]
apt = ["git", "zsh", "curl"]
"#;

const LINK_CATALOG: &str = r#"
[dotfile]
links = ["common/zshrc", { source = "common/p10k.zsh", target = ".p10k.zsh" }]
"#;

// ---------------------------------------------------------------------------
// Packages
// ---------------------------------------------------------------------------

#[test]
fn second_run_installs_nothing() {
    let env = TestEnv::new();
    let apt = FakeBackend::new(Backend::Apt).with_installed(&["git"]);
    let ctx = env.context(Os::Linux, apt.clone().into_set());
    let selection = select_all(&catalog(APT_CATALOG), &ctx.platform);

    let first = converge::apply(&selection, &ctx);
    assert_eq!(first.applied.len(), 2);
    assert_eq!(first.skipped.len(), 1);

    let second = converge::apply(&selection, &ctx);
    assert!(second.applied.is_empty());
    assert_eq!(second.skipped.len(), 3);
    assert_eq!(apt.installs(), ["zsh", "curl"]);
}

#[test]
fn one_failure_does_not_stop_the_run() {
    let env = TestEnv::new();
    let apt = FakeBackend::new(Backend::Apt).with_failing(&["zsh"]);
    let ctx = env.context(Os::Linux, apt.clone().into_set());
    let selection = select_all(&catalog(APT_CATALOG), &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert_eq!(apt.installs(), ["git", "zsh", "curl"]);
    assert_eq!(report.applied.len(), 2);
    assert_eq!(report.failed.len(), 1);
    let (target, reason) = &report.failed[0];
    assert_eq!(target.id, "apt:zsh");
    assert!(reason.contains("exit 100"), "{reason}");
    assert_eq!(install::outcome(&report), Outcome::Completed);
    assert_eq!(install::outcome(&report).exit_code(), 0);
}

#[test]
fn missing_adapter_is_recorded_per_target() {
    let env = TestEnv::new();
    let ctx = env.context(Os::Linux, BackendSet::default());
    let selection = select_all(&catalog(APT_CATALOG), &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert_eq!(report.failed.len(), 3);
    assert!(report.failed[0].1.contains("no apt adapter"));
}

#[test]
fn dry_run_plans_without_installing() {
    let env = TestEnv::new();
    let apt = FakeBackend::new(Backend::Apt).with_installed(&["curl"]);
    let ctx = env
        .context(Os::Linux, apt.clone().into_set())
        .with_dry_run(true);
    let selection = select_all(&catalog(APT_CATALOG), &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert!(apt.installs().is_empty());
    assert_eq!(report.planned.len(), 2);
    assert_eq!(report.skipped.len(), 1);
    assert_eq!(report.summary(true), "2 would change, 1 already ok, 0 failed");
}

// ---------------------------------------------------------------------------
// Dotfile links
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn zshrc_is_backed_up_and_linked_on_linux() {
    let env = TestEnv::new()
        .with_dotfile("common/zshrc", "export ZSH=$HOME/.oh-my-zsh\n")
        .with_dotfile("common/p10k.zsh", "# p10k\n")
        .with_home_file(".zshrc", "# hand-written zshrc\n");
    let ctx = env.context(Os::Linux, BackendSet::default());
    let selection = select_all(&catalog(LINK_CATALOG), &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert!(report.failed.is_empty(), "{:?}", report.failed);
    assert_eq!(report.applied.len(), 2);
    let zshrc = env.home().join(".zshrc");
    assert!(zshrc.symlink_metadata().unwrap().file_type().is_symlink());
    assert_eq!(
        std::fs::read_link(&zshrc).unwrap(),
        env.root().join("dotfiles/common/zshrc")
    );

    let backups = env.backups_of(".zshrc");
    assert_eq!(backups.len(), 1);
    assert_eq!(report.backups.len(), 1);
    assert_eq!(report.backups[0].backup, backups[0]);
    assert_eq!(
        std::fs::read_to_string(&backups[0]).unwrap(),
        "# hand-written zshrc\n"
    );

    let again = converge::apply(&selection, &ctx);
    assert!(again.applied.is_empty());
    assert_eq!(again.skipped.len(), 2);
    assert_eq!(env.backups_of(".zshrc").len(), 1);
}

#[cfg(unix)]
#[test]
fn wrong_symlink_is_replaced_without_backup() {
    let env = TestEnv::new()
        .with_dotfile("common/zshrc", "# managed\n")
        .with_dotfile("common/p10k.zsh", "# p10k\n")
        .with_home_file("elsewhere", "# other\n");
    std::os::unix::fs::symlink(env.home().join("elsewhere"), env.home().join(".zshrc")).unwrap();
    let ctx = env.context(Os::Linux, BackendSet::default());
    let selection = select_all(&catalog(LINK_CATALOG), &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert!(report.backups.is_empty());
    assert!(env.backups_of(".zshrc").is_empty());
    assert_eq!(
        std::fs::read_link(env.home().join(".zshrc")).unwrap(),
        env.root().join("dotfiles/common/zshrc")
    );
    assert_eq!(
        std::fs::read_to_string(env.home().join("elsewhere")).unwrap(),
        "# other\n"
    );
}

#[cfg(unix)]
#[test]
fn repeated_conflicts_get_distinct_backups() {
    let env = TestEnv::new()
        .with_dotfile("common/zshrc", "# managed\n")
        .with_dotfile("common/p10k.zsh", "# p10k\n");
    let ctx = env.context(Os::Linux, BackendSet::default());
    let selection = select_all(&catalog(LINK_CATALOG), &ctx.platform);
    let zshrc = env.home().join(".zshrc");

    for generation in 0..3 {
        if zshrc.symlink_metadata().is_ok() {
            std::fs::remove_file(&zshrc).unwrap();
        }
        std::fs::write(&zshrc, format!("# generation {generation}\n")).unwrap();
        let report = converge::apply(&selection, &ctx);
        assert_eq!(report.backups.len(), 1);
    }

    let backups = env.backups_of(".zshrc");
    assert_eq!(backups.len(), 3);
    let mut contents: Vec<String> = backups
        .iter()
        .map(|b| std::fs::read_to_string(b).unwrap())
        .collect();
    contents.sort();
    assert_eq!(
        contents,
        ["# generation 0\n", "# generation 1\n", "# generation 2\n"]
    );
}

#[cfg(unix)]
#[test]
fn missing_source_fails_only_that_link() {
    let env = TestEnv::new().with_dotfile("common/p10k.zsh", "# p10k\n");
    let ctx = env.context(Os::Linux, BackendSet::default());
    let selection = select_all(&catalog(LINK_CATALOG), &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0.id, "link:.zshrc");
    assert_eq!(report.applied.len(), 1);
    assert!(env.home().join(".zshrc").symlink_metadata().is_err());
}

#[cfg(unix)]
#[test]
fn backup_pass_moves_conflicts_without_linking() {
    let env = TestEnv::new()
        .with_dotfile("common/zshrc", "# managed\n")
        .with_dotfile("common/p10k.zsh", "# p10k\n")
        .with_home_file(".zshrc", "# mine\n");
    let ctx = env.context(Os::Linux, BackendSet::default());
    let selection = select_all(&catalog(LINK_CATALOG), &ctx.platform);

    let report = converge::links::backup_conflicts(selection.targets(), &ctx);

    assert_eq!(report.backups.len(), 1);
    assert_eq!(report.skipped.len(), 1);
    assert!(env.home().join(".zshrc").symlink_metadata().is_err());
    assert_eq!(env.backups_of(".zshrc").len(), 1);
}

// ---------------------------------------------------------------------------
// Identity template
// ---------------------------------------------------------------------------

const TEMPLATE_CATALOG: &str = r#"
[dotfile]
templates = [{ source = "templates/gitconfig.local", target = ".gitconfig.local" }]
"#;

const TEMPLATE: &str = "[user]\n\tname = {{NAME}}\n\temail = {{EMAIL}}\n{{CREDENTIAL_HELPER}}\n";

#[test]
fn identity_file_is_rendered_for_the_platform() {
    let env = TestEnv::new().with_repo_file("templates/gitconfig.local", TEMPLATE);
    let ctx = env
        .context(Os::MacOs, BackendSet::default())
        .with_identity(identity());
    let selection = select_all(&catalog(TEMPLATE_CATALOG), &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert!(report.failed.is_empty(), "{:?}", report.failed);
    let rendered = std::fs::read_to_string(env.home().join(".gitconfig.local")).unwrap();
    assert!(rendered.contains("name = Ada Lovelace"));
    assert!(rendered.contains("email = ada@example.com"));
    assert!(rendered.contains("helper = osxkeychain"));

    let again = converge::apply(&selection, &ctx);
    assert_eq!(again.skipped.len(), 1);
}

#[test]
fn missing_identity_fails_the_template_only() {
    let env = TestEnv::new()
        .with_repo_file("templates/gitconfig.local", TEMPLATE)
        .with_dotfile("common/editorconfig", "root = true\n");
    let catalog = catalog(
        r#"
[dotfile]
links = ["common/editorconfig"]
templates = [{ source = "templates/gitconfig.local", target = ".gitconfig.local" }]
"#,
    );
    let ctx = env.context(Os::Linux, BackendSet::default());
    let selection = select_all(&catalog, &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0.id, "template:.gitconfig.local");
    assert!(report.failed[0].1.contains("git identity not configured"));
    assert!(!env.home().join(".gitconfig.local").exists());
    if cfg!(unix) {
        assert_eq!(report.applied.len(), 1);
    }
}

#[test]
fn rerun_without_identity_keeps_rendered_file() {
    let env = TestEnv::new().with_repo_file("templates/gitconfig.local", TEMPLATE);
    let selection = {
        let ctx = env.context(Os::Linux, BackendSet::default());
        select_all(&catalog(TEMPLATE_CATALOG), &ctx.platform)
    };
    let with_identity = env
        .context(Os::Linux, BackendSet::default())
        .with_identity(identity());
    let first = converge::apply(&selection, &with_identity);
    assert_eq!(first.applied.len(), 1);
    let rendered = std::fs::read_to_string(env.home().join(".gitconfig.local")).unwrap();

    let anonymous = env.context(Os::Linux, BackendSet::default());
    let second = converge::apply(&selection, &anonymous);

    assert!(second.failed.is_empty(), "{:?}", second.failed);
    assert_eq!(second.skipped.len(), 1);
    assert_eq!(
        std::fs::read_to_string(env.home().join(".gitconfig.local")).unwrap(),
        rendered
    );
    assert!(env.backups_of(".gitconfig.local").is_empty());
}

// ---------------------------------------------------------------------------
// Clones
// ---------------------------------------------------------------------------

#[cfg(unix)]
#[test]
fn failed_clone_keeps_its_backup_in_the_report() {
    let env = TestEnv::new().with_home_file(".oh-my-zsh/custom.zsh", "# mine\n");
    let url = format!("file://{}", env.dir.path().join("no-such-repo").display());
    let catalog = catalog(&format!(
        r#"
[dotfile]
clones = [{{ name = "oh-my-zsh", url = "{url}", dest = ".oh-my-zsh" }}]
"#
    ));
    let log = RecordingLog::default();
    let ctx = env.recorded_context(Os::Linux, BackendSet::default(), &log);
    let selection = select_all(&catalog, &ctx.platform);

    let report = converge::apply(&selection, &ctx);

    assert_eq!(report.failed.len(), 1);
    assert!(report.failed[0].1.contains("original moved to"), "{}", report.failed[0].1);
    let backups = env.backups_of(".oh-my-zsh");
    assert_eq!(backups.len(), 1);
    assert_eq!(report.backups.len(), 1);
    assert_eq!(report.backups[0].backup, backups[0]);
    assert!(backups[0].join("custom.zsh").exists());

    assert!(log.has("warn", "before failing"), "{:?}", log.lines());
    assert!(log.has("error", "clone:oh-my-zsh failed"), "{:?}", log.lines());
}

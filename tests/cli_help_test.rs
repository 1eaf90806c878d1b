#[cfg(test)]
mod cli_help_tests {
    use assert_cmd::prelude::*;
    use predicates::prelude::*;
    use std::process::Command;
    use tempfile::TempDir;

    /// Run the binary against an isolated configuration directory
    fn fbcli(config_dir: &TempDir) -> Command {
        let mut cmd = Command::cargo_bin("fbcli").unwrap();
        cmd.env("FBCLI_CONFIG_DIR", config_dir.path());
        cmd.env_remove("RUST_LOG");
        cmd
    }

    #[test]
    fn test_cli_help_output() {
        let config_dir = TempDir::new().unwrap();
        let assert_result = fbcli(&config_dir).arg("--help").assert().success();
        let output = assert_result.get_output();
        let help_output = String::from_utf8_lossy(&output.stdout);

        println!("CLI Help Output:\n{}", help_output);

        assert!(help_output.contains("Usage:"));
        assert!(help_output.contains("Options:"));
        assert!(help_output.contains("Commands:"));
        assert!(help_output.contains("login"));
        assert!(help_output.contains("logout"));
        assert!(help_output.contains("config"));
        assert!(help_output.contains("--non-interactive"));
        assert!(help_output.contains("-h, --help"));
        assert!(help_output.contains("-V, --version"));
    }

    #[test]
    fn test_cli_version_output() {
        let config_dir = TempDir::new().unwrap();
        fbcli(&config_dir)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("fbcli"));
    }

    #[test]
    fn test_nested_subcommand_help() {
        let nested_commands = vec![("config", "get")];

        for (parent_cmd, sub_cmd) in nested_commands {
            let config_dir = TempDir::new().unwrap();
            let assert_result = fbcli(&config_dir)
                .arg(parent_cmd)
                .arg(sub_cmd)
                .arg("--help")
                .assert()
                .success();
            let output = assert_result.get_output();
            let help_output = String::from_utf8_lossy(&output.stdout);

            assert!(help_output.contains("Usage:"));
            assert!(help_output.contains(parent_cmd));
            assert!(help_output.contains(sub_cmd));
            assert!(help_output.contains("path"));
        }
    }

    #[test]
    fn test_non_interactive_login_fails_with_exit_code_one() {
        let config_dir = TempDir::new().unwrap();
        fbcli(&config_dir)
            .arg("login")
            .arg("--non-interactive")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("non-interactive mode"));

        assert!(!config_dir.path().join("configstore.json").exists());
        assert!(!config_dir.path().join("config.yml").exists());
    }

    #[test]
    fn test_login_with_stored_credential_reports_already_logged_in() {
        let config_dir = TempDir::new().unwrap();
        std::fs::write(
            config_dir.path().join("configstore.json"),
            r#"{"user":{"email":"a@b.com"},"session":{"token":"x"},"usage":false}"#,
        )
        .unwrap();

        fbcli(&config_dir)
            .arg("login")
            .env("FBCLI_REALTIME_ORIGIN", "http://127.0.0.1:9")
            .assert()
            .success()
            .stdout(predicate::str::contains("Already logged in as"))
            .stdout(predicate::str::contains("a@b.com"));
    }

    #[test]
    fn test_logout_clears_stored_credential() {
        let config_dir = TempDir::new().unwrap();
        let store = config_dir.path().join("configstore.json");
        std::fs::write(
            &store,
            r#"{"user":{"email":"a@b.com"},"session":{"token":"x"},"usage":true}"#,
        )
        .unwrap();

        fbcli(&config_dir)
            .arg("logout")
            .assert()
            .success()
            .stdout(predicate::str::contains("a@b.com"));

        let content = std::fs::read_to_string(&store).unwrap();
        assert!(!content.contains("session"));
    }

    #[test]
    fn test_logout_when_not_logged_in() {
        let config_dir = TempDir::new().unwrap();
        fbcli(&config_dir)
            .arg("logout")
            .assert()
            .success()
            .stdout(predicate::str::contains("not logged in"));
    }

    #[test]
    fn test_config_get_path() {
        let config_dir = TempDir::new().unwrap();
        fbcli(&config_dir)
            .args(["config", "get", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.yml"));
    }
}

//! Integration tests for Glacier

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::path::Path;
    use tempfile::TempDir;

    /// Command isolated from any user config
    fn glacier(temp: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("glacier");
        cmd.env("GLACIER_CONFIG", temp.path().join("config.toml"))
            .current_dir(temp.path());
        cmd
    }

    fn write(dir: &Path, name: &str, content: &str) {
        std::fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn help_displays() {
        let temp = TempDir::new().unwrap();
        glacier(&temp)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("deep-frozen cache"));
    }

    #[test]
    fn version_displays() {
        let temp = TempDir::new().unwrap();
        glacier(&temp)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("glacier"));
    }

    #[test]
    fn load_prints_json() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.json", r#"{"x": [1, 2, {"y": 3}]}"#);

        glacier(&temp)
            .args(["load", "--format", "json", "a.json"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"{"x":[1,2,{"y":3}]}"#));
    }

    #[test]
    fn load_toml_manifest() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "site.toml", "[server]\nport = 8080\n");

        glacier(&temp)
            .args(["load", "--format", "json", "site.toml"])
            .assert()
            .success()
            .stdout(predicate::str::contains(r#"{"server":{"port":8080}}"#));
    }

    #[test]
    fn repeated_path_hits_cache() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.json", "{}");

        glacier(&temp)
            .args(["load", "--stats", "a.json", "a.json"])
            .assert()
            .success()
            .stderr(predicate::str::contains("hits: 1").and(predicate::str::contains("misses: 1")));
    }

    #[test]
    fn no_cache_bypasses_store() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.json", "{}");

        glacier(&temp)
            .args(["load", "--no-cache", "--stats", "a.json", "a.json"])
            .assert()
            .success()
            .stderr(predicate::str::contains("bypassed: 2").and(predicate::str::contains("0 cached")));
    }

    #[test]
    fn eval_prints_globals() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "build-manifest.js",
            "globalThis.__BUILD_MANIFEST = { pages: { '/': ['main.js'] } };",
        );

        glacier(&temp)
            .args(["eval", "--format", "json", "build-manifest.js"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                r#"{"__BUILD_MANIFEST":{"pages":{"/":["main.js"]}}}"#,
            ));
    }

    #[test]
    fn eval_empty_manifest_fails() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "empty.js", "");

        glacier(&temp)
            .args(["eval", "empty.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Manifest file is empty"));
    }

    #[test]
    fn eval_exception_fails() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "bad.js", "throw new Error('broken manifest');");

        glacier(&temp)
            .args(["eval", "bad.js"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("evaluation failed"));
    }

    #[test]
    fn missing_manifest_fails_with_hint() {
        let temp = TempDir::new().unwrap();
        glacier(&temp)
            .args(["load", "nope.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Manifest not found").and(predicate::str::contains("Hint:")));
    }

    #[test]
    fn malformed_manifest_fails() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "bad.json", "{\"x\": ");

        glacier(&temp)
            .args(["load", "bad.json"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Malformed manifest"));
    }

    #[test]
    fn config_path() {
        let temp = TempDir::new().unwrap();
        glacier(&temp)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let temp = TempDir::new().unwrap();
        glacier(&temp)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"));
    }

    #[test]
    fn config_set_disables_caching() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "a.json", "{}");

        glacier(&temp)
            .args(["config", "set", "cache.enabled", "false"])
            .assert()
            .success();

        glacier(&temp)
            .args(["load", "--stats", "a.json", "a.json"])
            .assert()
            .success()
            .stderr(predicate::str::contains("bypassed: 2"));
    }

    #[test]
    fn config_set_unknown_key_fails() {
        let temp = TempDir::new().unwrap();
        glacier(&temp)
            .args(["config", "set", "cache.size", "1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Unknown config key"));
    }
}

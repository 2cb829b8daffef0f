//! Integration tests for Javelin

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::io::Write;
    use std::path::Path;
    use tempfile::TempDir;
    use zip::write::FileOptions;

    /// Command isolated from the user's configuration
    fn javelin(home: &TempDir) -> Command {
        let mut cmd = cargo_bin_cmd!("javelin");
        cmd.arg("--config")
            .arg(home.path().join("config.toml"))
            .env_remove("BP_BUILD_ARGUMENTS")
            .env_remove("BP_BUILT_ARTIFACT")
            .env_remove("BP_BUILT_MODULE");
        cmd
    }

    fn write_executable_jar(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        let mut jar = zip::ZipWriter::new(fs::File::create(path).unwrap());
        let options = FileOptions::<()>::default();
        jar.start_file("META-INF/MANIFEST.MF", options).unwrap();
        jar.write_all(b"Manifest-Version: 1.0\r\nMain-Class: com.example.Main\r\n\r\n")
            .unwrap();
        jar.start_file("com/example/Main.class", options).unwrap();
        jar.write_all(b"cafebabe").unwrap();
        jar.start_file("fixture-marker", options).unwrap();
        jar.finish().unwrap();
    }

    fn source_tree(root: &Path) {
        fs::create_dir_all(root.join("src/main/java")).unwrap();
        fs::write(root.join("src/main/java/Main.java"), "class Main {}").unwrap();
        fs::write(root.join("build.gradle"), "apply plugin: 'java'").unwrap();
    }

    #[test]
    fn help_displays() {
        let home = TempDir::new().unwrap();
        javelin(&home)
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("cached builds for Java applications"));
    }

    #[test]
    fn version_displays() {
        let home = TempDir::new().unwrap();
        javelin(&home)
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("javelin"));
    }

    #[test]
    fn config_path() {
        let home = TempDir::new().unwrap();
        javelin(&home)
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show() {
        let home = TempDir::new().unwrap();
        javelin(&home)
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[build]"))
            .stdout(predicate::str::contains("toolchain-probe"));
    }

    #[test]
    fn invalid_config_reports_error() {
        let home = TempDir::new().unwrap();
        fs::write(home.path().join("config.toml"), "[build\n").unwrap();
        javelin(&home)
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }

    #[test]
    fn fingerprint_prints_record() {
        let home = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        source_tree(source.path());

        javelin(&home)
            .args(["fingerprint", "--toolchain-version", "17.0.2", "--source"])
            .arg(source.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("java-version = \"17.0.2\""))
            .stdout(predicate::str::contains("Main.java"))
            .stdout(predicate::str::contains("drwx"));
    }

    #[test]
    fn fingerprint_json() {
        let home = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        source_tree(source.path());

        javelin(&home)
            .args(["fingerprint", "--format", "json", "--toolchain-version", "17"])
            .arg("--source")
            .arg(source.path())
            .assert()
            .success()
            .stdout(predicate::str::contains("\"java-version\": \"17\""));
    }

    #[test]
    fn fingerprint_missing_source_fails() {
        let home = TempDir::new().unwrap();
        javelin(&home)
            .args(["fingerprint", "--toolchain-version", "17", "--source"])
            .arg(home.path().join("missing"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Failed to fingerprint"));
    }

    #[test]
    fn cache_show_empty() {
        let home = TempDir::new().unwrap();
        javelin(&home)
            .args(["cache", "show", "--cache-dir"])
            .arg(home.path().join("cache"))
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached build"));
    }

    #[test]
    fn build_without_build_files_fails() {
        let home = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        javelin(&home)
            .args(["build", "--toolchain-version", "17", "--source"])
            .arg(source.path())
            .arg("--cache-dir")
            .arg(home.path().join("cache"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("pass --tool"));
    }

    #[cfg(unix)]
    #[test]
    fn build_then_hit() {
        let home = TempDir::new().unwrap();
        let source = TempDir::new().unwrap();
        let cache = home.path().join("cache");

        let jar = home.path().join("app.jar");
        write_executable_jar(&jar);

        // `true` stands in for Gradle; the artifact is already in place
        let prepare = |root: &Path| {
            source_tree(root);
            fs::create_dir_all(root.join("build/libs")).unwrap();
            fs::copy(&jar, root.join("build/libs/app.jar")).unwrap();
        };
        let build = |home: &TempDir| {
            let mut cmd = javelin(home);
            cmd.args(["build", "--executable", "true", "--toolchain-version", "17.0.2"])
                .arg("--source")
                .arg(source.path())
                .arg("--cache-dir")
                .arg(&cache);
            cmd
        };

        prepare(source.path());
        build(&home)
            .assert()
            .success()
            .stdout(predicate::str::contains("built"));

        assert!(source.path().join("fixture-marker").exists());
        assert!(source.path().join("com/example/Main.class").exists());
        assert!(!source.path().join("src/main/java/Main.java").exists());
        assert!(cache.join("application.zip").exists());

        javelin(&home)
            .args(["cache", "show", "--cache-dir"])
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("17.0.2"));

        for entry in fs::read_dir(source.path()).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                fs::remove_dir_all(&path).unwrap();
            } else {
                fs::remove_file(&path).unwrap();
            }
        }
        prepare(source.path());
        build(&home)
            .assert()
            .success()
            .stdout(predicate::str::contains("cache hit"));
        assert!(source.path().join("fixture-marker").exists());

        javelin(&home)
            .args(["cache", "clear", "--cache-dir"])
            .arg(&cache)
            .assert()
            .success()
            .stdout(predicate::str::contains("cleared"));
        assert!(!cache.join("application.zip").exists());
    }
}

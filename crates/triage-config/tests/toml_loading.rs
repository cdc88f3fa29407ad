//! Integration tests for TOML configuration loading.
//!
//! Uses figment::Jail for safe, sandboxed env var manipulation.

use figment::{
    Figment, Jail,
    providers::{Env, Format, Serialized, Toml},
};
use triage_config::TriageConfig;

#[test]
fn loads_all_sections_from_toml() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "config.toml",
            r#"
[audit]
secret = "toml-secret"

[database]
path = "/var/lib/triage/triage.db"

[general]
default_limit = 50
default_actor = "usr-oncall"
"#,
        )?;

        let config: TriageConfig = Figment::from(Serialized::defaults(TriageConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert!(config.audit.is_configured());
        assert_eq!(config.audit.secret, "toml-secret");
        assert_eq!(config.database.path, "/var/lib/triage/triage.db");
        assert_eq!(config.general.default_limit, 50);
        assert_eq!(config.general.default_actor, "usr-oncall");
        Ok(())
    });
}

#[test]
fn partial_toml_keeps_defaults() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[general]\ndefault_limit = 5\n")?;

        let config: TriageConfig = Figment::from(Serialized::defaults(TriageConfig::default()))
            .merge(Toml::file("config.toml"))
            .extract()?;

        assert_eq!(config.general.default_limit, 5);
        assert!(!config.audit.is_configured());
        assert_eq!(config.database.path, ".triage/triage.db");
        Ok(())
    });
}

#[test]
fn env_beats_toml() {
    Jail::expect_with(|jail| {
        jail.create_file("config.toml", "[audit]\nsecret = \"from-toml\"\n")?;
        jail.set_env("TRIAGE_AUDIT__SECRET", "from-env");

        let config: TriageConfig = Figment::from(Serialized::defaults(TriageConfig::default()))
            .merge(Toml::file("config.toml"))
            .merge(Env::prefixed("TRIAGE_").split("__"))
            .extract()?;

        assert_eq!(config.audit.secret, "from-env");
        Ok(())
    });
}

#[test]
fn project_config_is_discovered() {
    Jail::expect_with(|jail| {
        jail.create_dir(".triage")?;
        jail.create_file(".triage/config.toml", "[audit]\nsecret = \"project-secret\"\n")?;

        let config = TriageConfig::load().expect("config loads");
        assert_eq!(config.audit.secret, "project-secret");
        Ok(())
    });
}

#[test]
fn relative_database_path_is_anchored_at_project_root() {
    Jail::expect_with(|jail| {
        let root = jail.directory().to_path_buf();
        let config = TriageConfig::load_from(&root).expect("config loads");
        assert_eq!(
            std::path::PathBuf::from(&config.database.path),
            root.join(".triage/triage.db")
        );
        Ok(())
    });
}

#[test]
fn invalid_limit_is_rejected_on_load() {
    Jail::expect_with(|jail| {
        jail.create_dir(".triage")?;
        jail.create_file(".triage/config.toml", "[general]\ndefault_limit = 0\n")?;

        assert!(TriageConfig::load().is_err());
        Ok(())
    });
}

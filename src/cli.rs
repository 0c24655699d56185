use clap::Parser;
use directories::BaseDirs;
use once_cell::sync::Lazy;
use std::{ffi::OsString, path::PathBuf, time::Duration};

use crate::auth::session::SessionSettings;

pub static CLI: Lazy<Cli> = Lazy::new(parse_args);

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[arg(
        short,
        long,
        env = "MENUBOARD_DB",
        value_name = "FILE",
        help = "Path to the SQLite database file (created if it does not exist)",
        default_value = get_default_database_file()
    )]
    pub database: PathBuf,
    #[arg(
        short,
        long,
        env = "MENUBOARD_BIND",
        value_name = "ADDR",
        default_value = "127.0.0.1:8000"
    )]
    pub bind: String,
    #[arg(
        short,
        long,
        env = "MENUBOARD_SECRET_KEY",
        value_name = "SECRET",
        hide_env_values = true,
        value_parser = parse_secret_key,
        help = "Secret used to sign session tokens"
    )]
    pub secret_key: String,
    #[arg(
        long,
        env = "MENUBOARD_SESSION_TTL",
        value_name = "SECONDS",
        default_value_t = 86_400,
        help = "Lifetime of a login session"
    )]
    pub session_ttl_secs: u64,
    #[arg(
        long,
        env = "MENUBOARD_TEMPLATES",
        value_name = "GLOB",
        default_value = default_templates_glob()
    )]
    pub templates: String,
}

impl Cli {
    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            secret_key: self.secret_key.clone(),
            ttl: Duration::from_secs(self.session_ttl_secs),
        }
    }
}

fn parse_secret_key(value: &str) -> Result<String, String> {
    if value.trim().is_empty() {
        return Err("secret key must not be blank".to_owned());
    }
    Ok(value.to_owned())
}

pub fn parse_args() -> Cli {
    Cli::parse()
}

fn get_default_database_file() -> OsString {
    let db_name = "menuboard.sqlite";
    if cfg!(target_os = "android") {
        db_name.into()
    } else {
        match BaseDirs::new() {
            Some(base_dirs) => base_dirs.data_dir().join("menuboard").join(db_name).into(),
            None => db_name.into(),
        }
    }
}

pub fn default_templates_glob() -> String {
    concat!(env!("CARGO_MANIFEST_DIR"), "/templates/**/*").to_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply() {
        let cli = Cli::try_parse_from(["menuboard", "--secret-key", "k"]).unwrap();

        assert_eq!(cli.bind, "127.0.0.1:8000");
        assert_eq!(cli.session_settings().ttl, Duration::from_secs(86_400));
        assert!(cli.database.ends_with("menuboard.sqlite"));
    }

    #[test]
    fn secret_key_is_required() {
        std::env::remove_var("MENUBOARD_SECRET_KEY");
        assert!(Cli::try_parse_from(["menuboard"]).is_err());
    }

    #[test]
    fn blank_secret_key_is_rejected() {
        assert!(Cli::try_parse_from(["menuboard", "--secret-key", ""]).is_err());
        assert!(Cli::try_parse_from(["menuboard", "--secret-key", "   "]).is_err());
    }
}

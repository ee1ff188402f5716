//! Configuration file handling and refresh-mode resolution.
//!
//! Flags and environment variables (wired up in [`crate::cli`]) take
//! precedence over the optional YAML config file, which is searched at
//! `~/.refreshment.yaml` unless `--config` points elsewhere. The merged
//! values resolve into a [`RefreshMode`], an explicit two-variant choice
//! rather than an inference from whichever flags happen to be set, so a
//! half-specified mode is rejected up front instead of failing somewhere
//! down the line.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use log::info;
use serde::Deserialize;

use crate::cli::Args;

/// Values accepted in `~/.refreshment.yaml`. Keys match the long flag
/// names; all are optional and lose to flags and environment variables.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub mfa_serial: Option<String>,
    pub token: Option<String>,
    pub path_to_substrate: Option<PathBuf>,
    pub terraform_root_path: Option<PathBuf>,
    pub credentials_path: Option<PathBuf>,
}

impl Settings {
    /// Loads the config file, if there is one.
    ///
    /// With an explicit `--config` path the file must exist and parse.
    /// Without one, a missing `~/.refreshment.yaml` (or an unresolvable
    /// home directory) simply yields empty settings.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match dirs::home_dir() {
                Some(home) => home.join(".refreshment.yaml"),
                None => return Ok(Self::default()),
            },
        };
        if explicit.is_none() && !path.exists() {
            return Ok(Self::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let settings = serde_yaml::from_str(&raw)
            .with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Using config file: {}", path.display());
        Ok(settings)
    }
}

/// How new credentials are obtained. Selected once, up front, from the
/// merged flag/env/file values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefreshMode {
    /// STS GetSessionToken with an MFA device serial and token code.
    Mfa { serial: String, token: String },
    /// Delegate to a Substrate helper binary run inside its root directory.
    Substrate { binary: PathBuf, root: PathBuf },
}

impl RefreshMode {
    /// Merges flags over file settings and picks the mode.
    ///
    /// MFA parameters win when both groups are supplied. Supplying only
    /// half of either group is a configuration error, as is supplying
    /// nothing at all.
    pub fn resolve(args: &Args, settings: &Settings) -> Result<Self> {
        let serial = pick_string(args.mfa_serial.as_deref(), settings.mfa_serial.as_deref());
        let token = pick_string(args.token.as_deref(), settings.token.as_deref());
        let binary = args
            .path_to_substrate
            .clone()
            .or_else(|| settings.path_to_substrate.clone());
        let root = args
            .terraform_root_path
            .clone()
            .or_else(|| settings.terraform_root_path.clone());

        match (serial, token) {
            (Some(serial), Some(token)) => return Ok(Self::Mfa { serial, token }),
            (Some(_), None) => bail!("--mfaSerial was given without --token"),
            (None, Some(_)) => bail!("--token was given without --mfaSerial"),
            (None, None) => {}
        }

        match (binary, root) {
            (Some(binary), Some(root)) => Ok(Self::Substrate { binary, root }),
            (Some(_), None) => bail!("Please pass the location of your root Substrate directory!"),
            (None, Some(_)) => bail!("Please pass the location of the Substrate binary!"),
            (None, None) => bail!(
                "Nothing to do: pass --mfaSerial/--token for MFA auth, \
                 or --pathToSubstrate/--terraformRootPath for Substrate auth"
            ),
        }
    }

    /// Profile holding the working cache of credentials for this mode.
    pub fn cache_profile(&self) -> &'static str {
        match self {
            Self::Mfa { .. } => crate::store::MFA_PROFILE,
            Self::Substrate { .. } => crate::store::SUBSTRATE_PROFILE,
        }
    }

    /// Profile that validated credentials are promoted into.
    pub fn target_profile(&self) -> &'static str {
        match self {
            Self::Mfa { .. } => crate::store::CORP_PROFILE,
            Self::Substrate { .. } => crate::store::DEFAULT_PROFILE,
        }
    }
}

// Empty strings count as unset so that `--token ""` does not select MFA mode.
fn pick_string(flag: Option<&str>, file: Option<&str>) -> Option<String> {
    flag.or(file)
        .filter(|s| !s.is_empty())
        .map(ToOwned::to_owned)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        Args::try_parse_from(std::iter::once("refreshment").chain(argv.iter().copied())).unwrap()
    }

    #[test]
    fn resolves_mfa_mode() {
        let args = parse(&["-m", "arn:aws:iam::123:mfa/user", "-t", "123456"]);
        let mode = RefreshMode::resolve(&args, &Settings::default()).unwrap();
        assert_eq!(
            mode,
            RefreshMode::Mfa {
                serial: "arn:aws:iam::123:mfa/user".into(),
                token: "123456".into(),
            }
        );
        assert_eq!(mode.cache_profile(), "refreshment_mfa");
        assert_eq!(mode.target_profile(), "nlk_corp");
    }

    #[test]
    fn resolves_substrate_mode() {
        let args = parse(&["-p", "/usr/local/bin/substrate", "-r", "/home/me/src/substrate"]);
        let mode = RefreshMode::resolve(&args, &Settings::default()).unwrap();
        assert_eq!(
            mode,
            RefreshMode::Substrate {
                binary: "/usr/local/bin/substrate".into(),
                root: "/home/me/src/substrate".into(),
            }
        );
        assert_eq!(mode.cache_profile(), "refreshment_substrate");
        assert_eq!(mode.target_profile(), "default");
    }

    #[test]
    fn mfa_wins_over_substrate() {
        let args = parse(&["-m", "arn:mfa", "-t", "000000", "-p", "/bin/substrate", "-r", "/tmp"]);
        let mode = RefreshMode::resolve(&args, &Settings::default()).unwrap();
        assert!(matches!(mode, RefreshMode::Mfa { .. }));
    }

    #[test]
    fn rejects_partial_parameters() {
        for argv in [
            &["-m", "arn:mfa"][..],
            &["-t", "123456"][..],
            &["-p", "/bin/substrate"][..],
            &["-r", "/tmp"][..],
            &[][..],
        ] {
            let args = parse(argv);
            assert!(RefreshMode::resolve(&args, &Settings::default()).is_err(), "{argv:?}");
        }
    }

    #[test]
    fn empty_serial_counts_as_unset() {
        let args = parse(&["-m", "", "-t", "123456"]);
        assert!(RefreshMode::resolve(&args, &Settings::default()).is_err());
    }

    #[test]
    fn file_settings_fill_missing_flags() {
        let args = parse(&[]);
        let settings: Settings = serde_yaml::from_str(
            "mfaSerial: arn:aws:iam::123:mfa/user\ntoken: \"654321\"\n",
        )
        .unwrap();
        let mode = RefreshMode::resolve(&args, &settings).unwrap();
        assert_eq!(
            mode,
            RefreshMode::Mfa {
                serial: "arn:aws:iam::123:mfa/user".into(),
                token: "654321".into(),
            }
        );
    }

    #[test]
    fn flags_take_precedence_over_file() {
        let args = parse(&["-m", "arn:flag", "-t", "111111"]);
        let settings: Settings =
            serde_yaml::from_str("mfaSerial: arn:file\ntoken: \"999999\"\n").unwrap();
        let mode = RefreshMode::resolve(&args, &settings).unwrap();
        assert_eq!(mode, RefreshMode::Mfa { serial: "arn:flag".into(), token: "111111".into() });
    }

    #[test]
    fn explicit_config_must_exist_and_parse() {
        let dir = tempfile::tempdir().unwrap();
        let err = Settings::load(Some(&dir.path().join("nope.yaml")));
        assert!(err.is_err());

        let path = dir.path().join("present.yaml");
        std::fs::write(&path, "credentialsPath: /tmp/creds\n").unwrap();
        let settings = Settings::load(Some(&path)).unwrap();
        assert_eq!(settings.credentials_path, Some(PathBuf::from("/tmp/creds")));
    }
}

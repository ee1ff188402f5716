//! The AWS shared credentials file.
//!
//! The file is standard INI: one bracketed section per profile, each with
//! `aws_access_key_id`, `aws_secret_access_key` and `aws_session_token`
//! lines. Refreshment only ever touches its own profiles:
//!
//! - `refreshment_mfa` / `refreshment_substrate`: working caches holding
//!   the most recently generated credentials for each mode.
//! - `nlk_corp` / `default`: the promoted aliases that AWS tooling reads,
//!   updated whenever the cache (or a fresh exchange) proves valid.
//!
//! Every other section, key and comment line in the file is preserved
//! verbatim on save: rather than regenerating the file from the parsed
//! model, a save splices the updated credential keys into the original
//! text line by line. The file is loaded once per run and written back at
//! most once, so a failed refresh never leaves a half-updated file behind.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use ini::Ini;

pub const MFA_PROFILE: &str = "refreshment_mfa";
pub const SUBSTRATE_PROFILE: &str = "refreshment_substrate";
pub const CORP_PROFILE: &str = "nlk_corp";
pub const DEFAULT_PROFILE: &str = "default";

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const SESSION_TOKEN: &str = "aws_session_token";

/// One set of temporary credentials, either read out of a profile section
/// or returned by an STS exchange. Held in memory only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: String,
}

/// In-memory copy of the credentials file plus the path it came from.
///
/// Holds both the parsed model (for lookups) and the raw lines as loaded
/// (for writing back without losing comments or formatting). Updates are
/// applied to the model immediately and to the raw lines on save.
pub struct CredentialFile {
    path: PathBuf,
    lines: Vec<String>,
    ini: Ini,
    updates: Vec<(String, CandidateCredentials)>,
}

impl CredentialFile {
    /// Standard location, `~/.aws/credentials`.
    pub fn default_path() -> Result<PathBuf> {
        dirs::home_dir()
            .map(|home| home.join(".aws").join("credentials"))
            .context("Could not determine home directory")
    }

    pub fn load(path: PathBuf) -> Result<Self> {
        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read aws credentials file {}", path.display()))?;
        let ini = Ini::load_from_str(&raw)
            .with_context(|| format!("Failed to parse aws credentials file {}", path.display()))?;
        let lines = raw.lines().map(ToOwned::to_owned).collect();
        Ok(Self { path, lines, ini, updates: Vec::new() })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Returns the profile's credentials only if all three fields are
    /// present and non-empty. A partially filled section is treated the
    /// same as a missing one.
    pub fn complete_profile(&self, name: &str) -> Option<CandidateCredentials> {
        let section = self.ini.section(Some(name))?;
        let field = |key| section.get(key).filter(|v: &&str| !v.is_empty());
        Some(CandidateCredentials {
            access_key_id: field(ACCESS_KEY_ID)?.to_owned(),
            secret_access_key: field(SECRET_ACCESS_KEY)?.to_owned(),
            session_token: field(SESSION_TOKEN)?.to_owned(),
        })
    }

    /// Replaces the three credential keys of `name`, creating the section
    /// if needed. Other keys in the section are left alone.
    pub fn set_profile(&mut self, name: &str, credentials: &CandidateCredentials) {
        self.ini
            .with_section(Some(name))
            .set(ACCESS_KEY_ID, credentials.access_key_id.as_str())
            .set(SECRET_ACCESS_KEY, credentials.secret_access_key.as_str())
            .set(SESSION_TOKEN, credentials.session_token.as_str());
        self.updates.retain(|(updated, _)| updated != name);
        self.updates.push((name.to_owned(), credentials.clone()));
    }

    /// Writes the file back, splicing each updated profile's credential
    /// keys into the text as loaded. Lines the run did not target, comment
    /// lines included, come through byte for byte.
    pub fn save(&self) -> Result<()> {
        let mut lines = self.lines.clone();
        for (name, credentials) in &self.updates {
            splice_profile(&mut lines, name, credentials);
        }
        let mut contents = lines.join("\n");
        contents.push('\n');
        std::fs::write(&self.path, contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}

/// Rewrites the three credential keys of `name` in place, appending the
/// section (or any missing keys) when not already present.
fn splice_profile(lines: &mut Vec<String>, name: &str, credentials: &CandidateCredentials) {
    let pairs = [
        (ACCESS_KEY_ID, &credentials.access_key_id),
        (SECRET_ACCESS_KEY, &credentials.secret_access_key),
        (SESSION_TOKEN, &credentials.session_token),
    ];

    let header = format!("[{name}]");
    let Some(start) = lines.iter().position(|line| line.trim() == header) else {
        if lines.last().is_some_and(|line| !line.trim().is_empty()) {
            lines.push(String::new());
        }
        lines.push(header);
        lines.extend(pairs.iter().map(|(key, value)| format!("{key}={value}")));
        return;
    };

    // End of the section: the next header, or end of file.
    let mut end = lines[start + 1..]
        .iter()
        .position(|line| line.trim_start().starts_with('['))
        .map_or(lines.len(), |offset| start + 1 + offset);

    for (key, value) in pairs {
        let existing = lines[start + 1..end]
            .iter()
            .position(|line| key_of(line) == Some(key))
            .map(|offset| start + 1 + offset);
        match existing {
            Some(index) => lines[index] = format!("{key}={value}"),
            None => {
                // Append after the section's last property line so trailing
                // blank lines keep separating it from the next section.
                let insert_at = lines[start + 1..end]
                    .iter()
                    .rposition(|line| key_of(line).is_some())
                    .map_or(start + 1, |offset| start + 1 + offset + 1);
                lines.insert(insert_at, format!("{key}={value}"));
                end += 1;
            }
        }
    }
}

/// The key of a property line, or `None` for comments, headers and blanks.
fn key_of(line: &str) -> Option<&str> {
    let line = line.trim_start();
    if line.starts_with('#') || line.starts_with(';') || line.starts_with('[') {
        return None;
    }
    let (key, _) = line.split_once('=')?;
    Some(key.trim())
}

use std::collections::HashMap;
use std::fs;
use std::path::{
  Path,
  PathBuf
};
use std::time::Duration;

use anyhow::{
  Context,
  anyhow,
  bail
};
use chrono_tz::Tz;
use tracing::{
  debug,
  info,
  trace,
  warn
};

use crate::controller::ViewMode;
use crate::source::DEFAULT_SOURCE_URL;

const RC_ENV_VAR: &str = "HOLICALRC";
const RC_FILE_NAME: &str = ".holicalrc";

#[derive(Debug, Clone)]
pub struct Config {
  map:              HashMap<String, String>,
  pub loaded_files: Vec<PathBuf>
}

impl Default for Config {
  fn default() -> Self {
    let mut map = HashMap::new();
    for (key, value) in [
      ("source.url", DEFAULT_SOURCE_URL),
      ("source.timeout", "30"),
      ("default.country", "IN"),
      ("default.view", "monthly"),
      ("color", "on")
    ] {
      map.insert(
        key.to_string(),
        value.to_string()
      );
    }
    Self {
      map,
      loaded_files: vec![]
    }
  }
}

impl Config {
  #[tracing::instrument(skip(
    rc_override
  ))]
  pub fn load(
    rc_override: Option<&Path>
  ) -> anyhow::Result<Self> {
    let mut cfg = Config::default();

    let rc = resolve_rc_path(rc_override)?;
    if let Some(path) = rc {
      info!(rc = %path.display(), "loading holicalrc");
      cfg.load_file(&path, &mut vec![])?;
    } else {
      debug!(
        "no holicalrc found; using \
         defaults"
      );
    }

    Ok(cfg)
  }

  #[tracing::instrument(skip(
    self, overrides
  ))]
  pub fn apply_overrides<I>(
    &mut self,
    overrides: I
  ) where
    I: IntoIterator<
      Item = (String, String)
    >
  {
    for (k, v) in overrides {
      let key = k
        .strip_prefix("rc.")
        .unwrap_or(&k)
        .to_string();
      debug!(key = %key, value = %v, "applying override");
      self.map.insert(key, v);
    }
  }

  pub fn get(
    &self,
    key: &str
  ) -> Option<String> {
    self.map.get(key).cloned()
  }

  pub fn get_bool(
    &self,
    key: &str
  ) -> anyhow::Result<Option<bool>> {
    self
      .map
      .get(key)
      .map(|raw| {
        parse_bool(raw).ok_or_else(|| {
          anyhow!(
            "invalid {key} setting \
             {raw:?}: expected on or off"
          )
        })
      })
      .transpose()
  }

  pub fn source_url(&self) -> String {
    self
      .get("source.url")
      .unwrap_or_else(|| {
        DEFAULT_SOURCE_URL.to_string()
      })
  }

  pub fn source_timeout(
    &self
  ) -> anyhow::Result<Duration> {
    let raw = self
      .get("source.timeout")
      .unwrap_or_else(|| "30".to_string());
    let secs = raw
      .trim()
      .parse::<u64>()
      .with_context(|| {
        format!(
          "invalid source.timeout \
           {raw:?}: expected seconds"
        )
      })?;
    Ok(Duration::from_secs(secs))
  }

  pub fn default_country(&self) -> String {
    self
      .get("default.country")
      .unwrap_or_else(|| "IN".to_string())
  }

  pub fn default_view(
    &self
  ) -> anyhow::Result<ViewMode> {
    self
      .get("default.view")
      .map(|raw| raw.parse::<ViewMode>())
      .transpose()
      .context("invalid default.view")
      .map(|mode| {
        mode.unwrap_or(ViewMode::Monthly)
      })
  }

  pub fn color(
    &self
  ) -> anyhow::Result<bool> {
    Ok(
      self
        .get_bool("color")?
        .unwrap_or(true)
    )
  }

  /// `None` means the system local zone.
  pub fn timezone(
    &self
  ) -> anyhow::Result<Option<Tz>> {
    let Some(raw) = self.get("timezone")
    else {
      return Ok(None);
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
      return Ok(None);
    }
    trimmed
      .parse::<Tz>()
      .map(Some)
      .map_err(|err| {
        anyhow!(
          "invalid timezone id \
           {trimmed:?}: {err}"
        )
      })
  }

  /// `chain` holds the files currently
  /// being read, outermost first.
  #[tracing::instrument(skip(self, chain))]
  fn load_file(
    &mut self,
    path: &Path,
    chain: &mut Vec<PathBuf>
  ) -> anyhow::Result<()> {
    let path = expand_tilde(path);
    let canonical = fs::canonicalize(&path)
      .unwrap_or_else(|_| path.clone());
    if chain.contains(&canonical) {
      bail!(
        "include cycle detected at {}",
        path.display()
      );
    }
    let text =
      fs::read_to_string(&path)
        .with_context(|| {
          format!(
            "failed to read {}",
            path.display()
          )
        })?;

    self
      .loaded_files
      .push(path.clone());

    let base_dir = path
      .parent()
      .map(|p| p.to_path_buf())
      .unwrap_or_else(|| {
        PathBuf::from(".")
      });

    for (line_num, raw_line) in
      text.lines().enumerate()
    {
      let mut line = raw_line.trim();
      if let Some((before, _)) =
        line.split_once('#')
      {
        line = before.trim();
      }

      if line.is_empty() {
        continue;
      }

      if let Some(include_rest) =
        line.strip_prefix("include ")
      {
        let include_path =
          resolve_include_path(
            &base_dir,
            include_rest.trim()
          )?;
        debug!(
            file = %path.display(),
            include = %include_path.display(),
            line = line_num + 1,
            "processing include"
        );

        if include_path.exists() {
          chain.push(canonical.clone());
          let loaded = self.load_file(
            &include_path,
            chain
          );
          chain.pop();
          loaded?;
        } else {
          warn!(include = %include_path.display(), "include file does not exist; skipping");
        }
        continue;
      }

      let (k, v) = line
        .split_once('=')
        .ok_or_else(|| {
          anyhow!(
            "invalid config line \
             {}:{}: {}",
            path.display(),
            line_num + 1,
            raw_line
          )
        })?;

      let key = k.trim().to_string();
      let value = v.trim().to_string();
      trace!(key = %key, value = %value, "loaded config key");
      self.map.insert(key, value);
    }

    Ok(())
  }
}

#[tracing::instrument(skip(
  override_path
))]
fn resolve_rc_path(
  override_path: Option<&Path>
) -> anyhow::Result<Option<PathBuf>> {
  if let Some(path) = override_path {
    return Ok(Some(path.to_path_buf()));
  }

  if let Ok(rc_env) =
    std::env::var(RC_ENV_VAR)
  {
    if rc_env == "/dev/null" {
      return Ok(None);
    }
    return Ok(Some(PathBuf::from(
      rc_env
    )));
  }

  let Some(home) = dirs::home_dir()
  else {
    warn!(
      "cannot determine home \
       directory; skipping holicalrc"
    );
    return Ok(None);
  };
  let candidate = home.join(RC_FILE_NAME);
  if candidate.exists() {
    return Ok(Some(candidate));
  }

  Ok(None)
}

fn resolve_include_path(
  base_dir: &Path,
  include: &str
) -> anyhow::Result<PathBuf> {
  if include.trim().is_empty() {
    return Err(anyhow!(
      "include path cannot be empty"
    ));
  }

  let raw = PathBuf::from(include);
  let expanded = expand_tilde(&raw);
  if expanded.is_absolute() {
    Ok(expanded)
  } else {
    Ok(base_dir.join(expanded))
  }
}

fn expand_tilde(
  path: &Path
) -> PathBuf {
  let text = path.to_string_lossy();
  if let Some(rest) =
    text.strip_prefix("~/")
    && let Some(home) = dirs::home_dir()
  {
    return home.join(rest);
  }
  path.to_path_buf()
}

fn parse_bool(s: &str) -> Option<bool> {
  match s
    .trim()
    .to_ascii_lowercase()
    .as_str()
  {
    | "1" | "y" | "yes" | "on" | "true" => {
      Some(true)
    }
    | "0" | "n" | "no" | "off"
    | "false" => Some(false),
    | _ => None
  }
}

#[cfg(test)]
mod tests {
  use std::fs;
  use std::time::Duration;

  use tempfile::tempdir;

  use super::Config;
  use crate::controller::ViewMode;
  use crate::source::DEFAULT_SOURCE_URL;

  #[test]
  fn defaults_without_rc_file() {
    let cfg = Config::default();
    assert_eq!(cfg.source_url(), DEFAULT_SOURCE_URL);
    assert_eq!(cfg.default_country(), "IN");
    assert_eq!(
      cfg.default_view().expect("view"),
      ViewMode::Monthly
    );
    assert!(cfg.color().expect("color"));
    assert_eq!(
      cfg.source_timeout().expect("timeout"),
      Duration::from_secs(30)
    );
    assert!(cfg.timezone().expect("tz").is_none());
  }

  #[test]
  fn loads_rc_file_with_includes_and_comments() {
    let temp = tempdir().expect("tempdir");
    let extra = temp.path().join("extra.rc");
    fs::write(
      &extra,
      "default.view = quarterly\n"
    )
    .expect("write include");

    let rc = temp.path().join("holicalrc");
    fs::write(
      &rc,
      "# holiday calendar\n\
       default.country = DE # germany\n\
       timezone = Asia/Kolkata\n\
       include extra.rc\n\
       include missing.rc\n"
    )
    .expect("write rc");

    let cfg =
      Config::load(Some(rc.as_path()))
        .expect("load");
    assert_eq!(cfg.default_country(), "DE");
    assert_eq!(
      cfg.default_view().expect("view"),
      ViewMode::Quarterly
    );
    assert_eq!(
      cfg
        .timezone()
        .expect("tz")
        .map(|tz| tz.name().to_string()),
      Some("Asia/Kolkata".to_string())
    );
    assert_eq!(cfg.loaded_files.len(), 2);
  }

  #[test]
  fn rejects_malformed_line() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("holicalrc");
    fs::write(&rc, "just some words\n")
      .expect("write rc");
    let err =
      Config::load(Some(rc.as_path()))
        .expect_err("malformed line");
    assert!(
      err
        .to_string()
        .contains("invalid config line")
    );
  }

  #[test]
  fn overrides_strip_rc_prefix() {
    let mut cfg = Config::default();
    cfg.apply_overrides([
      (
        "rc.color".to_string(),
        "off".to_string()
      ),
      (
        "source.url".to_string(),
        "http://holidays.test/api"
          .to_string()
      ),
      (
        "default.view".to_string(),
        "weekly".to_string()
      ),
    ]);
    assert!(!cfg.color().expect("color"));
    assert_eq!(
      cfg.get_bool("color").expect("bool"),
      Some(false)
    );
    assert_eq!(
      cfg.get_bool("missing").expect("bool"),
      None
    );
    assert_eq!(
      cfg.source_url(),
      "http://holidays.test/api"
    );
    assert!(cfg.default_view().is_err());
  }

  #[test]
  fn color_uses_shared_bool_parser() {
    let mut cfg = Config::default();
    cfg.apply_overrides([(
      "color".to_string(),
      "N".to_string()
    )]);
    assert!(!cfg.color().expect("color"));

    cfg.apply_overrides([(
      "color".to_string(),
      "sometimes".to_string()
    )]);
    let err = cfg
      .color()
      .expect_err("invalid color");
    assert!(
      err
        .to_string()
        .contains("invalid color setting")
    );
  }

  #[test]
  fn self_include_is_rejected() {
    let temp = tempdir().expect("tempdir");
    let rc = temp.path().join("holicalrc");
    fs::write(
      &rc,
      "color = off\ninclude holicalrc\n"
    )
    .expect("write rc");

    let err =
      Config::load(Some(rc.as_path()))
        .expect_err("cycle");
    assert!(
      format!("{err:#}")
        .contains("include cycle")
    );
  }

  #[test]
  fn mutual_includes_are_rejected() {
    let temp = tempdir().expect("tempdir");
    let a = temp.path().join("a.rc");
    let b = temp.path().join("b.rc");
    fs::write(&a, "include b.rc\n")
      .expect("write a");
    fs::write(
      &b,
      "color = off\ninclude a.rc\n"
    )
    .expect("write b");

    let err =
      Config::load(Some(a.as_path()))
        .expect_err("cycle");
    assert!(
      format!("{err:#}")
        .contains("include cycle")
    );
  }

  #[test]
  fn shared_include_is_not_a_cycle() {
    let temp = tempdir().expect("tempdir");
    let common =
      temp.path().join("common.rc");
    let left = temp.path().join("left.rc");
    let rc = temp.path().join("holicalrc");
    fs::write(
      &common,
      "default.country = FR\n"
    )
    .expect("write common");
    fs::write(&left, "include common.rc\n")
      .expect("write left");
    fs::write(
      &rc,
      "include left.rc\ninclude common.rc\n"
    )
    .expect("write rc");

    let cfg =
      Config::load(Some(rc.as_path()))
        .expect("diamond loads");
    assert_eq!(cfg.default_country(), "FR");
    assert_eq!(cfg.loaded_files.len(), 4);
  }
}

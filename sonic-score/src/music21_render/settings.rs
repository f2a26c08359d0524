//! How generated program is finished, stored and executed.
use std::{
    io::Write,
    path::{Path, PathBuf},
    process::{Command, ExitStatus},
};

use serde::{Deserialize, Serialize};

use crate::emission::Finish;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    /// python interpreter with music21 installed
    pub python: String,
    /// write MusicXML next to the script, instead of showing the score
    pub save: bool,
    /// keep generated python file after run
    pub keep_temp: bool,
    /// execute generated program
    pub run: bool,
}
impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            python: "python".to_string(),
            save: true,
            keep_temp: false,
            run: true,
        }
    }
}
impl RenderSettings {
    /// Missing keys are taken from default.
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn finish_for(&self, script: &Path) -> Finish {
        match self.save {
            true => Finish::Write(output_path(script)),
            false => Finish::Show,
        }
    }
}

/// `<script dir>/<script stem>_new.mxl`
///
/// ```
/// # use std::path::{Path, PathBuf};
/// # use sonic_score::music21_render::output_path;
/// assert_eq!(
///     output_path(Path::new("scores/suku.rb")),
///     PathBuf::from("scores/suku_new.mxl")
/// );
/// ```
pub fn output_path(script: &Path) -> PathBuf {
    let stem = script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    script
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(format!("{stem}_new.mxl"))
}

/// Write program to `<stem>_temp*.py` in `dir` and run it by python.
///
/// File is deleted after run, unless `keep_temp` is set.
///
/// # Returns
/// exit status of python, and path of the kept file (if kept).
pub fn run_python(
    program: &str,
    stem: &str,
    dir: &Path,
    settings: &RenderSettings,
) -> Result<(ExitStatus, Option<PathBuf>), std::io::Error> {
    let mut file = tempfile::Builder::new()
        .prefix(&format!("{stem}_temp"))
        .suffix(".py")
        .tempfile_in(dir)?;
    file.write_all(program.as_bytes())?;
    file.flush()?;
    log::debug!("running {} {:?}", settings.python, file.path());
    let status = Command::new(&settings.python).arg(file.path()).status()?;
    if !status.success() {
        log::warn!("{} exited with {status}", settings.python);
    }
    let kept = match settings.keep_temp {
        true => Some(file.into_temp_path().keep().map_err(|e| e.error)?),
        false => None,
    };
    Ok((status, kept))
}

use std::{error::Error, fs, path::PathBuf, process::ExitCode};

use clap::Parser;
use sonic_score::{
    music21_render::{run_python, RenderSettings, RendersToMusic21},
    pipeline::Pipeline,
    script::parse_script,
};

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Convert score script to music21 program",
    long_about = None
)]
struct Cli {
    /// Score script to convert.
    script: PathBuf,
    /// Show the score instead of writing `<script>_new.mxl`.
    #[arg(long)]
    no_save: bool,
    /// Keep the generated python file.
    #[arg(long)]
    keep_temp: bool,
    /// Only print the generated program.
    #[arg(long)]
    no_run: bool,
    /// TOML file with render settings.
    #[arg(short, long)]
    config: Option<PathBuf>,
}
impl Cli {
    /// Settings file (or defaults), overridden by flags.
    fn settings(&self) -> Result<RenderSettings, Box<dyn Error>> {
        let mut settings = match &self.config {
            Some(path) => RenderSettings::from_toml(&fs::read_to_string(path)?)?,
            None => RenderSettings::default(),
        };
        if self.no_save {
            settings.save = false;
        }
        if self.keep_temp {
            settings.keep_temp = true;
        }
        if self.no_run {
            settings.run = false;
        }
        Ok(settings)
    }
}

fn run(cli: Cli) -> Result<(), Box<dyn Error>> {
    let settings = cli.settings()?;
    log::debug!("settings: {settings:?}");
    let source = fs::read_to_string(&cli.script)?;
    let calls = parse_script(&source)?;
    let stream =
        Pipeline::new(settings.finish_for(&cli.script)).run(&calls)?;
    let program = stream.render_music21();
    println!("{program}");

    if !settings.run {
        return Ok(());
    }
    let stem = cli
        .script
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let (status, kept) =
        run_python(&program, &stem, &std::env::current_dir()?, &settings)?;
    if let Some(path) = kept {
        log::info!("generated program kept at {}", path.display());
    }
    match status.success() {
        true => Ok(()),
        false => Err(format!("{} exited with {status}", settings.python).into()),
    }
}

fn main() -> ExitCode {
    env_logger::init();
    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("sonic-score: {error}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::Cli;

    #[test]
    fn test_flags_override_settings() {
        let cli =
            Cli::parse_from(["sonic-score", "piece.rb", "--no-save", "--no-run"]);
        let settings = cli.settings().unwrap();
        assert!(!settings.save);
        assert!(!settings.run);
        assert!(!settings.keep_temp);
        assert_eq!(settings.python, "python");
    }
}

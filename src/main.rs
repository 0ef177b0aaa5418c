mod app;
mod state;
mod ui;

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use eframe::egui;

use app::{Finished, PickerApp};
use freq_pick::artifacts::write_artifacts;
use freq_pick::config::{Modifier, PickerConfig};
use freq_pick::controller::Controller;
use freq_pick::data::loader::load_file;
use freq_pick::data::model::DisplayDomain;
use freq_pick::session::SessionOutcome;
use state::AppState;

/// Pick peak frequencies from a magnitude spectrum.
#[derive(Parser, Debug)]
#[command(name = "freq-pick", version, about)]
struct Cli {
    /// Spectrum file (.parquet, .json or .csv). Asks with a file dialog if omitted.
    #[arg(long = "in", value_name = "FILE")]
    input: Option<PathBuf>,

    /// Directory for `<stem>_pick.png` / `<stem>_pick.json`.
    #[arg(long = "out", value_name = "DIR", requires = "stem")]
    output_dir: Option<PathBuf>,

    /// Artifact file stem.
    #[arg(long, requires = "output_dir")]
    stem: Option<String>,

    /// Minimum snap window in Hz.
    #[arg(long = "snap-hz")]
    snap_hz: Option<f64>,

    /// Stored magnitude domain of the input (metadata only).
    #[arg(long)]
    domain: Option<DisplayDomain>,

    /// Frequency window shown in the picker.
    #[arg(long, num_args = 2, value_names = ["FMIN", "FMAX"], allow_negative_numbers = true)]
    xlim: Option<Vec<f64>>,

    /// Show the whole spectrum and allow selection outside `--xlim`.
    #[arg(long)]
    no_crop: bool,

    /// Modifier key that gates selection gestures.
    #[arg(long)]
    modifier: Option<Modifier>,

    #[arg(long)]
    title: Option<String>,

    /// Text appended to the title, e.g. "[1/5]".
    #[arg(long = "title-append")]
    title_append: Option<String>,

    /// JSON picker config (key bindings, defaults).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

impl Cli {
    /// Config file (or defaults) with command-line flags layered on top.
    fn picker_config(&self) -> Result<PickerConfig> {
        let mut config = match &self.config {
            Some(path) => PickerConfig::from_json_file(path)?,
            None => PickerConfig::default(),
        };
        if let Some(snap) = self.snap_hz {
            config.user_snap_hz = snap;
        }
        if let Some(modifier) = self.modifier {
            config.modifier = modifier;
        }
        if let Some(xlim) = &self.xlim {
            if let [fmin, fmax] = xlim.as_slice() {
                config.xlim = Some((*fmin, *fmax));
            }
        }
        if self.no_crop {
            config.crop_to_xlim = false;
        }
        if self.title.is_some() {
            config.title = self.title.clone();
        }
        if self.title_append.is_some() {
            config.title_append = self.title_append.clone();
        }
        config.validate()?;
        Ok(config)
    }
}

fn main() -> ExitCode {
    env_logger::init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:#}");
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let config = cli.picker_config()?;

    let input = match &cli.input {
        Some(path) => path.clone(),
        None => rfd::FileDialog::new()
            .set_title("Open spectrum")
            .add_filter("Supported files", &["parquet", "pq", "json", "csv"])
            .add_filter("Parquet", &["parquet", "pq"])
            .add_filter("JSON", &["json"])
            .add_filter("CSV", &["csv"])
            .pick_file()
            .context("no input file selected")?,
    };

    let (spectrum, context) = load_file(&input)?.into_spectrum(cli.domain)?;
    let controller = Controller::new(&spectrum, context.as_ref(), &config)?;
    let state = AppState::new(controller);

    let finished: Rc<RefCell<Option<Finished>>> = Rc::new(RefCell::new(None));
    let slot = finished.clone();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([600.0, 400.0]),
        ..Default::default()
    };

    let window_title = match config.composed_title() {
        Some(t) => format!("freq-pick – {t}"),
        None => "freq-pick".to_string(),
    };
    eframe::run_native(
        &window_title,
        options,
        Box::new(move |_cc| Ok(Box::new(PickerApp::new(state, slot)))),
    )
    .map_err(|e| anyhow!("picker window failed: {e}"))?;

    let Some(Finished { outcome, snapshot }) = finished.borrow_mut().take() else {
        bail!("picker window exited before the session finished");
    };

    match outcome {
        SessionOutcome::Cancelled => {
            eprintln!("Picker cancelled.");
            Ok(ExitCode::from(1))
        }
        SessionOutcome::Committed(selection) => {
            if let (Some(dir), Some(stem)) = (&cli.output_dir, &cli.stem) {
                write_artifacts(dir, stem, &snapshot, &selection, spectrum.display_domain())?;
            }
            if selection.is_empty() {
                println!("No peaks selected.");
            } else {
                println!("Selected {} peaks.", selection.len());
                for (idx, hz) in selection.selected_idx.iter().zip(&selection.selected_hz) {
                    println!("  {hz:>12.4} Hz  (bin {idx})");
                }
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

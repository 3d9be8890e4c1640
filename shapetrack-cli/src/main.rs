use clap::Parser;
use serde::{Deserialize, Serialize};
use shapetrack::image::io::{load_color_image, save_mask};
use shapetrack::session::{
    ControlChannel, DirectoryTemplateStore, FrameSource, ResultChannel, Session,
};
use shapetrack::{
    ColorImage, ConsensusConfig, IdentityPolicy, MatchMethod, OutputMode, PipelineConfig,
    SessionConfig, SessionSettings, SessionState, ShapeTrackResult, TrackerConfig,
};
use std::collections::{BTreeMap, VecDeque};
use std::fs;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

const EXAMPLE_JSON: &str =
    include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/config.example.json"));

#[derive(Parser, Debug)]
#[command(author, version, about = "ShapeTrack CLI (replays frames with a command script)")]
struct Cli {
    /// Path to the JSON configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "config.json")]
    config: PathBuf,
    /// Print an example config and exit.
    #[arg(long)]
    print_example: bool,
    /// Enable tracing output.
    #[arg(long)]
    trace: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum OutputModeConfig {
    #[default]
    Registry,
    Consensus,
}

impl From<OutputModeConfig> for OutputMode {
    fn from(value: OutputModeConfig) -> Self {
        match value {
            OutputModeConfig::Registry => OutputMode::Registry,
            OutputModeConfig::Consensus => OutputMode::Consensus,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
enum MatchMethodConfig {
    #[default]
    I1,
    I2,
    I3,
}

impl From<MatchMethodConfig> for MatchMethod {
    fn from(value: MatchMethodConfig) -> Self {
        match value {
            MatchMethodConfig::I1 => MatchMethod::I1,
            MatchMethodConfig::I2 => MatchMethod::I2,
            MatchMethodConfig::I3 => MatchMethod::I3,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct TrackerConfigJson {
    max_score: i32,
    found_score: i32,
    lost_score: i32,
    initial_score: i32,
    nearest_radius: Option<f64>,
}

impl Default for TrackerConfigJson {
    fn default() -> Self {
        let cfg = TrackerConfig::default();
        Self {
            max_score: cfg.max_score,
            found_score: cfg.found_score,
            lost_score: cfg.lost_score,
            initial_score: cfg.initial_score,
            nearest_radius: None,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ConsensusConfigJson {
    cycles: usize,
}

impl Default for ConsensusConfigJson {
    fn default() -> Self {
        Self {
            cycles: ConsensusConfig::default().cycles,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct SessionConfigJson {
    output: OutputModeConfig,
    publish_every: usize,
    match_method: MatchMethodConfig,
    tracker: TrackerConfigJson,
    consensus: ConsensusConfigJson,
}

impl Default for SessionConfigJson {
    fn default() -> Self {
        Self {
            output: OutputModeConfig::Registry,
            publish_every: SessionConfig::default().publish_every,
            match_method: MatchMethodConfig::I1,
            tracker: TrackerConfigJson::default(),
            consensus: ConsensusConfigJson::default(),
        }
    }
}

impl From<SessionConfigJson> for SessionConfig {
    fn from(value: SessionConfigJson) -> Self {
        let identity = match value.tracker.nearest_radius {
            Some(radius) => IdentityPolicy::NearestWithin { radius },
            None => IdentityPolicy::ExactPosition,
        };
        Self {
            output: value.output.into(),
            publish_every: value.publish_every,
            tracker: TrackerConfig {
                max_score: value.tracker.max_score,
                found_score: value.tracker.found_score,
                lost_score: value.tracker.lost_score,
                initial_score: value.tracker.initial_score,
                identity,
            },
            consensus: ConsensusConfig {
                cycles: value.consensus.cycles,
            },
            pipeline: PipelineConfig {
                match_method: value.match_method.into(),
            },
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SetupJson {
    /// `Key=Value` template settings applied whenever setup or adjusting starts.
    overrides: BTreeMap<String, i64>,
    /// Write the template config file after applying the overrides.
    save: bool,
}

#[derive(Debug, Deserialize)]
struct ScriptedCommand {
    cycle: usize,
    payload: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Config {
    frames_dir: String,
    template_dir: Option<String>,
    settings_path: Option<String>,
    output_path: Option<String>,
    mask_path: Option<String>,
    commands: Vec<ScriptedCommand>,
    setup: SetupJson,
    session: SessionConfigJson,
}

#[derive(Debug, Default, Serialize)]
struct Output {
    cycles: usize,
    published: Vec<String>,
    reports: Vec<String>,
}

/// Frames read in file name order from a directory.
struct DirectoryFrames {
    paths: VecDeque<PathBuf>,
}

impl DirectoryFrames {
    fn open(dir: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|e| e.to_str())
                    .map(|e| matches!(e.to_ascii_lowercase().as_str(), "png" | "jpg" | "jpeg"))
                    .unwrap_or(false)
            })
            .collect();
        paths.sort();
        Ok(Self {
            paths: paths.into(),
        })
    }

    fn is_exhausted(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for DirectoryFrames {
    fn next_frame(&mut self) -> ShapeTrackResult<Option<ColorImage>> {
        match self.paths.pop_front() {
            Some(path) => load_color_image(path).map(Some),
            None => Ok(None),
        }
    }
}

/// Releases each scripted payload once the loop reaches its cycle.
struct ScriptedControl {
    pending: VecDeque<ScriptedCommand>,
    cycle: usize,
}

impl ScriptedControl {
    fn new(mut commands: Vec<ScriptedCommand>) -> Self {
        commands.sort_by_key(|c| c.cycle);
        Self {
            pending: commands.into(),
            cycle: 0,
        }
    }

    fn advance_to(&mut self, cycle: usize) {
        self.cycle = cycle;
    }

    fn is_drained(&self) -> bool {
        self.pending.is_empty()
    }
}

impl ControlChannel for ScriptedControl {
    fn poll(&mut self) -> ShapeTrackResult<Option<String>> {
        match self.pending.front() {
            Some(cmd) if cmd.cycle <= self.cycle => {
                Ok(self.pending.pop_front().map(|c| c.payload))
            }
            _ => Ok(None),
        }
    }
}

/// Prints published payloads to stdout and reports to stderr.
#[derive(Default)]
struct PrintResults {
    output: Output,
}

impl ResultChannel for PrintResults {
    fn publish(&mut self, payload: &str) -> ShapeTrackResult<()> {
        println!("{payload}");
        self.output.published.push(payload.to_string());
        Ok(())
    }

    fn report(&mut self, message: &str) -> ShapeTrackResult<()> {
        eprintln!("{message}");
        self.output.reports.push(message.to_string());
        Ok(())
    }
}

fn apply_setup(
    session: &mut Session<DirectoryTemplateStore>,
    setup: &SetupJson,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some(template) = session.template() else {
        return Ok(());
    };
    let mut config = *template.config();
    for (key, value) in &setup.overrides {
        if !config.set(key, *value)? {
            return Err(format!("unknown template setting {key}").into());
        }
    }
    session.update_config(config)?;
    if setup.save {
        session.save_template_config()?;
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    if cli.trace {
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::from_default_env().add_directive("shapetrack=info".parse()?),
            )
            .with_target(false)
            .init();
    }

    if cli.print_example {
        println!("{EXAMPLE_JSON}");
        return Ok(());
    }

    let config_text = fs::read_to_string(&cli.config)?;
    let config: Config = serde_json::from_str(&config_text)?;
    if config.frames_dir.is_empty() {
        return Err("frames_dir must be set in the config".into());
    }

    let template_dir = match (&config.template_dir, &config.settings_path) {
        (Some(dir), _) => PathBuf::from(dir),
        (None, Some(path)) => PathBuf::from(SessionSettings::load(path)?.template_filepath),
        (None, None) => return Err("template_dir or settings_path must be set".into()),
    };

    let mut session = Session::new(
        config.session.into(),
        DirectoryTemplateStore::new(template_dir),
    )?;
    let mut frames = DirectoryFrames::open(Path::new(&config.frames_dir))?;
    let mut control = ScriptedControl::new(config.commands);
    let mut results = PrintResults::default();

    let mut cycle = 0usize;
    loop {
        control.advance_to(cycle);
        if !session.cycle(&mut frames, &mut control, &mut results)? {
            break;
        }
        match session.state() {
            SessionState::Setup => {
                apply_setup(&mut session, &config.setup)?;
                session.finish_setup();
            }
            SessionState::Adjusting => {
                apply_setup(&mut session, &config.setup)?;
                session.finish_adjusting();
            }
            SessionState::Standby | SessionState::Tracking => {}
        }
        cycle += 1;

        let idle = session.state() == SessionState::Standby;
        if control.is_drained() && (idle || frames.is_exhausted()) {
            break;
        }
    }
    results.output.cycles = cycle;
    tracing::info!(
        cycles = cycle,
        published = results.output.published.len(),
        "replay finished"
    );

    if let (Some(path), Some(report)) = (&config.mask_path, session.last_report()) {
        save_mask(&report.preprocessed.mask, path)?;
    }

    let json = serde_json::to_string_pretty(&results.output)?;
    match config.output_path {
        Some(path) => fs::write(path, json)?,
        None => eprintln!("{json}"),
    }

    Ok(())
}

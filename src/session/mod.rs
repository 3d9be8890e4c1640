//! The controlling loop: command handling, mode transitions and publishing.
//!
//! States:
//!
//! - `Standby`: no frames are processed.
//! - `Setup`: a new template is being configured; frames are processed for
//!   inspection, nothing is published.
//! - `Adjusting`: like setup, entered with `overlay;<name>` from standby or
//!   tracking and left with [`Session::finish_adjusting`].
//! - `Tracking`: frames are processed and results published.
//!
//! `quit` ends the loop after the current cycle from any state. A failed
//! template request leaves the state unchanged and is reported on the result
//! channel.

mod command;
mod io;
mod settings;

pub use command::Command;
#[cfg(feature = "image-io")]
pub use io::DirectoryTemplateStore;
pub use io::{
    CollectedResults, ControlChannel, FrameSource, QueuedCommands, QueuedFrames, ResultChannel,
    TemplateStore,
};
pub use settings::SessionSettings;

use crate::consensus::{ConsensusConfig, ConsensusSelector, VoteOutcome};
use crate::contour::Point;
use crate::pipeline::{FrameReport, PipelineConfig, ShapeFinder};
use crate::template::{Template, TemplateConfig};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::track::{TrackRegistry, TrackerConfig};
use crate::util::{ShapeTrackError, ShapeTrackResult};

/// Payload published when a publish cycle has no position.
pub const NOTHING_FOUND: &str = "Nothing Found";

/// Formats positions as `x,y` joined by `;`, or [`NOTHING_FOUND`] when empty.
pub fn format_positions(positions: &[Point]) -> String {
    if positions.is_empty() {
        return NOTHING_FOUND.to_string();
    }
    positions
        .iter()
        .map(|p| format!("{},{}", p.x, p.y))
        .collect::<Vec<_>>()
        .join(";")
}

/// Which stage turns candidates into published positions.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputMode {
    /// Persistence-scored registry, published every `publish_every` cycles.
    #[default]
    Registry,
    /// Majority vote, published whenever a window completes.
    Consensus,
}

/// Session options.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionConfig {
    /// Publishing strategy.
    pub output: OutputMode,
    /// Registry mode publishes on every `publish_every`-th tracking cycle.
    pub publish_every: usize,
    /// Registry scoring.
    pub tracker: TrackerConfig,
    /// Consensus window.
    pub consensus: ConsensusConfig,
    /// Detection options.
    pub pipeline: PipelineConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            output: OutputMode::Registry,
            publish_every: 10,
            tracker: TrackerConfig::default(),
            consensus: ConsensusConfig::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Validates every nested configuration.
    pub fn validate(&self) -> ShapeTrackResult<()> {
        if self.publish_every == 0 {
            return Err(ShapeTrackError::InvalidConfig {
                key: "publish_every",
                reason: "must be at least 1".to_string(),
            });
        }
        self.tracker.validate()?;
        self.consensus.validate()
    }
}

/// Session mode.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// Idle.
    Standby,
    /// Configuring a freshly created template.
    Setup,
    /// Adjusting an existing template.
    Adjusting,
    /// Detecting, tracking and publishing.
    Tracking,
}

impl SessionState {
    /// Lowercase state name.
    pub fn name(self) -> &'static str {
        match self {
            Self::Standby => "standby",
            Self::Setup => "setup",
            Self::Adjusting => "adjusting",
            Self::Tracking => "tracking",
        }
    }
}

/// Owns the template and the tracking state of one session.
pub struct Session<S> {
    config: SessionConfig,
    store: S,
    state: SessionState,
    resume: SessionState,
    template: Option<Template>,
    finder: ShapeFinder,
    registry: TrackRegistry,
    consensus: ConsensusSelector,
    publish_cycle: usize,
    last_report: Option<FrameReport>,
    quit: bool,
}

impl<S: TemplateStore> Session<S> {
    /// Creates a session in standby.
    pub fn new(config: SessionConfig, store: S) -> ShapeTrackResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            store,
            state: SessionState::Standby,
            resume: SessionState::Standby,
            template: None,
            finder: ShapeFinder::new(config.pipeline),
            registry: TrackRegistry::new(config.tracker)?,
            consensus: ConsensusSelector::new(config.consensus)?,
            publish_cycle: 0,
            last_report: None,
            quit: false,
        })
    }

    /// Current mode.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// True once `quit` was received.
    pub fn is_quit(&self) -> bool {
        self.quit
    }

    /// Active template, if any.
    pub fn template(&self) -> Option<&Template> {
        self.template.as_ref()
    }

    /// Track registry (registry output mode).
    pub fn registry(&self) -> &TrackRegistry {
        &self.registry
    }

    /// Detection report of the most recent processed frame.
    pub fn last_report(&self) -> Option<&FrameReport> {
        self.last_report.as_ref()
    }

    /// Template store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Applies one command.
    ///
    /// Template failures are reported on `results` and leave the state
    /// unchanged; only channel errors are returned.
    pub fn handle_command<R: ResultChannel>(
        &mut self,
        command: Command,
        results: &mut R,
    ) -> ShapeTrackResult<()> {
        match command {
            Command::Quit => {
                self.quit = true;
                trace_event!("session_quit");
            }
            Command::StopTracking => {
                if self.state == SessionState::Tracking {
                    self.enter(SessionState::Standby);
                }
            }
            Command::NewTemplate(file) => match self.store.new_template(&file) {
                Ok(template) => {
                    self.template = Some(template);
                    self.enter(SessionState::Setup);
                }
                Err(err) => self.report_failure(results, "new_template", &file, &err)?,
            },
            Command::Track(name) => match self.store.load_template(&name) {
                Ok(template) => {
                    self.template = Some(template);
                    self.enter(SessionState::Tracking);
                }
                Err(err) => self.report_failure(results, "track", &name, &err)?,
            },
            Command::Overlay(name) => {
                if !matches!(self.state, SessionState::Standby | SessionState::Tracking) {
                    return Ok(());
                }
                let current = self.template.as_ref().is_some_and(|t| t.name() == name);
                if !current {
                    match self.store.load_template(&name) {
                        Ok(template) => self.template = Some(template),
                        Err(err) => return self.report_failure(results, "overlay", &name, &err),
                    }
                }
                self.resume = self.state;
                self.enter(SessionState::Adjusting);
            }
        }
        Ok(())
    }

    /// Leaves setup and starts tracking.
    pub fn finish_setup(&mut self) {
        if self.state == SessionState::Setup {
            self.enter(SessionState::Tracking);
        }
    }

    /// Leaves setup without tracking.
    pub fn abort_setup(&mut self) {
        if self.state == SessionState::Setup {
            self.enter(SessionState::Standby);
        }
    }

    /// Leaves adjusting mode and returns to the mode it was entered from.
    pub fn finish_adjusting(&mut self) {
        if self.state == SessionState::Adjusting {
            self.enter(self.resume);
        }
    }

    /// Replaces the template configuration during setup or adjusting.
    pub fn update_config(&mut self, config: TemplateConfig) -> ShapeTrackResult<()> {
        if !matches!(self.state, SessionState::Setup | SessionState::Adjusting) {
            return Err(ShapeTrackError::InvalidConfig {
                key: "state",
                reason: format!("configuration is locked in {:?}", self.state),
            });
        }
        let template = self.template.as_mut().ok_or(ShapeTrackError::InvalidConfig {
            key: "template",
            reason: "no active template".to_string(),
        })?;
        template.reconfigure(config)
    }

    /// Writes the active template's configuration file.
    pub fn save_template_config(&self) -> ShapeTrackResult<()> {
        match &self.template {
            Some(template) => template.save_config(),
            None => Err(ShapeTrackError::InvalidConfig {
                key: "template",
                reason: "no active template".to_string(),
            }),
        }
    }

    /// Runs one loop iteration; returns `false` once the session quit.
    ///
    /// Pending control payloads are drained and only the last one is applied.
    pub fn cycle<F, C, R>(
        &mut self,
        frames: &mut F,
        control: &mut C,
        results: &mut R,
    ) -> ShapeTrackResult<bool>
    where
        F: FrameSource,
        C: ControlChannel,
        R: ResultChannel,
    {
        let _span = trace_span!("session_cycle").entered();

        let mut last = None;
        while let Some(payload) = control.poll()? {
            last = Some(payload);
        }
        if let Some(payload) = last {
            match Command::parse(&payload) {
                Some(command) => self.handle_command(command, results)?,
                None => {
                    trace_warn!("ignoring control payload {payload:?}");
                }
            }
        }
        if self.quit {
            return Ok(false);
        }

        if self.state == SessionState::Standby {
            return Ok(true);
        }
        let Some(frame) = frames.next_frame()? else {
            return Ok(true);
        };
        let Some(template) = self.template.as_ref() else {
            return Ok(true);
        };
        let report = self.finder.find(&frame, template);

        if self.state == SessionState::Tracking {
            self.publish(&report, results)?;
        }
        self.last_report = Some(report);
        Ok(true)
    }

    /// Cycles until `quit` is received or a collaborator fails.
    pub fn run<F, C, R>(
        &mut self,
        frames: &mut F,
        control: &mut C,
        results: &mut R,
    ) -> ShapeTrackResult<()>
    where
        F: FrameSource,
        C: ControlChannel,
        R: ResultChannel,
    {
        while self.cycle(frames, control, results)? {}
        Ok(())
    }

    fn publish<R: ResultChannel>(
        &mut self,
        report: &FrameReport,
        results: &mut R,
    ) -> ShapeTrackResult<()> {
        match self.config.output {
            OutputMode::Registry => {
                self.registry.process_candidates(&report.candidates);
                self.registry.update();
                self.publish_cycle += 1;
                if self.publish_cycle >= self.config.publish_every {
                    self.publish_cycle = 0;
                    results.publish(&format_positions(&self.registry.positions()))?;
                }
            }
            OutputMode::Consensus => match self.consensus.vote(&report.candidates) {
                VoteOutcome::Pending => {}
                VoteOutcome::NoCandidates => results.publish(NOTHING_FOUND)?,
                VoteOutcome::Winner(w) => results.publish(&format_positions(&[w.position]))?,
            },
        }
        Ok(())
    }

    fn enter(&mut self, state: SessionState) {
        if state == SessionState::Tracking || self.state == SessionState::Tracking {
            self.registry.clear();
            self.consensus.reset();
            self.publish_cycle = 0;
        }
        trace_event!("session_state", from = self.state.name(), to = state.name());
        self.state = state;
    }

    fn report_failure<R: ResultChannel>(
        &self,
        results: &mut R,
        command: &str,
        arg: &str,
        err: &ShapeTrackError,
    ) -> ShapeTrackResult<()> {
        trace_warn!("{command} {arg} failed: {err}");
        results.report(&format!("{command};{arg} failed: {err}"))
    }
}

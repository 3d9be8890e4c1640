//! Python bindings for the shapetrack contour tracking library.
//!
//! Frames are HxWx3 uint8 numpy arrays in RGB order.

use numpy::{PyReadonlyArray3, PyUntypedArrayMethods};
use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;

use shapetrack::{
    format_positions as rust_format_positions, BinaryMethod, BlurMode, Candidate as RustCandidate,
    ColorImage, ConsensusConfig, ConsensusSelector, MatchMethod, PipelineConfig, Point,
    ShapeFinder, ShapeTrackError, Template as RustTemplate, TemplateConfig as RustTemplateConfig,
    TrackRegistry, TrackerConfig,
};

/// Convert a ShapeTrackError to a Python exception.
fn to_py_err(err: ShapeTrackError) -> PyErr {
    match err {
        ShapeTrackError::InvalidConfig { .. } | ShapeTrackError::ConfigParse { .. } => {
            PyValueError::new_err(err.to_string())
        }
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

fn frame_from_array(frame: &PyReadonlyArray3<'_, u8>) -> PyResult<ColorImage> {
    let shape = frame.shape();
    if shape[2] != ColorImage::CHANNELS {
        return Err(PyValueError::new_err("frame must have shape (height, width, 3)"));
    }
    let data = frame.as_slice()?.to_vec();
    ColorImage::new(data, shape[1], shape[0]).map_err(to_py_err)
}

fn parse_method(name: &str) -> PyResult<MatchMethod> {
    match name.to_lowercase().as_str() {
        "i1" => Ok(MatchMethod::I1),
        "i2" => Ok(MatchMethod::I2),
        "i3" => Ok(MatchMethod::I3),
        _ => Err(PyValueError::new_err("match_method must be 'i1', 'i2' or 'i3'")),
    }
}

fn build_template(
    image: PyReadonlyArray3<'_, u8>,
    config: Option<TemplateConfig>,
) -> PyResult<RustTemplate> {
    let image = frame_from_array(&image)?;
    let cfg = config.map(|c| c.inner).unwrap_or_default();
    RustTemplate::from_image("template", image, cfg).map_err(to_py_err)
}

/// Shape-matched candidate found in one frame.
#[pyclass]
#[derive(Clone)]
pub struct Candidate {
    /// Integer centroid x.
    #[pyo3(get)]
    pub x: i32,
    /// Integer centroid y.
    #[pyo3(get)]
    pub y: i32,
    /// Shape distance to the template.
    #[pyo3(get)]
    pub distance: f64,
    /// Enclosed area in px².
    #[pyo3(get)]
    pub area: f64,
    /// Perimeter in px.
    #[pyo3(get)]
    pub perimeter: f64,
}

#[pymethods]
impl Candidate {
    fn __repr__(&self) -> String {
        format!(
            "Candidate(x={}, y={}, distance={:.4}, area={:.1}, perimeter={:.1})",
            self.x, self.y, self.distance, self.area, self.perimeter
        )
    }
}

impl From<&RustCandidate> for Candidate {
    fn from(c: &RustCandidate) -> Self {
        Self {
            x: c.position.x,
            y: c.position.y,
            distance: c.distance,
            area: c.area,
            perimeter: c.perimeter,
        }
    }
}

/// Template matching parameters.
#[pyclass]
#[derive(Clone)]
pub struct TemplateConfig {
    inner: RustTemplateConfig,
}

#[pymethods]
impl TemplateConfig {
    /// Create a new TemplateConfig.
    ///
    /// Args:
    ///     binary_lower: Lower binarization / Canny threshold (default: 100)
    ///     binary_upper: Upper binarization / Canny threshold (default: 255)
    ///     blur: 0 none, 1 gaussian, 2 median, 3 bilateral (default: 0)
    ///     hsv_lower: Inclusive HSV lower bound (default: (0, 0, 0))
    ///     hsv_upper: Inclusive HSV upper bound (default: (255, 255, 255))
    ///     max_distance: Shape distance slider 0..=100, divided by 20 (default: 20)
    ///     area_filter: Area tolerance, 0 disables (default: 500)
    ///     perimeter_filter: Perimeter tolerance, 0 disables (default: 500)
    ///     binary_method: 0 band, 1 inverted band, 2 edges (default: 1)
    #[new]
    #[pyo3(signature = (
        binary_lower = 100,
        binary_upper = 255,
        blur = 0,
        hsv_lower = (0, 0, 0),
        hsv_upper = (255, 255, 255),
        max_distance = 20,
        area_filter = 500,
        perimeter_filter = 500,
        binary_method = 1
    ))]
    #[allow(clippy::too_many_arguments)]
    fn new(
        binary_lower: u8,
        binary_upper: u8,
        blur: i64,
        hsv_lower: (u8, u8, u8),
        hsv_upper: (u8, u8, u8),
        max_distance: u32,
        area_filter: u32,
        perimeter_filter: u32,
        binary_method: i64,
    ) -> PyResult<Self> {
        let inner = RustTemplateConfig {
            binary_lower,
            binary_upper,
            blur: BlurMode::from_id(blur).map_err(to_py_err)?,
            hsv_lower: [hsv_lower.0, hsv_lower.1, hsv_lower.2],
            hsv_upper: [hsv_upper.0, hsv_upper.1, hsv_upper.2],
            max_distance,
            area_filter,
            perimeter_filter,
            binary_method: BinaryMethod::from_id(binary_method).map_err(to_py_err)?,
        };
        inner.validate().map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Parse `Key=Value` config text.
    #[staticmethod]
    fn from_config_string(text: &str) -> PyResult<Self> {
        let inner = RustTemplateConfig::parse(text).map_err(to_py_err)?;
        Ok(Self { inner })
    }

    /// Serialize to `Key=Value` config text.
    fn to_config_string(&self) -> String {
        self.inner.to_config_string()
    }

    /// Get a setting by its persisted key.
    fn get(&self, key: &str) -> PyResult<i64> {
        self.inner
            .get(key)
            .ok_or_else(|| PyValueError::new_err(format!("unknown key {key}")))
    }

    /// Set a setting by its persisted key.
    fn set(&mut self, key: &str, value: i64) -> PyResult<()> {
        let mut next = self.inner;
        if !next.set(key, value).map_err(to_py_err)? {
            return Err(PyValueError::new_err(format!("unknown key {key}")));
        }
        next.validate().map_err(to_py_err)?;
        self.inner = next;
        Ok(())
    }

    fn __repr__(&self) -> String {
        format!(
            "TemplateConfig(binary_method={}, blur={}, max_distance={}, area_filter={}, perimeter_filter={})",
            self.inner.binary_method.id(),
            self.inner.blur.id(),
            self.inner.max_distance,
            self.inner.area_filter,
            self.inner.perimeter_filter
        )
    }
}

/// Persistence-scored tracker for one template.
#[pyclass]
pub struct ShapeTracker {
    template: RustTemplate,
    finder: ShapeFinder,
    registry: TrackRegistry,
}

#[pymethods]
impl ShapeTracker {
    /// Create a tracker from a reference image.
    ///
    /// Args:
    ///     template: HxWx3 uint8 reference image
    ///     config: TemplateConfig (default: TemplateConfig())
    ///     max_score: Persistence cap (default: 8)
    ///     found_score: Added on rematch (default: 3)
    ///     lost_score: Added every cycle, negative (default: -2)
    ///     initial_score: Persistence of new objects (default: 2)
    ///     match_method: "i1", "i2" or "i3" (default: "i1")
    #[new]
    #[pyo3(signature = (
        template,
        config = None,
        max_score = 8,
        found_score = 3,
        lost_score = -2,
        initial_score = 2,
        match_method = "i1"
    ))]
    fn new(
        template: PyReadonlyArray3<'_, u8>,
        config: Option<TemplateConfig>,
        max_score: i32,
        found_score: i32,
        lost_score: i32,
        initial_score: i32,
        match_method: &str,
    ) -> PyResult<Self> {
        let template = build_template(template, config)?;
        let tracker = TrackerConfig {
            max_score,
            found_score,
            lost_score,
            initial_score,
            ..TrackerConfig::default()
        };
        let registry = TrackRegistry::new(tracker).map_err(to_py_err)?;
        let finder = ShapeFinder::new(PipelineConfig {
            match_method: parse_method(match_method)?,
        });
        Ok(Self {
            template,
            finder,
            registry,
        })
    }

    /// Detect candidates in a frame without touching the tracked state.
    fn detect(&self, frame: PyReadonlyArray3<'_, u8>) -> PyResult<Vec<Candidate>> {
        let frame = frame_from_array(&frame)?;
        let report = self.finder.find(&frame, &self.template);
        Ok(report.candidates.iter().map(Candidate::from).collect())
    }

    /// Process one frame and return the live tracked positions.
    fn update(&mut self, frame: PyReadonlyArray3<'_, u8>) -> PyResult<Vec<(i32, i32)>> {
        let frame = frame_from_array(&frame)?;
        let report = self.finder.find(&frame, &self.template);
        self.registry.process_candidates(&report.candidates);
        Ok(self
            .registry
            .update()
            .into_iter()
            .map(|o| (o.position.x, o.position.y))
            .collect())
    }

    /// Replace the template configuration.
    fn reconfigure(&mut self, config: TemplateConfig) -> PyResult<()> {
        self.template.reconfigure(config.inner).map_err(to_py_err)
    }

    /// Reference area and perimeter of the template.
    #[getter]
    fn reference(&self) -> (f64, f64) {
        let d = self.template.descriptor();
        (d.area, d.perimeter)
    }

    fn __repr__(&self) -> String {
        format!("ShapeTracker(tracked={})", self.registry.len())
    }
}

/// Majority-vote tracker for one template.
#[pyclass]
pub struct ConsensusTracker {
    template: RustTemplate,
    finder: ShapeFinder,
    selector: ConsensusSelector,
}

#[pymethods]
impl ConsensusTracker {
    /// Create a vote-based tracker from a reference image.
    ///
    /// Args:
    ///     template: HxWx3 uint8 reference image
    ///     config: TemplateConfig (default: TemplateConfig())
    ///     cycles: Frames per vote (default: 5)
    ///     match_method: "i1", "i2" or "i3" (default: "i1")
    #[new]
    #[pyo3(signature = (template, config = None, cycles = 5, match_method = "i1"))]
    fn new(
        template: PyReadonlyArray3<'_, u8>,
        config: Option<TemplateConfig>,
        cycles: usize,
        match_method: &str,
    ) -> PyResult<Self> {
        let template = build_template(template, config)?;
        let selector = ConsensusSelector::new(ConsensusConfig { cycles }).map_err(to_py_err)?;
        let finder = ShapeFinder::new(PipelineConfig {
            match_method: parse_method(match_method)?,
        });
        Ok(Self {
            template,
            finder,
            selector,
        })
    }

    /// Process one frame; returns the winning position when a vote completes.
    fn update(&mut self, frame: PyReadonlyArray3<'_, u8>) -> PyResult<Option<(i32, i32)>> {
        let frame = frame_from_array(&frame)?;
        let report = self.finder.find(&frame, &self.template);
        Ok(self
            .selector
            .update(&report.candidates)
            .map(|w| (w.position.x, w.position.y)))
    }

    fn __repr__(&self) -> String {
        format!(
            "ConsensusTracker(cycles={}, pending={})",
            self.selector.config().cycles,
            self.selector.pending_updates()
        )
    }
}

/// Format positions as the published payload (`x,y;x,y` or `Nothing Found`).
#[pyfunction]
fn format_positions(positions: Vec<(i32, i32)>) -> String {
    let points: Vec<Point> = positions.into_iter().map(Point::from).collect();
    rust_format_positions(&points)
}

/// Python module for shapetrack.
#[pymodule]
fn _shapetrack(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<Candidate>()?;
    m.add_class::<TemplateConfig>()?;
    m.add_class::<ShapeTracker>()?;
    m.add_class::<ConsensusTracker>()?;
    m.add_function(wrap_pyfunction!(format_positions, m)?)?;

    m.add("__version__", env!("CARGO_PKG_VERSION"))?;

    Ok(())
}

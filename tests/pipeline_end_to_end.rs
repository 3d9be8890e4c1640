use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use shapetrack::{
    BinaryMethod, BlurMode, ColorImage, MatchMethod, PipelineConfig, Point, ShapeFinder,
    Template, TemplateConfig,
};

const WIDTH: usize = 120;
const HEIGHT: usize = 80;
const BACKGROUND: [u8; 3] = [235, 235, 235];
const DARK: [u8; 3] = [15, 15, 15];
const BLUE: [u8; 3] = [30, 60, 200];
const RED: [u8; 3] = [200, 30, 30];

struct Blob {
    x0: usize,
    y0: usize,
    size: usize,
    color: [u8; 3],
}

fn square(x0: usize, y0: usize, size: usize, color: [u8; 3]) -> Blob {
    Blob {
        x0,
        y0,
        size,
        color,
    }
}

fn render(width: usize, height: usize, blobs: &[Blob]) -> ColorImage {
    ColorImage::from_fn(width, height, |x, y| {
        blobs
            .iter()
            .find(|b| (b.x0..b.x0 + b.size).contains(&x) && (b.y0..b.y0 + b.size).contains(&y))
            .map_or(BACKGROUND, |b| b.color)
    })
    .unwrap()
}

fn make_template(color: [u8; 3], config: TemplateConfig) -> Template {
    Template::from_image("square", render(48, 48, &[square(12, 12, 21, color)]), config).unwrap()
}

fn near(a: Point, b: Point, tol: i32) -> bool {
    (a.x - b.x).abs() <= tol && (a.y - b.y).abs() <= tol
}

fn positions(finder: &ShapeFinder, frame: &ColorImage, template: &Template) -> Vec<Point> {
    let mut out: Vec<Point> = finder
        .find(frame, template)
        .candidates
        .iter()
        .map(|c| c.position)
        .collect();
    out.sort();
    out
}

fn tight() -> TemplateConfig {
    TemplateConfig {
        area_filter: 60,
        perimeter_filter: 12,
        ..TemplateConfig::default()
    }
}

#[test]
fn default_pipeline_locates_matching_squares() {
    let template = make_template(DARK, tight());
    let frame = render(
        WIDTH,
        HEIGHT,
        &[
            square(10, 10, 21, DARK),
            square(70, 40, 21, DARK),
            square(45, 5, 8, DARK),
            square(30, 45, 30, DARK),
        ],
    );
    let finder = ShapeFinder::new(PipelineConfig::default());
    let report = finder.find(&frame, &template);

    assert_eq!(report.contour_count, 4);
    assert_eq!(report.matched_count, 4);
    let found = positions(&finder, &frame, &template);
    assert_eq!(found, vec![Point::new(20, 20), Point::new(80, 50)]);
}

#[test]
fn shape_threshold_rejects_other_shapes() {
    let template = make_template(DARK, tight());
    let mut frame = render(WIDTH, HEIGHT, &[square(10, 10, 21, DARK)]);
    // thin bar with an area close to the template's
    for y in 50..55 {
        for x in 30..118 {
            frame.set_pixel(x, y, DARK);
        }
    }
    let finder = ShapeFinder::new(PipelineConfig::default());
    let report = finder.find(&frame, &template);
    assert_eq!(report.contour_count, 2);
    assert_eq!(report.matched_count, 1);
    assert_eq!(report.candidates[0].position, Point::new(20, 20));
}

#[test]
fn every_match_method_finds_the_square() {
    let template = make_template(DARK, tight());
    let frame = render(WIDTH, HEIGHT, &[square(60, 20, 21, DARK)]);
    for method in [MatchMethod::I1, MatchMethod::I2, MatchMethod::I3] {
        let finder = ShapeFinder::new(PipelineConfig {
            match_method: method,
        });
        assert_eq!(
            positions(&finder, &frame, &template),
            vec![Point::new(70, 30)],
            "{method:?}"
        );
    }
}

#[test]
fn hsv_range_keeps_only_the_selected_color() {
    let config = TemplateConfig {
        hsv_lower: [100, 100, 50],
        hsv_upper: [130, 255, 255],
        binary_lower: 0,
        binary_upper: 255,
        binary_method: BinaryMethod::Band,
        ..tight()
    };
    let template = make_template(BLUE, config);
    let frame = render(
        WIDTH,
        HEIGHT,
        &[square(10, 10, 21, RED), square(70, 40, 21, BLUE)],
    );
    let finder = ShapeFinder::new(PipelineConfig::default());
    let report = finder.find(&frame, &template);

    assert_eq!(report.preprocessed.color_mask.count_nonzero(), 21 * 21);
    assert_eq!(report.contour_count, 1);
    assert_eq!(
        report.candidates.iter().map(|c| c.position).collect::<Vec<_>>(),
        vec![Point::new(80, 50)]
    );
}

#[test]
fn blur_modes_keep_square_positions() {
    for blur in [BlurMode::Gaussian, BlurMode::Median, BlurMode::Bilateral] {
        let config = TemplateConfig {
            blur,
            ..tight()
        };
        let template = make_template(DARK, config);
        let frame = render(
            WIDTH,
            HEIGHT,
            &[square(10, 10, 21, DARK), square(70, 40, 21, DARK)],
        );
        let found = positions(&ShapeFinder::default(), &frame, &template);
        assert_eq!(found.len(), 2, "{blur:?}");
        assert!(near(found[0], Point::new(20, 20), 1), "{blur:?} {found:?}");
        assert!(near(found[1], Point::new(80, 50), 1), "{blur:?} {found:?}");
    }
}

#[test]
fn median_blur_removes_speckle_noise() {
    let config = TemplateConfig {
        blur: BlurMode::Median,
        ..tight()
    };
    let template = make_template(DARK, config);
    let mut frame = render(WIDTH, HEIGHT, &[square(40, 20, 21, DARK)]);
    let mut rng = StdRng::seed_from_u64(7);
    for _ in 0..60 {
        let x = rng.random_range(0..WIDTH);
        let y = rng.random_range(0..HEIGHT);
        let inside = (40..61).contains(&x) && (20..41).contains(&y);
        if !inside {
            frame.set_pixel(x, y, DARK);
        }
    }

    let unblurred = make_template(DARK, tight());
    let noisy = ShapeFinder::default().find(&frame, &unblurred);
    assert!(noisy.contour_count > 1);

    let found = positions(&ShapeFinder::default(), &frame, &template);
    assert_eq!(found.len(), 1);
    assert!(near(found[0], Point::new(50, 30), 1), "{found:?}");
}

#[test]
fn edge_mode_tracks_square_outlines() {
    let config = TemplateConfig {
        binary_method: BinaryMethod::Edges,
        ..tight()
    };
    let template = make_template(DARK, config);
    let frame = render(
        WIDTH,
        HEIGHT,
        &[square(10, 10, 21, DARK), square(70, 40, 21, DARK)],
    );
    let found = positions(&ShapeFinder::default(), &frame, &template);
    assert!(!found.is_empty());
    assert!(found
        .iter()
        .all(|p| near(*p, Point::new(20, 20), 1) || near(*p, Point::new(80, 50), 1)));
}

#[test]
fn empty_frame_yields_no_candidates() {
    let template = make_template(DARK, tight());
    let frame = ColorImage::filled(WIDTH, HEIGHT, BACKGROUND).unwrap();
    let report = ShapeFinder::default().find(&frame, &template);
    assert_eq!(report.contour_count, 0);
    assert!(report.candidates.is_empty());
}

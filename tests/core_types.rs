use shapetrack::{ColorImage, ImageView, OwnedImage, ShapeTrackError};

#[test]
fn image_view_rejects_invalid_dimensions() {
    let data = [0u8; 4];

    let err = ImageView::from_slice(&data, 0, 1).err().unwrap();
    assert_eq!(
        err,
        ShapeTrackError::InvalidDimensions {
            width: 0,
            height: 1,
        }
    );

    let err = ImageView::from_slice(&data, 1, 0).err().unwrap();
    assert_eq!(
        err,
        ShapeTrackError::InvalidDimensions {
            width: 1,
            height: 0,
        }
    );
}

#[test]
fn image_view_rejects_invalid_stride() {
    let data = [0u8; 8];

    let err = ImageView::new(&data, 4, 1, 3).err().unwrap();
    assert_eq!(
        err,
        ShapeTrackError::InvalidStride {
            width: 4,
            stride: 3,
        }
    );
}

#[test]
fn image_view_rejects_small_buffer() {
    let data = [0u8; 3];

    let err = ImageView::new(&data, 2, 2, 2).err().unwrap();
    assert_eq!(err, ShapeTrackError::BufferTooSmall { needed: 4, got: 3 });
}

#[test]
fn padded_view_rows_skip_padding() {
    let data: Vec<u8> = (0u8..12).collect();
    let view = ImageView::new(&data, 3, 3, 4).unwrap();
    assert_eq!(view.row(1).unwrap(), &[4, 5, 6]);
    assert_eq!(view.get(2, 2), Some(&10));
    assert_eq!(view.get(3, 0), None);

    let owned = OwnedImage::from_view(view).unwrap();
    assert_eq!(owned.data(), &[0, 1, 2, 4, 5, 6, 8, 9, 10]);
}

#[test]
fn color_image_checks_buffer_length() {
    let err = ColorImage::new(vec![0u8; 11], 2, 2).err().unwrap();
    assert_eq!(err, ShapeTrackError::BufferTooSmall { needed: 12, got: 11 });
    assert!(ColorImage::new(vec![0u8; 13], 2, 2).is_err());

    let mut img = ColorImage::filled(2, 2, [1, 2, 3]).unwrap();
    img.set_pixel(1, 0, [9, 8, 7]);
    assert_eq!(img.pixel(1, 0), [9, 8, 7]);
    assert_eq!(img.pixel(0, 1), [1, 2, 3]);
}

#[test]
fn errors_render_their_context() {
    let err = ShapeTrackError::InvalidConfig {
        key: "MaxDistance",
        reason: "must be at most 100".to_string(),
    };
    assert_eq!(
        err.to_string(),
        "invalid config value for MaxDistance: must be at most 100"
    );
    let err = ShapeTrackError::ConfigParse {
        line: 3,
        reason: "bad".to_string(),
    };
    assert_eq!(err.to_string(), "config parse error on line 3: bad");
}

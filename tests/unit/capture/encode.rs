use super::*;

fn baked(components: u8, samples: Vec<f32>) -> BakedImage {
    let width = (samples.len() / usize::from(components)) as u32;
    BakedImage {
        width,
        height: 1,
        components,
        valid_samples: u64::from(width),
        samples,
    }
}

#[test]
fn base_color_is_srgb_encoded() {
    let img = baked(3, vec![0.0, 1.0, 0.5]);
    let EncodedPixels::Rgb8(px) = encode_samples(ChannelKind::BaseColor, &img, DepthRange::default())
    else {
        panic!("expected rgb8");
    };
    assert_eq!(px[0], 0);
    assert_eq!(px[1], 255);
    // Linear 0.5 is ~0.735 in sRGB.
    assert_eq!(px[2], 188);
}

#[test]
fn normals_are_packed_into_unit_range() {
    let img = baked(3, vec![-1.0, 0.0, 1.0]);
    let EncodedPixels::Rgb8(px) = encode_samples(ChannelKind::Normal, &img, DepthRange::default())
    else {
        panic!("expected rgb8");
    };
    assert_eq!(px, vec![0, 128, 255]);
}

#[test]
fn scalars_are_luma8_and_clamped() {
    let img = baked(1, vec![-0.5, 0.5, 2.0]);
    assert_eq!(
        encode_samples(ChannelKind::Roughness, &img, DepthRange::default()),
        EncodedPixels::Luma8(vec![0, 128, 255])
    );
}

#[test]
fn depth_is_remapped_through_range() {
    let range = DepthRange::new(0.1, 10.0).unwrap();
    let img = baked(1, vec![0.0, 0.1, 5.05, 10.0, 20.0]);
    let EncodedPixels::Luma16(px) = encode_samples(ChannelKind::Depth, &img, range) else {
        panic!("expected luma16");
    };
    assert_eq!(px[0], 0);
    assert_eq!(px[1], 0);
    assert!((i32::from(px[2]) - 32768).abs() <= 1, "{}", px[2]);
    assert_eq!(px[3], 65535);
    assert_eq!(px[4], 65535);
}

#[test]
fn pngs_round_trip_through_the_decoder() {
    let dir = std::path::PathBuf::from("target/unit_encode");
    std::fs::create_dir_all(&dir).unwrap();

    let depth_path = dir.join("depth.png");
    let img = baked(1, vec![0.001, 10.0]);
    write_channel_png(&depth_path, ChannelKind::Depth, &img, DepthRange::default()).unwrap();
    let decoded = image::open(&depth_path).unwrap();
    assert_eq!(decoded.color(), image::ColorType::L16);
    assert_eq!((decoded.width(), decoded.height()), (2, 1));

    let color_path = dir.join("color.png");
    let img = baked(3, vec![1.0, 0.0, 0.0]);
    write_channel_png(&color_path, ChannelKind::BaseColor, &img, DepthRange::default()).unwrap();
    let decoded = image::open(&color_path).unwrap().to_rgb8();
    assert_eq!(decoded.get_pixel(0, 0).0, [255, 0, 0]);
}

#[test]
fn raw_depth_exr_keeps_scene_units() {
    let dir = std::path::PathBuf::from("target/unit_encode");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("depth_raw.exr");
    let range = DepthRange::new(0.0, 10.0).unwrap();
    write_raw_depth_exr(&path, &baked(1, vec![0.25, 7.5]), range).unwrap();

    let decoded = image::open(&path).unwrap().to_rgb32f();
    assert_eq!(decoded.get_pixel(0, 0).0, [-0.25, -0.25, -0.25]);
    assert_eq!(decoded.get_pixel(1, 0).0, [-7.5, -7.5, -7.5]);
}

#[test]
fn raw_depth_exr_is_signed_around_the_midpoint() {
    let dir = std::path::PathBuf::from("target/unit_encode");
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join("depth_raw_mid.exr");
    let range = DepthRange::new(0.5, 10.5)
        .unwrap()
        .with_midpoint(0.5)
        .unwrap();
    write_raw_depth_exr(&path, &baked(1, vec![0.25, 7.5, 40.0]), range).unwrap();

    let decoded = image::open(&path).unwrap().to_rgb32f();
    // Zero plane sits at 5.5; points above it are positive, beyond far is floored.
    assert_eq!(decoded.get_pixel(0, 0).0[0], 5.25);
    assert_eq!(decoded.get_pixel(1, 0).0[0], -2.0);
    assert_eq!(decoded.get_pixel(2, 0).0[0], -5.0);
}

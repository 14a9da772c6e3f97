use std::fs;
use std::path::PathBuf;

use itincap::rendering::raster::render_region;
use itincap::resources::ImageLoader;
use itincap::{RasterOptions, RegionSnapshot};
use sha2::{Digest, Sha256};

fn golden_path(name: &str) -> PathBuf {
    let mut p = PathBuf::from("tests/goldens/expected");
    p.push(name);
    p
}

#[test]
fn golden_capture_matches_fixture() {
    let region_html = fs::read_to_string("tests/goldens/regions/day1.html").expect("read fixture");
    let region = RegionSnapshot::new(region_html, None);
    let loader = ImageLoader::new("golden", 1000);

    let capture =
        render_region(&region, &RasterOptions::default(), &loader).expect("render fixture");

    // The golden is content-addressed: a digest of the PNG bytes
    let digest = hex::encode(Sha256::digest(&capture.png_data));

    let expected_path = golden_path("day1.sha256");
    if std::env::var("UPDATE_GOLDENS").is_ok() {
        fs::create_dir_all("tests/goldens/expected").ok();
        fs::write(&expected_path, &digest).expect("write golden");
        println!("Updated golden: {:?}", expected_path);
        return;
    }

    if !expected_path.exists() {
        println!(
            "No golden at {:?}; run with UPDATE_GOLDENS=1 to create it. Skipping.",
            expected_path
        );
        return;
    }

    let expected = fs::read_to_string(&expected_path).expect("unable to read golden");
    assert_eq!(digest, expected.trim());
}

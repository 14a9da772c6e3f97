#![cfg(feature = "remote")]

//! End-to-end capture tests against local HTTP servers

use itincap::controller::CAPTURE_TRIGGER;
use itincap::{CaptureConfig, CaptureController, Page};
use std::io::Cursor;
use tiny_http::{Header, Response, Server};

fn test_config(tag: &str) -> CaptureConfig {
    let dir = std::env::temp_dir().join(format!("itincap-net-{}-{}", tag, std::process::id()));
    let _ = std::fs::remove_dir_all(&dir);
    CaptureConfig {
        downloads_dir: dir,
        ..Default::default()
    }
}

fn red_png_bytes() -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([255, 0, 0, 255]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .expect("encode fixture png");
    buf
}

// Serve `html` at "/" and a small red PNG at "/map.png" until the server
// handle is dropped (the thread is leaked for the duration of the tests).
fn start_fixture_server(html: String) -> String {
    let server = Server::http("127.0.0.1:0").expect("bind fixture server");
    let addr = server.server_addr();
    let png = red_png_bytes();

    std::thread::spawn(move || {
        for request in server.incoming_requests() {
            let response = match request.url() {
                "/" => Response::from_string(html.clone()).with_header(
                    "Content-Type: text/html; charset=utf-8"
                        .parse::<Header>()
                        .unwrap(),
                ),
                "/map.png" => Response::from_data(png.clone())
                    .with_header("Content-Type: image/png".parse::<Header>().unwrap()),
                _ => Response::from_string("Not Found").with_status_code(404),
            };
            let _ = request.respond(response);
        }
    });

    format!("http://{}", addr)
}

fn decode_png(png_data: &[u8]) -> Vec<u8> {
    let decoder = png::Decoder::new(png_data);
    let mut reader = decoder.read_info().expect("read png info");
    let mut buf = vec![0; reader.output_buffer_size()];
    let info = reader.next_frame(&mut buf).expect("decode frame");
    buf.truncate(info.buffer_size());
    buf
}

fn count_red(pixels: &[u8]) -> usize {
    pixels
        .chunks(4)
        .filter(|p| p[0] == 255 && p[1] == 0 && p[2] == 0)
        .count()
}

#[test]
fn capture_of_served_page_fetches_same_origin_images() {
    // Skip on CI where sockets may not be available
    if std::env::var("CI").is_ok() {
        return;
    }

    let html = r#"<html><body>
        <button id="capture-btn">Save as image</button>
        <section class="itinerary-section">
          <h2>Day 1</h2>
          <img src="/map.png" width="32" height="32">
        </section>
    </body></html>"#;
    let base = start_fixture_server(html.to_string());

    // Same-origin images load even with cross-origin fetching disabled.
    let config = CaptureConfig {
        cross_origin: false,
        ..test_config("same-origin")
    };
    let mut page = Page::new(&config).expect("create page");
    let controller = CaptureController::new(&config).expect("create controller");
    controller.install(&mut page);
    page.load_url(&base).expect("load served page");

    assert!(page.click(CAPTURE_TRIGGER));
    controller.rasterizer().flush();

    let completed = controller.downloads().completed();
    assert_eq!(completed.len(), 1);
    let pixels = decode_png(&std::fs::read(&completed[0]).expect("read artifact"));
    assert!(count_red(&pixels) >= 32 * 32);
}

#[test]
fn cross_origin_images_require_the_cors_opt_in() {
    // Skip on CI where sockets may not be available
    if std::env::var("CI").is_ok() {
        return;
    }

    // The image lives on a second server, so its origin differs by port.
    let image_base = start_fixture_server("<html></html>".to_string());
    let html = format!(
        r#"<html><body>
            <button id="capture-btn">Save as image</button>
            <section class="itinerary-section">
              <img src="{}/map.png" width="32" height="32">
            </section>
        </body></html>"#,
        image_base
    );
    let page_base = start_fixture_server(html);

    for (cross_origin, expect_image) in [(false, false), (true, true)] {
        let config = CaptureConfig {
            cross_origin,
            ..test_config(if cross_origin { "cors-on" } else { "cors-off" })
        };
        let mut page = Page::new(&config).expect("create page");
        let controller = CaptureController::new(&config).expect("create controller");
        controller.install(&mut page);
        page.load_url(&page_base).expect("load served page");

        page.click(CAPTURE_TRIGGER);
        controller.rasterizer().flush();

        let completed = controller.downloads().completed();
        assert_eq!(completed.len(), 1);
        let pixels = decode_png(&std::fs::read(&completed[0]).expect("read artifact"));
        let red = count_red(&pixels);
        if expect_image {
            assert!(red >= 32 * 32, "cross-origin image should have been fetched");
        } else {
            // The skipped image paints as a neutral placeholder instead.
            assert_eq!(red, 0, "cross-origin image must not load without the opt-in");
        }
    }
}

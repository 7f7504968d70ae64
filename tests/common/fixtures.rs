#![allow(dead_code)]

use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_polygon_mut};
use imageproc::point::Point;
use imageproc::rect::Rect;
use signdet::{Template, TemplateLibrary, WindowCandidate};
use std::sync::Arc;

/// Side of the square scene tile that holds one sign.
pub const TILE: u32 = 103;

/// Vertical offset of the second tile in a two-sign scene.
pub const TILE_STEP: i32 = 123;

/// Saturated red, inside the default red band.
pub const SIGN_RED: Rgb<u8> = Rgb([220, 20, 20]);

/// Saturated blue, inside the default blue band.
pub const SIGN_BLUE: Rgb<u8> = Rgb([20, 20, 220]);

/// Triangle of roughly 2000 px with a square bounding box, 20 px inside its tile.
pub fn large_triangle(dy: i32) -> [Point<i32>; 3] {
    [
        Point::new(52, 20 + dy),
        Point::new(20, 83 + dy),
        Point::new(84, 83 + dy),
    ]
}

/// Triangle of roughly 100 px.
pub fn small_triangle(dy: i32) -> [Point<i32>; 3] {
    [
        Point::new(52, 45 + dy),
        Point::new(45, 59 + dy),
        Point::new(59, 59 + dy),
    ]
}

/// Inclusive pixel bounds (x_min, y_min, x_max, y_max) of a polygon.
pub fn polygon_bounds(poly: &[Point<i32>]) -> (u32, u32, u32, u32) {
    let x_min = poly.iter().map(|p| p.x).min().unwrap_or(0);
    let y_min = poly.iter().map(|p| p.y).min().unwrap_or(0);
    let x_max = poly.iter().map(|p| p.x).max().unwrap_or(0);
    let y_max = poly.iter().map(|p| p.y).max().unwrap_or(0);
    (x_min as u32, y_min as u32, x_max as u32, y_max as u32)
}

pub fn black_image(width: u32, height: u32) -> RgbImage {
    RgbImage::new(width, height)
}

/// One tile containing a filled triangle.
pub fn triangle_scene(poly: &[Point<i32>]) -> RgbImage {
    let mut img = black_image(TILE, TILE);
    draw_polygon_mut(&mut img, poly, SIGN_RED);
    img
}

/// Two stacked tiles, each with a large triangle.
pub fn two_triangle_scene() -> RgbImage {
    let mut img = black_image(TILE, TILE + TILE_STEP as u32);
    draw_polygon_mut(&mut img, &large_triangle(0), SIGN_RED);
    draw_polygon_mut(&mut img, &large_triangle(TILE_STEP), SIGN_RED);
    img
}

/// Triangle in the upper tile, a square of the same extent in the lower tile.
pub fn triangle_and_square_scene() -> RgbImage {
    let mut img = black_image(TILE, TILE + TILE_STEP as u32);
    draw_polygon_mut(&mut img, &large_triangle(0), SIGN_RED);
    draw_filled_rect_mut(
        &mut img,
        Rect::at(20, 20 + TILE_STEP).of_size(64, 64),
        SIGN_BLUE,
    );
    img
}

/// Square scene with a right triangle whose vertical side lies on column 0.
pub fn left_edge_triangle_scene() -> RgbImage {
    let mut img = black_image(90, 90);
    let triangle = [Point::new(0, 15), Point::new(0, 78), Point::new(63, 78)];
    draw_polygon_mut(&mut img, &triangle, SIGN_RED);
    img
}

/// Sign-colored block touching the left edge, far above the default `max_area`.
pub fn oversized_left_edge_scene() -> RgbImage {
    let mut img = black_image(400, 400);
    draw_filled_rect_mut(&mut img, Rect::at(0, 50).of_size(300, 300), SIGN_RED);
    img
}

/// Library holding the grayscale version of a whole scene.
pub fn scene_library(scene: &RgbImage) -> Arc<TemplateLibrary> {
    let templates = vec![Template {
        name: "scene".to_string(),
        image: DynamicImage::ImageRgb8(scene.clone()).to_luma8(),
    }];
    Arc::new(TemplateLibrary::from_templates("memory", templates).expect("non-empty library"))
}

/// Every foreground pixel of `mask` lies inside one of `windows`.
pub fn mask_covered_by_windows(mask: &GrayImage, windows: &[WindowCandidate]) -> bool {
    mask.enumerate_pixels()
        .filter(|(_, _, p)| p[0] != 0)
        .all(|(x, y, _)| windows.iter().any(|w| w.contains(x, y)))
}

/// Grayscale tile with a white version of the large triangle.
pub fn triangle_template() -> GrayImage {
    let mut tpl = GrayImage::new(TILE, TILE);
    draw_polygon_mut(&mut tpl, &large_triangle(0), Luma([255u8]));
    tpl
}

pub fn triangle_library() -> Arc<TemplateLibrary> {
    let templates = vec![Template {
        name: "triangle".to_string(),
        image: triangle_template(),
    }];
    Arc::new(TemplateLibrary::from_templates("memory", templates).expect("non-empty library"))
}

/// Binary mask with one filled axis-aligned rectangle.
pub fn rect_mask(width: u32, height: u32, x: i32, y: i32, w: u32, h: u32) -> GrayImage {
    let mut mask = GrayImage::new(width, height);
    draw_filled_rect_mut(&mut mask, Rect::at(x, y).of_size(w, h), Luma([255u8]));
    mask
}

pub fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p[0] != 0).count()
}

pub fn is_binary(mask: &GrayImage) -> bool {
    mask.pixels().all(|p| p[0] == 0 || p[0] == 255)
}

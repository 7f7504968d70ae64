use image::{GrayImage, Luma, imageops};
use imageproc::contours::{BorderType, find_contours};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;
use crate::models::Region;

/// Outermost regions of a binary mask (any non-zero pixel is foreground).
///
/// Holes and components nested inside holes are not reported; filling an
/// outer region covers them. Components touching the image border are
/// reported like any other.
pub fn find_regions(mask: &GrayImage) -> Vec<Region> {
    // Border following only starts outer borders right of a background pixel,
    // so trace on a copy surrounded by a 1 px background frame
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut framed, mask, 1, 1);

    find_contours::<i32>(&framed)
        .into_iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(|c| {
            let points = c
                .points
                .into_iter()
                .map(|p| Point::new(p.x - 1, p.y - 1))
                .collect();
            Region::from_points(points)
        })
        .collect()
}

/// Paint the area enclosed by a region's outer boundary with `value`.
pub fn fill_region(mask: &mut GrayImage, region: &Region, value: u8) {
    let color = Luma([value]);
    let mut poly: &[Point<i32>] = &region.points;

    // The polygon routine refuses a closing point equal to the first one
    while poly.len() > 1 && poly[0] == poly[poly.len() - 1] {
        poly = &poly[..poly.len() - 1];
    }

    match poly {
        [] => {}
        [p] => {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < mask.width() && (p.y as u32) < mask.height() {
                mask.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        [a, b] => draw_line_segment_mut(
            mask,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            color,
        ),
        _ => draw_polygon_mut(mask, poly, color),
    }
}

use super::Point;

/// Perimeter pixels of the axis-aligned ellipse centred at `center`, with
/// semi-axis `rows` along y and `cols` along x.
///
/// Midpoint (Bresenham) rasterization, one quadrant walk mirrored four times.
/// Pixels close to the axis extrema are emitted more than once; callers that
/// need a set must deduplicate.
///
/// The error terms grow with `rows² * cols`, so the semi-axes must stay within
/// image scale; `Board::ellipse` bounds them by the grid diagonal.
pub fn ellipse_perimeter(center: Point<isize>, rows: isize, cols: isize) -> Vec<Point<isize>> {
    let (a, b) = (cols as i64, rows as i64);
    let (aa, bb) = (a * a, b * b);
    let mut pixels = Vec::with_capacity(4 * (a + b + 1) as usize);
    let mut push = |x: i64, y: i64| {
        pixels.push(Point {
            x: center.x + x as isize,
            y: center.y + y as isize,
        })
    };

    let mut x = -a;
    let mut y = 0;
    let mut err = x * (2 * bb + x) + bb;
    while x <= 0 {
        push(-x, y);
        push(x, y);
        push(x, -y);
        push(-x, -y);
        let e2 = 2 * err;
        if e2 >= (2 * x + 1) * bb {
            x += 1;
            err += (2 * x + 1) * bb;
        }
        if e2 <= (2 * y + 1) * aa {
            y += 1;
            err += (2 * y + 1) * aa;
        }
    }
    // flat ellipses stop early; finish the tips of the vertical axis
    while y < b {
        y += 1;
        push(0, y);
        push(0, -y);
    }
    pixels
}

/// Horizontal pixels covered by one terminal cell.
pub const CELL_WIDTH_PX: u32 = 10;
/// Vertical pixels covered by one terminal cell.
pub const CELL_HEIGHT_PX: u32 = 20;

const LAYOUT_MARGIN_PX: u32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceSize
{
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize
{
    pub const fn new(width: u32, height: u32) -> Self
    {
        Self { width, height }
    }

    /// Fits a preferred size into the available layout area, keeping a margin.
    pub fn clamped_to(self, available: SurfaceSize) -> Self
    {
        Self {
            width: self.width.min(available.width.saturating_sub(LAYOUT_MARGIN_PX)),
            height: self.height.min(available.height.saturating_sub(LAYOUT_MARGIN_PX)),
        }
    }

    /// Pixel area spanned by a block of terminal cells.
    pub fn from_cells(cols: u16, rows: u16) -> Self
    {
        Self {
            width: cols as u32 * CELL_WIDTH_PX,
            height: rows as u32 * CELL_HEIGHT_PX,
        }
    }

    pub fn width_f(self) -> f32
    {
        self.width as f32
    }

    pub fn height_f(self) -> f32
    {
        self.height as f32
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect
{
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect
{
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self
    {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32
    {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32
    {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32)
    {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains(&self, x: f32, y: f32) -> bool
    {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool
    {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Penetration depth on each axis; only meaningful when the rects intersect.
    pub fn overlap(&self, other: &Rect) -> (f32, f32)
    {
        let x = self.right().min(other.right()) - self.x.max(other.x);
        let y = self.bottom().min(other.bottom()) - self.y.max(other.y);
        (x, y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb
{
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb
{
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);
    pub const RED: Rgb = Rgb::new(255, 0, 0);
    pub const GREEN: Rgb = Rgb::new(0, 200, 80);
    pub const BLUE: Rgb = Rgb::new(0, 149, 221);
    pub const GOLD: Rgb = Rgb::new(255, 215, 0);
    pub const GREY: Rgb = Rgb::new(90, 90, 90);

    pub const fn new(r: u8, g: u8, b: u8) -> Self
    {
        Self { r, g, b }
    }

    /// Scales brightness by `t` in `0.0..=1.0`.
    pub fn dimmed(self, t: f32) -> Self
    {
        let t = t.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * t) as u8,
            g: (self.g as f32 * t) as u8,
            b: (self.b as f32 * t) as u8,
        }
    }
}

/// A 2D drawing surface addressed in surface pixels.
///
/// Game modules paint through this trait only; where the pixels end up
/// (terminal cells, a test buffer) is the implementor's business.
pub trait Canvas
{
    fn size(&self) -> SurfaceSize;
    fn clear(&mut self);
    fn fill_rect(&mut self, rect: Rect, color: Rgb);
    fn stroke_rect(&mut self, rect: Rect, color: Rgb);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb);
    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Rgb);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell
{
    pub ch: char,
    pub color: Option<Rgb>,
}

impl Cell
{
    const BLANK: Cell = Cell {
        ch: ' ',
        color: None,
    };
}

const FILL_CHAR: char = '█';
const BORDER_CHAR: char = '·';

/// Character-cell canvas: each cell covers `CELL_WIDTH_PX` x `CELL_HEIGHT_PX`
/// surface pixels.
#[derive(Debug, Clone)]
pub struct CellCanvas
{
    size: SurfaceSize,
    cols: usize,
    rows: usize,
    cells: Vec<Cell>,
}

impl CellCanvas
{
    pub fn new(size: SurfaceSize) -> Self
    {
        let cols = size.width.div_ceil(CELL_WIDTH_PX).max(1) as usize;
        let rows = size.height.div_ceil(CELL_HEIGHT_PX).max(1) as usize;
        Self {
            size,
            cols,
            rows,
            cells: vec![Cell::BLANK; cols * rows],
        }
    }

    pub fn cols(&self) -> usize
    {
        self.cols
    }

    pub fn rows(&self) -> usize
    {
        self.rows
    }

    pub fn cell(&self, col: usize, row: usize) -> Option<Cell>
    {
        if col < self.cols && row < self.rows {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Rows with 24-bit ANSI colors, ready for the terminal.
    pub fn lines(&self) -> Vec<String>
    {
        self.cells.chunks(self.cols).map(render_row).collect()
    }

    /// Rows as bare characters.
    pub fn plain_lines(&self) -> Vec<String>
    {
        self.cells
            .chunks(self.cols)
            .map(|row| row.iter().map(|cell| cell.ch).collect())
            .collect()
    }

    fn paint(&mut self, col: i64, row: i64, ch: char, color: Rgb)
    {
        if col < 0 || row < 0 || col as usize >= self.cols || row as usize >= self.rows {
            return;
        }
        self.cells[row as usize * self.cols + col as usize] = Cell {
            ch,
            color: Some(color),
        };
    }

    fn cell_at(&self, x: f32, y: f32) -> (i64, i64)
    {
        (
            (x / CELL_WIDTH_PX as f32).floor() as i64,
            (y / CELL_HEIGHT_PX as f32).floor() as i64,
        )
    }

    /// Inclusive cell span whose centers fall inside `rect`.
    fn span(&self, rect: Rect) -> (i64, i64, i64, i64)
    {
        let cw = CELL_WIDTH_PX as f32;
        let ch = CELL_HEIGHT_PX as f32;
        let c0 = (rect.x / cw - 0.5).ceil() as i64;
        let c1 = (rect.right() / cw - 0.5).floor() as i64;
        let r0 = (rect.y / ch - 0.5).ceil() as i64;
        let r1 = (rect.bottom() / ch - 0.5).floor() as i64;
        (c0, r0, c1, r1)
    }
}

impl Canvas for CellCanvas
{
    fn size(&self) -> SurfaceSize
    {
        self.size
    }

    fn clear(&mut self)
    {
        self.cells.fill(Cell::BLANK);
    }

    fn fill_rect(&mut self, rect: Rect, color: Rgb)
    {
        let (c0, r0, c1, r1) = self.span(rect);
        if c0 > c1 || r0 > r1 {
            // Smaller than a cell: mark the cell under its center.
            let (cx, cy) = rect.center();
            let (col, row) = self.cell_at(cx, cy);
            self.paint(col, row, FILL_CHAR, color);
            return;
        }
        for row in r0..=r1 {
            for col in c0..=c1 {
                self.paint(col, row, FILL_CHAR, color);
            }
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Rgb)
    {
        let (c0, r0) = self.cell_at(rect.x, rect.y);
        let (c1, r1) = self.cell_at(rect.right() - 1.0, rect.bottom() - 1.0);
        for col in c0..=c1 {
            self.paint(col, r0, BORDER_CHAR, color);
            self.paint(col, r1, BORDER_CHAR, color);
        }
        for row in r0..=r1 {
            self.paint(c0, row, BORDER_CHAR, color);
            self.paint(c1, row, BORDER_CHAR, color);
        }
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Rgb)
    {
        let bounds = Rect::new(cx - radius, cy - radius, radius * 2.0, radius * 2.0);
        let (c0, r0, c1, r1) = self.span(bounds);
        let mut painted = false;
        for row in r0..=r1 {
            for col in c0..=c1 {
                let px = (col as f32 + 0.5) * CELL_WIDTH_PX as f32;
                let py = (row as f32 + 0.5) * CELL_HEIGHT_PX as f32;
                if (px - cx).powi(2) + (py - cy).powi(2) <= radius * radius {
                    self.paint(col, row, FILL_CHAR, color);
                    painted = true;
                }
            }
        }
        if !painted {
            let (col, row) = self.cell_at(cx, cy);
            self.paint(col, row, '●', color);
        }
    }

    fn draw_text(&mut self, x: f32, y: f32, text: &str, color: Rgb)
    {
        let (col, row) = self.cell_at(x, y);
        for (offset, ch) in text.chars().enumerate() {
            self.paint(col + offset as i64, row, ch, color);
        }
    }
}

fn render_row(row: &[Cell]) -> String
{
    let mut line = String::with_capacity(row.len() + 16);
    let mut active: Option<Rgb> = None;
    for cell in row {
        if cell.color != active {
            if let Some(color) = cell.color {
                line.push_str(&ansi_color(color));
            } else {
                line.push_str("\x1b[0m");
            }
            active = cell.color;
        }
        line.push(cell.ch);
    }
    if active.is_some() {
        line.push_str("\x1b[0m");
    }
    line
}

fn ansi_color(color: Rgb) -> String
{
    format!("\x1b[38;2;{};{};{}m", color.r, color.g, color.b)
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn clamped_to_keeps_margin_and_never_grows()
    {
        let preferred = SurfaceSize::new(400, 400);
        assert_eq!(
            preferred.clamped_to(SurfaceSize::new(1000, 1000)),
            SurfaceSize::new(400, 400)
        );
        assert_eq!(
            preferred.clamped_to(SurfaceSize::new(300, 220)),
            SurfaceSize::new(280, 200)
        );
        assert_eq!(
            preferred.clamped_to(SurfaceSize::new(10, 10)),
            SurfaceSize::new(0, 0)
        );
    }

    #[test]
    fn rect_overlap_reports_penetration_per_axis()
    {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(8.0, 5.0, 10.0, 10.0);
        assert!(a.intersects(&b));
        assert_eq!(a.overlap(&b), (2.0, 5.0));
        assert!(!a.intersects(&Rect::new(10.0, 0.0, 5.0, 5.0)));
    }

    #[test]
    fn cell_canvas_maps_pixels_to_cells()
    {
        let mut canvas = CellCanvas::new(SurfaceSize::new(100, 60));
        assert_eq!((canvas.cols(), canvas.rows()), (10, 3));

        canvas.fill_rect(Rect::new(20.0, 20.0, 20.0, 20.0), Rgb::RED);
        assert_eq!(canvas.cell(2, 1).map(|cell| cell.ch), Some(FILL_CHAR));
        assert_eq!(canvas.cell(3, 1).map(|cell| cell.ch), Some(FILL_CHAR));
        assert_eq!(canvas.cell(4, 1).map(|cell| cell.ch), Some(' '));

        // Sub-cell rects still show up.
        canvas.fill_rect(Rect::new(81.0, 41.0, 3.0, 3.0), Rgb::GOLD);
        assert_eq!(canvas.cell(8, 2).map(|cell| cell.color), Some(Some(Rgb::GOLD)));

        canvas.clear();
        assert!(canvas.plain_lines().iter().all(|line| line.trim().is_empty()));
    }

    #[test]
    fn text_is_clipped_at_the_right_edge()
    {
        let mut canvas = CellCanvas::new(SurfaceSize::new(50, 20));
        canvas.draw_text(30.0, 0.0, "Score", Rgb::WHITE);
        assert_eq!(canvas.plain_lines(), vec!["   Sc".to_string()]);
    }

    #[test]
    fn colored_rows_reset_at_the_end()
    {
        let mut canvas = CellCanvas::new(SurfaceSize::new(20, 20));
        canvas.draw_text(0.0, 0.0, "ab", Rgb::RED);
        let line = &canvas.lines()[0];
        assert!(line.starts_with("\x1b[38;2;255;0;0m"));
        assert!(line.ends_with("\x1b[0m"));
    }
}

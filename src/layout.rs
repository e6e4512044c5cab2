//! Arrangements of the tiled clients on a monitor
//!
//! Every function here is pure: it receives the usable rectangle, the number
//! of clients and the active tag's parameters and hands back one outer cell
//! per client, in insertion order. Cells include the client border.

use crate::{
    geometry::Rectangle,
    monitor::pertag::{Area, SplitDir},
};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================ LayoutKind ============================
// ====================================================================

/// Available layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum LayoutKind {
    /// Windows keep whatever geometry they are given
    Floating,
    /// Master and stack areas
    Tile,
    /// Every window covers the whole area
    Monocle,
    /// Near-square grid of all windows
    Grid,
    /// Master area plus a stack of tatami mats
    Tatami,
}

impl LayoutKind {
    /// Symbol shown in the bar before the layout refines it
    pub(crate) const fn symbol(self) -> &'static str {
        match self {
            Self::Floating => "><>",
            Self::Tile => "[]=",
            Self::Monocle => "[M]",
            Self::Grid => "###",
            Self::Tatami => "|+|",
        }
    }

    /// Whether the layout positions windows at all
    pub(crate) const fn arranges(self) -> bool {
        !matches!(self, Self::Floating)
    }
}

impl fmt::Display for LayoutKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

/// Parameters of the active tag needed to lay out a monitor
#[derive(Debug, Clone, Copy)]
pub(crate) struct Params<'a> {
    /// Usable rectangle of the monitor
    pub(crate) area:          Rectangle,
    /// Pixels between cells and around the edges
    pub(crate) gap:           u32,
    pub(crate) master_count:  u32,
    pub(crate) stack_columns: u32,
    /// Primary split, master area, stack area
    pub(crate) areas:         &'a [Area; 3],
}

/// Result of laying out a monitor
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Arrangement {
    /// One outer cell per tiled client
    pub(crate) cells:  Vec<Rectangle>,
    pub(crate) symbol: String,
}

/// Compute the cells for `tiled` clients. `visible` counts every visible
/// client, floating ones included, and only decorates the monocle symbol
pub(crate) fn arrange(kind: LayoutKind, params: &Params, tiled: usize, visible: usize) -> Arrangement {
    let [primary, master, stack] = *params.areas;

    let (cells, symbol) = match kind {
        LayoutKind::Floating => (vec![], kind.symbol().to_owned()),
        LayoutKind::Tile => (
            tile(params, tiled),
            format!(
                "{}{}{}",
                primary.dir.glyph(true),
                master.dir.glyph(false),
                stack.dir.glyph(false)
            ),
        ),
        LayoutKind::Monocle => (
            vec![params.area; tiled],
            if visible > 0 {
                format!("[{}]", visible)
            } else {
                kind.symbol().to_owned()
            },
        ),
        LayoutKind::Grid => (grid(params, tiled), kind.symbol().to_owned()),
        LayoutKind::Tatami => (tatami(params, tiled), kind.symbol().to_owned()),
    };

    let (ox, oy) = params.area.point.as_tuple();
    let cells = match kind {
        LayoutKind::Monocle => cells,
        _ => cells.into_iter().map(|c| c.translated(ox, oy)).collect(),
    };

    Arrangement { cells, symbol }
}

// ============================== Region ==============================
// ====================================================================

/// A rectangle described by its anchor and terminal point, relative to the
/// usable area. Cells inside start at the anchor and stop `gap` pixels short
/// of the terminal point
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Region {
    x:  i32,
    y:  i32,
    fx: i32,
    fy: i32,
}

impl Region {
    const fn cell(x: i32, y: i32, w: i32, h: i32) -> Rectangle {
        Rectangle::new(x, y, if w < 1 { 1 } else { w as u32 }, if h < 1 { 1 } else { h as u32 })
    }

    /// The region spanning `[x0, x1) x [y0, y1)` as a single cell
    fn span(x0: i32, y0: i32, x1: i32, y1: i32, gap: i32) -> Rectangle {
        Self::cell(x0, y0, x1 - x0 - gap, y1 - y0 - gap)
    }
}

/// Split `[start, end)` into `count` spans. The first span gets `fact` shares
/// against one share for each sibling, the siblings split what remains
/// evenly and the last one absorbs the rounding. Returns `(offset, length)`
/// pairs, lengths excluding the trailing gap
fn weighted_split(start: i32, end: i32, count: usize, fact: f32, gap: i32) -> Vec<(i32, i32)> {
    let mut spans = Vec::with_capacity(count);
    let mut pos = start;
    let mut share = 0;

    for i in 0..count {
        let remaining = end - pos;
        let len = if i + 1 == count {
            remaining - gap
        } else if i == 0 {
            let f = fact / (fact + (count - 1) as f32);
            (f * remaining as f32) as i32 - gap
        } else {
            if i == 1 {
                share = (remaining as f32 / (count - 1) as f32) as i32;
            }
            share - gap
        };

        let len = len.max(1);
        spans.push((pos, len));
        pos += len + gap;
    }

    spans
}

/// Fill `region` with `n` cells in lines of at most `per_line` cells. Lines are
/// stacked vertically when `rows` is set, side by side otherwise. The first
/// line is weighted by `line_fact`, the first cell of each line by `cell_fact`
fn lines(
    region: Region,
    n: usize,
    per_line: usize,
    line_fact: f32,
    cell_fact: f32,
    gap: i32,
    rows: bool,
) -> Vec<Rectangle> {
    if n == 0 {
        return vec![];
    }

    let per_line = per_line.clamp(1, n);
    let line_count = (n + per_line - 1) / per_line;
    let line_spans = if rows {
        weighted_split(region.y, region.fy, line_count, line_fact, gap)
    } else {
        weighted_split(region.x, region.fx, line_count, line_fact, gap)
    };

    let mut cells = Vec::with_capacity(n);
    for (l, (lo, llen)) in line_spans.into_iter().enumerate() {
        let count = per_line.min(n - l * per_line);
        let cell_spans = if rows {
            weighted_split(region.x, region.fx, count, cell_fact, gap)
        } else {
            weighted_split(region.y, region.fy, count, cell_fact, gap)
        };

        cells.extend(cell_spans.into_iter().map(|(co, clen)| {
            if rows {
                Region::cell(co, lo, clen, llen)
            } else {
                Region::cell(lo, co, llen, clen)
            }
        }));
    }

    cells
}

/// Lay `n` clients into an area with its direction and weight. With more than
/// one column the area becomes a grid
fn fill_area(region: Region, n: usize, area: Area, columns: usize, gap: i32) -> Vec<Rectangle> {
    let vertical = !area.dir.is_horizontal();

    if columns <= 1 || n <= 1 {
        return lines(region, n, 1, area.fact, 1.0, gap, vertical);
    }

    let columns = columns.min(n);
    let rows = (n + columns - 1) / columns;
    if vertical {
        lines(region, n, columns, area.fact, 1.0, gap, true)
    } else {
        lines(region, n, rows, area.fact, 1.0, gap, false)
    }
}

/// Split the usable area into a master and a stack region
fn primary_split(params: &Params, masters: usize, stacked: usize) -> (Region, Region) {
    let gap = params.gap as i32;
    let (ww, wh) = (params.area.width() as i32, params.area.height() as i32);
    let primary = params.areas[0];

    let f = if masters == 0 {
        0.0
    } else if stacked == 0 {
        1.0
    } else {
        (primary.fact / 2.0).clamp(0.05, 0.95)
    };

    if primary.dir.is_horizontal() {
        let ms = (f * (ww - gap) as f32) as i32;
        let ss = ww - ms - gap;
        let mx = if primary.dir == SplitDir::Horizontal { gap } else { ss + gap };
        let sx = if primary.dir == SplitDir::Horizontal { ms + gap } else { gap };
        (
            Region { x: mx, y: gap, fx: mx + ms, fy: wh },
            Region { x: sx, y: gap, fx: sx + ss, fy: wh },
        )
    } else {
        let ms = (f * (wh - gap) as f32) as i32;
        let ss = wh - ms - gap;
        let my = if primary.dir == SplitDir::Vertical { gap } else { ss + gap };
        let sy = if primary.dir == SplitDir::Vertical { ms + gap } else { gap };
        (
            Region { x: gap, y: my, fx: ww, fy: my + ms },
            Region { x: gap, y: sy, fx: ww, fy: sy + ss },
        )
    }
}

// =============================== Tile ===============================
// ====================================================================

fn tile(params: &Params, n: usize) -> Vec<Rectangle> {
    if n == 0 {
        return vec![];
    }

    let gap = params.gap as i32;
    let masters = n.min(params.master_count as usize);
    let stacked = n - masters;
    let (master, stack) = primary_split(params, masters, stacked);

    let mut cells = fill_area(master, masters, params.areas[1], 1, gap);
    cells.extend(fill_area(
        stack,
        stacked,
        params.areas[2],
        params.stack_columns as usize,
        gap,
    ));
    cells
}

// =============================== Grid ===============================
// ====================================================================

fn grid(params: &Params, n: usize) -> Vec<Rectangle> {
    if n == 0 {
        return vec![];
    }

    let gap = params.gap as i32;
    let region = Region {
        x:  gap,
        y:  gap,
        fx: params.area.width() as i32,
        fy: params.area.height() as i32,
    };

    let mut columns = 1;
    while columns * columns < n {
        columns += 1;
    }

    lines(
        region,
        n,
        columns,
        params.areas[1].fact,
        params.areas[2].fact,
        gap,
        true,
    )
}

// ============================== Tatami ==============================
// ====================================================================

/// Clients per mat
const MAT_SIZE: usize = 5;

fn tatami(params: &Params, n: usize) -> Vec<Rectangle> {
    if n == 0 {
        return vec![];
    }

    let gap = params.gap as i32;
    let masters = n.min(params.master_count as usize);
    let stacked = n - masters;
    let (master, stack) = primary_split(params, masters, stacked);

    let mut cells = fill_area(master, masters, params.areas[1], 1, gap);
    if stacked == 0 {
        return cells;
    }

    let area = params.areas[2];
    let mats = (stacked + MAT_SIZE - 1) / MAT_SIZE;
    let vertical = !area.dir.is_horizontal();
    let spans = if vertical {
        weighted_split(stack.y, stack.fy, mats, area.fact, gap)
    } else {
        weighted_split(stack.x, stack.fx, mats, area.fact, gap)
    };

    for (m, (offset, len)) in spans.into_iter().enumerate() {
        let region = if vertical {
            Region { y: offset, fy: offset + len + gap, ..stack }
        } else {
            Region { x: offset, fx: offset + len + gap, ..stack }
        };
        cells.extend(mat(region, MAT_SIZE.min(stacked - m * MAT_SIZE), gap));
    }

    cells
}

/// Arrange up to five cells in one tatami mat
fn mat(r: Region, count: usize, gap: i32) -> Vec<Rectangle> {
    let (w, h) = (r.fx - r.x, r.fy - r.y);
    let xs = |num: i32, den: i32| r.x + w * num / den;
    let ys = |num: i32, den: i32| r.y + h * num / den;
    let span = |x0, y0, x1, y1| Region::span(x0, y0, x1, y1, gap);

    match count {
        0 => vec![],
        1 => vec![span(r.x, r.y, r.fx, r.fy)],
        2 => {
            let xm = xs(1, 2);
            vec![span(r.x, r.y, xm, r.fy), span(xm, r.y, r.fx, r.fy)]
        },
        3 => {
            let (xm, ym) = (xs(1, 2), ys(1, 2));
            vec![
                span(r.x, r.y, xm, r.fy),
                span(xm, r.y, r.fx, ym),
                span(xm, ym, r.fx, r.fy),
            ]
        },
        4 => {
            let (xm, ym) = (xs(1, 2), ys(1, 2));
            vec![
                span(r.x, r.y, xm, ym),
                span(xm, r.y, r.fx, ym),
                span(r.x, ym, xm, r.fy),
                span(xm, ym, r.fx, r.fy),
            ]
        },
        _ => {
            // Pinwheel around a center square
            let (x1, x2, y1, y2) = (xs(1, 3), xs(2, 3), ys(1, 3), ys(2, 3));
            vec![
                span(r.x, r.y, x2, y1),
                span(x2, r.y, r.fx, y2),
                span(x1, y2, r.fx, r.fy),
                span(r.x, y1, x1, r.fy),
                span(x1, y1, x2, y2),
            ]
        },
    }
}

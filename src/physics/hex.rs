use std::collections::VecDeque;

use glam::Vec2;

/// Row/column address in a [`HexGrid`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

/// Fixed-size bubble grid. Odd rows are shifted right by one radius and hold
/// one cell fewer, so every row fits the same width.
#[derive(Debug, Clone)]
pub struct HexGrid {
    cols: usize,
    rows: usize,
    radius: f32,
    origin: Vec2,
    cells: Vec<Option<u8>>,
}

impl Cell {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl HexGrid {
    pub fn new(cols: usize, rows: usize, radius: f32, origin: Vec2) -> Self {
        Self {
            cols,
            rows,
            radius,
            origin,
            cells: vec![None; cols * rows],
        }
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    fn row_height(&self) -> f32 {
        self.radius * 3f32.sqrt()
    }

    pub fn row_len(&self, row: usize) -> usize {
        if row % 2 == 1 {
            self.cols.saturating_sub(1)
        } else {
            self.cols
        }
    }

    pub fn is_valid(&self, cell: Cell) -> bool {
        cell.row < self.rows && cell.col < self.row_len(cell.row)
    }

    fn index(&self, cell: Cell) -> Option<usize> {
        self.is_valid(cell).then(|| cell.row * self.cols + cell.col)
    }

    pub fn get(&self, cell: Cell) -> Option<u8> {
        self.index(cell).and_then(|i| self.cells[i])
    }

    pub fn is_empty(&self, cell: Cell) -> bool {
        self.index(cell).is_some_and(|i| self.cells[i].is_none())
    }

    /// Place a colour; returns `false` for cells outside the grid.
    pub fn place(&mut self, cell: Cell, colour: u8) -> bool {
        match self.index(cell) {
            Some(i) => {
                self.cells[i] = Some(colour);
                true
            }
            None => false,
        }
    }

    pub fn clear(&mut self, cell: Cell) -> Option<u8> {
        let i = self.index(cell)?;
        self.cells[i].take()
    }

    pub fn occupied(&self) -> impl Iterator<Item = (Cell, u8)> + '_ {
        (0..self.rows).flat_map(move |row| {
            (0..self.row_len(row)).filter_map(move |col| {
                let cell = Cell::new(row, col);
                self.get(cell).map(|c| (cell, c))
            })
        })
    }

    /// Centre of a cell in world space.
    pub fn center(&self, cell: Cell) -> Vec2 {
        let offset = if cell.row % 2 == 1 { self.radius } else { 0.0 };
        self.origin
            + Vec2::new(
                cell.col as f32 * 2.0 * self.radius + self.radius + offset,
                cell.row as f32 * self.row_height() + self.radius,
            )
    }

    /// Rectangular estimate of the cell under a point, clamped into the grid.
    fn estimate(&self, p: Vec2) -> (i64, i64) {
        let local = p - self.origin;
        let row = (local.y / self.row_height()).floor() as i64;
        let offset = if row.rem_euclid(2) == 1 { self.radius } else { 0.0 };
        let col = ((local.x - offset) / (2.0 * self.radius)).floor() as i64;
        (row, col)
    }

    /// Valid cells in the 3×3 block around the estimated cell of `p`.
    fn scan(&self, p: Vec2) -> impl Iterator<Item = Cell> + '_ {
        let (row, col) = self.estimate(p);
        (row - 1..=row + 1)
            .flat_map(move |r| (col - 1..=col + 1).map(move |c| (r, c)))
            .filter_map(move |(r, c)| {
                let cell = Cell::new(usize::try_from(r).ok()?, usize::try_from(c).ok()?);
                self.is_valid(cell).then_some(cell)
            })
    }

    /// Cell whose centre is nearest to `p`.
    pub fn cell_at(&self, p: Vec2) -> Option<Cell> {
        self.nearest(p, |_| true)
    }

    fn nearest(&self, p: Vec2, keep: impl Fn(Cell) -> bool) -> Option<Cell> {
        self.scan(p)
            .filter(|c| keep(*c))
            .min_by(|a, b| {
                self.center(*a)
                    .distance_squared(p)
                    .total_cmp(&self.center(*b).distance_squared(p))
            })
    }

    /// Occupied cell hit by a moving egg of radius `radius` at `p`.
    /// `tolerance` shrinks the hit radius so grazing shots slide past.
    pub fn collision(&self, p: Vec2, radius: f32, tolerance: f32) -> Option<Cell> {
        let reach = (self.radius + radius - tolerance).max(0.0);
        self.scan(p)
            .filter(|c| self.get(*c).is_some())
            .filter(|c| self.center(*c).distance_squared(p) < reach * reach)
            .min_by(|a, b| {
                self.center(*a)
                    .distance_squared(p)
                    .total_cmp(&self.center(*b).distance_squared(p))
            })
    }

    /// Nearest empty cell to `p` for an egg coming to rest.
    pub fn snap(&self, p: Vec2) -> Option<Cell> {
        self.nearest(p, |c| self.is_empty(c))
    }

    /// The up to six adjacent cells.
    pub fn neighbours(&self, cell: Cell) -> Vec<Cell> {
        let (r, c) = (cell.row as i64, cell.col as i64);
        let deltas: [(i64, i64); 6] = if cell.row % 2 == 1 {
            [(0, -1), (0, 1), (-1, 0), (-1, 1), (1, 0), (1, 1)]
        } else {
            [(0, -1), (0, 1), (-1, -1), (-1, 0), (1, -1), (1, 0)]
        };
        deltas
            .iter()
            .filter_map(|(dr, dc)| {
                let cell = Cell::new(usize::try_from(r + dr).ok()?, usize::try_from(c + dc).ok()?);
                self.is_valid(cell).then_some(cell)
            })
            .collect()
    }

    /// Connected same-colour cells including `start`; empty if `start` is
    /// empty.
    pub fn cluster(&self, start: Cell) -> Vec<Cell> {
        let Some(colour) = self.get(start) else {
            return Vec::new();
        };
        self.flood(&[start], |c| self.get(c) == Some(colour))
    }

    /// Occupied cells with no path to the top row.
    pub fn floating(&self) -> Vec<Cell> {
        let anchors: Vec<Cell> = (0..self.row_len(0))
            .map(|col| Cell::new(0, col))
            .filter(|c| self.get(*c).is_some())
            .collect();
        let attached = self.flood(&anchors, |c| self.get(c).is_some());
        self.occupied()
            .map(|(cell, _)| cell)
            .filter(|cell| !attached.contains(cell))
            .collect()
    }

    fn flood(&self, seeds: &[Cell], accept: impl Fn(Cell) -> bool) -> Vec<Cell> {
        let mut seen = vec![false; self.cells.len()];
        let mut queue: VecDeque<Cell> = VecDeque::new();
        let mut found = Vec::new();
        for seed in seeds {
            if let Some(i) = self.index(*seed) {
                if !seen[i] {
                    seen[i] = true;
                    queue.push_back(*seed);
                }
            }
        }
        while let Some(cell) = queue.pop_front() {
            found.push(cell);
            for next in self.neighbours(cell) {
                let Some(i) = self.index(next) else { continue };
                if !seen[i] && accept(next) {
                    seen[i] = true;
                    queue.push_back(next);
                }
            }
        }
        found
    }
}

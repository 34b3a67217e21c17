use volley_engine::render::Color;

/// One character cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cell {
    pub ch: char,
    pub foreground: Color,
    pub background: Option<Color>,
}

impl Cell {
    const BLANK: Self = Self {
        ch: ' ',
        foreground: Color::WHITE,
        background: None,
    };
}

/// A character raster the terminal renderer draws into before writing it out.
#[derive(Debug, Clone)]
pub struct Grid {
    cols: u16,
    rows: u16,
    cells: Vec<Cell>,
}

impl Grid {
    pub fn new(cols: u16, rows: u16) -> Self {
        Self {
            cols,
            rows,
            cells: vec![Cell::BLANK; cols as usize * rows as usize],
        }
    }

    pub fn cols(&self) -> u16 {
        self.cols
    }

    pub fn rows(&self) -> u16 {
        self.rows
    }

    pub fn clear(&mut self) {
        self.cells.fill(Cell::BLANK);
    }

    pub fn resize(&mut self, cols: u16, rows: u16) {
        *self = Self::new(cols, rows);
    }

    fn index(&self, col: i32, row: i32) -> Option<usize> {
        let inside = (0..self.cols as i32).contains(&col) && (0..self.rows as i32).contains(&row);
        inside.then(|| row as usize * self.cols as usize + col as usize)
    }

    pub fn get(&self, col: u16, row: u16) -> Option<&Cell> {
        self.index(col as i32, row as i32).map(|i| &self.cells[i])
    }

    /// Set a character, keeping the cell's background. Out of range cells are ignored.
    pub fn put(&mut self, col: i32, row: i32, ch: char, color: Color) {
        if let Some(i) = self.index(col, row) {
            self.cells[i].ch = ch;
            self.cells[i].foreground = color;
        }
    }

    /// Paint a cell's background and blank its character.
    pub fn fill(&mut self, col: i32, row: i32, color: Color) {
        if let Some(i) = self.index(col, row) {
            self.cells[i] = Cell {
                ch: ' ',
                foreground: Color::WHITE,
                background: Some(color),
            };
        }
    }

    /// Write text starting at a cell, clipped at the right edge.
    pub fn text(&mut self, col: i32, row: i32, text: &str, color: Color) {
        for (offset, ch) in text.chars().enumerate() {
            self.put(col + offset as i32, row, ch, color);
        }
    }

    /// The characters of one row, for inspection.
    pub fn row_string(&self, row: u16) -> String {
        (0..self.cols)
            .filter_map(|col| self.get(col, row).map(|cell| cell.ch))
            .collect()
    }

    /// Cells of one row.
    pub fn row(&self, row: u16) -> &[Cell] {
        let start = row as usize * self.cols as usize;
        let end = (start + self.cols as usize).min(self.cells.len());
        &self.cells[start.min(end)..end]
    }
}

/// One data line of a table block.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    /// 1-based line number in the input file.
    pub line: usize,
    /// Trimmed fields, one per header column.
    pub fields: Vec<String>,
}

/// One header block of the input file, exactly as written.
#[derive(Debug, Clone, PartialEq)]
pub struct RawTable {
    /// Position of this table among all tables of the file.
    pub index: usize,
    /// Column names, from the most recent `Date,...` line.
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

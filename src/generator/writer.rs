//! Numbered program line writer.

/// Punch program writer with line numbering.
pub struct ProgramWriter {
    /// Current line number.
    line_number: u32,
    /// Line number increment.
    increment: u32,
    /// Output buffer.
    buffer: String,
}

impl ProgramWriter {
    /// Create a new writer numbering from N10 in steps of 10.
    pub fn new() -> Self {
        Self::with_start(10)
    }

    /// Create a new writer starting at a specific line number.
    pub fn with_start(start: u32) -> Self {
        Self {
            line_number: start,
            increment: 10,
            buffer: String::new(),
        }
    }

    /// Get the current line number.
    pub fn current_line(&self) -> u32 {
        self.line_number
    }

    /// Get the generated program text.
    pub fn output(&self) -> &str {
        &self.buffer
    }

    /// Take the generated program text.
    pub fn take_output(self) -> String {
        self.buffer
    }

    /// Write a numbered line.
    pub fn write_line(&mut self, content: &str) {
        self.buffer.push_str(&format!("N{} {}\n", self.line_number, content));
        self.line_number += self.increment;
    }

    /// Write a line without numbering.
    pub fn write_raw(&mut self, content: &str) {
        self.buffer.push_str(content);
        self.buffer.push('\n');
    }

    /// Write a comment line.
    pub fn write_comment(&mut self, comment: &str) {
        self.write_raw(&format!("({})", comment));
    }

    /// Write the program terminator.
    pub fn write_terminator(&mut self) {
        self.write_raw("%");
    }

    // === Movement commands ===

    /// Rapid Y-only move (G00).
    pub fn rapid_y(&mut self, y: f64) {
        self.write_line(&format!("G00 Y{}", format_coord(y)));
    }

    /// Rapid X-only move (G00).
    pub fn rapid_x(&mut self, x: f64) {
        self.write_line(&format!("G00 X{}", format_coord(x)));
    }

    // === Strikes ===

    /// Strike with the current tool.
    pub fn strike(&mut self, x: f64, y: f64, c: Option<f64>) {
        self.write_line(&format!("{}{}", format_xy(x, y), format_c(c)));
    }

    /// Load a station, then strike.
    pub fn tool_change(&mut self, station: u32, x: f64, y: f64, c: Option<f64>) {
        self.write_line(&format!("{} {}{}", format_station(station), format_xy(x, y), format_c(c)));
    }

    /// End of program (M30).
    pub fn end_program(&mut self) {
        self.write_line("M30");
    }
}

impl Default for ProgramWriter {
    fn default() -> Self {
        Self::new()
    }
}

fn format_xy(x: f64, y: f64) -> String {
    format!("X{} Y{}", format_coord(x), format_coord(y))
}

fn format_c(c: Option<f64>) -> String {
    c.map(|a| format!(" C{}", format_coord(a))).unwrap_or_default()
}

/// Format a coordinate: at most three decimals, trailing zeros trimmed.
pub fn format_coord(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0');
    let s = s.trim_end_matches('.');
    if s.is_empty() || s == "-" || s == "-0" {
        "0".to_string()
    } else {
        s.to_string()
    }
}

/// Format a station code as `T` plus two digits.
pub fn format_station(station: u32) -> String {
    format!("T{:02}", station)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_coord() {
        assert_eq!(format_coord(0.0), "0");
        assert_eq!(format_coord(100.0), "100");
        assert_eq!(format_coord(12.5), "12.5");
        assert_eq!(format_coord(0.125984), "0.126");
        assert_eq!(format_coord(-3.25), "-3.25");
        assert_eq!(format_coord(-0.0002), "0");
        assert_eq!(format_coord(1e-12), "0");
    }

    #[test]
    fn test_program_writer() {
        let mut writer = ProgramWriter::new();
        writer.tool_change(3, 10.0, 20.0, Some(90.0));
        writer.strike(15.5, 20.0, None);
        writer.end_program();
        writer.write_terminator();

        assert_eq!(writer.current_line(), 40);
        assert_eq!(writer.output(), "N10 T03 X10 Y20 C90\nN20 X15.5 Y20\nN30 M30\n%\n");
    }
}

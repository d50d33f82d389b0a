/// Derived metadata of the loaded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BufferSize {
    pub line_count: usize,
    /// Length in characters of the widest line.
    pub widest_line: usize,
}

/// The virtual grid: an ordered, 0-indexed buffer of report lines.
///
/// Replaced wholesale on every reload; viewers hold a shared reference and
/// treat it as read-only.
#[derive(Debug, Default)]
pub struct DataProvider {
    lines: Vec<String>,
    size: BufferSize,
}

impl DataProvider {
    pub fn new() -> Self {
        DataProvider::default()
    }

    /// Replace the buffer with the lines of `text`.
    pub fn update(&mut self, text: &str) {
        self.lines = text.split('\n').map(str::to_owned).collect();
        let widest_line = self
            .lines
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0);
        self.size = BufferSize {
            line_count: self.lines.len(),
            widest_line,
        };
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn line(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    pub fn size(&self) -> BufferSize {
        self.size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_splits_lines_and_derives_size() {
        let mut provider = DataProvider::new();
        provider.update("\nID Description\n 1 water plants\n\n2 tasks\n");

        assert_eq!(provider.lines().len(), 6);
        assert_eq!(provider.line(1), Some("ID Description"));
        // trailing newline yields a final empty line, like the original split
        assert_eq!(provider.line(5), Some(""));
        assert_eq!(
            provider.size(),
            BufferSize {
                line_count: 6,
                widest_line: 15,
            }
        );
    }

    #[test]
    fn reload_replaces_the_buffer_wholesale() {
        let mut provider = DataProvider::new();
        provider.update("one line that is long");
        provider.update("a\nb");
        assert_eq!(provider.size().line_count, 2);
        assert_eq!(provider.size().widest_line, 1);
    }
}

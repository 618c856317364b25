/// Accumulated oracle output for a run: each chunk's lines followed by one
/// sentinel line
///
/// Oracle lines that look like the sentinel (optionally behind backslashes)
/// are stuffed with one extra leading backslash on the way in and unstuffed
/// by [`split_sentinel_groups`], so only lines written by [`push_chunk`]
/// ever act as boundaries.
///
/// [`push_chunk`]: ResponseBuffer::push_chunk
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    sentinel: String,
    text: String,
    chunk_count: usize,
    escaped_lines: usize,
}

impl ResponseBuffer {
    pub fn new(sentinel: impl Into<String>) -> Self {
        Self {
            sentinel: sentinel.into(),
            text: String::new(),
            chunk_count: 0,
            escaped_lines: 0,
        }
    }

    /// Append one chunk's raw output and terminate it with the sentinel
    ///
    /// Every line is kept, blank ones included, so the group read back by
    /// [`split_sentinel_groups`] counts the same lines as the raw output.
    pub fn push_chunk(&mut self, raw_output: &str) {
        let lines = raw_output
            .split('\n')
            .map(|line| line.strip_suffix('\r').unwrap_or(line));

        for line in lines {
            match escape_line(line, &self.sentinel) {
                Some(escaped) => {
                    self.escaped_lines += 1;
                    self.text.push_str(&escaped);
                }
                None => self.text.push_str(line),
            }
            self.text.push('\n');
        }

        self.text.push_str(&self.sentinel);
        self.text.push('\n');
        self.chunk_count += 1;
    }

    pub fn sentinel(&self) -> &str {
        &self.sentinel
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    /// Oracle lines that had to be escaped because they resembled the sentinel
    pub fn escaped_lines(&self) -> usize {
        self.escaped_lines
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }
}

/// Whether `trimmed` is the sentinel behind zero or more backslashes
fn is_stuffed_sentinel(trimmed: &str, sentinel: &str) -> bool {
    trimmed.trim_start_matches('\\') == sentinel
}

/// Escaped form of `line` if it could be mistaken for a boundary
fn escape_line(line: &str, sentinel: &str) -> Option<String> {
    let trimmed = line.trim();
    is_stuffed_sentinel(trimmed, sentinel).then(|| format!("\\{}", trimmed))
}

fn unescape_line(line: &str, sentinel: &str) -> String {
    let trimmed = line.trim();
    if trimmed.starts_with('\\') && is_stuffed_sentinel(trimmed, sentinel) {
        trimmed[1..].to_string()
    } else {
        line.to_string()
    }
}

/// Split sentinel-joined text back into one raw output per chunk
///
/// Only whole lines equal to the sentinel (after trimming) are boundaries.
/// Non-blank text after the last sentinel counts as one more group.
pub fn split_sentinel_groups(text: &str, sentinel: &str) -> Vec<String> {
    let mut groups = Vec::new();
    let mut current: Vec<String> = Vec::new();

    for line in text.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.trim() == sentinel {
            groups.push(current.join("\n"));
            current.clear();
        } else {
            current.push(unescape_line(line, sentinel));
        }
    }

    if current.iter().any(|line| !line.trim().is_empty()) {
        groups.push(current.join("\n"));
    }

    groups
}

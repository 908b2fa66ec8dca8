/// Split a markdown document into raw slide strings.
///
/// A slide break is a line made only of three or more `-` with a blank line
/// (or the start/end of the document) on both sides. Lines inside fenced code
/// blocks never break a slide. Chunks are trimmed and empty chunks are
/// dropped, so the result can be shorter than the separator count plus one.
pub fn split(body: &str) -> Vec<String> {
    // Normalize line endings
    let body = body.replace("\r\n", "\n");
    let lines: Vec<&str> = body.split('\n').collect();

    let mut slides: Vec<String> = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut fence = Fence::default();

    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();

        if !fence.is_open() && is_dash_separator(trimmed) {
            let prev_blank = i == 0 || lines[i - 1].trim().is_empty();
            let next_blank = lines.get(i + 1).is_none_or(|l| l.trim().is_empty());

            if prev_blank && next_blank {
                push_chunk(&mut slides, &current);
                current.clear();
                continue;
            }
        }

        fence.observe(trimmed);
        current.push(line);
    }
    push_chunk(&mut slides, &current);

    slides
}

fn push_chunk(slides: &mut Vec<String>, lines: &[&str]) {
    let chunk = lines.join("\n");
    let chunk = chunk.trim();
    if !chunk.is_empty() {
        slides.push(chunk.to_string());
    }
}

/// Tracks whether we are inside a ``` or ~~~ fenced block.
#[derive(Debug, Default)]
struct Fence {
    open: Option<(char, usize)>,
}

impl Fence {
    fn is_open(&self) -> bool {
        self.open.is_some()
    }

    fn observe(&mut self, trimmed: &str) {
        match self.open {
            Some((fence_char, fence_len)) => {
                let closing_count = trimmed.chars().take_while(|&c| c == fence_char).count();
                if closing_count >= fence_len
                    && trimmed
                        .chars()
                        .skip(closing_count)
                        .all(|c| c.is_whitespace())
                {
                    self.open = None;
                }
            }
            None => {
                if let Some(fence_char) = trimmed
                    .chars()
                    .next()
                    .filter(|_| trimmed.starts_with("```") || trimmed.starts_with("~~~"))
                {
                    let fence_len = trimmed.chars().take_while(|&c| c == fence_char).count();
                    self.open = Some((fence_char, fence_len));
                }
            }
        }
    }
}

fn is_dash_separator(line: &str) -> bool {
    line.len() >= 3 && line.chars().all(|c| c == '-')
}

use regex::{CaptureMatches, Captures, Regex};

/// One property record's slice of the source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePage<'t> {
    pub number: u32,
    pub text: &'t str,
}

/// Splits the flat export into pages on a boundary marker.
#[derive(Debug, Clone)]
pub struct PageSegmenter {
    marker: Regex,
    min_chars: usize,
}

impl PageSegmenter {
    pub fn new(marker: &str, min_chars: usize) -> Result<Self, regex::Error> {
        Ok(Self {
            marker: Regex::new(marker)?,
            min_chars,
        })
    }

    /// Lazily iterate the qualifying pages. Calling again restarts from the top.
    pub fn pages<'s, 't>(&'s self, text: &'t str) -> Pages<'s, 't> {
        Pages {
            text,
            markers: self.marker.captures_iter(text),
            current: None,
            ordinal: 0,
            started: false,
            min_chars: self.min_chars,
        }
    }

    pub fn count(&self, text: &str) -> usize {
        self.pages(text).count()
    }
}

pub struct Pages<'s, 't> {
    text: &'t str,
    markers: CaptureMatches<'s, 't>,
    current: Option<(u32, usize)>,
    ordinal: u32,
    started: bool,
    min_chars: usize,
}

impl<'s, 't> Pages<'s, 't> {
    fn header(&mut self, captures: &Captures<'_>) -> (u32, usize) {
        self.ordinal += 1;
        let number = captures
            .get(1)
            .and_then(|group| group.as_str().trim().parse::<u32>().ok())
            .unwrap_or(self.ordinal);
        let body_start = captures.get(0).map_or(0, |whole| whole.end());
        (number, body_start)
    }

    fn advance_marker(&mut self) -> Option<(u32, usize, usize)> {
        let captures = self.markers.next()?;
        let marker_start = captures.get(0).map_or(self.text.len(), |whole| whole.start());
        let (number, body_start) = self.header(&captures);
        Some((number, body_start, marker_start))
    }
}

impl<'s, 't> Iterator for Pages<'s, 't> {
    type Item = SourcePage<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        if !self.started {
            self.started = true;
            self.current = self
                .advance_marker()
                .map(|(number, body_start, _)| (number, body_start));
        }

        loop {
            let (number, body_start) = self.current.take()?;
            let body_end = match self.advance_marker() {
                Some((next_number, next_body, marker_start)) => {
                    self.current = Some((next_number, next_body));
                    marker_start
                }
                None => self.text.len(),
            };

            let body = &self.text[body_start..body_end];
            let chars = body.trim().chars().count();
            if chars >= self.min_chars {
                return Some(SourcePage {
                    number,
                    text: body,
                });
            }
            if chars == 0 {
                tracing::debug!(page = number, "skipping empty page");
            } else {
                tracing::warn!(
                    page = number,
                    chars,
                    min_chars = self.min_chars,
                    "skipping page below minimum length"
                );
            }
        }
    }
}

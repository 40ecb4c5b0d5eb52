use super::char_len;

/// Maps character offsets in the joined full text back to 1-based page
/// numbers. Built from the cleaned pages before they are joined, so the
/// cumulative bounds account for the two-character separator between pages.
#[derive(Debug)]
pub struct PageMap {
    bounds: Vec<usize>,
}

impl PageMap {
    pub fn new(pages: &[String]) -> Self {
        let mut bounds = Vec::<usize>::with_capacity(pages.len());
        let mut cumulative = 0usize;

        for (index, page) in pages.iter().enumerate() {
            cumulative += char_len(page);
            if index + 1 < pages.len() {
                cumulative += 2;
            }
            bounds.push(cumulative);
        }

        Self { bounds }
    }

    /// 1-based page containing the given offset. Offsets past the last bound
    /// clamp to the final page.
    pub fn page_for_offset(&self, offset: usize) -> i64 {
        if self.bounds.is_empty() {
            return 1;
        }
        for (index, bound) in self.bounds.iter().enumerate() {
            if offset <= *bound {
                return (index + 1) as i64;
            }
        }
        self.bounds.len() as i64
    }

    pub fn page_range(&self, start_offset: usize, end_offset: usize) -> (i64, i64) {
        let page_start = self.page_for_offset(start_offset);
        let page_end = self.page_for_offset(end_offset.max(start_offset));
        (page_start, page_end.max(page_start))
    }
}

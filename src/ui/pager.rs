/// Tracks which contact page is on screen. One page per contact; the index is
/// meaningless while the list is empty.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Pager {
    len: usize,
    index: usize,
}

impl Pager {
    pub(crate) fn new(len: usize) -> Self {
        Self { len, index: 0 }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Index of the visible page, or `None` when there are no contacts.
    pub(crate) fn current(&self) -> Option<usize> {
        (!self.is_empty()).then_some(self.index)
    }

    /// Advance one page. Returns `false` when already on the last page.
    pub(crate) fn next(&mut self) -> bool {
        if self.index + 1 < self.len {
            self.index += 1;
            true
        } else {
            false
        }
    }

    /// Step back one page. Returns `false` when already on the first page.
    pub(crate) fn previous(&mut self) -> bool {
        if self.index > 0 && !self.is_empty() {
            self.index -= 1;
            true
        } else {
            false
        }
    }

    pub(crate) fn first(&mut self) {
        self.index = 0;
    }

    pub(crate) fn last(&mut self) {
        self.index = self.len.saturating_sub(1);
    }

    /// Jump to `index`, ignoring out-of-range requests.
    pub(crate) fn go_to(&mut self, index: usize) -> bool {
        if index < self.len {
            self.index = index;
            true
        } else {
            false
        }
    }

    /// Adopt a freshly fetched page count, optionally focusing a specific page,
    /// and clamp the index back into bounds.
    pub(crate) fn sync(&mut self, len: usize, focus: Option<usize>) {
        self.len = len;
        if let Some(index) = focus.filter(|&i| i < len) {
            self.index = index;
        } else if self.index >= len {
            self.index = len.saturating_sub(1);
        }
    }

    pub(crate) fn label(&self) -> String {
        match self.current() {
            Some(index) => format!("Page {} of {}", index + 1, self.len),
            None => "No contacts".to_string(),
        }
    }
}
